//! Processed-lead ledger.
//!
//! Durable, monotonically growing set of `lead_key`s. A key present here is
//! permanently excluded from future matching. A `not_assigned` outcome
//! still marks the lead processed (one shot per lead, no retry queue).

use crate::models::ProcessedLead;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ProcessedLedger {
    keys: HashSet<String>,
    entries: Vec<ProcessedLead>,
}

impl ProcessedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the ledger from persisted rows, dropping duplicate keys.
    pub fn from_entries(entries: Vec<ProcessedLead>) -> Self {
        let mut ledger = Self::new();
        for entry in entries {
            ledger.record(entry);
        }
        ledger
    }

    pub fn contains(&self, lead_key: &str) -> bool {
        self.keys.contains(lead_key)
    }

    /// Adds an entry; returns false when the key was already present.
    pub fn record(&mut self, entry: ProcessedLead) -> bool {
        if !self.keys.insert(entry.lead_key.clone()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows in insertion order, for persistence.
    pub fn entries(&self) -> &[ProcessedLead] {
        &self.entries
    }
}
