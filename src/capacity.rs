//! Per-partner daily load tracking.
//!
//! Counters reset lazily: a counter whose `last_reset_date` differs from
//! the processing date reads as 0 and is physically reset on first touch.
//! There is no global flush.

use crate::models::CapacityCounter;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Mutable daily-load state for one run. Built from the persisted snapshot
/// at run start and written back at run end.
#[derive(Debug)]
pub struct CapacityLedger {
    today: NaiveDate,
    counters: HashMap<String, CapacityCounter>,
}

impl CapacityLedger {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            counters: HashMap::new(),
        }
    }

    /// Restores the ledger from persisted counters. Duplicate partner rows
    /// collapse to the first occurrence.
    pub fn from_counters(counters: Vec<CapacityCounter>, today: NaiveDate) -> Self {
        let mut ledger = Self::new(today);
        for counter in counters {
            ledger
                .counters
                .entry(counter.partner_id.clone())
                .or_insert(counter);
        }
        ledger
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Today's assignment count for a partner. Resets a stale counter as a
    /// side effect, so the stored state converges on the processing date.
    pub fn current_load(&mut self, partner_id: &str) -> u32 {
        match self.counters.get_mut(partner_id) {
            Some(counter) => {
                if counter.last_reset_date != self.today {
                    counter.assigned_count_today = 0;
                    counter.last_reset_date = self.today;
                }
                counter.assigned_count_today
            }
            None => 0,
        }
    }

    /// Records one assignment, creating a zero-initialized counter first if
    /// the partner has none.
    pub fn record_assignment(&mut self, partner_id: &str) {
        let counter = self
            .counters
            .entry(partner_id.to_string())
            .or_insert_with(|| CapacityCounter {
                partner_id: partner_id.to_string(),
                assigned_count_today: 0,
                last_reset_date: self.today,
            });
        if counter.last_reset_date != self.today {
            counter.assigned_count_today = 0;
            counter.last_reset_date = self.today;
        }
        counter.assigned_count_today += 1;
    }

    /// Snapshot for persistence, sorted by partner id for a stable file.
    pub fn snapshot(&self) -> Vec<CapacityCounter> {
        let mut counters: Vec<CapacityCounter> = self.counters.values().cloned().collect();
        counters.sort_by(|a, b| a.partner_id.cmp(&b.partner_id));
        counters
    }
}
