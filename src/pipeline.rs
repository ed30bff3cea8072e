//! Incremental run controller.
//!
//! One run is a single-threaded batch pass: load feeds and durable state,
//! narrow to leads never seen before, match them greedily in feed order,
//! then persist. Outputs are written before the processed-lead ledger, so
//! a failed output write never marks a lead as handled.

use crate::capacity::CapacityLedger;
use crate::config::Config;
use crate::eligibility;
use crate::errors::AppError;
use crate::models::{AssignedStatus, AssignmentRecord, Lead, ProcessedLead};
use crate::selector;
use crate::storage;
use chrono::{Local, NaiveDate};
use std::collections::HashSet;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_leads: usize,
    pub already_processed: usize,
    pub new_leads: usize,
    pub assigned: usize,
    pub not_assigned: usize,
    pub records_appended: usize,
}

/// Runs the full matching pass against today's date.
pub fn run(config: &Config) -> Result<RunSummary, AppError> {
    run_with_date(config, Local::now().date_naive())
}

/// Runs the full matching pass against an explicit processing date.
/// Split out so state transitions across calendar days are testable.
pub fn run_with_date(config: &Config, today: NaiveDate) -> Result<RunSummary, AppError> {
    tracing::info!("Running lead-to-POSP matching for {}", today);

    let leads = storage::read_leads(&config.leads_file)?;
    let partners = storage::read_partners(&config.partners_file)?;
    let mut processed = storage::read_processed_ledger(&config.leads_master_file)?;
    let counters = storage::read_capacity_counters(&config.posp_load_file, today)?;
    let mut capacity = CapacityLedger::from_counters(counters, today);

    // Deduplicate the feed by lead key, then drop everything already
    // handled in a previous run. A key in the ledger stays excluded even
    // if the lead's other fields changed since.
    let total_leads = leads.len();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let new_leads: Vec<Lead> = leads
        .into_iter()
        .filter(|lead| seen_keys.insert(lead.lead_key.clone()))
        .filter(|lead| !processed.contains(&lead.lead_key))
        .collect();
    let already_processed = processed.len();

    tracing::info!("Total leads in feed    : {}", total_leads);
    tracing::info!("Already processed leads: {}", already_processed);
    tracing::info!("New leads to process   : {}", new_leads.len());

    if new_leads.is_empty() {
        tracing::info!("No new leads. Nothing to do.");
        return Ok(RunSummary {
            total_leads,
            already_processed,
            ..RunSummary::default()
        });
    }

    let eligible = eligibility::filter_eligible(
        partners,
        today,
        config.matching.active_days_window,
    );

    let mut records: Vec<AssignmentRecord> = Vec::new();
    for lead in &new_leads {
        records.extend(selector::select_for_lead(
            lead,
            &eligible,
            &mut capacity,
            &config.matching,
        ));
    }

    // Collapse duplicate decision rows within the run before touching
    // the output file.
    let mut seen_records = HashSet::new();
    records.retain(|r| seen_records.insert(r.dedup_key()));

    let assigned = records
        .iter()
        .filter(|r| r.assigned_status == AssignedStatus::Assigned)
        .count();
    let not_assigned = records.len() - assigned;

    // Outputs first, processed-lead ledger last. A lead is only marked
    // handled once its decision row is durable.
    let records_appended = storage::append_assignments(&config.matches_file, &records)?;
    storage::write_capacity_snapshot(&config.posp_load_file, &capacity.snapshot())?;

    for lead in &new_leads {
        processed.record(ProcessedLead {
            lead_key: lead.lead_key.clone(),
            lead_id: lead.lead_id.clone(),
            registration_no: lead.registration_no.clone(),
        });
    }
    storage::write_processed_ledger(&config.leads_master_file, &processed)?;

    let summary = RunSummary {
        total_leads,
        already_processed,
        new_leads: new_leads.len(),
        assigned,
        not_assigned,
        records_appended,
    };
    tracing::info!(
        "✅ Matching completed: {} new leads, {} assigned, {} not assigned, {} rows appended",
        summary.new_leads,
        summary.assigned,
        summary.not_assigned,
        summary.records_appended
    );
    Ok(summary)
}
