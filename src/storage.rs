//! CSV adapters for the matching engine.
//!
//! All schema tolerance lives here: header normalization, column aliases,
//! required-column validation, and per-row recovery. The core modules only
//! ever see typed records. Every write goes to a sibling temp file and is
//! atomically renamed into place, so a crash mid-write cannot leave a
//! half-written ledger behind.

use crate::eligibility::{parse_activity_date, parse_app_installed};
use crate::errors::{AppError, ResultExt};
use crate::ledger::ProcessedLedger;
use crate::models::{AssignmentRecord, CapacityCounter, Lead, Partner, ProcessedLead};
use chrono::NaiveDate;
use csv::StringRecord;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Lead-side pincode header aliases (spreadsheet exports are inconsistent).
const PINCODE_ALIASES: [&str; 5] = ["pincode", "postal_code", "postalcode", "pin_code", "pin"];

/// Canonicalizes a spreadsheet header: trim, lowercase, collapse
/// non-alphanumeric runs, and strip the `_x000d` carriage-return artifact
/// Excel exports sometimes append.
fn normalize_header(raw: &str) -> String {
    static HEADER_RE: OnceLock<Regex> = OnceLock::new();
    let re = HEADER_RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
    let lowered = raw.trim().to_lowercase();
    let cleaned = re.replace_all(&lowered, "_");
    let cleaned = cleaned.trim_matches('_');
    cleaned.strip_suffix("_x000d").unwrap_or(cleaned).to_string()
}

fn header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        map.entry(normalize_header(name)).or_insert(idx);
    }
    map
}

fn find_col(map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| map.get(*a).copied())
}

/// Ensures every required column resolved; the error lists the canonical
/// names of the missing ones.
fn require_columns(
    file_label: &str,
    resolved: &[(&str, Option<usize>)],
) -> Result<(), AppError> {
    let missing: Vec<&str> = resolved
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::ConfigurationError(format!(
            "{} is missing required columns: {:?}",
            file_label, missing
        )))
    }
}

fn field(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

fn opt_field(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.map(|i| field(record, i)).filter(|s| !s.is_empty())
}

// ============ Input Feeds ============

/// Reads the lead feed. Blank-identity leads get a positional fallback key
/// so they stay in the processable universe without being matched twice.
pub fn read_leads(path: &Path) -> Result<Vec<Lead>, AppError> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening leads file {}", path.display()))?;
    let map = header_map(rdr.headers().context("reading leads header")?);

    let lead_id_col = find_col(&map, &["leadid", "lead_id"]);
    let reg_no_col = find_col(&map, &["registrationno", "registration_no"]);
    let city_col = find_col(&map, &["regcity", "city", "lead_city"]);
    let state_col = find_col(&map, &["regstate", "state", "lead_state"]);
    require_columns(
        "Leads file",
        &[
            ("leadid", lead_id_col),
            ("registrationno", reg_no_col),
            ("regcity", city_col),
            ("regstate", state_col),
        ],
    )?;
    let pincode_col = find_col(&map, &PINCODE_ALIASES);

    let mut leads = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    "{}",
                    AppError::MalformedRecord(format!("skipping lead row {}: {}", idx + 2, e))
                );
                continue;
            }
        };
        let lead_id = field(&record, lead_id_col.unwrap_or(0));
        let registration_no = field(&record, reg_no_col.unwrap_or(0));
        let lead_key = if lead_id.is_empty() && registration_no.is_empty() {
            idx.to_string()
        } else {
            Lead::key_for(&lead_id, &registration_no)
        };
        leads.push(Lead {
            lead_id,
            registration_no,
            city: field(&record, city_col.unwrap_or(0)),
            state: field(&record, state_col.unwrap_or(0)),
            pincode: opt_field(&record, pincode_col),
            lead_key,
        });
    }
    tracing::info!("Loaded {} leads from {}", leads.len(), path.display());
    Ok(leads)
}

/// Reads the partner feed. Rows without a partner id are malformed and
/// skipped; unparseable dates and scores degrade to absent values and are
/// handled downstream by the eligibility filter.
pub fn read_partners(path: &Path) -> Result<Vec<Partner>, AppError> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening partner file {}", path.display()))?;
    let map = header_map(rdr.headers().context("reading partner header")?);

    let id_col = find_col(&map, &["user_id", "partner_id", "posp_id"]);
    let city_col = find_col(&map, &["city_name", "city"]);
    let state_col = find_col(&map, &["state_name", "state"]);
    let activity_col = find_col(&map, &["last_biz_date", "last_activity_date"]);
    require_columns(
        "Partner file",
        &[
            ("user_id", id_col),
            ("city_name", city_col),
            ("state_name", state_col),
            ("last_biz_date", activity_col),
        ],
    )?;
    let name_col = find_col(&map, &["user_name", "partner_name", "name"]);
    let pincode_col = find_col(&map, &PINCODE_ALIASES);
    let app_col = find_col(&map, &["app_installed"]);
    let perf_col = find_col(&map, &["performance_score"]);

    let mut partners = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    "{}",
                    AppError::MalformedRecord(format!("skipping partner row {}: {}", idx + 2, e))
                );
                continue;
            }
        };
        let partner_id = field(&record, id_col.unwrap_or(0));
        if partner_id.is_empty() {
            tracing::warn!(
                "{}",
                AppError::MalformedRecord(format!("partner row {} has no id", idx + 2))
            );
            continue;
        }

        let raw_date = field(&record, activity_col.unwrap_or(0));
        let last_activity_date = parse_activity_date(&raw_date);
        if last_activity_date.is_none() && !raw_date.is_empty() {
            tracing::warn!(
                "partner {}: unparseable last activity date '{}'",
                partner_id,
                raw_date
            );
        }

        let performance_score = opt_field(&record, perf_col)
            .and_then(|raw| {
                let parsed = raw.parse::<f64>().ok();
                if parsed.is_none() {
                    tracing::warn!(
                        "partner {}: non-numeric performance score '{}'",
                        partner_id,
                        raw
                    );
                }
                parsed
            })
            .unwrap_or(0.0);

        partners.push(Partner {
            partner_name: name_col.map(|i| field(&record, i)).unwrap_or_default(),
            city: field(&record, city_col.unwrap_or(0)),
            state: field(&record, state_col.unwrap_or(0)),
            pincode: opt_field(&record, pincode_col),
            last_activity_date,
            app_installed: app_col.map(|i| parse_app_installed(&field(&record, i))),
            performance_score,
            partner_id,
        });
    }
    tracing::info!(
        "Loaded {} partner rows from {}",
        partners.len(),
        path.display()
    );
    Ok(partners)
}

// ============ Durable State ============

/// Loads the processed-lead ledger; a missing file is an empty ledger.
/// Older master files without a `lead_key` column are tolerated by
/// recomputing the key from the identity pair.
pub fn read_processed_ledger(path: &Path) -> Result<ProcessedLedger, AppError> {
    if !path.exists() {
        return Ok(ProcessedLedger::new());
    }
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening leads master {}", path.display()))?;
    let map = header_map(rdr.headers().context("reading leads master header")?);
    if map.is_empty() {
        return Ok(ProcessedLedger::new());
    }
    let key_col = find_col(&map, &["lead_key"]);
    let lead_id_col = find_col(&map, &["lead_id", "leadid"]);
    let reg_no_col = find_col(&map, &["registration_no", "registrationno"]);
    if key_col.is_none() && (lead_id_col.is_none() || reg_no_col.is_none()) {
        return Err(AppError::ConfigurationError(
            "Leads master is missing required columns: [\"lead_key\"]".to_string(),
        ));
    }

    let mut entries = Vec::new();
    for result in rdr.records() {
        let record = result.context("reading leads master row")?;
        let lead_id = opt_field(&record, lead_id_col).unwrap_or_default();
        let registration_no = opt_field(&record, reg_no_col).unwrap_or_default();
        let lead_key = opt_field(&record, key_col)
            .unwrap_or_else(|| Lead::key_for(&lead_id, &registration_no));
        entries.push(ProcessedLead {
            lead_key,
            lead_id,
            registration_no,
        });
    }
    Ok(ProcessedLedger::from_entries(entries))
}

/// Rewrites the processed-lead ledger atomically.
pub fn write_processed_ledger(path: &Path, ledger: &ProcessedLedger) -> Result<(), AppError> {
    write_rows(path, ledger.entries()).context("writing leads master")
}

/// Loads the persisted capacity counters; a missing file is empty state.
/// Rows with an unreadable reset date keep their count but are stamped
/// with the processing date.
pub fn read_capacity_counters(
    path: &Path,
    today: NaiveDate,
) -> Result<Vec<CapacityCounter>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening load file {}", path.display()))?;
    let map = header_map(rdr.headers().context("reading load file header")?);
    if map.is_empty() {
        return Ok(Vec::new());
    }
    let id_col = find_col(&map, &["partner_id", "posp_id", "user_id"]);
    let count_col = find_col(&map, &["assigned_count_today"]);
    let reset_col = find_col(&map, &["last_reset_date"]);
    require_columns("Load file", &[("partner_id", id_col)])?;

    let mut counters = Vec::new();
    for result in rdr.records() {
        let record = result.context("reading load file row")?;
        let partner_id = field(&record, id_col.unwrap_or(0));
        if partner_id.is_empty() {
            continue;
        }
        let assigned_count_today = opt_field(&record, count_col)
            .and_then(|raw| raw.parse::<f64>().ok())
            .map(|n| n.max(0.0) as u32)
            .unwrap_or(0);
        let last_reset_date = opt_field(&record, reset_col)
            .and_then(|raw| parse_activity_date(&raw))
            .unwrap_or(today);
        counters.push(CapacityCounter {
            partner_id,
            assigned_count_today,
            last_reset_date,
        });
    }
    Ok(counters)
}

/// Rewrites the capacity snapshot atomically.
pub fn write_capacity_snapshot(
    path: &Path,
    counters: &[CapacityCounter],
) -> Result<(), AppError> {
    write_rows(path, counters).context("writing load snapshot")
}

// ============ Assignment Output ============

/// Reads previously emitted assignment records; missing file means none.
pub fn read_assignments(path: &Path) -> Result<Vec<AssignmentRecord>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening matches file {}", path.display()))?;
    let mut records = Vec::new();
    for result in rdr.deserialize::<AssignmentRecord>() {
        records.push(result.context("reading existing match row")?);
    }
    Ok(records)
}

/// Appends new assignment records, deduplicating against the existing file
/// by `(lead_id, registration_no, partner_id, assigned_status)`. Returns
/// the number of rows actually added.
pub fn append_assignments(
    path: &Path,
    new_records: &[AssignmentRecord],
) -> Result<usize, AppError> {
    let mut combined = read_assignments(path)?;
    let mut seen: HashSet<_> = combined.iter().map(|r| r.dedup_key()).collect();

    let mut appended = 0;
    for record in new_records {
        if seen.insert(record.dedup_key()) {
            combined.push(record.clone());
            appended += 1;
        }
    }
    write_rows(path, &combined).context("writing matches file")?;
    Ok(appended)
}

// ============ Atomic Writes ============

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Serializes rows to a sibling temp file, then renames over the target.
fn write_rows<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    let tmp = tmp_path(path);
    let mut wtr = csv::Writer::from_path(&tmp)
        .with_context(|| format!("creating temp file {}", tmp.display()))?;
    for row in rows {
        wtr.serialize(row).context("serializing row")?;
    }
    wtr.flush().context("flushing temp file")?;
    drop(wtr);
    std::fs::rename(&tmp, path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header("  LeadID "), "leadid");
        assert_eq!(normalize_header("Pincode_x000D_"), "pincode");
        assert_eq!(normalize_header("Last Biz Date"), "last_biz_date");
        assert_eq!(normalize_header("user-id"), "user_id");
    }

    #[test]
    fn tmp_path_is_a_sibling() {
        let p = tmp_path(Path::new("/data/out/matches.csv"));
        assert_eq!(p, Path::new("/data/out/matches.csv.tmp"));
    }
}
