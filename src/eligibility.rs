//! Partner eligibility filtering.
//!
//! Reduces the raw partner pool to the subset usable for matching:
//! deduplicated by id, recently active, and with the partner app installed
//! (or no app column in the feed at all, which is treated as installed).

use crate::models::Partner;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;

/// Truthy encodings accepted for the `app_installed` column.
const TRUTHY: [&str; 4] = ["yes", "y", "true", "1"];

/// Parses an `app_installed` cell. Accepts the truthy string encodings
/// case-insensitively and any nonzero numeric; everything else (including a
/// blank cell) is false.
pub fn parse_app_installed(raw: &str) -> bool {
    let v = raw.trim().to_lowercase();
    if TRUTHY.contains(&v.as_str()) {
        return true;
    }
    v.parse::<f64>().map(|n| n != 0.0).unwrap_or(false)
}

/// Lenient activity-date parsing. The original feeds mixed ISO dates with
/// day-first formats and occasional timestamps, so several layouts are
/// tried in order. Returns `None` for blank or unparseable values.
pub fn parse_activity_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%b-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d-%m-%Y %H:%M:%S"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Returns the partners usable for matching this run.
///
/// Duplicates (same `partner_id`) collapse to the first row, preserving
/// feed order. Partners whose last activity is unknown or older than
/// `window_days` are excluded entirely, as are partners without the app.
pub fn filter_eligible(partners: Vec<Partner>, today: NaiveDate, window_days: i64) -> Vec<Partner> {
    let total = partners.len();
    let mut seen: HashSet<String> = HashSet::new();
    let eligible: Vec<Partner> = partners
        .into_iter()
        .filter(|p| {
            if !seen.insert(p.partner_id.clone()) {
                tracing::debug!("dropping duplicate partner row: {}", p.partner_id);
                return false;
            }
            let active = match p.last_activity_date {
                Some(d) => (today - d).num_days() <= window_days,
                None => false,
            };
            if !active {
                return false;
            }
            p.app_installed.unwrap_or(true)
        })
        .collect();
    tracing::info!(
        "Eligible partners: {} of {} (window {} days)",
        eligible.len(),
        total,
        window_days
    );
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn partner(id: &str, last_activity: Option<NaiveDate>, app: Option<bool>) -> Partner {
        Partner {
            partner_id: id.to_string(),
            partner_name: format!("Partner {}", id),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: None,
            last_activity_date: last_activity,
            app_installed: app,
            performance_score: 0.0,
        }
    }

    #[test]
    fn truthy_encodings() {
        for v in ["yes", "YES", "y", "true", "TRUE", "1", "2", "1.0"] {
            assert!(parse_app_installed(v), "expected truthy: {}", v);
        }
        for v in ["no", "n", "false", "0", "0.0", "", "maybe"] {
            assert!(!parse_app_installed(v), "expected falsy: {}", v);
        }
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_activity_date("2025-03-14"), Some(expected));
        assert_eq!(parse_activity_date("14-03-2025"), Some(expected));
        assert_eq!(parse_activity_date("14/03/2025"), Some(expected));
        assert_eq!(parse_activity_date("2025-03-14 09:30:00"), Some(expected));
        assert_eq!(parse_activity_date("not a date"), None);
        assert_eq!(parse_activity_date(""), None);
    }

    #[test]
    fn stale_and_unknown_partners_excluded() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let fresh = partner("P1", Some(today - Duration::days(5)), None);
        let stale = partner("P2", Some(today - Duration::days(45)), None);
        let unknown = partner("P3", None, None);
        let out = filter_eligible(vec![fresh, stale, unknown], today, 30);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].partner_id, "P1");
    }

    #[test]
    fn app_column_fail_open() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let recent = today - Duration::days(1);
        let absent = partner("P1", Some(recent), None);
        let installed = partner("P2", Some(recent), Some(true));
        let missing_app = partner("P3", Some(recent), Some(false));
        let out = filter_eligible(vec![absent, installed, missing_app], today, 30);
        let ids: Vec<&str> = out.iter().map(|p| p.partner_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }

    #[test]
    fn duplicates_collapse_to_first_row() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut first = partner("P1", Some(today), None);
        first.city = "Pune".to_string();
        let mut second = partner("P1", Some(today), None);
        second.city = "Mumbai".to_string();
        let out = filter_eligible(vec![first, second], today, 30);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].city, "Pune");
    }
}
