/// Unit tests for the matching core
/// Covers candidate selection, tier exclusivity, tie-breaks, and the
/// capacity cap as seen through the selector.
use chrono::{Duration, NaiveDate};
use lead_posp_matcher::capacity::CapacityLedger;
use lead_posp_matcher::config::MatchConfig;
use lead_posp_matcher::models::{AssignedStatus, Lead, Partner};
use lead_posp_matcher::selector::select_for_lead;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn lead(id: &str, city: &str, state: &str, pincode: Option<&str>) -> Lead {
    Lead {
        lead_id: id.to_string(),
        registration_no: format!("REG{}", id),
        city: city.to_string(),
        state: state.to_string(),
        pincode: pincode.map(String::from),
        lead_key: Lead::key_for(id, &format!("REG{}", id)),
    }
}

fn partner(
    id: &str,
    city: &str,
    state: &str,
    pincode: Option<&str>,
    days_ago: i64,
    performance: f64,
) -> Partner {
    Partner {
        partner_id: id.to_string(),
        partner_name: format!("Partner {}", id),
        city: city.to_string(),
        state: state.to_string(),
        pincode: pincode.map(String::from),
        last_activity_date: Some(today() - Duration::days(days_ago)),
        app_installed: Some(true),
        performance_score: performance,
    }
}

#[cfg(test)]
mod selection_tests {
    use super::*;

    #[test]
    fn worked_example_assigns_exact_pincode_partner() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", Some("411001"));
        let p = partner("P1", "Pune", "Maharashtra", Some("411001"), 2, 0.0);

        let records = select_for_lead(&l, &[p], &mut ledger, &cfg);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.assigned_status, AssignedStatus::Assigned);
        assert_eq!(r.partner_id.as_deref(), Some("P1"));
        assert_eq!(r.match_type, "pincode_exact");
        // 18 (pincode_exact) + 5 (active 2 days ago) + 0 (performance)
        assert_eq!(r.total_score, 23.0);
        assert_eq!(ledger.current_load("P1"), 1);
    }

    #[test]
    fn state_mismatch_yields_not_assigned() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", None);
        let p = partner("P1", "Pune", "Karnataka", None, 1, 50.0);

        let records = select_for_lead(&l, &[p], &mut ledger, &cfg);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].assigned_status, AssignedStatus::NotAssigned);
        assert_eq!(records[0].partner_id, None);
        assert_eq!(records[0].match_type, "none");
        assert_eq!(ledger.current_load("P1"), 0);
    }

    #[test]
    fn below_min_score_yields_not_assigned() {
        let cfg = MatchConfig {
            min_score: 20.0,
            ..MatchConfig::default()
        };
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", None);
        // exact_city (10) + recency (5) = 15 < 20
        let p = partner("P1", "Pune", "Maharashtra", None, 1, 0.0);

        let records = select_for_lead(&l, &[p], &mut ledger, &cfg);
        assert_eq!(records[0].assigned_status, AssignedStatus::NotAssigned);
        assert_eq!(ledger.current_load("P1"), 0);
    }

    #[test]
    fn no_partners_yields_exactly_one_not_assigned_row() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", None);

        let records = select_for_lead(&l, &[], &mut ledger, &cfg);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].assigned_status, AssignedStatus::NotAssigned);
    }

    #[test]
    fn performance_weight_can_flip_the_winner() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", None);
        // Same tier and recency; performance decides.
        let low = partner("LOW", "Pune", "Maharashtra", None, 1, 1.0);
        let high = partner("HIGH", "Pune", "Maharashtra", None, 1, 9.0);

        let records = select_for_lead(&l, &[low, high], &mut ledger, &cfg);
        assert_eq!(records[0].partner_id.as_deref(), Some("HIGH"));
    }
}

#[cfg(test)]
mod top_n_tests {
    use super::*;

    #[test]
    fn top_two_assigns_both_winners_in_rank_order() {
        let cfg = MatchConfig {
            max_matches_per_lead: 2,
            ..MatchConfig::default()
        };
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", None);
        // exact_city (10) + recency (5) + performance: 20, 15, and 10.
        let best = partner("BEST", "Pune", "Maharashtra", None, 1, 5.0);
        let second = partner("SECOND", "Pune", "Maharashtra", None, 1, 0.0);
        let third = partner("THIRD", "Pune", "Maharashtra", None, 40, 0.0);

        let records = select_for_lead(&l, &[third, second, best], &mut ledger, &cfg);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].partner_id.as_deref(), Some("BEST"));
        assert_eq!(records[1].partner_id.as_deref(), Some("SECOND"));
        assert!(records
            .iter()
            .all(|r| r.assigned_status == AssignedStatus::Assigned));
        assert_eq!(ledger.current_load("BEST"), 1);
        assert_eq!(ledger.current_load("SECOND"), 1);
        assert_eq!(ledger.current_load("THIRD"), 0);
    }

    #[test]
    fn min_score_floor_applies_after_truncation() {
        let cfg = MatchConfig {
            max_matches_per_lead: 2,
            min_score: 12.0,
            ..MatchConfig::default()
        };
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", None);
        // 15 survives; 10 makes the top two but falls below the floor.
        let strong = partner("STRONG", "Pune", "Maharashtra", None, 1, 0.0);
        let weak = partner("WEAK", "Pune", "Maharashtra", None, 40, 0.0);
        let spare = partner("SPARE", "Pune", "Maharashtra", None, 40, 0.0);

        let records = select_for_lead(&l, &[strong, weak, spare], &mut ledger, &cfg);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].partner_id.as_deref(), Some("STRONG"));
        assert_eq!(records[0].assigned_status, AssignedStatus::Assigned);
        assert_eq!(ledger.current_load("STRONG"), 1);
        assert_eq!(ledger.current_load("WEAK"), 0);
        assert_eq!(ledger.current_load("SPARE"), 0);
    }
}

#[cfg(test)]
mod tier_exclusivity_tests {
    use super::*;

    #[test]
    fn postal_candidate_discards_higher_scoring_city_candidate() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", Some("411001"));
        // pincode_3 (10) + no recency bonus (40 days) = 10
        let postal = partner("POSTAL", "Nashik", "Maharashtra", Some("411999"), 40, 0.0);
        // exact_city (10) + recency (5) = 15, but must be discarded
        let city = partner("CITY", "Pune", "Maharashtra", None, 1, 0.0);

        let records = select_for_lead(&l, &[city, postal], &mut ledger, &cfg);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].partner_id.as_deref(), Some("POSTAL"));
        assert_eq!(records[0].match_type, "pincode_3");
    }

    #[test]
    fn exact_city_discards_higher_scoring_fuzzy_candidate() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Bengalooru", "Karnataka", None);
        // exact_city (10) + no bonus (40 days) = 10
        let exact = partner("EXACT", "Bengalooru", "Karnataka", None, 40, 0.0);
        // fuzzy ~90 (8) + recency (5) = 13, but must be discarded
        let fuzzy = partner("FUZZY", "Bengaluru", "Karnataka", None, 1, 0.0);

        let records = select_for_lead(&l, &[fuzzy, exact], &mut ledger, &cfg);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].partner_id.as_deref(), Some("EXACT"));
        assert_eq!(records[0].match_type, "exact_city");
    }
}

#[cfg(test)]
mod tie_break_tests {
    use super::*;

    #[test]
    fn equal_score_prefers_more_recent_activity() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", None);
        // Both exact_city + fast recency bonus, so equal totals.
        let older = partner("OLDER", "Pune", "Maharashtra", None, 6, 0.0);
        let newer = partner("NEWER", "Pune", "Maharashtra", None, 1, 0.0);

        let records = select_for_lead(&l, &[older, newer], &mut ledger, &cfg);
        assert_eq!(records[0].partner_id.as_deref(), Some("NEWER"));
    }

    #[test]
    fn equal_score_and_recency_prefers_lighter_load() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        ledger.record_assignment("BUSY");
        ledger.record_assignment("BUSY");
        ledger.record_assignment("IDLE");

        let l = lead("L1", "Pune", "Maharashtra", None);
        let busy = partner("BUSY", "Pune", "Maharashtra", None, 1, 0.0);
        let idle = partner("IDLE", "Pune", "Maharashtra", None, 1, 0.0);

        let records = select_for_lead(&l, &[busy, idle], &mut ledger, &cfg);
        assert_eq!(records[0].partner_id.as_deref(), Some("IDLE"));
    }

    #[test]
    fn full_tie_keeps_feed_order() {
        let cfg = MatchConfig::default();
        let mut ledger = CapacityLedger::new(today());
        let l = lead("L1", "Pune", "Maharashtra", None);
        let first = partner("FIRST", "Pune", "Maharashtra", None, 1, 0.0);
        let second = partner("SECOND", "Pune", "Maharashtra", None, 1, 0.0);

        let records = select_for_lead(&l, &[first, second], &mut ledger, &cfg);
        assert_eq!(records[0].partner_id.as_deref(), Some("FIRST"));
    }
}

#[cfg(test)]
mod capacity_tests {
    use super::*;

    #[test]
    fn partner_at_cap_is_excluded_before_scoring() {
        let cfg = MatchConfig {
            daily_posp_cap: 2,
            ..MatchConfig::default()
        };
        let mut ledger = CapacityLedger::new(today());
        ledger.record_assignment("STRONG");
        ledger.record_assignment("STRONG");

        let l = lead("L1", "Pune", "Maharashtra", None);
        // STRONG would win on score, but it is at the cap.
        let strong = partner("STRONG", "Pune", "Maharashtra", None, 1, 10.0);
        let weak = partner("WEAK", "Pune", "Maharashtra", None, 20, 0.0);

        let records = select_for_lead(&l, &[strong, weak], &mut ledger, &cfg);
        assert_eq!(records[0].partner_id.as_deref(), Some("WEAK"));
        assert_eq!(ledger.current_load("STRONG"), 2);
    }

    #[test]
    fn assignments_within_a_run_consume_capacity() {
        let cfg = MatchConfig {
            daily_posp_cap: 2,
            ..MatchConfig::default()
        };
        let mut ledger = CapacityLedger::new(today());
        let partners = vec![partner("P1", "Pune", "Maharashtra", None, 1, 0.0)];

        let mut statuses = Vec::new();
        for i in 0..3 {
            let l = lead(&format!("L{}", i), "Pune", "Maharashtra", None);
            let records = select_for_lead(&l, &partners, &mut ledger, &cfg);
            statuses.push(records[0].assigned_status);
        }
        assert_eq!(
            statuses,
            vec![
                AssignedStatus::Assigned,
                AssignedStatus::Assigned,
                AssignedStatus::NotAssigned
            ]
        );
        assert_eq!(ledger.current_load("P1"), 2);
    }
}
