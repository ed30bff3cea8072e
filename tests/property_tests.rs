/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use chrono::{Duration, NaiveDate};
use lead_posp_matcher::capacity::CapacityLedger;
use lead_posp_matcher::config::MatchConfig;
use lead_posp_matcher::geo::{city_similarity, normalize_pincode, resolve};
use lead_posp_matcher::models::{AssignedStatus, CapacityCounter, Lead, Partner};
use lead_posp_matcher::selector::select_for_lead;
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

// Property: pincode normalization never panics and only ever yields
// exactly 6 digits
proptest! {
    #[test]
    fn normalize_pincode_never_panics(raw in "\\PC*") {
        let _ = normalize_pincode(&raw);
    }

    #[test]
    fn normalized_pincode_is_always_six_digits(raw in "\\PC*") {
        if let Some(pin) = normalize_pincode(&raw) {
            prop_assert_eq!(pin.len(), 6);
            prop_assert!(pin.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn six_digit_inputs_always_normalize(digits in "[0-9]{6}") {
        prop_assert_eq!(normalize_pincode(&digits), Some(digits));
    }
}

// Property: similarity is a bounded, symmetric percentage
proptest! {
    #[test]
    fn similarity_is_bounded(a in "\\PC*", b in "\\PC*") {
        let r = city_similarity(&a, &b);
        prop_assert!((0.0..=100.0).contains(&r));
    }

    #[test]
    fn similarity_is_symmetric(a in "[a-z ]{0,20}", b in "[a-z ]{0,20}") {
        let lhs = city_similarity(&a, &b);
        let rhs = city_similarity(&b, &a);
        prop_assert!((lhs - rhs).abs() < 1e-9);
    }
}

// Property: differing non-blank states with no postal match are excluded
// no matter how similar the cities are
proptest! {
    #[test]
    fn state_mismatch_excludes_pair(
        city in "[a-z]{1,12}",
        state_a in "[a-z]{3,10}",
        state_b in "[a-z]{3,10}",
    ) {
        prop_assume!(state_a != state_b);
        let cfg = MatchConfig::default();
        // Identical city names: the strongest possible city signal.
        let m = resolve(None, &city, &state_a, None, &city, &state_b, &cfg);
        prop_assert!(m.is_none());
    }
}

// Property: a counter carried over from another date always reads as 0,
// regardless of its stored count
proptest! {
    #[test]
    fn stale_counter_always_reads_zero(count in 0u32..10_000, days_old in 1i64..400) {
        let counters = vec![CapacityCounter {
            partner_id: "P1".to_string(),
            assigned_count_today: count,
            last_reset_date: today() - Duration::days(days_old),
        }];
        let mut ledger = CapacityLedger::from_counters(counters, today());
        prop_assert_eq!(ledger.current_load("P1"), 0);
    }
}

// Property: across any number of leads, a partner's daily count never
// exceeds the configured cap
proptest! {
    #[test]
    fn partner_never_exceeds_daily_cap(num_leads in 1usize..40, cap in 1u32..10) {
        let cfg = MatchConfig {
            daily_posp_cap: cap,
            ..MatchConfig::default()
        };
        let partners = vec![Partner {
            partner_id: "P1".to_string(),
            partner_name: "Partner P1".to_string(),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: None,
            last_activity_date: Some(today() - Duration::days(1)),
            app_installed: Some(true),
            performance_score: 0.0,
        }];
        let mut ledger = CapacityLedger::new(today());

        let mut assigned = 0usize;
        for i in 0..num_leads {
            let lead = Lead {
                lead_id: format!("L{}", i),
                registration_no: format!("REG{}", i),
                city: "Pune".to_string(),
                state: "Maharashtra".to_string(),
                pincode: None,
                lead_key: format!("L{}_REG{}", i, i),
            };
            let records = select_for_lead(&lead, &partners, &mut ledger, &cfg);
            prop_assert_eq!(records.len(), 1);
            if records[0].assigned_status == AssignedStatus::Assigned {
                assigned += 1;
            }
        }

        prop_assert_eq!(assigned, num_leads.min(cap as usize));
        prop_assert!(ledger.current_load("P1") <= cap);
    }
}
