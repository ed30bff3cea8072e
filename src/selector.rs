//! Capacity-aware assignment selection for a single lead.
//!
//! Candidates are gated on capacity before scoring, grouped by tier
//! exclusivity, ranked, truncated to the configured match count, and
//! filtered against the minimum score. Winners increment the capacity
//! ledger immediately so later leads in the same run see the load.

use crate::capacity::CapacityLedger;
use crate::config::MatchConfig;
use crate::geo;
use crate::models::{AssignmentRecord, Candidate, GeoTier, Lead, Partner};
use crate::scoring;
use std::cmp::Ordering;

/// Produces the assignment records for one lead: one `assigned` row per
/// surviving candidate, or exactly one `not_assigned` row.
pub fn select_for_lead(
    lead: &Lead,
    partners: &[Partner],
    ledger: &mut CapacityLedger,
    cfg: &MatchConfig,
) -> Vec<AssignmentRecord> {
    let today = ledger.today();
    let mut candidates: Vec<Candidate> = Vec::new();

    for partner in partners {
        // Partners at the daily cap are excluded before scoring, exactly
        // like geo-ineligible partners.
        let load = ledger.current_load(&partner.partner_id);
        if load >= cfg.daily_posp_cap {
            continue;
        }

        let geo_match = match geo::resolve(
            lead.pincode.as_deref(),
            &lead.city,
            &lead.state,
            partner.pincode.as_deref(),
            &partner.city,
            &partner.state,
            cfg,
        ) {
            Some(m) => m,
            None => continue,
        };

        let days_since_last = scoring::days_since_activity(partner.last_activity_date, today);
        let total_score = scoring::compose(
            geo_match.base_score,
            scoring::recency_bonus(days_since_last, cfg),
            partner.performance_score,
            cfg,
        );

        candidates.push(Candidate {
            partner_id: partner.partner_id.clone(),
            partner_name: partner.partner_name.clone(),
            partner_city: partner.city.clone(),
            partner_state: partner.state.clone(),
            partner_pincode: partner.pincode.clone(),
            tier: geo_match.tier,
            similarity: geo_match.similarity,
            total_score,
            last_activity_date: partner.last_activity_date,
            days_since_last,
            performance_score: partner.performance_score,
            load_at_scoring: load,
        });
    }

    // Tier exclusivity at the lead level: any postal candidate discards all
    // non-postal candidates; failing that, exact city discards fuzzy.
    if candidates.iter().any(|c| c.tier.is_pincode()) {
        candidates.retain(|c| c.tier.is_pincode());
    } else if candidates.iter().any(|c| c.tier == GeoTier::ExactCity) {
        candidates.retain(|c| c.tier == GeoTier::ExactCity);
    }

    // Highest score first, then most recent activity, then lightest load.
    // The sort is stable, so full ties keep feed order for reproducibility.
    candidates.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.last_activity_date.cmp(&a.last_activity_date))
            .then_with(|| a.load_at_scoring.cmp(&b.load_at_scoring))
    });

    candidates.truncate(cfg.max_matches_per_lead);
    candidates.retain(|c| c.total_score >= cfg.min_score);

    if candidates.is_empty() {
        tracing::debug!("lead {} has no qualifying partner", lead.lead_key);
        return vec![AssignmentRecord::not_assigned(lead)];
    }

    candidates
        .into_iter()
        .map(|candidate| {
            ledger.record_assignment(&candidate.partner_id);
            tracing::debug!(
                "lead {} -> partner {} ({}, score {:.1})",
                lead.lead_key,
                candidate.partner_id,
                candidate.tier.as_str(),
                candidate.total_score
            );
            AssignmentRecord::assigned(lead, &candidate)
        })
        .collect()
}
