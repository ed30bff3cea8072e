//! Tiered geographic match resolver.
//!
//! Classifies a (lead, partner) pair into the strongest applicable tier:
//! postal-prefix tiers first, then exact city, then fuzzy city. A postal
//! match bypasses the state gate entirely; everything else requires the
//! states to match case-insensitively, since state is a hard operational
//! boundary rather than a soft preference.

use crate::config::MatchConfig;
use crate::models::{GeoMatch, GeoTier};

/// Returns the 6-digit pincode with non-digit characters discarded, or
/// `None` when the remaining digits are not exactly 6.
pub fn normalize_pincode(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 6 {
        Some(digits)
    } else {
        None
    }
}

/// City-name similarity as a percentage in [0, 100].
pub fn city_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b) * 100.0
}

/// Resolves the best applicable geo tier for a (lead, partner) pair.
///
/// Evaluation is strict priority order: once a tier matches, lower tiers
/// are not considered. Returns `None` when the pair is geographically
/// ineligible (state mismatch, or city similarity below 50).
pub fn resolve(
    lead_pincode: Option<&str>,
    lead_city: &str,
    lead_state: &str,
    partner_pincode: Option<&str>,
    partner_city: &str,
    partner_state: &str,
    cfg: &MatchConfig,
) -> Option<GeoMatch> {
    // Postal tiers apply only when both sides normalize to 6 digits.
    if let (Some(lp), Some(pp)) = (
        lead_pincode.and_then(normalize_pincode),
        partner_pincode.and_then(normalize_pincode),
    ) {
        if lp == pp {
            return Some(GeoMatch {
                tier: GeoTier::PincodeExact,
                base_score: cfg.pincode_exact_base,
                similarity: 100.0,
            });
        }
        if lp[..5] == pp[..5] {
            return Some(GeoMatch {
                tier: GeoTier::Pincode5,
                base_score: cfg.pincode_5_base,
                similarity: 100.0,
            });
        }
        if lp[..3] == pp[..3] {
            return Some(GeoMatch {
                tier: GeoTier::Pincode3,
                base_score: cfg.pincode_3_base,
                similarity: 100.0,
            });
        }
        // Unrelated pincodes fall through to the city/state tiers.
    }

    // State gate: hard exclusion, never a penalty.
    let lead_state = lead_state.trim().to_lowercase();
    let partner_state = partner_state.trim().to_lowercase();
    if lead_state.is_empty() || partner_state.is_empty() || lead_state != partner_state {
        return None;
    }

    let lc = lead_city.trim().to_lowercase();
    let pc = partner_city.trim().to_lowercase();
    if !lc.is_empty() && lc == pc {
        return Some(GeoMatch {
            tier: GeoTier::ExactCity,
            base_score: cfg.exact_city_base,
            similarity: 100.0,
        });
    }

    let ratio = city_similarity(lead_city, partner_city);
    if ratio < 50.0 {
        return None;
    }
    let base_score = if ratio >= 90.0 {
        cfg.fuzzy_city_90
    } else if ratio >= 70.0 {
        cfg.fuzzy_city_70
    } else {
        cfg.fuzzy_city_50
    };
    Some(GeoMatch {
        tier: GeoTier::FuzzyCity,
        base_score,
        similarity: ratio,
    })
}
