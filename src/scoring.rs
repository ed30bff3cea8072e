//! Composite score computation.
//!
//! `total = geo_base + recency_bonus + performance_score * performance_weight`
//!
//! The score is purely additive and unbounded above; no normalization, so
//! configuration weights shift ranking predictably.

use crate::config::MatchConfig;
use chrono::NaiveDate;

/// Sentinel for partners with no parseable activity date. Far outside any
/// recency band, so such partners earn no bonus.
pub const UNKNOWN_ACTIVITY_DAYS: i64 = 999;

/// Days elapsed since the partner's last recorded activity.
pub fn days_since_activity(last_activity: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match last_activity {
        Some(d) => (today - d).num_days(),
        None => UNKNOWN_ACTIVITY_DAYS,
    }
}

/// Recency bonus for a partner active `days` ago.
pub fn recency_bonus(days: i64, cfg: &MatchConfig) -> f64 {
    if days <= cfg.recency_fast_days {
        cfg.recency_fast_bonus
    } else if days <= cfg.recency_slow_days {
        cfg.recency_slow_bonus
    } else {
        0.0
    }
}

/// Combines the three ranking signals into the composite score.
pub fn compose(geo_base: f64, recency: f64, performance_score: f64, cfg: &MatchConfig) -> f64 {
    geo_base + recency + performance_score * cfg.performance_weight
}
