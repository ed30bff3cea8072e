use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Scoring and selection tunables. Every field has a default and an
/// environment override; weights shift ranking directly since the composite
/// score is additive and unnormalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Base score for an exact 6-digit pincode match.
    pub pincode_exact_base: f64,
    /// Base score for a 5-digit pincode prefix match.
    pub pincode_5_base: f64,
    /// Base score for a 3-digit pincode prefix match.
    pub pincode_3_base: f64,
    /// Base score for an exact city match.
    pub exact_city_base: f64,
    /// Base score for fuzzy city similarity >= 90.
    pub fuzzy_city_90: f64,
    /// Base score for fuzzy city similarity >= 70.
    pub fuzzy_city_70: f64,
    /// Base score for fuzzy city similarity >= 50.
    pub fuzzy_city_50: f64,
    /// Recency bonus when the partner was active within `recency_fast_days`.
    pub recency_fast_bonus: f64,
    /// Recency bonus when active within `recency_slow_days`.
    pub recency_slow_bonus: f64,
    /// Days-since-activity threshold for the fast bonus.
    pub recency_fast_days: i64,
    /// Days-since-activity threshold for the slow bonus.
    pub recency_slow_days: i64,
    /// Multiplier applied to the partner performance score.
    pub performance_weight: f64,
    /// Minimum composite score required to assign a lead.
    pub min_score: f64,
    /// Partners inactive for longer than this many days are excluded.
    pub active_days_window: i64,
    /// Maximum leads a partner may receive per calendar day.
    pub daily_posp_cap: u32,
    /// Maximum partners assigned to a single lead.
    pub max_matches_per_lead: usize,
}

impl MatchConfig {
    /// Rejects configurations that would silently break matching: zero
    /// caps, inverted recency bands, and non-finite score inputs (a NaN
    /// weight would poison every composite score).
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.daily_posp_cap == 0 {
            anyhow::bail!("DAILY_POSP_CAP must be at least 1");
        }
        if self.max_matches_per_lead == 0 {
            anyhow::bail!("MAX_MATCHES_PER_LEAD must be at least 1");
        }
        if self.active_days_window < 1 {
            anyhow::bail!("ACTIVE_DAYS_WINDOW must be at least 1 day");
        }
        if self.recency_fast_days > self.recency_slow_days {
            anyhow::bail!("RECENCY_FAST_DAYS cannot exceed RECENCY_SLOW_DAYS");
        }
        for (name, value) in [
            ("PINCODE_EXACT_BASE", self.pincode_exact_base),
            ("PINCODE_5_BASE", self.pincode_5_base),
            ("PINCODE_3_BASE", self.pincode_3_base),
            ("EXACT_CITY_BASE", self.exact_city_base),
            ("FUZZY_CITY_90", self.fuzzy_city_90),
            ("FUZZY_CITY_70", self.fuzzy_city_70),
            ("FUZZY_CITY_50", self.fuzzy_city_50),
            ("RECENCY_FAST_BONUS", self.recency_fast_bonus),
            ("RECENCY_SLOW_BONUS", self.recency_slow_bonus),
            ("PERFORMANCE_WEIGHT", self.performance_weight),
            ("MIN_SCORE", self.min_score),
        ] {
            if !value.is_finite() {
                anyhow::bail!("{} must be a finite number", name);
            }
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            pincode_exact_base: 18.0,
            pincode_5_base: 14.0,
            pincode_3_base: 10.0,
            exact_city_base: 10.0,
            fuzzy_city_90: 8.0,
            fuzzy_city_70: 5.0,
            fuzzy_city_50: 3.0,
            recency_fast_bonus: 5.0,
            recency_slow_bonus: 3.0,
            recency_fast_days: 7,
            recency_slow_days: 30,
            performance_weight: 1.0,
            min_score: 8.0,
            active_days_window: 30,
            daily_posp_cap: 15,
            max_matches_per_lead: 1,
        }
    }
}

/// Full run configuration: input/output paths plus scoring tunables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Lead feed CSV.
    pub leads_file: PathBuf,
    /// Partner (POSP) feed CSV.
    pub partners_file: PathBuf,
    /// Append-only assignment output CSV.
    pub matches_file: PathBuf,
    /// Processed-lead ledger CSV.
    pub leads_master_file: PathBuf,
    /// Per-partner daily load snapshot CSV.
    pub posp_load_file: PathBuf,
    pub matching: MatchConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = MatchConfig::default();
        let matching = MatchConfig {
            pincode_exact_base: env_f64("PINCODE_EXACT_BASE", defaults.pincode_exact_base)?,
            pincode_5_base: env_f64("PINCODE_5_BASE", defaults.pincode_5_base)?,
            pincode_3_base: env_f64("PINCODE_3_BASE", defaults.pincode_3_base)?,
            exact_city_base: env_f64("EXACT_CITY_BASE", defaults.exact_city_base)?,
            fuzzy_city_90: env_f64("FUZZY_CITY_90", defaults.fuzzy_city_90)?,
            fuzzy_city_70: env_f64("FUZZY_CITY_70", defaults.fuzzy_city_70)?,
            fuzzy_city_50: env_f64("FUZZY_CITY_50", defaults.fuzzy_city_50)?,
            recency_fast_bonus: env_f64("RECENCY_FAST_BONUS", defaults.recency_fast_bonus)?,
            recency_slow_bonus: env_f64("RECENCY_SLOW_BONUS", defaults.recency_slow_bonus)?,
            recency_fast_days: env_i64("RECENCY_FAST_DAYS", defaults.recency_fast_days)?,
            recency_slow_days: env_i64("RECENCY_SLOW_DAYS", defaults.recency_slow_days)?,
            performance_weight: env_f64("PERFORMANCE_WEIGHT", defaults.performance_weight)?,
            min_score: env_f64("MIN_SCORE", defaults.min_score)?,
            active_days_window: env_i64("ACTIVE_DAYS_WINDOW", defaults.active_days_window)?,
            daily_posp_cap: env_u32("DAILY_POSP_CAP", defaults.daily_posp_cap)?,
            max_matches_per_lead: env_usize(
                "MAX_MATCHES_PER_LEAD",
                defaults.max_matches_per_lead,
            )?,
        };

        matching.validate()?;

        let config = Self {
            leads_file: env_path("LEADS_FILE", "leads.csv"),
            partners_file: env_path("POSP_FILE", "posp.csv"),
            matches_file: env_path("MATCHES_FILE", "lead_posp_matches.csv"),
            leads_master_file: env_path("LEADS_MASTER_FILE", "leads_master.csv"),
            posp_load_file: env_path("POSP_LOAD_FILE", "posp_load.csv"),
            matching,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Leads file: {}", config.leads_file.display());
        tracing::debug!("Partner file: {}", config.partners_file.display());
        tracing::debug!(
            "min_score={}, daily_posp_cap={}, active_days_window={}",
            config.matching.min_score,
            config.matching.daily_posp_cap,
            config.matching.active_days_window
        );

        Ok(config)
    }
}


fn env_path(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn env_f64(name: &str, default: f64) -> anyhow::Result<f64> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", name, raw)),
        _ => Ok(default),
    }
}

fn env_i64(name: &str, default: i64) -> anyhow::Result<i64> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid integer, got '{}'", name, raw)),
        _ => Ok(default),
    }
}

fn env_u32(name: &str, default: u32) -> anyhow::Result<u32> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| {
                anyhow::anyhow!("{} must be a non-negative integer, got '{}'", name, raw)
            }),
        _ => Ok(default),
    }
}

fn env_usize(name: &str, default: usize) -> anyhow::Result<usize> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| {
                anyhow::anyhow!("{} must be a non-negative integer, got '{}'", name, raw)
            }),
        _ => Ok(default),
    }
}
