//! Lead → POSP Matching Engine Library
//!
//! This library assigns incoming leads (prospective customers tied to a
//! vehicle registration) to at most one eligible POSP partner, ranking
//! candidates by geographic match tier, activity recency, and performance.
//! Processing is incremental and capacity-capped: a lead is handled exactly
//! once, and no partner receives more than the configured number of
//! assignments per calendar day.
//!
//! # Modules
//!
//! - `capacity`: Per-partner daily load counters with lazy reset.
//! - `config`: Configuration management.
//! - `eligibility`: Partner pool filtering (recency, app install, dedup).
//! - `errors`: Error handling types.
//! - `geo`: Tiered geographic match resolver.
//! - `ledger`: Processed-lead ledger for exactly-once handling.
//! - `models`: Core data models.
//! - `pipeline`: Incremental run controller.
//! - `scoring`: Composite score computation.
//! - `selector`: Capacity-aware assignment selection.
//! - `storage`: CSV adapters and atomic state persistence.

pub mod capacity;
pub mod config;
pub mod eligibility;
pub mod errors;
pub mod geo;
pub mod ledger;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod selector;
pub mod storage;
