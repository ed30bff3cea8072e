use lead_posp_matcher::config::Config;
use lead_posp_matcher::pipeline;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the matcher.
///
/// Initializes tracing, loads configuration from the environment, and runs
/// one full matching pass. The process exits nonzero on configuration or
/// persistence failures; per-row data problems are recovered inside the
/// run and only logged.
fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_posp_matcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let summary = pipeline::run(&config)?;

    tracing::info!(
        "Run finished: {} leads total, {} previously processed, {} new ({} assigned / {} not assigned)",
        summary.total_leads,
        summary.already_processed,
        summary.new_leads,
        summary.assigned,
        summary.not_assigned
    );

    Ok(())
}
