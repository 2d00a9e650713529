//! AMAX Fit - guided workouts, daily activity tracking and an AI coach
//!
//! Main entry point for the console application.
//!
//! # Overview
//!
//! This binary crate provides the console front end for AMAX Fit. It initializes:
//! - Configuration loading ([`ConfigManager`]: settings and workout catalog)
//! - Logging infrastructure (daily file rotation, optional console output)
//! - Tokio async runtime (rest timer schedules, coach requests, video probes)
//! - State management ([`StateManager`], seeded with the configured daily stats)
//! - Console front end ([`ConsoleApp`] - reads commands from stdin)
//!
//! # Execution Flow
//!
//! 1. Load `amaxfit.yaml` (plus `AMAXFIT__*` overrides) and `catalog.yaml` from `AMAX Fit Data/`
//! 2. Initialize logging → `AMAX Fit Data/logs/amaxfit.<date>`
//! 3. Create tokio runtime with 4 worker threads
//! 4. Create StateManager and seed today's stats
//! 5. Build the coach advisor (Gemini, key read from `API_KEY` at call time)
//! 6. Run the console loop until `quit` or end of input
//! 7. Log the metrics summary and shut down the runtime with a 5s timeout
//!
//! # Configuration Files
//!
//! Expected in `AMAX Fit Data/` directory (both optional):
//! - `amaxfit.yaml`: session rules, coach endpoint, stats seed, logging
//! - `catalog.yaml`: exercises and workouts (built-in catalog when absent)

use amaxfit::services::{AdviceProvider, GeminiAdvisor, OfflineAdvisor};
use amaxfit::ui::ConsoleApp;
use amaxfit::{APP_NAME, ConfigManager, Metrics, StateManager, VERSION};
use anyhow::Result;
use camino::Utf8Path;
use std::sync::Arc;

/// Data directory holding settings, catalog and logs
const DATA_DIR: &str = "AMAX Fit Data";

/// Main entry point for the AMAX Fit console application
///
/// # Errors
///
/// This function can fail if:
/// - The data directory cannot be created
/// - `amaxfit.yaml` or `catalog.yaml` is invalid
/// - Logging initialization fails (disk space, permissions)
/// - Tokio runtime creation fails (system resources)
/// - Reading console input fails
fn main() -> Result<()> {
    let config_manager = ConfigManager::new(DATA_DIR)?;
    let mut settings = config_manager.load_settings()?;

    // Relative log directories live inside the data directory
    if Utf8Path::new(&settings.logging.dir).is_relative() {
        settings.logging.dir = config_manager
            .config_dir()
            .join(&settings.logging.dir)
            .into_string();
    }
    let _guard = amaxfit::logging::setup_logging(&settings.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let catalog = Arc::new(config_manager.load_catalog()?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("amaxfit-worker")
        .build()?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 4);

    let state_manager = StateManager::new();
    state_manager.seed_daily_stats(&settings.daily_stats);
    tracing::info!("State manager initialized");

    let metrics = Arc::new(Metrics::new());

    let provider: Arc<dyn AdviceProvider> = match GeminiAdvisor::new(&settings.coach) {
        Ok(advisor) => Arc::new(advisor),
        Err(e) => {
            tracing::warn!("Coach client unavailable, answers will use fallback text: {}", e);
            Arc::new(OfflineAdvisor)
        }
    };

    let app = ConsoleApp::new(
        state_manager,
        catalog,
        &settings,
        provider,
        Arc::clone(&metrics),
    );

    let result = runtime.block_on(app.run());

    tracing::info!("Console closed, shutting down");
    metrics.log_summary();

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.inspect_err(|e| tracing::error!("Console error: {:#}", e))
}
