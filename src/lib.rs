// AMAX Fit - guided workouts, daily activity tracking and an AI coach
//
// This is the library crate containing the state engine, the workout player
// and the supporting services. The binary crate (main.rs) provides the
// console entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use crate::config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppState, Catalog, Settings, WorkoutSessionState};
pub use state::{AppAction, SessionAction, SessionReducer, StateChange, StateManager, app_reducer};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
