//! Data models for the AMAX Fit client.
//!
//! - [`Exercise`], [`Workout`], [`Catalog`]: the read-only catalog supplied at startup
//! - [`AppState`], [`View`], [`DailyStats`], [`UserProfile`]: the root application state
//! - [`WorkoutSessionState`]: runtime state of one guided workout session
//! - [`FigureAnimation`], [`FigureCue`]: the one-way cue for the decorative figure
//! - [`Settings`]: application settings loaded from `amaxfit.yaml`
//!
//! # Architecture Note
//!
//! State values are never mutated in place by the rest of the application.
//! The reducers in [`crate::state`] produce replacement snapshots, and the
//! `Arc` wrapped sub-fields are shared between snapshots when unchanged.

pub mod app_state;
pub mod catalog;
pub mod config;
pub mod figure;
pub mod session;

pub use app_state::{AppState, DailyStats, DailyStatsUpdate, UserProfile, View};
pub use catalog::{Catalog, CatalogError, CatalogFile, Difficulty, Exercise, Workout};
pub use self::config::{
    CoachSettings, FinishPolicy, LoggingSettings, SessionSettings, Settings, SettingsError,
    DEFAULT_REST_SECONDS,
};
pub use figure::{FigureAnimation, FigureCue};
pub use session::{CompletedSets, WorkoutSessionState};
