// State management module
//
// This module provides the application reducer and the StateManager, which owns
// the single root AppState snapshot, funnels every mutation through the reducer
// and emits change events for the front end.

pub mod session;

pub use session::{SessionAction, SessionReducer, SessionRules};

use crate::models::{AppState, DailyStats, DailyStatsUpdate, UserProfile, View, Workout};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Intents dispatched to the application reducer
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Show another top-level view
    Navigate(View),

    /// Onboarding finished; always routes to the dashboard
    SetUserProfile(Arc<UserProfile>),

    /// Select a workout and open the player
    StartWorkout(Arc<Workout>),

    /// Leave the player and return to the dashboard
    ExitWorkout,

    /// Shallow-merge the supplied stats fields
    UpdateStats(DailyStatsUpdate),
}

/// Compute the next application snapshot.
///
/// Pure and total. When the action changes nothing the same `Arc` is
/// returned, so `Arc::ptr_eq(&old, &new)` means "nothing changed".
pub fn app_reducer(state: &Arc<AppState>, action: AppAction) -> Arc<AppState> {
    let next = match action {
        AppAction::Navigate(view) => AppState {
            current_view: view,
            ..(**state).clone()
        },
        AppAction::SetUserProfile(profile) => AppState {
            user_profile: Some(profile),
            current_view: View::Dashboard,
            ..(**state).clone()
        },
        AppAction::StartWorkout(workout) => AppState {
            selected_workout: Some(workout),
            current_view: View::WorkoutPlayer,
            ..(**state).clone()
        },
        AppAction::ExitWorkout => AppState {
            selected_workout: None,
            current_view: View::Dashboard,
            ..(**state).clone()
        },
        AppAction::UpdateStats(update) => AppState {
            daily_stats: state.daily_stats.merged(&update),
            ..(**state).clone()
        },
    };

    if next == **state {
        Arc::clone(state)
    } else {
        Arc::new(next)
    }
}

/// Change events emitted when the application state is replaced
///
/// These events let the front end react to transitions without polling.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The visible view changed
    ViewChanged { from: View, to: View },

    /// Onboarding completed and a profile was stored
    ProfileSet { name: String },

    /// A workout was selected for the player
    WorkoutSelected { workout_id: String },

    /// The selected workout was cleared
    WorkoutCleared,

    /// Daily stats were merged
    StatsUpdated(DailyStats),
}

/// Owner of the root [`AppState`] snapshot
///
/// This is the single writer of application state:
/// - [`dispatch()`](Self::dispatch) runs [`app_reducer`] and swaps in the new snapshot
/// - [`snapshot()`](Self::snapshot) hands out the current immutable snapshot
/// - [`version()`](Self::version) increases once per effective change
/// - [`subscribe()`](Self::subscribe) listens to [`StateChange`] events
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`crate::ui::ConsoleApp`]: Primary consumer of state events
pub struct StateManager {
    /// Current snapshot and its version
    state: Arc<RwLock<Versioned>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

struct Versioned {
    snapshot: Arc<AppState>,
    version: u64,
}

impl StateManager {
    /// Create a new StateManager with the initial application state
    ///
    /// The broadcast channel buffers 100 events.
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(Versioned {
                snapshot: Arc::new(state),
                version: 0,
            })),
            state_tx,
        }
    }

    /// The current immutable snapshot
    pub fn snapshot(&self) -> Arc<AppState> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.snapshot)
    }

    /// Number of effective changes applied so far
    pub fn version(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let view = state_manager.read(|state| state.current_view);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard.snapshot)
    }

    /// Apply an action and emit change events
    ///
    /// This is the only way to modify application state. It:
    /// 1. Runs the reducer against the current snapshot
    /// 2. Returns early if the reducer reported no change
    /// 3. Swaps in the new snapshot and bumps the version
    /// 4. Emits the detected events
    ///
    /// # Returns
    /// The StateChange events that were emitted (empty for a no-op)
    pub fn dispatch(&self, action: AppAction) -> Vec<StateChange> {
        self.dispatch_with(|_| action)
    }

    /// Build the action from the current snapshot and apply it under the
    /// same write lock, so read-modify-write updates cannot interleave
    fn dispatch_with<F>(&self, build: F) -> Vec<StateChange>
    where
        F: FnOnce(&AppState) -> AppAction,
    {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old = Arc::clone(&guard.snapshot);
        let action = build(&*old);

        tracing::debug!("Dispatching {:?}", action);
        let new = app_reducer(&old, action);
        if Arc::ptr_eq(&old, &new) {
            return Vec::new();
        }

        guard.snapshot = Arc::clone(&new);
        guard.version += 1;

        let changes = Self::detect_changes(&old, &new);
        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two snapshots and generate events
    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.user_profile != new.user_profile {
            if let Some(profile) = &new.user_profile {
                changes.push(StateChange::ProfileSet {
                    name: profile.name.clone(),
                });
            }
        }

        if old.selected_workout != new.selected_workout {
            match &new.selected_workout {
                Some(workout) => changes.push(StateChange::WorkoutSelected {
                    workout_id: workout.id.clone(),
                }),
                None => changes.push(StateChange::WorkoutCleared),
            }
        }

        if old.current_view != new.current_view {
            changes.push(StateChange::ViewChanged {
                from: old.current_view,
                to: new.current_view,
            });
        }

        if old.daily_stats != new.daily_stats {
            changes.push(StateChange::StatsUpdated(new.daily_stats.clone()));
        }

        changes
    }

    // Convenience methods for common transitions

    pub fn navigate(&self, view: View) -> Vec<StateChange> {
        self.dispatch(AppAction::Navigate(view))
    }

    /// Store the onboarding profile (routes to the dashboard)
    pub fn complete_onboarding(&self, profile: UserProfile) -> Vec<StateChange> {
        tracing::info!("Onboarding complete for {}", profile.name);
        self.dispatch(AppAction::SetUserProfile(Arc::new(profile)))
    }

    /// Select a workout and open the player
    pub fn start_workout(&self, workout: Arc<Workout>) -> Vec<StateChange> {
        tracing::info!("Starting workout {} ({})", workout.id, workout.title);
        self.dispatch(AppAction::StartWorkout(workout))
    }

    pub fn exit_workout(&self) -> Vec<StateChange> {
        self.dispatch(AppAction::ExitWorkout)
    }

    pub fn update_stats(&self, update: DailyStatsUpdate) -> Vec<StateChange> {
        self.dispatch(AppAction::UpdateStats(update))
    }

    /// Replace every stats field with the given values
    ///
    /// Used at startup to load the configured stats into the store.
    pub fn seed_daily_stats(&self, stats: &DailyStats) -> Vec<StateChange> {
        self.update_stats(DailyStatsUpdate {
            steps: Some(stats.steps),
            steps_goal: Some(stats.steps_goal),
            calories: Some(stats.calories),
            calories_goal: Some(stats.calories_goal),
            water: Some(stats.water),
            water_goal: Some(stats.water_goal),
            workouts_completed: Some(stats.workouts_completed),
        })
    }

    /// Count one more completed workout for today
    pub fn record_workout_completed(&self) -> Vec<StateChange> {
        self.dispatch_with(|s| {
            let completed = s.daily_stats.workouts_completed.saturating_add(1);
            AppAction::UpdateStats(DailyStatsUpdate::default().workouts_completed(completed))
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across tasks
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
