// Workout session reducer
//
// Pure transition function for the guided workout player. The reducer never
// fails: guarded transitions whose precondition does not hold return the
// input snapshot unchanged (same Arc), which callers use to detect no-ops.

use crate::models::{CompletedSets, FinishPolicy, SessionSettings, WorkoutSessionState};
use std::sync::Arc;

/// Intents dispatched to the session reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Move to the next exercise; no-op on the last one
    NextExercise { total_exercises: usize },

    /// Move to the previous exercise; no-op on the first one.
    /// Unlike `NextExercise` this keeps the current timer value.
    PrevExercise,

    TogglePause,

    /// Replace the rest timer value
    SetTimer(u32),

    /// One-second countdown step, floored at zero. Only the timer driver sends this.
    TickTimer,

    /// Flip membership of `set_index` in the completed sets of `exercise_index`
    ToggleSet {
        exercise_index: usize,
        set_index: usize,
    },

    FinishWorkout,
}

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRules {
    pub rest_seconds: u32,
    pub rest_increment_seconds: u32,
    pub max_rest_seconds: Option<u32>,
    pub strict_set_bounds: bool,
    pub finish_policy: FinishPolicy,
}

/// Defaults match the reference product: 45 s rest, unchecked sets, progress kept on finish.
impl Default for SessionRules {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

impl From<&SessionSettings> for SessionRules {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            rest_seconds: settings.rest_seconds,
            rest_increment_seconds: settings.rest_increment_seconds,
            max_rest_seconds: settings.max_rest_seconds,
            strict_set_bounds: settings.strict_set_bounds,
            finish_policy: settings.finish_policy,
        }
    }
}

/// Reducer for [`WorkoutSessionState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionReducer {
    rules: SessionRules,
}

impl SessionReducer {
    pub fn new(rules: SessionRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    /// Snapshot a freshly started session begins from.
    pub fn initial_state(&self) -> Arc<WorkoutSessionState> {
        Arc::new(WorkoutSessionState::new(self.rules.rest_seconds))
    }

    /// Compute the next snapshot.
    ///
    /// Returns the same `Arc` when nothing changes.
    pub fn reduce(
        &self,
        state: &Arc<WorkoutSessionState>,
        action: SessionAction,
    ) -> Arc<WorkoutSessionState> {
        match action {
            SessionAction::NextExercise { total_exercises } => {
                if state.current_exercise_index + 1 < total_exercises {
                    Arc::new(WorkoutSessionState {
                        current_exercise_index: state.current_exercise_index + 1,
                        timer: self.rules.rest_seconds,
                        is_paused: false,
                        ..(**state).clone()
                    })
                } else {
                    Arc::clone(state)
                }
            }
            SessionAction::PrevExercise => {
                if state.current_exercise_index > 0 {
                    Arc::new(WorkoutSessionState {
                        current_exercise_index: state.current_exercise_index - 1,
                        is_paused: false,
                        ..(**state).clone()
                    })
                } else {
                    Arc::clone(state)
                }
            }
            SessionAction::TogglePause => Arc::new(WorkoutSessionState {
                is_paused: !state.is_paused,
                ..(**state).clone()
            }),
            SessionAction::SetTimer(seconds) => Arc::new(WorkoutSessionState {
                timer: seconds,
                ..(**state).clone()
            }),
            SessionAction::TickTimer => {
                if state.timer == 0 {
                    Arc::clone(state)
                } else {
                    Arc::new(WorkoutSessionState {
                        timer: state.timer - 1,
                        ..(**state).clone()
                    })
                }
            }
            SessionAction::ToggleSet {
                exercise_index,
                set_index,
            } => {
                let mut completed: CompletedSets = (*state.completed_sets).clone();
                let sets = completed.entry(exercise_index).or_default();
                if let Some(pos) = sets.iter().position(|&s| s == set_index) {
                    sets.remove(pos);
                    // Keep the map free of empty entries so a double toggle restores it exactly
                    if sets.is_empty() {
                        completed.remove(&exercise_index);
                    }
                } else {
                    sets.push(set_index);
                }
                Arc::new(WorkoutSessionState {
                    completed_sets: Arc::new(completed),
                    ..(**state).clone()
                })
            }
            SessionAction::FinishWorkout => match self.rules.finish_policy {
                FinishPolicy::KeepProgress => Arc::new(WorkoutSessionState {
                    is_finished: true,
                    ..(**state).clone()
                }),
                FinishPolicy::ResetProgress => Arc::new(WorkoutSessionState {
                    is_finished: true,
                    ..WorkoutSessionState::new(self.rules.rest_seconds)
                }),
            },
        }
    }
}
