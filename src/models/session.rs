use std::collections::BTreeMap;
use std::sync::Arc;

/// Completed set indices per exercise index.
///
/// Sparse: an exercise that has not been touched has no entry. Set indices
/// keep the order in which they were marked.
pub type CompletedSets = BTreeMap<usize, Vec<usize>>;

/// Runtime state of one guided workout session.
///
/// Created fresh when a workout starts and discarded on exit. Replaced
/// wholesale by [`crate::state::SessionReducer`]; `completed_sets` sits
/// behind an `Arc` so transitions that do not touch it share the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutSessionState {
    pub current_exercise_index: usize,
    pub is_paused: bool,
    /// Rest-timer seconds remaining
    pub timer: u32,
    pub completed_sets: Arc<CompletedSets>,
    pub is_finished: bool,
}

impl WorkoutSessionState {
    /// A session at the first exercise with a full rest timer.
    pub fn new(rest_seconds: u32) -> Self {
        Self {
            current_exercise_index: 0,
            is_paused: false,
            timer: rest_seconds,
            completed_sets: Arc::new(CompletedSets::new()),
            is_finished: false,
        }
    }

    /// Completed sets for an exercise; empty when the exercise has no entry.
    pub fn completed_sets_for(&self, exercise_index: usize) -> &[usize] {
        self.completed_sets
            .get(&exercise_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_set_completed(&self, exercise_index: usize, set_index: usize) -> bool {
        self.completed_sets_for(exercise_index).contains(&set_index)
    }

    /// Total completed sets across all exercises.
    pub fn completed_set_count(&self) -> usize {
        self.completed_sets.values().map(Vec::len).sum()
    }

    /// Whether the rest timer should be ticking.
    pub fn timer_running(&self) -> bool {
        !self.is_paused && self.timer > 0
    }
}
