// Guided workout player
//
// Owns one session: the session snapshot, the reducer and the rest-timer
// driver. Every path that changes the running condition reconciles the timer,
// and dropping the player cancels it.

use crate::metrics::Metrics;
use crate::models::{Exercise, FigureAnimation, FigureCue, Workout, WorkoutSessionState};
use crate::services::timer::{RestTimer, TimerTick};
use crate::state::{SessionAction, SessionReducer, SessionRules};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Remaining rest below which the timer is shown as a warning
pub const REST_WARNING_SECONDS: u32 = 10;

#[derive(Error, Debug, PartialEq)]
pub enum PlayerError {
    #[error("Workout {0} has no exercises")]
    EmptyWorkout(String),

    #[error("Set {set} is out of range, exercise has {sets} sets")]
    SetOutOfRange { set: usize, sets: u32 },
}

/// Result of pressing the primary "next" control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStep {
    /// Moved to the following exercise
    Advanced,
    /// The last exercise was completed and the session is finished
    Finished,
}

/// Runtime owner of a guided workout session
///
/// Must be created and driven from within a tokio runtime.
pub struct WorkoutPlayer {
    workout: Arc<Workout>,
    reducer: SessionReducer,
    state: Arc<WorkoutSessionState>,
    timer: RestTimer,
    ticks: mpsc::Receiver<TimerTick>,
    metrics: Arc<Metrics>,
}

impl WorkoutPlayer {
    pub fn new(
        workout: Arc<Workout>,
        rules: SessionRules,
        metrics: Arc<Metrics>,
    ) -> Result<Self, PlayerError> {
        if workout.exercises.is_empty() {
            return Err(PlayerError::EmptyWorkout(workout.id.clone()));
        }

        let reducer = SessionReducer::new(rules);
        let state = reducer.initial_state();
        let (timer, ticks) = RestTimer::channel();

        let mut player = Self {
            workout,
            reducer,
            state,
            timer,
            ticks,
            metrics,
        };
        player.timer.reconcile(player.state.timer_running());

        tracing::info!(
            "Player opened for {} ({} exercises)",
            player.workout.id,
            player.workout.exercise_count()
        );
        Ok(player)
    }

    pub fn workout(&self) -> &Arc<Workout> {
        &self.workout
    }

    pub fn state(&self) -> &Arc<WorkoutSessionState> {
        &self.state
    }

    pub fn rules(&self) -> &SessionRules {
        self.reducer.rules()
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Apply an action and reconcile the rest timer
    ///
    /// Returns false when the reducer reported a no-op.
    pub fn dispatch(&mut self, action: SessionAction) -> bool {
        let next = self.reducer.reduce(&self.state, action);
        if Arc::ptr_eq(&next, &self.state) {
            tracing::trace!("Session action {:?} was a no-op", action);
            return false;
        }

        self.state = next;
        self.timer.reconcile(self.state.timer_running());
        true
    }

    /// Exercise at the current index
    pub fn current_exercise(&self) -> &Exercise {
        // The reducer keeps the index inside the (non-empty) exercise list
        &self.workout.exercises[self.state.current_exercise_index]
    }

    pub fn is_last_exercise(&self) -> bool {
        self.state.current_exercise_index + 1 == self.workout.exercise_count()
    }

    /// Header label such as `"1 / 2"`
    pub fn progress_label(&self) -> String {
        format!(
            "{} / {}",
            self.state.current_exercise_index + 1,
            self.workout.exercise_count()
        )
    }

    /// True while the rest timer is in its final seconds
    pub fn rest_warning(&self) -> bool {
        self.state.timer > 0 && self.state.timer < REST_WARNING_SECONDS
    }

    pub fn figure_cue(&self) -> FigureCue {
        FigureCue {
            animation: FigureAnimation::for_exercise(self.current_exercise()),
            paused: self.state.is_paused,
        }
    }

    /// Primary control: next exercise, or finish on the last one
    pub fn advance(&mut self) -> PlayerStep {
        if self.is_last_exercise() {
            self.finish_workout();
            PlayerStep::Finished
        } else {
            self.dispatch(SessionAction::NextExercise {
                total_exercises: self.workout.exercise_count(),
            });
            self.metrics.record_exercise_advanced();
            PlayerStep::Advanced
        }
    }

    /// Mark the session finished, wherever it currently is
    pub fn finish_workout(&mut self) {
        if self.state.is_finished {
            return;
        }
        self.dispatch(SessionAction::FinishWorkout);
        self.metrics.record_workout_finished();
        tracing::info!(
            "Workout {} finished with {} sets completed",
            self.workout.id,
            self.state.completed_set_count()
        );
    }

    pub fn previous(&mut self) -> bool {
        self.dispatch(SessionAction::PrevExercise)
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.dispatch(SessionAction::TogglePause)
    }

    /// Add the configured increment to the rest timer
    ///
    /// Clamped to `max_rest_seconds` when one is configured.
    pub fn add_rest(&mut self) -> u32 {
        let rules = *self.reducer.rules();
        let mut target = self.state.timer.saturating_add(rules.rest_increment_seconds);
        if let Some(max) = rules.max_rest_seconds {
            target = target.min(max);
        }
        self.dispatch(SessionAction::SetTimer(target));
        self.state.timer
    }

    /// Toggle a set of the current exercise
    ///
    /// With strict set bounds, indices past the declared set count are
    /// rejected; otherwise they pass through unchecked.
    pub fn toggle_set(&mut self, set_index: usize) -> Result<bool, PlayerError> {
        let sets = self.current_exercise().sets;
        if self.reducer.rules().strict_set_bounds && set_index >= sets as usize {
            return Err(PlayerError::SetOutOfRange {
                set: set_index,
                sets,
            });
        }

        self.dispatch(SessionAction::ToggleSet {
            exercise_index: self.state.current_exercise_index,
            set_index,
        });
        self.metrics.record_set_toggled();
        Ok(self.state.is_set_completed(self.state.current_exercise_index, set_index))
    }

    /// Wait for the next live countdown tick and apply it
    ///
    /// Returns the remaining seconds. Ticks from cancelled schedules are
    /// discarded. Stays pending while no schedule is running, so it can sit
    /// in a `select!` loop.
    pub async fn next_tick(&mut self) -> Option<u32> {
        loop {
            let tick = self.ticks.recv().await?;
            if self.timer.accepts(tick) {
                self.dispatch(SessionAction::TickTimer);
                self.metrics.record_tick();
                if self.state.timer == 0 {
                    tracing::debug!("Rest period over");
                }
                return Some(self.state.timer);
            }
            self.metrics.record_stale_tick();
        }
    }

    /// End the session and hand back the final snapshot
    pub fn finish(mut self) -> Arc<WorkoutSessionState> {
        self.timer.cancel();
        tracing::info!("Player closed for {}", self.workout.id);
        Arc::clone(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Catalog;
    use std::sync::atomic::Ordering;

    fn player(workout_id: &str, rules: SessionRules) -> WorkoutPlayer {
        let workout = Catalog::builtin().workout(workout_id).unwrap();
        WorkoutPlayer::new(workout, rules, Arc::new(Metrics::new())).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_workout_rejected() {
        let mut workout = (*Catalog::builtin().workout("w1").unwrap()).clone();
        workout.exercises.clear();

        let result = WorkoutPlayer::new(
            Arc::new(workout),
            SessionRules::default(),
            Arc::new(Metrics::new()),
        );
        assert_eq!(result.err(), Some(PlayerError::EmptyWorkout("w1".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_starts_with_session() {
        let player = player("w1", SessionRules::default());
        assert!(player.timer_running());
        assert_eq!(player.state().timer, 45);
        assert_eq!(player.progress_label(), "1 / 2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_advance_then_finish() {
        let mut player = player("w1", SessionRules::default());

        assert_eq!(player.advance(), PlayerStep::Advanced);
        assert!(player.is_last_exercise());
        assert_eq!(player.current_exercise().id, "plank");

        assert_eq!(player.advance(), PlayerStep::Finished);
        assert!(player.state().is_finished);
        assert_eq!(player.metrics.workouts_finished.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_timer() {
        let mut player = player("w1", SessionRules::default());
        player.toggle_pause();
        assert!(!player.timer_running());

        player.toggle_pause();
        assert!(player.timer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_rest_respects_max() {
        let mut player = player(
            "w1",
            SessionRules {
                max_rest_seconds: Some(50),
                ..SessionRules::default()
            },
        );
        assert_eq!(player.add_rest(), 50);
        assert_eq!(player.add_rest(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_rest_restarts_finished_timer() {
        let mut player = player("w3", SessionRules::default());
        player.dispatch(SessionAction::SetTimer(0));
        assert!(!player.timer_running());

        assert_eq!(player.add_rest(), 10);
        assert!(player.timer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_set_strict_bounds() {
        let mut strict = player(
            "w1",
            SessionRules {
                strict_set_bounds: true,
                ..SessionRules::default()
            },
        );
        assert_eq!(
            strict.toggle_set(3),
            Err(PlayerError::SetOutOfRange { set: 3, sets: 3 })
        );
        assert_eq!(strict.toggle_set(2), Ok(true));
        assert_eq!(strict.toggle_set(2), Ok(false));

        let mut lenient = player("w1", SessionRules::default());
        assert_eq!(lenient.toggle_set(7), Ok(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_tick_counts_down() {
        let mut player = player("w1", SessionRules::default());
        assert_eq!(player.next_tick().await, Some(44));
        assert_eq!(player.next_tick().await, Some(43));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_stops_at_zero() {
        let mut player = player("w1", SessionRules::default());
        player.dispatch(SessionAction::SetTimer(2));

        assert_eq!(player.next_tick().await, Some(1));
        assert_eq!(player.next_tick().await, Some(0));
        assert!(!player.timer_running());
        assert!(!player.rest_warning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_figure_cue_follows_exercise_and_pause() {
        let mut player = player("w2", SessionRules::default());
        assert_eq!(
            player.figure_cue(),
            FigureCue {
                animation: FigureAnimation::Squat,
                paused: false
            }
        );

        player.toggle_pause();
        player.advance();
        let cue = player.figure_cue();
        assert_eq!(cue.animation, FigureAnimation::Pushup);
        assert!(!cue.paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_cancels_timer() {
        let player = player("w1", SessionRules::default());
        let state = player.finish();
        assert_eq!(state.timer, 45);
    }
}
