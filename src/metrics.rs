// Session metrics module
//
// Lightweight counters for what happened during a run of the client

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide usage counters
///
/// Uses atomic operations so the player, the coach chat and the console loop
/// can share one instance without locks. Logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Countdown ticks applied to a session
    pub ticks_applied: AtomicU64,

    /// Ticks discarded because their schedule had been cancelled
    pub stale_ticks_dropped: AtomicU64,

    /// Set toggles accepted by the player
    pub sets_toggled: AtomicU64,

    /// Moves to the next exercise
    pub exercises_advanced: AtomicU64,

    /// Sessions that reached FinishWorkout
    pub workouts_finished: AtomicU64,

    /// Advice requests sent to the coach provider
    pub coach_requests: AtomicU64,

    /// Advice requests answered with the fallback text
    pub coach_failures: AtomicU64,

    /// Application state changes applied by the console
    pub state_updates: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks_applied: AtomicU64::new(0),
            stale_ticks_dropped: AtomicU64::new(0),
            sets_toggled: AtomicU64::new(0),
            exercises_advanced: AtomicU64::new(0),
            workouts_finished: AtomicU64::new(0),
            coach_requests: AtomicU64::new(0),
            coach_failures: AtomicU64::new(0),
            state_updates: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_tick(&self) {
        self.ticks_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_tick(&self) {
        self.stale_ticks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set_toggled(&self) {
        self.sets_toggled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exercise_advanced(&self) {
        self.exercises_advanced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_workout_finished(&self) {
        self.workouts_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coach_request(&self) {
        self.coach_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coach_failure(&self) {
        self.coach_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch of application state changes
    pub fn record_state_updates(&self, count: usize) {
        self.state_updates.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of coach requests that fell back to canned text
    pub fn coach_failure_rate(&self) -> f64 {
        let requests = self.coach_requests.load(Ordering::Relaxed);
        let failures = self.coach_failures.load(Ordering::Relaxed);
        if requests > 0 {
            failures as f64 / requests as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Workouts finished: {}, exercises advanced: {}, sets toggled: {}",
            self.workouts_finished.load(Ordering::Relaxed),
            self.exercises_advanced.load(Ordering::Relaxed),
            self.sets_toggled.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Timer ticks: {} applied, {} stale dropped",
            self.ticks_applied.load(Ordering::Relaxed),
            self.stale_ticks_dropped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Coach requests: {} ({:.0}% fell back)",
            self.coach_requests.load(Ordering::Relaxed),
            self.coach_failure_rate() * 100.0
        );
        tracing::info!(
            "State updates: {}",
            self.state_updates.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.ticks_applied.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.coach_requests.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_session_counters() {
        let metrics = Metrics::new();

        metrics.record_tick();
        metrics.record_tick();
        metrics.record_stale_tick();
        metrics.record_set_toggled();
        metrics.record_exercise_advanced();
        metrics.record_workout_finished();
        metrics.record_state_updates(3);

        assert_eq!(metrics.ticks_applied.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.stale_ticks_dropped.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.sets_toggled.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.exercises_advanced.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.workouts_finished.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.state_updates.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_coach_failure_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.coach_failure_rate(), 0.0);

        metrics.record_coach_request();
        metrics.record_coach_request();
        metrics.record_coach_failure();
        assert_eq!(metrics.coach_failure_rate(), 0.5);
    }
}
