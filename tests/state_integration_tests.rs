//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits state change events on effective mutations only
//! - Supports multiple subscribers
//! - Handles concurrent dispatch from multiple threads
//! - Keeps the navigation, onboarding and stats semantics of the app reducer

use amaxfit::models::{DailyStats, DailyStatsUpdate, Difficulty, UserProfile, View};
use amaxfit::{AppAction, AppState, Catalog, StateChange, StateManager, app_reducer};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::{Duration, timeout};

fn profile(name: &str) -> UserProfile {
    UserProfile {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        goal: "Build muscle".to_string(),
        equipment: BTreeSet::from(["Dumbbells".to_string()]),
        experience: Difficulty::Intermediate,
    }
}

#[tokio::test]
async fn test_state_change_events_emitted() {
    let state = StateManager::new();
    let mut rx = state.subscribe();

    state.complete_onboarding(profile("Alex"));

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");
    assert_eq!(
        event,
        StateChange::ProfileSet {
            name: "Alex".to_string()
        }
    );

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");
    assert_eq!(
        event,
        StateChange::ViewChanged {
            from: View::Onboarding,
            to: View::Dashboard
        }
    );
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = StateManager::new();
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();

    state.navigate(View::Nutrition);

    for rx in [&mut rx1, &mut rx2] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");
        assert!(
            matches!(event, StateChange::ViewChanged { to: View::Nutrition, .. }),
            "Expected ViewChanged event, got: {:?}",
            event
        );
    }
}

#[tokio::test]
async fn test_no_op_emits_nothing() {
    let state = StateManager::new();
    state.navigate(View::Dashboard);
    let version = state.version();
    let mut rx = state.subscribe();

    let changes = state.navigate(View::Dashboard);
    assert!(changes.is_empty());
    assert_eq!(state.version(), version);

    let result = timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(result.is_err(), "No event expected for a no-op dispatch");
}

#[tokio::test]
async fn test_workout_lifecycle_events() {
    let state = StateManager::new();
    let workout = Catalog::builtin().workout("w2").unwrap();

    let changes = state.start_workout(Arc::clone(&workout));
    assert_eq!(
        changes,
        vec![
            StateChange::WorkoutSelected {
                workout_id: "w2".to_string()
            },
            StateChange::ViewChanged {
                from: View::Onboarding,
                to: View::WorkoutPlayer
            },
        ]
    );
    assert_eq!(
        state.read(|s| s.active_workout().map(|w| w.id.clone())),
        Some("w2".to_string())
    );

    let changes = state.exit_workout();
    assert_eq!(changes[0], StateChange::WorkoutCleared);
    assert!(state.read(|s| s.selected_workout.is_none()));
    assert_eq!(state.read(|s| s.current_view), View::Dashboard);
}

#[test]
fn test_stats_merge_keeps_other_fields() {
    let state = StateManager::new();
    let changes = state.update_stats(DailyStatsUpdate::default().calories(2000));

    let stats = state.read(|s| s.daily_stats.clone());
    assert_eq!(stats.steps, 8432);
    assert_eq!(stats.calories, 2000);
    assert_eq!(stats.water, 1.8);
    assert_eq!(changes, vec![StateChange::StatsUpdated(stats)]);
}

#[test]
fn test_seed_and_record_completed() {
    let state = StateManager::new();
    let seed = DailyStats {
        steps: 0,
        calories: 0,
        water: 0.0,
        workouts_completed: 0,
        ..DailyStats::default()
    };
    state.seed_daily_stats(&seed);
    assert_eq!(state.read(|s| s.daily_stats.clone()), seed);

    state.record_workout_completed();
    state.record_workout_completed();
    assert_eq!(state.read(|s| s.daily_stats.workouts_completed), 2);
}

#[test]
fn test_snapshots_are_immutable() {
    let state = StateManager::new();
    let before = state.snapshot();

    state.navigate(View::Progress);

    assert_eq!(before.current_view, View::Onboarding);
    assert_eq!(state.snapshot().current_view, View::Progress);
}

#[test]
fn test_concurrent_dispatch() {
    let state = StateManager::new();
    let mut handles = vec![];

    for i in 0..10 {
        let state = state.clone();
        handles.push(std::thread::spawn(move || {
            state.update_stats(DailyStatsUpdate::default().steps(1000 + i));
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Every update is a distinct value applied under the write lock
    assert_eq!(state.version(), 10);
    let steps = state.read(|s| s.daily_stats.steps);
    assert!((1000..1010).contains(&steps));
}

#[test]
fn test_concurrent_record_workout_completed() {
    let state = StateManager::new();
    let start = state.read(|s| s.daily_stats.workouts_completed);
    let mut handles = vec![];

    for _ in 0..8 {
        let state = state.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..500 {
                state.record_workout_completed();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Every increment is read and written under the same write lock
    assert_eq!(
        state.read(|s| s.daily_stats.workouts_completed),
        start + 8 * 500
    );
    assert_eq!(state.version(), 8 * 500);
}

fn arb_view() -> impl Strategy<Value = View> {
    prop::sample::select(View::ALL.to_vec())
}

fn arb_state() -> impl Strategy<Value = AppState> {
    (arb_view(), any::<bool>(), 0u32..50_000, any::<bool>()).prop_map(
        |(view, onboarded, steps, selected)| AppState {
            current_view: view,
            user_profile: onboarded.then(|| Arc::new(profile("Sam"))),
            daily_stats: DailyStats {
                steps,
                ..DailyStats::default()
            },
            selected_workout: selected.then(|| Catalog::builtin().workout("w1").unwrap()),
        },
    )
}

proptest! {
    #[test]
    fn navigate_only_changes_view(state in arb_state(), view in arb_view()) {
        let state = Arc::new(state);
        let next = app_reducer(&state, AppAction::Navigate(view));

        prop_assert_eq!(next.current_view, view);
        prop_assert_eq!(&next.user_profile, &state.user_profile);
        prop_assert_eq!(&next.daily_stats, &state.daily_stats);
        prop_assert_eq!(&next.selected_workout, &state.selected_workout);
    }

    #[test]
    fn onboarding_always_routes_to_dashboard(state in arb_state()) {
        let state = Arc::new(state);
        let new_profile = Arc::new(profile("Robin"));
        let next = app_reducer(&state, AppAction::SetUserProfile(Arc::clone(&new_profile)));

        prop_assert_eq!(next.current_view, View::Dashboard);
        prop_assert!(next.user_profile.as_ref().is_some_and(|p| Arc::ptr_eq(p, &new_profile)));
    }
}
