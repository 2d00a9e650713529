use crate::models::catalog::{Difficulty, Workout};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Top-level screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Onboarding,
    Dashboard,
    Workouts,
    WorkoutPlayer,
    ExerciseDetail,
    Nutrition,
    Progress,
    Settings,
    AiChat,
}

impl View {
    /// Every declared view tag.
    pub const ALL: [View; 9] = [
        View::Onboarding,
        View::Dashboard,
        View::Workouts,
        View::WorkoutPlayer,
        View::ExerciseDetail,
        View::Nutrition,
        View::Progress,
        View::Settings,
        View::AiChat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Onboarding => "onboarding",
            View::Dashboard => "dashboard",
            View::Workouts => "workouts",
            View::WorkoutPlayer => "workout-player",
            View::ExerciseDetail => "exercise-detail",
            View::Nutrition => "nutrition",
            View::Progress => "progress",
            View::Settings => "settings",
            View::AiChat => "ai-chat",
        }
    }

    /// Views rendered full screen, outside the tab layout.
    pub fn is_full_screen(&self) -> bool {
        matches!(self, View::Onboarding | View::WorkoutPlayer)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "player" => Ok(View::WorkoutPlayer),
            "chat" | "coach" => Ok(View::AiChat),
            "exercise" => Ok(View::ExerciseDetail),
            other => View::ALL
                .iter()
                .copied()
                .find(|v| v.as_str() == other)
                .ok_or_else(|| format!("unknown view: {}", s)),
        }
    }
}

/// Daily activity aggregates shown on the dashboard rings.
///
/// Goals are expected to be strictly positive; the progress helpers return
/// `0.0` rather than dividing by a non-positive goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyStats {
    pub steps: u32,
    pub steps_goal: u32,
    pub calories: u32,
    pub calories_goal: u32,
    /// Liters
    pub water: f64,
    pub water_goal: f64,
    pub workouts_completed: u32,
}

impl Default for DailyStats {
    fn default() -> Self {
        Self {
            steps: 8432,
            steps_goal: 10000,
            calories: 1845,
            calories_goal: 2500,
            water: 1.8,
            water_goal: 3.0,
            workouts_completed: 12,
        }
    }
}

fn ring_fraction(value: f64, goal: f64) -> f64 {
    if goal <= 0.0 || !goal.is_finite() {
        return 0.0;
    }
    (value / goal).clamp(0.0, 1.0)
}

impl DailyStats {
    pub fn steps_progress(&self) -> f64 {
        ring_fraction(self.steps as f64, self.steps_goal as f64)
    }

    pub fn calories_progress(&self) -> f64 {
        ring_fraction(self.calories as f64, self.calories_goal as f64)
    }

    pub fn water_progress(&self) -> f64 {
        ring_fraction(self.water, self.water_goal)
    }

    /// Shallow-merge the supplied fields; unspecified fields keep their value.
    pub fn merged(&self, update: &DailyStatsUpdate) -> DailyStats {
        DailyStats {
            steps: update.steps.unwrap_or(self.steps),
            steps_goal: update.steps_goal.unwrap_or(self.steps_goal),
            calories: update.calories.unwrap_or(self.calories),
            calories_goal: update.calories_goal.unwrap_or(self.calories_goal),
            water: update.water.unwrap_or(self.water),
            water_goal: update.water_goal.unwrap_or(self.water_goal),
            workouts_completed: update.workouts_completed.unwrap_or(self.workouts_completed),
        }
    }
}

/// Partial [`DailyStats`]: any subset of fields to replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStatsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_goal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_goal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_goal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workouts_completed: Option<u32>,
}

impl DailyStatsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn calories(mut self, calories: u32) -> Self {
        self.calories = Some(calories);
        self
    }

    pub fn water(mut self, liters: f64) -> Self {
        self.water = Some(liters);
        self
    }

    pub fn workouts_completed(mut self, count: u32) -> Self {
        self.workouts_completed = Some(count);
        self
    }
}

/// Profile collected by the onboarding flow. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub goal: String,
    pub equipment: BTreeSet<String>,
    pub experience: Difficulty,
}

/// Root application state. One instance for the life of the client.
///
/// Snapshots are replaced wholesale by [`crate::state::app_reducer`]; the
/// `Arc` fields let unchanged sub-values be shared between snapshots.
///
/// Invariant: `selected_workout` is set whenever `current_view` is
/// [`View::WorkoutPlayer`] after a `StartWorkout`, and cleared on exit.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub current_view: View,
    pub user_profile: Option<Arc<UserProfile>>,
    pub daily_stats: DailyStats,
    pub selected_workout: Option<Arc<Workout>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_view: View::Onboarding,
            user_profile: None,
            daily_stats: DailyStats::default(),
            selected_workout: None,
        }
    }
}

impl AppState {
    pub fn is_onboarded(&self) -> bool {
        self.user_profile.is_some()
    }

    /// The workout the player should render, if the player view is active.
    pub fn active_workout(&self) -> Option<&Arc<Workout>> {
        match self.current_view {
            View::WorkoutPlayer => self.selected_workout.as_ref(),
            _ => None,
        }
    }
}
