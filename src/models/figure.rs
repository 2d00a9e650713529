use crate::models::catalog::Exercise;
use serde::{Deserialize, Serialize};

/// Animation loop played by the decorative figure next to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureAnimation {
    #[default]
    Idle,
    Squat,
    Pushup,
}

impl FigureAnimation {
    /// Pick the animation that illustrates an exercise.
    pub fn for_exercise(exercise: &Exercise) -> Self {
        let key = format!("{} {}", exercise.id, exercise.name).to_ascii_lowercase();
        if key.contains("squat") {
            FigureAnimation::Squat
        } else if key.contains("push") {
            FigureAnimation::Pushup
        } else {
            FigureAnimation::Idle
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FigureAnimation::Idle => "idle",
            FigureAnimation::Squat => "squat",
            FigureAnimation::Pushup => "pushup",
        }
    }
}

/// One-way cue handed to the figure renderer. Nothing flows back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FigureCue {
    pub animation: FigureAnimation,
    pub paused: bool,
}
