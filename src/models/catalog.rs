use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Category tag that matches every workout in [`Catalog::filter_by_category`].
pub const ALL_CATEGORIES: &str = "All";

static REP_RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+))?\s*$").expect("Invalid rep range regex"));

static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*(s|sec|m|min)?\s*$").expect("Invalid duration regex"));

/// Difficulty tier shared by exercises and the onboarding experience level.
///
/// Catalog files spell tiers capitalised (`Beginner`), onboarding answers
/// arrive lowercase (`beginner`); both deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "beginner")]
    Beginner,
    #[serde(alias = "intermediate")]
    Intermediate,
    #[serde(alias = "advanced")]
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(CatalogError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// A single catalog exercise. Created once when the catalog loads and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Target duration label, e.g. `"60s"`
    pub duration: String,
    /// Rep range label, e.g. `"10-15"`
    pub reps: String,
    pub sets: u32,
    pub difficulty: Difficulty,
    pub muscles: Vec<String>,
    pub equipment: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl Exercise {
    /// Parse the rep label into an inclusive `(min, max)` range.
    ///
    /// `"10-15"` gives `(10, 15)`, `"1"` gives `(1, 1)`. Labels such as
    /// `"AMRAP"` yield `None`.
    pub fn rep_range(&self) -> Option<(u32, u32)> {
        let caps = REP_RANGE_PATTERN.captures(&self.reps)?;
        let min: u32 = caps.get(1)?.as_str().parse().ok()?;
        let max: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => min,
        };
        (min <= max).then_some((min, max))
    }

    /// Parse the duration label into seconds (`"60s"`, `"2m"`, `"45"`).
    pub fn duration_seconds(&self) -> Option<u32> {
        let caps = DURATION_PATTERN.captures(&self.duration)?;
        let value: u32 = caps.get(1)?.as_str().parse().ok()?;
        match caps.get(2).map(|m| m.as_str()) {
            Some("m") | Some("min") => value.checked_mul(60),
            _ => Some(value),
        }
    }

    /// The muscle group shown as the exercise's headline tag.
    pub fn primary_muscle(&self) -> Option<&str> {
        self.muscles.first().map(String::as_str)
    }
}

/// A workout: an ordered, non-empty sequence of exercises.
///
/// Exercise order defines playback order and is never changed at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub title: String,
    /// Duration in minutes
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub calories: u32,
    pub difficulty: String,
    pub category: String,
    pub image: String,
    pub exercises: Vec<Exercise>,
}

impl Workout {
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    /// Total number of sets across every exercise.
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }
}

/// Errors raised while loading or validating a catalog
#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Duplicate exercise id: {0}")]
    DuplicateExercise(String),

    #[error("Duplicate workout id: {0}")]
    DuplicateWorkout(String),

    #[error("Workout {workout} references unknown exercise {exercise}")]
    UnknownExercise { workout: String, exercise: String },

    #[error("Workout {0} has no exercises")]
    EmptyWorkout(String),

    #[error("Exercise {0} must have at least one set")]
    NoSets(String),

    #[error("Exercise {0} must target at least one muscle group")]
    NoMuscles(String),

    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

/// On-disk catalog layout. Workouts list exercise ids instead of embedding records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub workouts: Vec<WorkoutEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: String,
    pub title: String,
    pub duration: u32,
    pub calories: u32,
    pub difficulty: String,
    pub category: String,
    pub image: String,
    pub exercises: Vec<String>,
}

/// Read-only exercise and workout catalog supplied at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    exercises: IndexMap<String, Exercise>,
    workouts: IndexMap<String, Arc<Workout>>,
}

impl Catalog {
    /// Resolve and validate a parsed catalog file.
    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut exercises = IndexMap::new();
        for exercise in file.exercises {
            if exercise.sets == 0 {
                return Err(CatalogError::NoSets(exercise.id));
            }
            if exercise.muscles.is_empty() {
                return Err(CatalogError::NoMuscles(exercise.id));
            }
            if exercises.contains_key(&exercise.id) {
                return Err(CatalogError::DuplicateExercise(exercise.id));
            }
            exercises.insert(exercise.id.clone(), exercise);
        }

        let mut workouts = IndexMap::new();
        for entry in file.workouts {
            if entry.exercises.is_empty() {
                return Err(CatalogError::EmptyWorkout(entry.id));
            }
            if workouts.contains_key(&entry.id) {
                return Err(CatalogError::DuplicateWorkout(entry.id));
            }

            let resolved = entry
                .exercises
                .iter()
                .map(|id| {
                    exercises
                        .get(id)
                        .cloned()
                        .ok_or_else(|| CatalogError::UnknownExercise {
                            workout: entry.id.clone(),
                            exercise: id.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let workout = Workout {
                id: entry.id.clone(),
                title: entry.title,
                duration_minutes: entry.duration,
                calories: entry.calories,
                difficulty: entry.difficulty,
                category: entry.category,
                image: entry.image,
                exercises: resolved,
            };
            workouts.insert(entry.id, Arc::new(workout));
        }

        Ok(Self {
            exercises,
            workouts,
        })
    }

    /// Parse a YAML catalog file and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_yaml_ng::from_str(yaml).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_file(file)
    }

    /// Convert back to the on-disk layout.
    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            exercises: self.exercises.values().cloned().collect(),
            workouts: self
                .workouts
                .values()
                .map(|w| WorkoutEntry {
                    id: w.id.clone(),
                    title: w.title.clone(),
                    duration: w.duration_minutes,
                    calories: w.calories,
                    difficulty: w.difficulty.clone(),
                    category: w.category.clone(),
                    image: w.image.clone(),
                    exercises: w.exercises.iter().map(|e| e.id.clone()).collect(),
                })
                .collect(),
        }
    }

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.get(id)
    }

    pub fn workout(&self, id: &str) -> Option<Arc<Workout>> {
        self.workouts.get(id).cloned()
    }

    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.values()
    }

    pub fn workouts(&self) -> impl Iterator<Item = &Arc<Workout>> {
        self.workouts.values()
    }

    /// The workout featured on the dashboard (first in catalog order).
    pub fn featured(&self) -> Option<Arc<Workout>> {
        self.workouts.values().next().cloned()
    }

    /// `"All"` followed by each distinct workout category in catalog order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for workout in self.workouts.values() {
            if seen.insert(workout.category.as_str()) {
                categories.push(workout.category.clone());
            }
        }
        categories
    }

    /// Workouts in the given category; `"All"` returns every workout.
    pub fn filter_by_category(&self, category: &str) -> Vec<Arc<Workout>> {
        self.workouts
            .values()
            .filter(|w| category == ALL_CATEGORIES || w.category == category)
            .cloned()
            .collect()
    }

    /// The mock catalog shipped with the reference product.
    pub fn builtin() -> Self {
        let pushups = Exercise {
            id: "pushups".to_string(),
            name: "Push-Ups".to_string(),
            category: "Strength".to_string(),
            duration: "60s".to_string(),
            reps: "10-15".to_string(),
            sets: 3,
            difficulty: Difficulty::Beginner,
            muscles: vec!["Chest".to_string(), "Triceps".to_string(), "Core".to_string()],
            equipment: "None".to_string(),
            instructions: vec![
                "Start in a high plank position.".to_string(),
                "Lower your body until chest nearly touches floor.".to_string(),
                "Push back up to starting position.".to_string(),
            ],
            video_url: Some(
                "https://videos.pexels.com/video-files/4761426/4761426-sd_640_360_25fps.mp4"
                    .to_string(),
            ),
        };
        let squats = Exercise {
            id: "squats".to_string(),
            name: "Squats".to_string(),
            category: "Strength".to_string(),
            duration: "60s".to_string(),
            reps: "12-15".to_string(),
            sets: 3,
            difficulty: Difficulty::Beginner,
            muscles: vec![
                "Quads".to_string(),
                "Glutes".to_string(),
                "Hamstrings".to_string(),
            ],
            equipment: "None".to_string(),
            instructions: vec![
                "Stand with feet shoulder-width apart.".to_string(),
                "Lower hips back and down as if sitting in a chair.".to_string(),
                "Keep chest up and back straight.".to_string(),
                "Return to standing position.".to_string(),
            ],
            video_url: Some(
                "https://videos.pexels.com/video-files/4259059/4259059-sd_640_360_25fps.mp4"
                    .to_string(),
            ),
        };
        let plank = Exercise {
            id: "plank".to_string(),
            name: "Plank".to_string(),
            category: "Core".to_string(),
            duration: "45s".to_string(),
            reps: "1".to_string(),
            sets: 3,
            difficulty: Difficulty::Intermediate,
            muscles: vec!["Core".to_string(), "Shoulders".to_string()],
            equipment: "None".to_string(),
            instructions: vec![
                "Start on forearms and toes.".to_string(),
                "Keep body in straight line from head to heels.".to_string(),
                "Hold position engaging core muscles.".to_string(),
            ],
            video_url: Some(
                "https://videos.pexels.com/video-files/3076127/3076127-sd_640_360_25fps.mp4"
                    .to_string(),
            ),
        };

        let entry = |id: &str,
                     title: &str,
                     duration: u32,
                     calories: u32,
                     difficulty: &str,
                     category: &str,
                     image: &str,
                     exercises: &[&str]| WorkoutEntry {
            id: id.to_string(),
            title: title.to_string(),
            duration,
            calories,
            difficulty: difficulty.to_string(),
            category: category.to_string(),
            image: image.to_string(),
            exercises: exercises.iter().map(|s| s.to_string()).collect(),
        };

        let file = CatalogFile {
            exercises: vec![pushups, squats, plank],
            workouts: vec![
                entry(
                    "w1",
                    "Upper Body Strength",
                    45,
                    382,
                    "Advanced",
                    "Strength",
                    "https://images.unsplash.com/photo-1581009146145-b5ef050c2e1e",
                    &["pushups", "plank"],
                ),
                entry(
                    "w2",
                    "HIIT Cardio Blast",
                    20,
                    250,
                    "Intermediate",
                    "Cardio",
                    "https://images.unsplash.com/photo-1601422407692-ec4eeec1d9b3",
                    &["squats", "pushups"],
                ),
                entry(
                    "w3",
                    "Leg Day Power",
                    40,
                    410,
                    "Advanced",
                    "Strength",
                    "https://images.unsplash.com/photo-1434608519344-49d77a699ded",
                    &["squats"],
                ),
                entry(
                    "w4",
                    "Yoga Flow",
                    30,
                    180,
                    "Beginner",
                    "Flexibility",
                    "https://images.unsplash.com/photo-1544367563-12123d895951",
                    &["plank"],
                ),
            ],
        };

        // The built-in data is static and always satisfies validation
        Self::from_file(file).unwrap_or_default()
    }
}
