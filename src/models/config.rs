use crate::models::app_state::DailyStats;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default rest period between exercises, in seconds.
pub const DEFAULT_REST_SECONDS: u32 = 45;

/// Seconds added by the "+" control on the rest timer.
pub const DEFAULT_REST_INCREMENT_SECONDS: u32 = 10;

pub const DEFAULT_COACH_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_COACH_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an elite fitness trainer for AMAX Fit. \
You provide short, motivating, and scientifically backed advice on workouts, nutrition, and recovery. \
Keep responses concise (under 100 words) and energetic.";

/// Application settings from `amaxfit.yaml`
///
/// Every section has defaults, so an empty or missing file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionSettings,
    pub coach: CoachSettings,
    pub daily_stats: DailyStats,
    pub logging: LoggingSettings,
}

/// What `FinishWorkout` does to the rest of the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishPolicy {
    /// Only set the finished flag; index, sets and timer stay as last observed.
    #[default]
    KeepProgress,
    /// Set the finished flag and return every other field to its initial value.
    ResetProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub rest_seconds: u32,
    pub rest_increment_seconds: u32,
    /// Upper bound applied by the player when rest time is added
    pub max_rest_seconds: Option<u32>,
    /// Reject set toggles beyond the exercise's declared set count
    pub strict_set_bounds: bool,
    pub finish_policy: FinishPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            rest_seconds: DEFAULT_REST_SECONDS,
            rest_increment_seconds: DEFAULT_REST_INCREMENT_SECONDS,
            max_rest_seconds: None,
            strict_set_bounds: false,
            finish_policy: FinishPolicy::KeepProgress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachSettings {
    pub model: String,
    /// Environment variable holding the API key, read at call time
    pub api_key_env: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub system_instruction: String,
}

impl Default for CoachSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_COACH_MODEL.to_string(),
            api_key_env: "API_KEY".to_string(),
            base_url: DEFAULT_COACH_BASE_URL.to_string(),
            timeout_secs: 30,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: String,
    pub prefix: String,
    pub debug: bool,
    pub console: bool,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            prefix: "amaxfit".to_string(),
            debug: false,
            console: false,
            json: false,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("session.rest_seconds must be greater than zero")]
    ZeroRest,

    #[error("session.max_rest_seconds ({max}) is below session.rest_seconds ({rest})")]
    MaxRestBelowRest { max: u32, rest: u32 },

    #[error("daily_stats.{0} must be greater than zero")]
    NonPositiveGoal(&'static str),

    #[error("coach.timeout_secs must be greater than zero")]
    ZeroTimeout,
}

impl Settings {
    /// Check the invariants the rest of the application relies on.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let session = &self.session;
        if session.rest_seconds == 0 {
            return Err(SettingsError::ZeroRest);
        }
        if let Some(max) = session.max_rest_seconds {
            if max < session.rest_seconds {
                return Err(SettingsError::MaxRestBelowRest {
                    max,
                    rest: session.rest_seconds,
                });
            }
        }

        let stats = &self.daily_stats;
        if stats.steps_goal == 0 {
            return Err(SettingsError::NonPositiveGoal("steps_goal"));
        }
        if stats.calories_goal == 0 {
            return Err(SettingsError::NonPositiveGoal("calories_goal"));
        }
        if !(stats.water_goal > 0.0) {
            return Err(SettingsError::NonPositiveGoal("water_goal"));
        }

        if self.coach.timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.session.rest_seconds, 45);
        assert_eq!(settings.session.rest_increment_seconds, 10);
        assert_eq!(settings.session.finish_policy, FinishPolicy::KeepProgress);
        assert!(!settings.session.strict_set_bounds);
        assert_eq!(settings.coach.model, "gemini-2.5-flash");
        assert_eq!(settings.coach.api_key_env, "API_KEY");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let settings: Settings =
            serde_yaml_ng::from_str("session:\n  rest_seconds: 60\n").unwrap();
        assert_eq!(settings.session.rest_seconds, 60);
        assert_eq!(settings.session.rest_increment_seconds, 10);
        assert_eq!(settings.logging.prefix, "amaxfit");
    }

    #[test]
    fn test_validate_rejects_zero_rest() {
        let mut settings = Settings::default();
        settings.session.rest_seconds = 0;
        assert_eq!(settings.validate(), Err(SettingsError::ZeroRest));
    }

    #[test]
    fn test_validate_rejects_zero_goal() {
        let mut settings = Settings::default();
        settings.daily_stats.water_goal = 0.0;
        assert_eq!(
            settings.validate(),
            Err(SettingsError::NonPositiveGoal("water_goal"))
        );
    }

    #[test]
    fn test_validate_rejects_small_max_rest() {
        let mut settings = Settings::default();
        settings.session.max_rest_seconds = Some(30);
        assert_eq!(
            settings.validate(),
            Err(SettingsError::MaxRestBelowRest { max: 30, rest: 45 })
        );
    }

    #[test]
    fn test_finish_policy_yaml_names() {
        let policy: FinishPolicy = serde_yaml_ng::from_str("reset_progress").unwrap();
        assert_eq!(policy, FinishPolicy::ResetProgress);
    }
}
