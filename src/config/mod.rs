use crate::models::{Catalog, Settings};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ::config::{Config, Environment, File, FileFormat, Map};
use std::fs;

/// Prefix of environment variables that override `amaxfit.yaml`,
/// e.g. `AMAXFIT__SESSION__REST_SECONDS=60`.
pub const ENV_PREFIX: &str = "AMAXFIT";

const ENV_SEPARATOR: &str = "__";

/// Configuration manager for loading and saving the data directory files.
///
/// Manages two files:
/// - Settings (`amaxfit.yaml`): session rules, coach endpoint, stats seed, logging
/// - Catalog (`catalog.yaml`): exercises and workouts offered by the app
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    catalog_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified data directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "AMAX Fit Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join("amaxfit.yaml"),
            catalog_path: config_dir.join("catalog.yaml"),
            config_dir,
        })
    }

    /// Load settings from `amaxfit.yaml` layered under `AMAXFIT__*` variables.
    ///
    /// A missing file yields defaults. The result is validated before it is
    /// returned.
    pub fn load_settings(&self) -> Result<Settings> {
        self.load_settings_with_env(None)
    }

    /// Same as [`load_settings`](Self::load_settings) but reads overrides from
    /// `env` instead of the process environment when given.
    pub fn load_settings_with_env(
        &self,
        env: Option<Map<String, String>>,
    ) -> Result<Settings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings: Settings = Config::builder()
            .add_source(
                File::from(self.settings_path.as_std_path())
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save the settings file.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load the catalog file.
    ///
    /// # Returns
    /// The validated catalog, or the built-in catalog if the file doesn't exist
    pub fn load_catalog(&self) -> Result<Catalog> {
        if !self.catalog_path.exists() {
            tracing::warn!(
                "Catalog file not found at {}, using built-in catalog",
                self.catalog_path
            );
            return Ok(Catalog::builtin());
        }

        let file_contents = fs::read_to_string(&self.catalog_path)
            .with_context(|| format!("Failed to read catalog: {}", self.catalog_path))?;

        let catalog = Catalog::from_yaml_str(&file_contents)
            .with_context(|| format!("Failed to load catalog: {}", self.catalog_path))?;

        tracing::info!(
            "Loaded catalog from {} ({} exercises, {} workouts)",
            self.catalog_path,
            catalog.exercises().count(),
            catalog.workouts().count()
        );
        Ok(catalog)
    }

    /// Save the catalog file.
    pub fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(&catalog.to_file())
            .context("Failed to serialize catalog to YAML")?;

        fs::write(&self.catalog_path, yaml_string)
            .with_context(|| format!("Failed to write catalog: {}", self.catalog_path))?;

        tracing::info!("Saved catalog to {}", self.catalog_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn catalog_path(&self) -> &Utf8Path {
        &self.catalog_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FinishPolicy;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    fn no_env() -> Option<Map<String, String>> {
        Some(Map::new())
    }

    #[test]
    fn test_create_config_manager() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.settings_path().ends_with("amaxfit.yaml"));
        assert!(manager.catalog_path().ends_with("catalog.yaml"));
    }

    #[test]
    fn test_missing_settings_use_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        let settings = manager.load_settings_with_env(no_env()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_save_settings() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut settings = Settings::default();
        settings.session.rest_seconds = 60;
        settings.session.finish_policy = FinishPolicy::ResetProgress;
        settings.coach.model = "gemini-test".to_string();
        manager.save_settings(&settings).unwrap();

        let loaded = manager.load_settings_with_env(no_env()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_settings_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(
            manager.settings_path(),
            "session:\n  rest_seconds: 30\ndaily_stats:\n  steps: 100\n",
        )
        .unwrap();

        let settings = manager.load_settings_with_env(no_env()).unwrap();
        assert_eq!(settings.session.rest_seconds, 30);
        assert_eq!(settings.session.rest_increment_seconds, 10);
        assert_eq!(settings.daily_stats.steps, 100);
        assert_eq!(settings.daily_stats.steps_goal, 10000);
    }

    #[test]
    fn test_environment_overrides_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.settings_path(), "session:\n  rest_seconds: 30\n").unwrap();

        let mut env = Map::new();
        env.insert("AMAXFIT__SESSION__REST_SECONDS".to_string(), "90".to_string());
        env.insert(
            "AMAXFIT__SESSION__STRICT_SET_BOUNDS".to_string(),
            "true".to_string(),
        );

        let settings = manager.load_settings_with_env(Some(env)).unwrap();
        assert_eq!(settings.session.rest_seconds, 90);
        assert!(settings.session.strict_set_bounds);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.settings_path(), "session:\n  rest_seconds: 0\n").unwrap();

        let err = manager.load_settings_with_env(no_env()).unwrap_err();
        assert!(format!("{:#}", err).contains("rest_seconds must be greater than zero"));
    }

    #[test]
    fn test_missing_catalog_uses_builtin() {
        let (manager, _temp_dir) = create_test_config_manager();
        let catalog = manager.load_catalog().unwrap();
        assert_eq!(catalog.workouts().count(), 4);
    }

    #[test]
    fn test_load_save_catalog() {
        let (manager, _temp_dir) = create_test_config_manager();
        let catalog = Catalog::builtin();
        manager.save_catalog(&catalog).unwrap();

        let loaded = manager.load_catalog().unwrap();
        assert_eq!(
            loaded.workout("w1").unwrap().exercises,
            catalog.workout("w1").unwrap().exercises
        );
    }

    #[test]
    fn test_invalid_catalog_is_an_error() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(
            manager.catalog_path(),
            "exercises: []\nworkouts:\n  - id: w9\n    title: Ghost\n    duration: 5\n    calories: 10\n    difficulty: Easy\n    category: Core\n    image: ''\n    exercises: [nope]\n",
        )
        .unwrap();

        assert!(manager.load_catalog().is_err());
    }
}
