use crate::error::ConfigError;
use crate::models::config::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "potion_manager_config.json";

/// Configuration manager for app settings
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager rooted at `<config_dir>/potion-manager`.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("potion-manager");

        fs::create_dir_all(&config_dir)?;

        Ok(Self::with_dir(config_dir))
    }

    /// Manager rooted at an explicit settings directory
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        Self {
            config_dir,
            config_path,
        }
    }

    /// Save configuration to disk as pretty JSON
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir)?;
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, json)?;
        Ok(())
    }

    /// Load configuration from disk
    ///
    /// If config file doesn't exist, returns default configuration
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)?;
        let config: AppConfig = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Resolve a configured path: relative paths are taken from the settings directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::Region;
    use crate::testing::temp_dir;

    fn create_test_manager() -> ConfigManager {
        // save() creates the directory itself
        ConfigManager::with_dir(temp_dir("config").join("settings"))
    }

    #[test]
    fn test_config_path() {
        let manager = create_test_manager();
        assert!(manager.config_file_path().ends_with("settings/potion_manager_config.json"));
        assert!(!manager.config_exists());
    }

    #[test]
    fn test_load_without_file_gives_defaults() {
        let manager = create_test_manager();
        assert_eq!(manager.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let manager = create_test_manager();
        let mut config = AppConfig::default();
        config.regions.slot_regions = vec![Some(Region::new(1, 2, 3, 4)), None];
        config.timing.mana_potion_delay_ms = 2500;
        config.debug = true;

        manager.save(&config).unwrap();
        assert!(manager.config_exists());
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn test_load_corrupted_file() {
        let manager = create_test_manager();
        fs::create_dir_all(manager.config_dir()).unwrap();
        fs::write(manager.config_file_path(), "{ invalid json }").unwrap();

        assert!(matches!(manager.load(), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_resolve_relative_paths() {
        let manager = ConfigManager::with_dir("/tmp/settings");
        assert_eq!(
            manager.resolve(Path::new("templates")),
            PathBuf::from("/tmp/settings/templates")
        );
        assert_eq!(manager.resolve(Path::new("/abs/t")), PathBuf::from("/abs/t"));
    }
}
