use crate::error::{ConfigError, PotionError};
use crate::models::config::AppConfig;
use crate::services::config::ConfigManager;

/// Print the config path and the effective configuration.
///
/// With `write_default`, a missing config file is created from the defaults first.
pub fn show_config(manager: &ConfigManager, config: &AppConfig, write_default: bool) -> Result<(), PotionError> {
    if write_default {
        if write_default_config(manager)? {
            println!("Wrote default configuration");
        } else {
            println!("Config file already exists, leaving it unchanged");
        }
    }

    println!("Config file: {}", manager.config_file_path().display());
    if !manager.config_exists() {
        println!("(not found, showing defaults)");
    }
    let json = serde_json::to_string_pretty(config).map_err(ConfigError::from)?;
    println!("{}", json);
    Ok(())
}

/// Write defaults if no config file exists; returns whether a file was written
fn write_default_config(manager: &ConfigManager) -> Result<bool, ConfigError> {
    if manager.config_exists() {
        return Ok(false);
    }
    manager.save(&AppConfig::default())?;
    Ok(true)
}
