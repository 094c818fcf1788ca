pub mod config;
pub mod run;
pub mod scan;
pub mod templates;

use crate::error::PotionError;
use crate::models::config::AppConfig;
use crate::services::config::ConfigManager;
use crate::services::template_store::TemplateStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Automatic flask usage driven by screen sampling")]
pub struct Cli {
    /// Settings directory holding the config file and templates
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the sampling loop until Ctrl-C
    Run {
        /// Do not wait for the game window to be focused
        #[arg(long)]
        no_focus: bool,
        /// Log key presses instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Classify every slot once and print the result
    Scan,
    /// Create the per-slot template directories
    InitTemplates,
    /// Capture a slot and store it as a template
    CaptureTemplate {
        /// Slot number (1-based)
        #[arg(long)]
        slot: usize,
        #[arg(long)]
        name: String,
        #[arg(long)]
        kind: String,
        /// Store under the depleted set instead of the occupied one
        #[arg(long)]
        depleted: bool,
    },
    /// Capture a slot's progress-bar region while no effect is running
    CaptureProgress {
        /// Slot number (1-based)
        #[arg(long)]
        slot: usize,
    },
    /// Print the config path and contents
    Config {
        /// Write the default configuration if no file exists yet
        #[arg(long)]
        write_default: bool,
    },
}

impl Cli {
    pub fn config_manager(&self) -> Result<ConfigManager, PotionError> {
        match &self.settings {
            Some(dir) => Ok(ConfigManager::with_dir(dir)),
            None => Ok(ConfigManager::new()?),
        }
    }
}

/// Dispatch a parsed command
pub async fn execute(command: Command, manager: ConfigManager, config: AppConfig) -> Result<(), PotionError> {
    match command {
        Command::Run { no_focus, dry_run } => run::run(&manager, config, no_focus, dry_run).await,
        Command::Scan => scan::scan(&manager, config),
        Command::InitTemplates => templates::init_templates(&manager, &config),
        Command::CaptureTemplate {
            slot,
            name,
            kind,
            depleted,
        } => templates::capture_template(&manager, &config, slot, &name, &kind, depleted),
        Command::CaptureProgress { slot } => templates::capture_progress_template(&manager, &config, slot),
        Command::Config { write_default } => config::show_config(&manager, &config, write_default),
    }
}

/// Template store rooted at the configured directories
pub(crate) fn load_templates(manager: &ConfigManager, config: &AppConfig) -> TemplateStore {
    TemplateStore::load(
        manager.resolve(&config.templates.template_root),
        manager.resolve(&config.templates.progress_template_dir),
        config.slots.slot_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from(["potion-manager", "--debug", "run", "--dry-run"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Command::Run {
                no_focus: false,
                dry_run: true
            }
        ));
    }

    #[test]
    fn test_parse_capture_template() {
        let cli = Cli::try_parse_from([
            "potion-manager",
            "capture-template",
            "--slot",
            "3",
            "--name",
            "Large Mana Flask",
            "--kind",
            "mana",
            "--settings",
            "/tmp/pm",
        ])
        .unwrap();

        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/pm")));
        match cli.command {
            Command::CaptureTemplate {
                slot,
                name,
                kind,
                depleted,
            } => {
                assert_eq!(slot, 3);
                assert_eq!(name, "Large Mana Flask");
                assert_eq!(kind, "mana");
                assert!(!depleted);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_capture_progress() {
        let cli = Cli::try_parse_from(["potion-manager", "capture-progress", "--slot", "2"]).unwrap();
        assert!(matches!(cli.command, Command::CaptureProgress { slot: 2 }));
        assert!(Cli::try_parse_from(["potion-manager", "capture-progress"]).is_err());
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["potion-manager"]).is_err());
    }
}
