use crate::error::PotionError;
use crate::models::config::AppConfig;
use crate::services::clock::SystemClock;
use crate::services::config::ConfigManager;
use crate::services::focus::{AlwaysFocused, FocusOracle, WindowFocusOracle};
use crate::services::key_dispatch::{KeyDispatcher, KeyboardDispatcher, LogDispatcher};
use crate::services::potion_tracker::PotionTracker;
use crate::services::screen_capture::ScreenCapture;
use crate::services::session::PotionSession;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How often the status line is logged while running
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Start the sampling loop and keep it running until Ctrl-C
pub async fn run(
    manager: &ConfigManager,
    mut config: AppConfig,
    no_focus: bool,
    dry_run: bool,
) -> Result<(), PotionError> {
    if no_focus {
        config.focus.require_window_focus = false;
    }

    let templates = super::load_templates(manager, &config);
    let capture = Arc::new(ScreenCapture::new()?);

    let dispatcher: Arc<dyn KeyDispatcher> = if dry_run {
        info!("Dry run: key presses are only logged");
        Arc::new(LogDispatcher)
    } else {
        Arc::new(KeyboardDispatcher)
    };

    let focus: Arc<dyn FocusOracle> = if config.focus.require_window_focus {
        Arc::new(WindowFocusOracle::new(config.focus.focus_timeout()))
    } else {
        Arc::new(AlwaysFocused)
    };

    if !config.regions.slot_regions.iter().flatten().any(|r| r.is_valid()) {
        warn!(
            "No usable slot regions configured in {}",
            manager.config_file_path().display()
        );
    }

    let session = PotionSession::new(config, templates, capture, dispatcher, focus);
    let tracker = PotionTracker::new(session, Arc::new(SystemClock));
    tracker.start().await?;
    info!("Potion manager running, press Ctrl-C to stop");

    let mut status = tokio::time::interval(STATUS_INTERVAL);
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            _ = status.tick() => {
                info!("{}", tracker.snapshot().status_line());
            }
        }
    }

    tracker.stop().await;
    Ok(())
}
