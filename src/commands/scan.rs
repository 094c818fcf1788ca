use crate::error::PotionError;
use crate::models::config::AppConfig;
use crate::models::slot::PotionSlot;
use crate::services::config::ConfigManager;
use crate::services::focus::AlwaysFocused;
use crate::services::key_dispatch::LogDispatcher;
use crate::services::screen_capture::ScreenCapture;
use crate::services::session::PotionSession;
use std::sync::Arc;

/// Classify every slot once and print one line per slot
pub fn scan(manager: &ConfigManager, config: AppConfig) -> Result<(), PotionError> {
    let templates = super::load_templates(manager, &config);
    let capture = Arc::new(ScreenCapture::new()?);
    let mut session = PotionSession::new(
        config,
        templates,
        capture,
        Arc::new(LogDispatcher),
        Arc::new(AlwaysFocused),
    );

    let changed = session.scan_all_slots();
    for slot in session.slots() {
        println!("{}", describe_slot(slot));
    }
    println!("{} slot(s) updated", changed);
    Ok(())
}

fn describe_slot(slot: &PotionSlot) -> String {
    if slot.is_empty() {
        return format!("Slot {} [{}]: empty", slot.slot_number, slot.hotkey);
    }
    format!(
        "Slot {} [{}]: {} ({}) {}/{} uses, confidence {:.2}",
        slot.slot_number,
        slot.hotkey,
        slot.subtype.as_str(),
        slot.category.as_str(),
        slot.uses_remaining,
        slot.max_uses,
        slot.confidence
    )
}
