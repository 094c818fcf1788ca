use crate::error::PotionError;
use crate::models::config::AppConfig;
use crate::services::config::ConfigManager;
use crate::services::screen_capture::{CaptureProvider, ScreenCapture};
use crate::services::template_store::{TemplateState, TemplateStore};

/// Create `full/slotN`, `empty/slotN` and the progress-bar directory
pub fn init_templates(manager: &ConfigManager, config: &AppConfig) -> Result<(), PotionError> {
    let store = super::load_templates(manager, config);
    store.create_structure()?;
    println!("Template directories created under {}", store.root().display());
    Ok(())
}

/// Capture slot `slot` (1-based) and store it as a template
pub fn capture_template(
    manager: &ConfigManager,
    config: &AppConfig,
    slot: usize,
    name: &str,
    kind: &str,
    depleted: bool,
) -> Result<(), PotionError> {
    let capture = ScreenCapture::new()?;
    let store = template_dirs(manager, config);
    let state = if depleted {
        TemplateState::Depleted
    } else {
        TemplateState::Occupied
    };

    let path = save_slot_capture(&store, config, &capture, slot, name, kind, state)?;
    println!("Saved {}", path.display());
    Ok(())
}

/// Capture the progress-bar region of slot `slot` (1-based) as its idle reference
pub fn capture_progress_template(manager: &ConfigManager, config: &AppConfig, slot: usize) -> Result<(), PotionError> {
    let capture = ScreenCapture::new()?;
    let store = template_dirs(manager, config);

    let path = save_progress_capture(&store, config, &capture, slot)?;
    println!("Saved {}", path.display());
    Ok(())
}

/// Store paths only; nothing is read from disk
fn template_dirs(manager: &ConfigManager, config: &AppConfig) -> TemplateStore {
    TemplateStore::new(
        manager.resolve(&config.templates.template_root),
        manager.resolve(&config.templates.progress_template_dir),
        config.slots.slot_count,
    )
}

fn slot_index(config: &AppConfig, slot: usize) -> Result<usize, PotionError> {
    if slot == 0 || slot > config.slots.slot_count {
        return Err(PotionError::InvalidSlot(slot));
    }
    Ok(slot - 1)
}

fn save_slot_capture(
    store: &TemplateStore,
    config: &AppConfig,
    capture: &dyn CaptureProvider,
    slot: usize,
    name: &str,
    kind: &str,
    state: TemplateState,
) -> Result<std::path::PathBuf, PotionError> {
    let index = slot_index(config, slot)?;
    let region = config
        .regions
        .slot_region(index)
        .ok_or(PotionError::MissingRegion(slot))?;

    let image = capture.capture(&region)?;
    Ok(store.save_template(index, state, name, kind, &image)?)
}

fn save_progress_capture(
    store: &TemplateStore,
    config: &AppConfig,
    capture: &dyn CaptureProvider,
    slot: usize,
) -> Result<std::path::PathBuf, PotionError> {
    let index = slot_index(config, slot)?;
    let region = config
        .regions
        .progress_region(index)
        .ok_or(PotionError::MissingRegion(slot))?;

    let image = capture.capture(&region)?;
    Ok(store.save_progress_template(index, &image)?)
}
