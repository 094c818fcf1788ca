use crate::models::region::{PixelPoint, Region, RgbColor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SLOT_COUNT: usize = 5;

/// Calibration artifacts produced by the setup flow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RegionConfig {
    pub slot_regions: Vec<Option<Region>>,
    pub health_bar_region: Option<Region>,
    pub mana_bar_region: Option<Region>,
    pub health_pixel_point: Option<PixelPoint>,
    pub health_pixel_color: Option<RgbColor>,
    pub mana_pixel_point: Option<PixelPoint>,
    pub mana_pixel_color: Option<RgbColor>,
    pub slot_progress_bars: Vec<Option<Region>>,
}

impl RegionConfig {
    /// Region of a slot by 0-based index
    pub fn slot_region(&self, index: usize) -> Option<Region> {
        self.slot_regions.get(index).copied().flatten()
    }

    pub fn progress_region(&self, index: usize) -> Option<Region> {
        self.slot_progress_bars.get(index).copied().flatten()
    }
}

/// Detection tunables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Not consulted by the policy engine, which acts below 100%
    pub health_threshold: f32,
    pub mana_threshold: f32,
    pub pixel_color_tolerance: f64,
    /// Fraction of the progress area that must be bar-colored to count as active
    pub progress_threshold: f32,
    pub occupied_match_threshold: f32,
    pub depleted_match_threshold: f32,
    pub progress_match_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            health_threshold: 50.0,
            mana_threshold: 30.0,
            pixel_color_tolerance: 50.0,
            progress_threshold: 0.1,
            occupied_match_threshold: 0.80,
            depleted_match_threshold: 0.98,
            progress_match_threshold: 0.80,
        }
    }
}

/// Delay constants, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub health_potion_delay_ms: u64,
    pub instant_potion_delay_ms: u64,
    pub mana_potion_delay_ms: u64,
    pub tick_interval_ms: u64,
    pub rescan_interval_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            health_potion_delay_ms: 2000,
            instant_potion_delay_ms: 300,
            mana_potion_delay_ms: 3000,
            tick_interval_ms: 100,
            rescan_interval_ms: 5000,
            error_backoff_ms: 1000,
        }
    }
}

impl TimingConfig {
    pub fn health_delay(&self) -> Duration {
        Duration::from_millis(self.health_potion_delay_ms)
    }

    pub fn instant_delay(&self) -> Duration {
        Duration::from_millis(self.instant_potion_delay_ms)
    }

    pub fn mana_delay(&self) -> Duration {
        Duration::from_millis(self.mana_potion_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

/// Per-slot hotkeys and toggles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlotConfig {
    pub slot_count: usize,
    pub slot_hotkeys: Vec<String>,
    /// When false the per-slot toggles below are ignored
    pub use_gui_controls: bool,
    pub slot_auto_use: Vec<bool>,
    pub slot_instant: Vec<bool>,
    pub slot_enduring: Vec<bool>,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            slot_hotkeys: (1..=DEFAULT_SLOT_COUNT).map(|n| n.to_string()).collect(),
            use_gui_controls: true,
            slot_auto_use: vec![true; DEFAULT_SLOT_COUNT],
            slot_instant: vec![false; DEFAULT_SLOT_COUNT],
            slot_enduring: vec![false; DEFAULT_SLOT_COUNT],
        }
    }
}

impl SlotConfig {
    /// Hotkey for a 0-based slot index, defaulting to its 1-based number
    pub fn hotkey(&self, index: usize) -> String {
        self.slot_hotkeys
            .get(index)
            .cloned()
            .unwrap_or_else(|| (index + 1).to_string())
    }

    pub fn auto_use(&self, index: usize) -> bool {
        self.slot_auto_use.get(index).copied().unwrap_or(false)
    }

    pub fn instant(&self, index: usize) -> bool {
        self.slot_instant.get(index).copied().unwrap_or(false)
    }

    pub fn enduring(&self, index: usize) -> bool {
        self.slot_enduring.get(index).copied().unwrap_or(false)
    }
}

/// Window focus gating
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FocusConfig {
    pub require_window_focus: bool,
    pub process_name_hints: Vec<String>,
    pub focus_timeout_ms: u64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            require_window_focus: true,
            process_name_hints: vec![
                "pathofexile".to_string(),
                "pathofexile_x64".to_string(),
                "pathofexilesteam".to_string(),
                "path of exile".to_string(),
            ],
            focus_timeout_ms: 1000,
        }
    }
}

impl FocusConfig {
    pub fn focus_timeout(&self) -> Duration {
        Duration::from_millis(self.focus_timeout_ms)
    }
}

/// Template directories; relative paths resolve against the settings directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplateConfig {
    pub template_root: PathBuf,
    pub progress_template_dir: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            template_root: PathBuf::from("templates"),
            progress_template_dir: PathBuf::from("progress_bars"),
        }
    }
}

/// Complete persisted configuration, stored as one flat key-value document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub regions: RegionConfig,
    #[serde(flatten)]
    pub detection: DetectionConfig,
    #[serde(flatten)]
    pub timing: TimingConfig,
    #[serde(flatten)]
    pub slots: SlotConfig,
    #[serde(flatten)]
    pub focus: FocusConfig,
    #[serde(flatten)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub debug: bool,
}
