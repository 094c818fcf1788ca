use crate::models::potion::PotionSubtype;
use crate::models::region::Region;
use serde::Serialize;
use std::time::Duration;

/// A utility effect whose progress bar is currently visible
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActiveEffect {
    pub subtype: PotionSubtype,
    pub started_at: Duration,
    pub expires_at: Duration,
    pub progress_bar_region: Option<Region>,
}

/// Per-tick view of the character's resources, rebuilt every tick
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameState {
    /// `None` when no detection source is configured
    pub health_percentage: Option<f32>,
    pub mana_percentage: Option<f32>,
    pub health_current: Option<u32>,
    pub health_max: Option<u32>,
    pub mana_current: Option<u32>,
    pub mana_max: Option<u32>,
    pub active_effects: Vec<ActiveEffect>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            health_percentage: Some(100.0),
            mana_percentage: Some(100.0),
            health_current: None,
            health_max: None,
            mana_current: None,
            mana_max: None,
            active_effects: Vec::new(),
        }
    }
}

impl GameState {
    /// Health below 100%; an unknown reading never triggers consumption
    pub fn health_missing(&self) -> bool {
        self.health_percentage.is_some_and(|p| p < 100.0)
    }

    pub fn mana_missing(&self) -> bool {
        self.mana_percentage.is_some_and(|p| p < 100.0)
    }
}
