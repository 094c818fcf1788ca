use crate::models::potion::{PotionCategory, PotionSubtype};
use serde::Serialize;
use std::time::Duration;

/// One physical flask slot.
///
/// Timestamps are durations since the Unix epoch; `Duration::ZERO` means never.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PotionSlot {
    /// 1-based slot number
    pub slot_number: usize,
    pub category: PotionCategory,
    pub subtype: PotionSubtype,
    pub hotkey: String,
    pub uses_remaining: u32,
    pub max_uses: u32,
    /// Legacy field, always zero
    pub cooldown: Duration,
    pub last_used: Duration,
    pub duration: Duration,
    pub active_until: Duration,
    pub confidence: f32,
}

impl PotionSlot {
    pub fn new(slot_number: usize, hotkey: impl Into<String>) -> Self {
        Self {
            slot_number,
            category: PotionCategory::Empty,
            subtype: PotionSubtype::Empty,
            hotkey: hotkey.into(),
            uses_remaining: 0,
            max_uses: 0,
            cooldown: Duration::ZERO,
            last_used: Duration::ZERO,
            duration: Duration::ZERO,
            active_until: Duration::ZERO,
            confidence: 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.slot_number - 1
    }

    pub fn is_empty(&self) -> bool {
        self.subtype == PotionSubtype::Empty
    }

    pub fn has_uses(&self) -> bool {
        self.uses_remaining > 0
    }

    /// Whether the timed effect of the last use is still running at `now`
    pub fn is_effect_running(&self, now: Duration) -> bool {
        now < self.active_until
    }

    /// Apply a classifier result.
    ///
    /// Identity and uses are only rewritten when either changed, so a slot consumed since the
    /// last scan is topped back up to its max uses. Returns true when the slot changed.
    pub fn apply_classification(&mut self, classification: &SlotClassification) -> bool {
        self.confidence = classification.confidence;

        if self.subtype == classification.subtype
            && self.uses_remaining == classification.uses_remaining
        {
            return false;
        }

        self.subtype = classification.subtype;
        self.uses_remaining = classification.uses_remaining;
        self.cooldown = Duration::ZERO;

        match classification.subtype.config() {
            Some(item) => {
                self.category = item.category;
                self.max_uses = item.max_uses;
                self.duration = item.duration;
            }
            None => {
                self.category = PotionCategory::Empty;
                self.uses_remaining = 0;
                self.max_uses = 0;
                self.duration = Duration::ZERO;
            }
        }
        self.uses_remaining = self.uses_remaining.min(self.max_uses);

        true
    }

    /// Short "subtype(uses)" label used in logs and the status line
    pub fn label(&self) -> String {
        format!("{}({})", self.subtype, self.uses_remaining)
    }
}

/// Outcome of classifying a single slot capture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotClassification {
    pub subtype: PotionSubtype,
    pub uses_remaining: u32,
    pub occupied: bool,
    pub confidence: f32,
    /// Template key that won, e.g. `small-health-flask_health`
    pub template_key: Option<String>,
}

impl SlotClassification {
    pub fn empty() -> Self {
        Self {
            subtype: PotionSubtype::Empty,
            uses_remaining: 0,
            occupied: false,
            confidence: 0.0,
            template_key: None,
        }
    }
}
