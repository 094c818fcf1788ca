use crate::error::PotionError;
use crate::models::config::{AppConfig, RegionConfig};
use crate::models::game_state::{ActiveEffect, GameState};
use crate::models::potion::PotionCategory;
use crate::models::slot::{PotionSlot, SlotClassification};
use crate::services::buff_detector::{ActivityProbe, BuffDetector, TickProbe};
use crate::services::classifier::SlotClassifier;
use crate::services::focus::FocusOracle;
use crate::services::key_dispatch::KeyDispatcher;
use crate::services::policy::{PolicyContext, PolicyEngine};
use crate::services::resource_estimator::{Resource, ResourceEstimator};
use crate::services::screen_capture::CaptureProvider;
use crate::services::template_store::TemplateStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickOutcome {
    /// Skipped because the game window was not focused
    pub gated: bool,
    pub rescanned: bool,
    /// Slot numbers consumed this tick, in policy order
    pub consumed: Vec<usize>,
}

impl TickOutcome {
    fn gated() -> Self {
        Self {
            gated: true,
            ..Self::default()
        }
    }
}

/// Sampling loop state as seen by readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Stopped,
    Running,
    FocusGated,
}

/// Immutable copy of the session published after every tick
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub slots: Vec<PotionSlot>,
    pub game_state: GameState,
    pub loop_state: LoopState,
    pub focused: bool,
    pub require_focus: bool,
    pub taken_at: Duration,
}

impl SessionSnapshot {
    /// One-line summary: focus, HP/MP, running effects and charged slots
    pub fn status_line(&self) -> String {
        let mut parts = Vec::new();

        if self.require_focus {
            parts.push(if self.focused { "Game:Active" } else { "Game:Inactive" }.to_string());
        }
        parts.push(format_resource("HP", self.game_state.health_percentage, self.game_state.health_current, self.game_state.health_max));
        parts.push(format_resource("MP", self.game_state.mana_percentage, self.game_state.mana_current, self.game_state.mana_max));

        let active: Vec<String> = self
            .slots
            .iter()
            .filter(|s| s.is_effect_running(self.taken_at))
            .map(|s| {
                let remaining = s.active_until.saturating_sub(self.taken_at);
                format!("{}({:.0}s)", s.subtype, remaining.as_secs_f32())
            })
            .collect();
        if !active.is_empty() {
            parts.push(format!("Active: {}", active.join(", ")));
        }

        let available: Vec<String> = self
            .slots
            .iter()
            .filter(|s| s.has_uses())
            .map(PotionSlot::label)
            .collect();
        if !available.is_empty() {
            parts.push(format!("Available: {}", available.join(", ")));
        }

        parts.join(" | ")
    }
}

fn format_resource(label: &str, percentage: Option<f32>, current: Option<u32>, max: Option<u32>) -> String {
    match (percentage, current, max) {
        (Some(p), Some(c), Some(m)) => format!("{}: {}/{} ({:.1}%)", label, c, m, p),
        (Some(p), _, _) => format!("{}: {:.1}%", label, p),
        (None, _, _) => format!("{}: --", label),
    }
}

/// Everything one sampling loop owns: slot state, detectors, policy and collaborators
pub struct PotionSession {
    config: AppConfig,
    slots: Vec<PotionSlot>,
    game_state: GameState,
    policy: PolicyEngine,
    classifier: SlotClassifier,
    estimator: ResourceEstimator,
    detector: BuffDetector,
    templates: TemplateStore,
    capture: Arc<dyn CaptureProvider>,
    dispatcher: Arc<dyn KeyDispatcher>,
    focus: Arc<dyn FocusOracle>,
    last_scan: Option<Duration>,
    focused: bool,
}

impl PotionSession {
    pub fn new(
        config: AppConfig,
        templates: TemplateStore,
        capture: Arc<dyn CaptureProvider>,
        dispatcher: Arc<dyn KeyDispatcher>,
        focus: Arc<dyn FocusOracle>,
    ) -> Self {
        let slots = (0..config.slots.slot_count)
            .map(|i| PotionSlot::new(i + 1, config.slots.hotkey(i)))
            .collect();

        Self {
            slots,
            game_state: GameState::default(),
            policy: PolicyEngine::new(config.timing.clone(), config.slots.clone()),
            classifier: SlotClassifier::from_config(&config.detection),
            estimator: ResourceEstimator::from_config(&config),
            detector: BuffDetector::from_config(&config.detection),
            templates,
            capture,
            dispatcher,
            focus,
            last_scan: None,
            focused: false,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn slots(&self) -> &[PotionSlot] {
        &self.slots
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Re-read templates from disk without restarting
    pub fn reload_templates(&mut self) {
        self.templates.reload();
        self.last_scan = None;
    }

    /// Query the focus oracle, or report focused when gating is off
    pub fn check_focus(&mut self) -> bool {
        let focus = &self.config.focus;
        self.focused = !focus.require_window_focus
            || self
                .focus
                .is_foreground_process_matching(&focus.process_name_hints);
        self.focused
    }

    /// Capture and classify one slot (0-based) without touching slot state
    pub fn classify_slot(&self, index: usize) -> Result<SlotClassification, PotionError> {
        if index >= self.slots.len() {
            return Err(PotionError::InvalidSlot(index + 1));
        }
        let region = self
            .config
            .regions
            .slot_region(index)
            .ok_or(PotionError::MissingRegion(index + 1))?;
        let image = self.capture.capture(&region)?;
        Ok(self.classifier.classify(&self.templates, index, &image))
    }

    /// Reclassify every slot; returns how many changed
    pub fn scan_all_slots(&mut self) -> usize {
        scan_slots(
            &mut self.slots,
            &self.classifier,
            &self.templates,
            &self.config.regions,
            self.capture.as_ref(),
        )
    }

    /// Rebuild the game state with a fresh probe
    pub fn refresh_game_state(&mut self, now: Duration) {
        let probe = TickProbe::new(
            &self.detector,
            &self.templates,
            &self.config.regions,
            self.capture.as_ref(),
        );
        self.game_state = build_game_state(
            &self.estimator,
            &self.slots,
            &self.config.regions,
            self.capture.as_ref(),
            &probe,
            now,
        );
    }

    fn rescan_due(&self, now: Duration) -> bool {
        match self.last_scan {
            None => true,
            Some(at) => now.saturating_sub(at) > self.config.timing.rescan_interval(),
        }
    }

    /// One sampling iteration: focus gate, state refresh, periodic rescan, policy
    pub fn tick(&mut self, now: Duration) -> Result<TickOutcome, PotionError> {
        if !self.check_focus() {
            debug!("Game window not focused, skipping tick");
            return Ok(TickOutcome::gated());
        }
        let rescanned = self.rescan_due(now);

        // one detector run per slot per tick, shared by state refresh and policy
        let probe = TickProbe::new(
            &self.detector,
            &self.templates,
            &self.config.regions,
            self.capture.as_ref(),
        );

        self.game_state = build_game_state(
            &self.estimator,
            &self.slots,
            &self.config.regions,
            self.capture.as_ref(),
            &probe,
            now,
        );

        if rescanned {
            scan_slots(
                &mut self.slots,
                &self.classifier,
                &self.templates,
                &self.config.regions,
                self.capture.as_ref(),
            );
            self.last_scan = Some(now);
        }

        let ctx = PolicyContext {
            now,
            state: &self.game_state,
            probe: &probe,
            dispatcher: self.dispatcher.as_ref(),
        };
        let consumed = self.policy.evaluate(&mut self.slots, &ctx)?;

        Ok(TickOutcome {
            gated: false,
            rescanned,
            consumed,
        })
    }

    /// Initial scan done when a loop starts
    pub fn start(&mut self, now: Duration) {
        let changed = self.scan_all_slots();
        self.last_scan = Some(now);
        info!(
            "Initial scan: {} slot(s) identified, {} changed",
            self.slots.iter().filter(|s| !s.is_empty()).count(),
            changed
        );
    }

    pub fn snapshot(&self, loop_state: LoopState, now: Duration) -> SessionSnapshot {
        SessionSnapshot {
            slots: self.slots.clone(),
            game_state: self.game_state.clone(),
            loop_state,
            focused: self.focused,
            require_focus: self.config.focus.require_window_focus,
            taken_at: now,
        }
    }

    #[cfg(test)]
    pub(crate) fn slots_mut(&mut self) -> &mut [PotionSlot] {
        &mut self.slots
    }

    #[cfg(test)]
    pub(crate) fn is_rescan_due(&self, now: Duration) -> bool {
        self.rescan_due(now)
    }
}

fn scan_slots(
    slots: &mut [PotionSlot],
    classifier: &SlotClassifier,
    templates: &TemplateStore,
    regions: &RegionConfig,
    capture: &dyn CaptureProvider,
) -> usize {
    let mut changed = 0;

    for (index, slot) in slots.iter_mut().enumerate() {
        let classification = match regions.slot_region(index) {
            None => SlotClassification::empty(),
            Some(region) => match capture.capture(&region) {
                Ok(image) => classifier.classify(templates, index, &image),
                Err(e) => {
                    warn!("Slot {}: capture failed, keeping previous state: {}", index + 1, e);
                    continue;
                }
            },
        };

        let before = slot.label();
        if slot.apply_classification(&classification) {
            changed += 1;
            info!(
                "Slot {}: {} -> {} (conf: {:.2})",
                slot.slot_number,
                before,
                slot.label(),
                classification.confidence
            );
        }
    }

    changed
}

fn build_game_state(
    estimator: &ResourceEstimator,
    slots: &[PotionSlot],
    regions: &RegionConfig,
    capture: &dyn CaptureProvider,
    probe: &dyn ActivityProbe,
    now: Duration,
) -> GameState {
    let active_effects = slots
        .iter()
        .filter(|s| s.category == PotionCategory::Utility && !s.is_empty())
        .filter(|s| probe.is_active(s.index()) && s.is_effect_running(now))
        .map(|s| ActiveEffect {
            subtype: s.subtype,
            started_at: s.last_used,
            expires_at: s.active_until,
            progress_bar_region: regions
                .progress_region(s.index())
                .or_else(|| regions.slot_region(s.index())),
        })
        .collect();

    GameState {
        health_percentage: estimator.estimate(Resource::Health, capture),
        mana_percentage: estimator.estimate(Resource::Mana, capture),
        active_effects,
        ..GameState::default()
    }
}
