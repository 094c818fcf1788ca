use crate::error::DispatchError;
use crate::models::config::{SlotConfig, TimingConfig};
use crate::models::game_state::GameState;
use crate::models::potion::{PotionCategory, PotionSubtype};
use crate::models::slot::PotionSlot;
use crate::services::buff_detector::ActivityProbe;
use crate::services::key_dispatch::KeyDispatcher;
use std::cmp::Reverse;
use std::time::Duration;
use tracing::{debug, info};

/// Per-tick inputs shared by every policy branch
pub struct PolicyContext<'a> {
    pub now: Duration,
    pub state: &'a GameState,
    pub probe: &'a dyn ActivityProbe,
    pub dispatcher: &'a dyn KeyDispatcher,
}

/// Decides which slots to consume each tick.
///
/// Health keeps a cross-slot timer; mana and utility only look at per-slot state.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    timing: TimingConfig,
    toggles: SlotConfig,
    last_health_use: Duration,
}

impl PolicyEngine {
    pub fn new(timing: TimingConfig, toggles: SlotConfig) -> Self {
        Self {
            timing,
            toggles,
            last_health_use: Duration::ZERO,
        }
    }

    /// Time of the last health consumption, zero if none yet
    pub fn last_health_use(&self) -> Duration {
        self.last_health_use
    }

    fn gui_controls(&self) -> bool {
        self.toggles.use_gui_controls
    }

    /// Slot is enabled for automatic use, or toggles are not in effect
    fn auto_use(&self, slot: &PotionSlot) -> bool {
        !self.gui_controls() || self.toggles.auto_use(slot.index())
    }

    /// Charged, identified, and for utility items not already running
    pub fn can_use_potion(&self, slot: &PotionSlot, probe: &dyn ActivityProbe) -> bool {
        if !slot.has_uses() || slot.category == PotionCategory::Empty {
            return false;
        }
        if slot.category == PotionCategory::Utility {
            return !probe.is_active(slot.index());
        }
        true
    }

    /// Press the slot's key and record the use.
    ///
    /// Returns `Ok(false)` without pressing anything when the slot cannot be used. Slot state is
    /// only touched after the key press succeeded.
    pub fn use_potion(
        &self,
        slot: &mut PotionSlot,
        ctx: &PolicyContext<'_>,
    ) -> Result<bool, DispatchError> {
        if !self.can_use_potion(slot, ctx.probe) {
            return Ok(false);
        }

        ctx.dispatcher.press(&slot.hotkey)?;

        slot.last_used = ctx.now;
        slot.uses_remaining -= 1;
        if slot.subtype.config().is_some_and(|item| !item.instant) {
            slot.active_until = ctx.now + slot.duration;
        }

        info!(
            "Used {} (slot {}, key {}), {} uses left",
            slot.subtype, slot.slot_number, slot.hotkey, slot.uses_remaining
        );
        Ok(true)
    }

    /// Run the health, mana and utility branches in order; returns consumed slot numbers
    pub fn evaluate(
        &mut self,
        slots: &mut [PotionSlot],
        ctx: &PolicyContext<'_>,
    ) -> Result<Vec<usize>, DispatchError> {
        let mut consumed = Vec::new();
        consumed.extend(self.process_health(slots, ctx)?);
        consumed.extend(self.process_mana(slots, ctx)?);
        consumed.extend(self.process_utility(slots, ctx)?);
        Ok(consumed)
    }

    /// At most one health consumption, gated by the shared and per-slot timers
    pub fn process_health(
        &mut self,
        slots: &mut [PotionSlot],
        ctx: &PolicyContext<'_>,
    ) -> Result<Option<usize>, DispatchError> {
        let has_available = slots
            .iter()
            .any(|s| s.category == PotionCategory::Health && s.has_uses());
        if !has_available || !ctx.state.health_missing() {
            return Ok(None);
        }

        let since_shared = ctx.now.saturating_sub(self.last_health_use);
        if since_shared < self.timing.instant_delay() {
            return Ok(None);
        }

        let usable: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.category == PotionCategory::Health
                    && self.auto_use(slot)
                    && self.can_use_potion(slot, ctx.probe)
            })
            .filter(|(_, slot)| {
                let required = if self.gui_controls() && self.toggles.instant(slot.index()) {
                    self.timing.instant_delay()
                } else {
                    self.timing.health_delay()
                };
                ctx.now.saturating_sub(slot.last_used) >= required && since_shared >= required
            })
            .map(|(i, _)| i)
            .collect();

        let Some(pick) = fullest(slots, &usable) else {
            return Ok(None);
        };

        if self.use_potion(&mut slots[pick], ctx)? {
            self.last_health_use = ctx.now;
            return Ok(Some(slots[pick].slot_number));
        }
        Ok(None)
    }

    /// At most one mana consumption; enduring slots wait for their effect to end
    pub fn process_mana(
        &mut self,
        slots: &mut [PotionSlot],
        ctx: &PolicyContext<'_>,
    ) -> Result<Option<usize>, DispatchError> {
        let has_available = slots
            .iter()
            .any(|s| s.category == PotionCategory::Mana && s.has_uses());
        if !has_available || !ctx.state.mana_missing() {
            return Ok(None);
        }

        let usable: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.category == PotionCategory::Mana
                    && self.auto_use(slot)
                    && self.can_use_potion(slot, ctx.probe)
            })
            .filter(|(_, slot)| {
                if self.gui_controls() && self.toggles.enduring(slot.index()) {
                    !ctx.probe.is_active(slot.index())
                } else {
                    ctx.now.saturating_sub(slot.last_used) >= self.timing.mana_delay()
                }
            })
            .map(|(i, _)| i)
            .collect();

        let Some(pick) = fullest(slots, &usable) else {
            return Ok(None);
        };

        if self.use_potion(&mut slots[pick], ctx)? {
            return Ok(Some(slots[pick].slot_number));
        }
        Ok(None)
    }

    /// Keep one effect of each utility subtype running, rotating across slots that hold it
    pub fn process_utility(
        &mut self,
        slots: &mut [PotionSlot],
        ctx: &PolicyContext<'_>,
    ) -> Result<Vec<usize>, DispatchError> {
        // depleted slots count too: their effect may still be running
        let active_types: Vec<PotionSubtype> = slots
            .iter()
            .filter(|s| s.category == PotionCategory::Utility && !s.is_empty())
            .filter(|s| ctx.probe.is_active(s.index()))
            .map(|s| s.subtype)
            .collect();

        let mut groups: Vec<(PotionSubtype, Vec<usize>)> = Vec::new();
        for (i, slot) in slots.iter().enumerate() {
            if !self.auto_use(slot)
                || slot.category != PotionCategory::Utility
                || !slot.has_uses()
                || slot.is_empty()
            {
                continue;
            }
            match groups.iter_mut().find(|(subtype, _)| *subtype == slot.subtype) {
                Some((_, members)) => members.push(i),
                None => groups.push((slot.subtype, vec![i])),
            }
        }

        let mut consumed = Vec::new();
        for (subtype, members) in groups {
            if active_types.contains(&subtype) {
                debug!("{} already active, skipping", subtype);
                continue;
            }

            let Some(&pick) = members
                .iter()
                .find(|&&i| self.can_use_potion(&slots[i], ctx.probe))
            else {
                debug!("No usable slot for {}", subtype);
                continue;
            };

            if self.use_potion(&mut slots[pick], ctx)? {
                consumed.push(slots[pick].slot_number);
            }
        }

        Ok(consumed)
    }
}

/// Index with the most uses left; the earliest slot wins ties
fn fullest(slots: &[PotionSlot], candidates: &[usize]) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .min_by_key(|&i| Reverse(slots[i].uses_remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slot::SlotClassification;
    use crate::testing::{FakeProbe, RecordingDispatcher};

    const T0: Duration = Duration::from_secs(1_000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn slots_with(contents: &[(PotionSubtype, u32)]) -> Vec<PotionSlot> {
        let mut slots: Vec<PotionSlot> = (1..=5).map(|n| PotionSlot::new(n, n.to_string())).collect();
        for (slot, &(subtype, uses)) in slots.iter_mut().zip(contents) {
            slot.apply_classification(&SlotClassification {
                subtype,
                uses_remaining: uses,
                occupied: uses > 0,
                confidence: 1.0,
                template_key: None,
            });
            slot.uses_remaining = uses;
        }
        slots
    }

    fn toggles(instant: &[bool], enduring: &[bool]) -> SlotConfig {
        let mut config = SlotConfig::default();
        for (i, &v) in instant.iter().enumerate() {
            config.slot_instant[i] = v;
        }
        for (i, &v) in enduring.iter().enumerate() {
            config.slot_enduring[i] = v;
        }
        config
    }

    fn low(health: f32, mana: f32) -> GameState {
        GameState {
            health_percentage: Some(health),
            mana_percentage: Some(mana),
            ..GameState::default()
        }
    }

    fn ctx<'a>(
        now: Duration,
        state: &'a GameState,
        probe: &'a FakeProbe,
        dispatcher: &'a RecordingDispatcher,
    ) -> PolicyContext<'a> {
        PolicyContext {
            now,
            state,
            probe,
            dispatcher,
        }
    }

    #[test]
    fn test_health_shared_and_per_slot_timers() {
        let mut slots = slots_with(&[
            (PotionSubtype::SmallHealthInstant, 3),
            (PotionSubtype::HealthOvertime, 2),
        ]);
        let mut engine = PolicyEngine::new(TimingConfig::default(), toggles(&[true, false], &[]));
        let state = low(80.0, 100.0);
        let probe = FakeProbe::new();
        let keys = RecordingDispatcher::new();

        // fullest slot first
        assert_eq!(engine.process_health(&mut slots, &ctx(T0, &state, &probe, &keys)).unwrap(), Some(1));
        assert_eq!(engine.last_health_use(), T0);
        assert_eq!(slots[0].uses_remaining, 2);

        assert_eq!(engine.process_health(&mut slots, &ctx(T0 + ms(299), &state, &probe, &keys)).unwrap(), None);

        // instant slot may fire again after 300ms, the other needs 2s since the shared use
        assert_eq!(engine.process_health(&mut slots, &ctx(T0 + ms(300), &state, &probe, &keys)).unwrap(), Some(1));
        assert_eq!(engine.process_health(&mut slots, &ctx(T0 + ms(600), &state, &probe, &keys)).unwrap(), Some(1));
        assert_eq!(slots[0].uses_remaining, 0);

        assert_eq!(engine.process_health(&mut slots, &ctx(T0 + ms(2599), &state, &probe, &keys)).unwrap(), None);
        assert_eq!(engine.process_health(&mut slots, &ctx(T0 + ms(2600), &state, &probe, &keys)).unwrap(), Some(2));

        assert_eq!(keys.pressed(), vec!["1", "1", "1", "2"]);
        assert_eq!(slots[1].active_until, T0 + ms(2600) + Duration::from_secs(15));
        assert_eq!(slots[0].active_until, Duration::ZERO);
    }

    #[test]
    fn test_health_needs_missing_health() {
        let mut slots = slots_with(&[(PotionSubtype::SmallHealthInstant, 3)]);
        let mut engine = PolicyEngine::new(TimingConfig::default(), SlotConfig::default());
        let probe = FakeProbe::new();
        let keys = RecordingDispatcher::new();

        let full = low(100.0, 100.0);
        assert_eq!(engine.process_health(&mut slots, &ctx(T0, &full, &probe, &keys)).unwrap(), None);

        let unknown = GameState {
            health_percentage: None,
            ..GameState::default()
        };
        assert_eq!(engine.process_health(&mut slots, &ctx(T0, &unknown, &probe, &keys)).unwrap(), None);
        assert!(keys.pressed().is_empty());
    }

    #[test]
    fn test_health_respects_auto_use_toggle() {
        let mut slots = slots_with(&[(PotionSubtype::LargeHealthInstant, 2)]);
        let mut config = SlotConfig::default();
        config.slot_auto_use[0] = false;
        let mut engine = PolicyEngine::new(TimingConfig::default(), config.clone());
        let state = low(50.0, 100.0);
        let probe = FakeProbe::new();
        let keys = RecordingDispatcher::new();

        assert_eq!(engine.process_health(&mut slots, &ctx(T0, &state, &probe, &keys)).unwrap(), None);

        // without per-slot toggles the switch is ignored, and the long delay applies
        config.use_gui_controls = false;
        config.slot_instant[0] = true;
        let mut engine = PolicyEngine::new(TimingConfig::default(), config);
        assert_eq!(engine.process_health(&mut slots, &ctx(T0, &state, &probe, &keys)).unwrap(), Some(1));
        assert_eq!(engine.process_health(&mut slots, &ctx(T0 + ms(300), &state, &probe, &keys)).unwrap(), None);
        assert_eq!(engine.process_health(&mut slots, &ctx(T0 + ms(2000), &state, &probe, &keys)).unwrap(), Some(1));
    }

    #[test]
    fn test_mana_delay_and_enduring() {
        let mut slots = slots_with(&[
            (PotionSubtype::Clarity, 1),
            (PotionSubtype::SmallManaInstant, 3),
        ]);
        let mut engine = PolicyEngine::new(TimingConfig::default(), toggles(&[], &[true, false]));
        let state = low(100.0, 20.0);
        let probe = FakeProbe::new();
        let keys = RecordingDispatcher::new();

        // slot 2 has more uses
        assert_eq!(engine.process_mana(&mut slots, &ctx(T0, &state, &probe, &keys)).unwrap(), Some(2));
        // enduring slot 1 ignores timers, only its effect matters
        probe.set_active(0, true);
        assert_eq!(engine.process_mana(&mut slots, &ctx(T0 + ms(100), &state, &probe, &keys)).unwrap(), None);
        probe.set_active(0, false);
        assert_eq!(engine.process_mana(&mut slots, &ctx(T0 + ms(100), &state, &probe, &keys)).unwrap(), Some(1));
        assert_eq!(slots[0].active_until, T0 + ms(100) + Duration::from_secs(45));

        assert_eq!(engine.process_mana(&mut slots, &ctx(T0 + ms(2999), &state, &probe, &keys)).unwrap(), None);
        assert_eq!(engine.process_mana(&mut slots, &ctx(T0 + ms(3000), &state, &probe, &keys)).unwrap(), Some(2));
        assert_eq!(keys.pressed(), vec!["2", "1", "2"]);
    }

    #[test]
    fn test_utility_group_suppression() {
        let mut slots = slots_with(&[
            (PotionSubtype::SmallHealthInstant, 3),
            (PotionSubtype::Quicksilver, 0),
            (PotionSubtype::Quicksilver, 3),
        ]);
        let mut engine = PolicyEngine::new(TimingConfig::default(), SlotConfig::default());
        let state = GameState::default();
        let probe = FakeProbe::new();
        let keys = RecordingDispatcher::new();

        // the depleted slot's running effect suppresses the whole group
        probe.set_active(1, true);
        assert!(engine.process_utility(&mut slots, &ctx(T0, &state, &probe, &keys)).unwrap().is_empty());
        assert!(keys.pressed().is_empty());

        probe.set_active(1, false);
        assert_eq!(engine.process_utility(&mut slots, &ctx(T0, &state, &probe, &keys)).unwrap(), vec![3]);
        assert_eq!(slots[2].uses_remaining, 2);
        assert_eq!(slots[2].active_until, T0 + Duration::from_secs(20));
    }

    #[test]
    fn test_utility_rotates_within_group_and_across_types() {
        let mut slots = slots_with(&[
            (PotionSubtype::Jade, 3),
            (PotionSubtype::Jade, 3),
            (PotionSubtype::Granite, 3),
        ]);
        let mut engine = PolicyEngine::new(TimingConfig::default(), SlotConfig::default());
        let state = GameState::default();
        let probe = FakeProbe::new();
        let keys = RecordingDispatcher::new();

        assert_eq!(engine.process_utility(&mut slots, &ctx(T0, &state, &probe, &keys)).unwrap(), vec![1, 3]);

        slots[0].uses_remaining = 0;
        assert_eq!(engine.process_utility(&mut slots, &ctx(T0, &state, &probe, &keys)).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_no_uses_means_no_keypress() {
        let mut slots = slots_with(&[(PotionSubtype::SmallHealthInstant, 0)]);
        let engine = PolicyEngine::new(TimingConfig::default(), SlotConfig::default());
        let state = low(10.0, 10.0);
        let probe = FakeProbe::new();
        let keys = RecordingDispatcher::new();

        assert!(!engine.use_potion(&mut slots[0], &ctx(T0, &state, &probe, &keys)).unwrap());
        assert!(!engine.use_potion(&mut slots[3], &ctx(T0, &state, &probe, &keys)).unwrap());
        assert!(keys.pressed().is_empty());
        assert_eq!(slots[0].last_used, Duration::ZERO);
    }

    #[test]
    fn test_dispatch_failure_leaves_state() {
        let mut slots = slots_with(&[(PotionSubtype::SmallHealthInstant, 3)]);
        let mut engine = PolicyEngine::new(TimingConfig::default(), SlotConfig::default());
        let state = low(10.0, 100.0);
        let probe = FakeProbe::new();
        let keys = RecordingDispatcher::new();
        keys.set_fail(true);

        let result = engine.evaluate(&mut slots, &ctx(T0, &state, &probe, &keys));
        assert!(matches!(result, Err(DispatchError::Simulate { .. })));
        assert_eq!(slots[0].uses_remaining, 3);
        assert_eq!(engine.last_health_use(), Duration::ZERO);
    }
}
