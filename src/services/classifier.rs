use crate::models::config::DetectionConfig;
use crate::models::potion::PotionSubtype;
use crate::models::slot::SlotClassification;
use crate::services::template_store::{SlotTemplate, TemplateState, TemplateStore};
use crate::services::vision::template_similarity;
use image::RgbImage;
use tracing::debug;

/// Scores a slot capture against that slot's stored templates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotClassifier {
    pub occupied_threshold: f32,
    pub depleted_threshold: f32,
}

impl Default for SlotClassifier {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

impl SlotClassifier {
    pub fn from_config(detection: &DetectionConfig) -> Self {
        Self {
            occupied_threshold: detection.occupied_match_threshold,
            depleted_threshold: detection.depleted_match_threshold,
        }
    }

    fn threshold(&self, state: TemplateState) -> f32 {
        match state {
            TemplateState::Occupied => self.occupied_threshold,
            TemplateState::Depleted => self.depleted_threshold,
        }
    }

    /// Best template clearing its partition's threshold, with its similarity.
    ///
    /// Only a strictly higher score replaces the current best, so the first template visited
    /// wins ties.
    pub fn best_match<'a>(
        &self,
        store: &'a TemplateStore,
        index: usize,
        capture: &RgbImage,
    ) -> Option<(&'a SlotTemplate, f32)> {
        let mut best: Option<(&SlotTemplate, f32)> = None;

        for template in store.slot_templates(index) {
            let similarity = template_similarity(capture, &template.image);
            if similarity <= self.threshold(template.state) {
                continue;
            }
            if best.map_or(true, |(_, score)| similarity > score) {
                best = Some((template, similarity));
            }
        }

        best
    }

    /// Classify a live capture of slot `index` (0-based)
    pub fn classify(
        &self,
        store: &TemplateStore,
        index: usize,
        capture: &RgbImage,
    ) -> SlotClassification {
        let Some((template, similarity)) = self.best_match(store, index, capture) else {
            debug!("Slot {}: no template cleared its threshold", index + 1);
            return SlotClassification::empty();
        };

        let occupied = template.state == TemplateState::Occupied;
        let subtype = PotionSubtype::resolve(&template.name, &template.kind, occupied);
        let uses_remaining = match subtype.config() {
            Some(item) if occupied => item.max_uses,
            _ => 0,
        };

        debug!(
            "Slot {}: matched {} ({}) as {} with similarity {:.3}",
            index + 1,
            template.name,
            template.kind,
            subtype,
            similarity
        );

        SlotClassification {
            subtype,
            uses_remaining,
            occupied,
            confidence: similarity,
            template_key: Some(template.key.clone()),
        }
    }
}
