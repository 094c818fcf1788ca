use crate::models::config::{DetectionConfig, RegionConfig};
use crate::services::screen_capture::CaptureProvider;
use crate::services::template_store::TemplateStore;
use crate::services::vision::color::PROGRESS_BANDS;
use crate::services::vision::{band_coverage, correlation_similarity, detect_segments, SegmentParams};
use image::{imageops, RgbImage};
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Share of the slot height, from the top, above the progress-bar strip
const PROGRESS_STRIP_START: f32 = 0.7;

/// Answers "is the effect of slot `index` currently running?"
pub trait ActivityProbe {
    fn is_active(&self, index: usize) -> bool;
}

/// Detects running buffs from a slot's progress indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuffDetector {
    /// Correlation above this means the indicator looks like its idle template
    pub template_threshold: f32,
    /// Minimum bar-colored share of the strip for the heuristic
    pub coverage_threshold: f32,
    pub segments: SegmentParams,
}

impl Default for BuffDetector {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

impl BuffDetector {
    pub fn from_config(detection: &DetectionConfig) -> Self {
        Self {
            template_threshold: detection.progress_match_threshold,
            coverage_threshold: detection.progress_threshold,
            segments: SegmentParams::default(),
        }
    }

    /// Whether slot `index` (0-based) shows an active progress indicator.
    ///
    /// Uses the idle template when both it and its region exist, otherwise the edge/color
    /// heuristic over the bottom of the slot. A failed slot capture counts as active so the
    /// caller holds off consuming.
    pub fn is_active(
        &self,
        index: usize,
        store: &TemplateStore,
        regions: &RegionConfig,
        capture: &dyn CaptureProvider,
    ) -> bool {
        if let (Some(template), Some(region)) = (store.progress_template(index), regions.progress_region(index)) {
            match capture.capture(&region) {
                Ok(current) => {
                    let similarity = correlation_similarity(&current, template);
                    debug!("Slot {}: progress template similarity {:.3}", index + 1, similarity);
                    return similarity <= self.template_threshold;
                }
                Err(e) => warn!(
                    "Slot {}: progress bar capture failed, using heuristic: {}",
                    index + 1,
                    e
                ),
            }
        }

        let Some(region) = regions.slot_region(index) else {
            return false;
        };

        match capture.capture(&region) {
            Ok(slot_image) => self.heuristic_active(&slot_image),
            Err(e) => {
                warn!("Slot {}: capture failed, treating effect as active: {}", index + 1, e);
                true
            }
        }
    }

    /// Edge segments or bar-colored pixels in the bottom strip of a slot capture
    pub fn heuristic_active(&self, slot_image: &RgbImage) -> bool {
        let strip = progress_strip(slot_image);
        if strip.width() == 0 || strip.height() == 0 {
            return false;
        }

        let has_lines = !detect_segments(&strip, self.segments).is_empty();
        let coverage = band_coverage(&strip, &PROGRESS_BANDS);

        has_lines || coverage > self.coverage_threshold
    }
}

/// Bottom 30% of a slot capture
pub fn progress_strip(slot_image: &RgbImage) -> RgbImage {
    let (width, height) = slot_image.dimensions();
    let start = (height as f32 * PROGRESS_STRIP_START) as u32;
    imageops::crop_imm(slot_image, 0, start, width, height - start).to_image()
}

/// Probe that runs the detector at most once per slot for its lifetime (one tick)
pub struct TickProbe<'a> {
    detector: &'a BuffDetector,
    store: &'a TemplateStore,
    regions: &'a RegionConfig,
    capture: &'a dyn CaptureProvider,
    cache: RefCell<HashMap<usize, bool>>,
}

impl<'a> TickProbe<'a> {
    pub fn new(
        detector: &'a BuffDetector,
        store: &'a TemplateStore,
        regions: &'a RegionConfig,
        capture: &'a dyn CaptureProvider,
    ) -> Self {
        Self {
            detector,
            store,
            regions,
            capture,
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl ActivityProbe for TickProbe<'_> {
    fn is_active(&self, index: usize) -> bool {
        if let Some(&cached) = self.cache.borrow().get(&index) {
            return cached;
        }
        let active = self
            .detector
            .is_active(index, self.store, self.regions, self.capture);
        self.cache.borrow_mut().insert(index, active);
        active
    }
}
