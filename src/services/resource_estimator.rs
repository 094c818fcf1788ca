use crate::error::CaptureError;
use crate::models::config::AppConfig;
use crate::models::region::{PixelPoint, Region, RgbColor};
use crate::services::screen_capture::CaptureProvider;
use crate::services::vision::color::{band_coverage, HueBand, HEALTH_BANDS, MANA_BANDS};
use tracing::{debug, warn};

/// Tracked resource bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Health,
    Mana,
}

impl Resource {
    /// Reported when the calibrated pixel no longer matches; below any consumption threshold
    pub fn not_full_sentinel(&self) -> f32 {
        match self {
            Self::Health => 40.0,
            Self::Mana => 20.0,
        }
    }

    pub fn bands(&self) -> &'static [HueBand] {
        match self {
            Self::Health => &HEALTH_BANDS,
            Self::Mana => &MANA_BANDS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Mana => "mana",
        }
    }
}

/// Calibration for one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSource {
    pub bar_region: Option<Region>,
    pub pixel_point: Option<PixelPoint>,
    pub pixel_color: Option<RgbColor>,
}

impl ResourceSource {
    fn calibrated_pixel(&self) -> Option<(PixelPoint, RgbColor)> {
        Some((self.pixel_point?, self.pixel_color?))
    }
}

/// Estimates health/mana percentages from the screen
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEstimator {
    pub tolerance: f64,
    pub health: ResourceSource,
    pub mana: ResourceSource,
}

impl ResourceEstimator {
    pub fn from_config(config: &AppConfig) -> Self {
        let regions = &config.regions;
        Self {
            tolerance: config.detection.pixel_color_tolerance,
            health: ResourceSource {
                bar_region: regions.health_bar_region,
                pixel_point: regions.health_pixel_point,
                pixel_color: regions.health_pixel_color,
            },
            mana: ResourceSource {
                bar_region: regions.mana_bar_region,
                pixel_point: regions.mana_pixel_point,
                pixel_color: regions.mana_pixel_color,
            },
        }
    }

    fn source(&self, resource: Resource) -> &ResourceSource {
        match resource {
            Resource::Health => &self.health,
            Resource::Mana => &self.mana,
        }
    }

    /// Current percentage (0-100).
    ///
    /// Pixel comparison is tried first; the hue mask over the bar region is the fallback.
    /// Returns `None` when neither source is configured.
    pub fn estimate(&self, resource: Resource, capture: &dyn CaptureProvider) -> Option<f32> {
        let source = self.source(resource);

        if let Some((point, color)) = source.calibrated_pixel() {
            match self.pixel_estimate(resource, point, color, capture) {
                Ok(percentage) => return Some(percentage),
                Err(e) => warn!(
                    "Pixel detection for {} failed, using bar fallback: {}",
                    resource.as_str(),
                    e
                ),
            }
        }

        let region = source.bar_region?;
        Some(self.hue_estimate(resource, &region, capture))
    }

    /// Binary full / not-full reading from the calibrated point
    pub fn pixel_estimate(
        &self,
        resource: Resource,
        point: PixelPoint,
        reference: RgbColor,
        capture: &dyn CaptureProvider,
    ) -> Result<f32, CaptureError> {
        let current = RgbColor::from(capture.pixel_color(point)?);
        let distance = current.distance(&reference);

        debug!(
            "{} pixel at ({}, {}): distance {:.1} (tolerance {})",
            resource.as_str(),
            point.x,
            point.y,
            distance,
            self.tolerance
        );

        if distance < self.tolerance {
            Ok(100.0)
        } else {
            Ok(resource.not_full_sentinel())
        }
    }

    /// Share of bar pixels in the resource's hue band; 100 on capture failure
    pub fn hue_estimate(&self, resource: Resource, region: &Region, capture: &dyn CaptureProvider) -> f32 {
        match capture.capture(region) {
            Ok(image) => band_coverage(&image, resource.bands()) * 100.0,
            Err(e) => {
                warn!("Failed to capture {} bar, assuming full: {}", resource.as_str(), e);
                100.0
            }
        }
    }
}
