use crate::error::CaptureError;
use crate::models::region::{PixelPoint, Region};
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;
use xcap::Monitor;

/// Source of screen pixels.
///
/// Region and point coordinates are logical screen pixels.
pub trait CaptureProvider: Send + Sync {
    fn capture(&self, region: &Region) -> Result<RgbImage, CaptureError>;

    fn pixel_color(&self, point: PixelPoint) -> Result<Rgb<u8>, CaptureError>;
}

/// Thread-safe wrapper for xcap::Monitor
///
/// SAFETY: This wrapper implements Send and Sync for Monitor, which is safe because:
/// 1. Monitor is essentially a handle to OS display resources
/// 2. All xcap operations internally handle synchronization
/// 3. We only use Monitor for read-only capture operations
#[derive(Clone)]
struct SendSyncMonitor(Monitor);

// SAFETY: Monitor handles are thread-safe at the OS level.
unsafe impl Send for SendSyncMonitor {}

// SAFETY: Monitor operations through xcap are internally synchronized.
unsafe impl Sync for SendSyncMonitor {}

/// Screen capture service using xcap
pub struct ScreenCapture {
    monitor: SendSyncMonitor,
    scale_factor: f64,
}

impl ScreenCapture {
    /// Create a new screen capture instance using the primary monitor
    pub fn new() -> Result<Self, CaptureError> {
        let monitor = Monitor::all()
            .map_err(|e| CaptureError::Backend(format!("Failed to get monitors: {}", e)))?
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .ok_or(CaptureError::NoMonitor)?;

        // xcap returns physical pixels
        let scale_factor = monitor.scale_factor().unwrap_or(1.0) as f64;

        debug!(
            "Screen capture initialized: scale {}, physical {}x{}",
            scale_factor,
            monitor.width().unwrap_or(0),
            monitor.height().unwrap_or(0)
        );

        Ok(Self {
            monitor: SendSyncMonitor(monitor),
            scale_factor,
        })
    }

    /// Capture entire screen
    pub fn capture_full(&self) -> Result<RgbImage, CaptureError> {
        let rgba_image = self
            .monitor
            .0
            .capture_image()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba_image).to_rgb8())
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}

impl CaptureProvider for ScreenCapture {
    fn capture(&self, region: &Region) -> Result<RgbImage, CaptureError> {
        let screen = self.capture_full()?;
        crop_region(&screen, region, self.scale_factor)
    }

    fn pixel_color(&self, point: PixelPoint) -> Result<Rgb<u8>, CaptureError> {
        let screen = self.capture_full()?;
        pixel_at(&screen, point, self.scale_factor)
    }
}

/// Crop a logical region out of a physical-pixel screenshot, clamped to the screen bounds
pub fn crop_region(screen: &RgbImage, region: &Region, scale_factor: f64) -> Result<RgbImage, CaptureError> {
    // On 125% scale: logical 100x100 → physical 125x125
    let left = (region.x as f64 * scale_factor).max(0.0) as u32;
    let top = (region.y as f64 * scale_factor).max(0.0) as u32;
    let right = ((region.x as f64 + region.width as f64) * scale_factor).max(0.0) as u32;
    let bottom = ((region.y as f64 + region.height as f64) * scale_factor).max(0.0) as u32;

    let right = right.min(screen.width());
    let bottom = bottom.min(screen.height());

    if left >= right || top >= bottom {
        return Err(CaptureError::EmptyRegion {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        });
    }

    Ok(image::imageops::crop_imm(screen, left, top, right - left, bottom - top).to_image())
}

/// Read one logical point from a physical-pixel screenshot
pub fn pixel_at(screen: &RgbImage, point: PixelPoint, scale_factor: f64) -> Result<Rgb<u8>, CaptureError> {
    let x = point.x as f64 * scale_factor;
    let y = point.y as f64 * scale_factor;

    if x < 0.0 || y < 0.0 || x as u32 >= screen.width() || y as u32 >= screen.height() {
        return Err(CaptureError::OutOfBounds {
            x: point.x,
            y: point.y,
        });
    }

    Ok(*screen.get_pixel(x as u32, y as u32))
}
