//! In-crate fakes for the external collaborators

use crate::error::{CaptureError, DispatchError};
use crate::models::region::{PixelPoint, Region};
use crate::services::buff_detector::ActivityProbe;
use crate::services::clock::Clock;
use crate::services::focus::FocusOracle;
use crate::services::key_dispatch::KeyDispatcher;
use crate::services::screen_capture::CaptureProvider;
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Fresh directory under the system temp dir, unique per process and call
pub(crate) fn temp_dir(label: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "potion-manager-{}-{}-{}",
        label,
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Capture provider backed by a map of canned images
#[derive(Default)]
pub(crate) struct FakeCapture {
    regions: Mutex<HashMap<Region, RgbImage>>,
    pixels: Mutex<HashMap<PixelPoint, Rgb<u8>>>,
    failing_regions: Mutex<HashSet<Region>>,
    fail_all: AtomicBool,
    pub captures: AtomicUsize,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_region(&self, region: Region, image: RgbImage) {
        self.regions.lock().insert(region, image);
    }

    pub fn set_pixel(&self, point: PixelPoint, color: Rgb<u8>) {
        self.pixels.lock().insert(point, color);
    }

    pub fn fail_region(&self, region: Region) {
        self.failing_regions.lock().insert(region);
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl CaptureProvider for FakeCapture {
    fn capture(&self, region: &Region) -> Result<RgbImage, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) || self.failing_regions.lock().contains(region) {
            return Err(CaptureError::Backend("fake capture failure".to_string()));
        }
        self.regions
            .lock()
            .get(region)
            .cloned()
            .ok_or(CaptureError::EmptyRegion {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            })
    }

    fn pixel_color(&self, point: PixelPoint) -> Result<Rgb<u8>, CaptureError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(CaptureError::Backend("fake capture failure".to_string()));
        }
        self.pixels
            .lock()
            .get(&point)
            .copied()
            .ok_or(CaptureError::OutOfBounds {
                x: point.x,
                y: point.y,
            })
    }
}

/// Dispatcher that records every key it is asked to press
#[derive(Default)]
pub(crate) struct RecordingDispatcher {
    pressed: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pressed(&self) -> Vec<String> {
        self.pressed.lock().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl KeyDispatcher for RecordingDispatcher {
    fn press(&self, key: &str) -> Result<(), DispatchError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Simulate {
                key: key.to_string(),
                reason: "fake dispatch failure".to_string(),
            });
        }
        self.pressed.lock().push(key.to_string());
        Ok(())
    }
}

/// Activity probe answering from a fixed set of active slot indices
#[derive(Default)]
pub(crate) struct FakeProbe {
    active: Mutex<HashSet<usize>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, index: usize, active: bool) {
        let mut set = self.active.lock();
        if active {
            set.insert(index);
        } else {
            set.remove(&index);
        }
    }
}

impl ActivityProbe for FakeProbe {
    fn is_active(&self, index: usize) -> bool {
        self.active.lock().contains(&index)
    }
}

/// Clock that only moves when told to
#[derive(Default)]
pub(crate) struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn at(start: Duration) -> Self {
        Self {
            millis: AtomicU64::new(start.as_millis() as u64),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Focus oracle with a switchable answer
pub(crate) struct FakeFocus {
    focused: AtomicBool,
}

impl FakeFocus {
    pub fn new(focused: bool) -> Self {
        Self {
            focused: AtomicBool::new(focused),
        }
    }

    pub fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::SeqCst);
    }
}

impl FocusOracle for FakeFocus {
    fn is_foreground_process_matching(&self, _hints: &[String]) -> bool {
        self.focused.load(Ordering::SeqCst)
    }
}

/// Solid-color image
pub(crate) fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}
