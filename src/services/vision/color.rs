use image::{GrayImage, Luma, RgbImage};
use rayon::prelude::*;

/// Inclusive HSV range. Hue in degrees (0-360), saturation/value in 0-255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueBand {
    pub min_hue: f32,
    pub max_hue: f32,
    pub min_saturation: f32,
    pub min_value: f32,
}

impl HueBand {
    pub const fn new(min_hue: f32, max_hue: f32) -> Self {
        Self {
            min_hue,
            max_hue,
            min_saturation: 50.0,
            min_value: 50.0,
        }
    }

    pub fn contains(&self, h: f32, s: f32, v: f32) -> bool {
        h >= self.min_hue
            && h <= self.max_hue
            && s >= self.min_saturation
            && v >= self.min_value
    }
}

/// Red wraps around 0°, so health needs two bands
pub const HEALTH_BANDS: [HueBand; 2] = [HueBand::new(0.0, 20.0), HueBand::new(340.0, 360.0)];
pub const MANA_BANDS: [HueBand; 1] = [HueBand::new(200.0, 260.0)];
/// Common progress-bar colors: green, blue, yellow/orange
pub const PROGRESS_BANDS: [HueBand; 3] = [
    HueBand::new(80.0, 160.0),
    HueBand::new(200.0, 260.0),
    HueBand::new(40.0, 80.0),
];

/// Convert RGB to HSV color space
/// Returns (H: 0-360, S: 0-255, V: 0-255)
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };
    let s = if max == 0.0 { 0.0 } else { (delta / max) * 255.0 };
    let v = max * 255.0;

    (h, s, v)
}

/// Binary mask of pixels falling inside any of the bands (rows processed in parallel)
pub fn hue_mask(image: &RgbImage, bands: &[HueBand]) -> GrayImage {
    let (width, height) = image.dimensions();

    let mask_data: Vec<u8> = (0..height)
        .into_par_iter()
        .flat_map(|y| {
            let mut row = Vec::with_capacity(width as usize);
            for x in 0..width {
                let pixel = image.get_pixel(x, y);
                let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
                if bands.iter().any(|band| band.contains(h, s, v)) {
                    row.push(255u8);
                } else {
                    row.push(0u8);
                }
            }
            row
        })
        .collect();

    GrayImage::from_raw(width, height, mask_data)
        .unwrap_or_else(|| GrayImage::from_pixel(width, height, Luma([0u8])))
}

/// Fraction (0..1) of pixels inside any band; 0 for an empty image
pub fn band_coverage(image: &RgbImage, bands: &[HueBand]) -> f32 {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return 0.0;
    }

    let mask = hue_mask(image, bands);
    let matching = mask.pixels().filter(|p| p[0] == 255).count() as u64;
    matching as f32 / total as f32
}
