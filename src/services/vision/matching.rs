use image::{imageops, RgbImage};
use rayon::prelude::*;

/// Resize `template` to the capture's dimensions when they differ
pub fn fit_template(template: &RgbImage, width: u32, height: u32) -> RgbImage {
    if template.dimensions() == (width, height) {
        return template.clone();
    }
    imageops::resize(template, width, height, imageops::FilterType::Triangle)
}

/// Similarity in [0, 1] derived from the normalized squared difference of two same-sized
/// images (all channels). 1.0 means identical.
pub fn sqdiff_similarity(capture: &RgbImage, template: &RgbImage) -> f32 {
    if capture.dimensions() != template.dimensions() {
        return 0.0;
    }

    let (diff, capture_energy, template_energy) = capture
        .as_raw()
        .par_iter()
        .zip(template.as_raw().par_iter())
        .map(|(&i, &t)| {
            let i = i as f64;
            let t = t as f64;
            ((t - i) * (t - i), i * i, t * t)
        })
        .reduce(
            || (0.0, 0.0, 0.0),
            |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2),
        );

    if diff == 0.0 {
        return 1.0;
    }

    let denominator = (capture_energy * template_energy).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    (1.0 - diff / denominator).clamp(0.0, 1.0) as f32
}

/// Normalized cross-correlation (mean-subtracted per channel) of two same-sized images,
/// in [-1, 1]. Flat images only correlate with an identical flat image.
pub fn ccoeff_similarity(capture: &RgbImage, template: &RgbImage) -> f32 {
    if capture.dimensions() != template.dimensions() {
        return 0.0;
    }

    let pixel_count = capture.width() as f64 * capture.height() as f64;
    if pixel_count == 0.0 {
        return 0.0;
    }

    let mut capture_mean = [0.0f64; 3];
    let mut template_mean = [0.0f64; 3];
    for (i, t) in capture.pixels().zip(template.pixels()) {
        for c in 0..3 {
            capture_mean[c] += i[c] as f64;
            template_mean[c] += t[c] as f64;
        }
    }
    for c in 0..3 {
        capture_mean[c] /= pixel_count;
        template_mean[c] /= pixel_count;
    }

    let mut cross = 0.0;
    let mut capture_var = 0.0;
    let mut template_var = 0.0;
    for (i, t) in capture.pixels().zip(template.pixels()) {
        for c in 0..3 {
            let di = i[c] as f64 - capture_mean[c];
            let dt = t[c] as f64 - template_mean[c];
            cross += di * dt;
            capture_var += di * di;
            template_var += dt * dt;
        }
    }

    if capture_var == 0.0 || template_var == 0.0 {
        return if capture_var == 0.0 && template_var == 0.0 && capture == template {
            1.0
        } else {
            0.0
        };
    }

    (cross / (capture_var * template_var).sqrt()).clamp(-1.0, 1.0) as f32
}

/// Resize if needed, then score with the squared-difference similarity
pub fn template_similarity(capture: &RgbImage, template: &RgbImage) -> f32 {
    let fitted = fit_template(template, capture.width(), capture.height());
    sqdiff_similarity(capture, &fitted)
}

/// Resize if needed, then score with the cross-correlation similarity
pub fn correlation_similarity(capture: &RgbImage, template: &RgbImage) -> f32 {
    let fitted = fit_template(template, capture.width(), capture.height());
    ccoeff_similarity(capture, &fitted)
}
