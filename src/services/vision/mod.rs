//! Pixel-level primitives shared by the classifier, estimator and buff detector

pub mod color;
pub mod lines;
pub mod matching;

pub use color::{band_coverage, hue_mask, rgb_to_hsv, HueBand};
pub use lines::{detect_segments, SegmentParams};
pub use matching::{correlation_similarity, template_similarity};
