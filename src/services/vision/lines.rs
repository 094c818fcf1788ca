use image::{imageops, GrayImage, RgbImage};
use imageproc::edges::canny;

/// Canny hysteresis thresholds
pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Straight edge-run detection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    pub min_length: u32,
    /// Largest run of non-edge pixels bridged inside one segment
    pub max_gap: u32,
    /// Edge pixels a segment must contain
    pub min_votes: u32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            min_length: 20,
            max_gap: 5,
            min_votes: 30,
        }
    }
}

/// An axis-aligned edge segment, end-inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Segment {
    pub fn length(&self) -> u32 {
        (self.x1 - self.x0).max(self.y1 - self.y0) + 1
    }
}

/// Edge map of an RGB image
pub fn edge_map(image: &RgbImage) -> GrayImage {
    let gray = imageops::grayscale(image);
    canny(&gray, CANNY_LOW, CANNY_HIGH)
}

/// Horizontal and vertical segments in a binary edge map.
///
/// Progress indicators are axis-aligned bars, so scanning rows and columns is enough.
pub fn find_segments(edges: &GrayImage, params: SegmentParams) -> Vec<Segment> {
    let (width, height) = edges.dimensions();
    let mut segments = Vec::new();

    for y in 0..height {
        let runs = scan_line(width, params, |i| edges.get_pixel(i, y)[0] > 0);
        segments.extend(runs.into_iter().map(|(start, end)| Segment {
            x0: start,
            y0: y,
            x1: end,
            y1: y,
        }));
    }

    for x in 0..width {
        let runs = scan_line(height, params, |i| edges.get_pixel(x, i)[0] > 0);
        segments.extend(runs.into_iter().map(|(start, end)| Segment {
            x0: x,
            y0: start,
            x1: x,
            y1: end,
        }));
    }

    segments.retain(|s| s.length() >= params.min_length);
    segments
}

/// Detect segments directly from an RGB image
pub fn detect_segments(image: &RgbImage, params: SegmentParams) -> Vec<Segment> {
    if image.width() == 0 || image.height() == 0 {
        return Vec::new();
    }
    find_segments(&edge_map(image), params)
}

/// Gap-bridged edge runs along one line with at least `min_votes` edge pixels
fn scan_line(len: u32, params: SegmentParams, is_edge: impl Fn(u32) -> bool) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    // (start, end, edge pixels)
    let mut current: Option<(u32, u32, u32)> = None;

    for i in 0..len {
        if !is_edge(i) {
            continue;
        }
        current = match current {
            Some((start, end, votes)) if i - end - 1 <= params.max_gap => Some((start, i, votes + 1)),
            Some(run) => {
                push_run(&mut runs, run, params);
                Some((i, i, 1))
            }
            None => Some((i, i, 1)),
        };
    }
    if let Some(run) = current {
        push_run(&mut runs, run, params);
    }

    runs
}

fn push_run(runs: &mut Vec<(u32, u32)>, (start, end, votes): (u32, u32, u32), params: SegmentParams) {
    if votes >= params.min_votes {
        runs.push((start, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_gapped_run_is_bridged() {
        let mut edges = GrayImage::new(60, 3);
        for x in 0..20 {
            edges.put_pixel(x, 1, Luma([255]));
        }
        // gap of 4 pixels (20..24)
        for x in 24..44 {
            edges.put_pixel(x, 1, Luma([255]));
        }

        let segments = find_segments(&edges, SegmentParams::default());
        assert_eq!(
            segments,
            vec![Segment {
                x0: 0,
                y0: 1,
                x1: 43,
                y1: 1
            }]
        );
        assert_eq!(segments[0].length(), 44);
    }

    #[test]
    fn test_sparse_edge_pixels_are_not_a_segment() {
        // five edge pixels spanning 20 columns
        let mut edges = GrayImage::new(40, 3);
        for x in [0, 6, 12, 18, 19] {
            edges.put_pixel(x, 1, Luma([255]));
        }
        assert!(find_segments(&edges, SegmentParams::default()).is_empty());

        // same span accepted once the vote floor allows it
        let lenient = SegmentParams {
            min_votes: 5,
            ..SegmentParams::default()
        };
        assert_eq!(find_segments(&edges, lenient).len(), 1);
    }

    #[test]
    fn test_wide_gap_splits_short_runs() {
        let mut edges = GrayImage::new(40, 1);
        for x in 0..12 {
            edges.put_pixel(x, 0, Luma([255]));
        }
        for x in 20..32 {
            edges.put_pixel(x, 0, Luma([255]));
        }
        assert!(find_segments(&edges, SegmentParams::default()).is_empty());
    }

    #[test]
    fn test_vertical_segment() {
        let mut edges = GrayImage::new(3, 45);
        for y in 2..40 {
            edges.put_pixel(2, y, Luma([255]));
        }
        let segments = find_segments(&edges, SegmentParams::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].x0, 2);
        assert_eq!(segments[0].length(), 38);
    }

    #[test]
    fn test_bar_edge_detected_in_image() {
        // dark slot with a bright horizontal bar across it
        let mut image = RgbImage::from_pixel(60, 12, Rgb([10, 10, 10]));
        for y in 4..8 {
            for x in 0..60 {
                image.put_pixel(x, y, Rgb([240, 240, 240]));
            }
        }
        assert!(!detect_segments(&image, SegmentParams::default()).is_empty());
    }

    #[test]
    fn test_flat_image_has_no_segments() {
        let image = RgbImage::from_pixel(40, 12, Rgb([90, 90, 90]));
        assert!(detect_segments(&image, SegmentParams::default()).is_empty());
        assert!(detect_segments(&RgbImage::new(0, 0), SegmentParams::default()).is_empty());
    }
}
