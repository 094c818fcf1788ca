use serde::{Deserialize, Serialize};

/// Screen rectangle in logical pixel coordinates.
///
/// Persisted as a `[x, y, width, height]` array, the layout the setup flow writes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "(i32, i32, u32, u32)", into = "(i32, i32, u32, u32)")]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl From<(i32, i32, u32, u32)> for Region {
    fn from((x, y, width, height): (i32, i32, u32, u32)) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<Region> for (i32, i32, u32, u32) {
    fn from(region: Region) -> Self {
        (region.x, region.y, region.width, region.height)
    }
}

/// Single screen coordinate used for pixel-distance resource detection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for PixelPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<PixelPoint> for (i32, i32) {
    fn from(point: PixelPoint) -> Self {
        (point.x, point.y)
    }
}

/// RGB color sampled at calibration time.
///
/// Reads any array of three or more channels, so RGBA samples drop their alpha.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "Vec<u8>", into = "(u8, u8, u8)")]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance in RGB space
    pub fn distance(&self, other: &RgbColor) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl TryFrom<Vec<u8>> for RgbColor {
    type Error = String;

    fn try_from(channels: Vec<u8>) -> Result<Self, Self::Error> {
        match channels.as_slice() {
            [r, g, b, ..] => Ok(Self::new(*r, *g, *b)),
            _ => Err(format!("expected at least 3 color channels, got {}", channels.len())),
        }
    }
}

impl From<RgbColor> for (u8, u8, u8) {
    fn from(color: RgbColor) -> Self {
        (color.r, color.g, color.b)
    }
}

impl From<image::Rgb<u8>> for RgbColor {
    fn from(pixel: image::Rgb<u8>) -> Self {
        Self::new(pixel[0], pixel[1], pixel[2])
    }
}
