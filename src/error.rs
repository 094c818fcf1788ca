use thiserror::Error;

/// Top-level error for a session tick or a CLI command
#[derive(Error, Debug)]
pub enum PotionError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Slot {0} is out of range")]
    InvalidSlot(usize),
    #[error("Slot {0} has no region configured")]
    MissingRegion(usize),
    #[error("Sampling loop is already running")]
    AlreadyRunning,
    #[error("Sampling loop task failed: {0}")]
    Task(String),
}

/// Screen capture failures (off-screen region, permission denied, no display)
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No primary monitor found")]
    NoMonitor,
    #[error("Failed to capture screen: {0}")]
    Backend(String),
    #[error("Point ({x}, {y}) is outside the captured screen")]
    OutOfBounds { x: i32, y: i32 },
    #[error("Region {width}x{height} at ({x}, {y}) is empty after clamping")]
    EmptyRegion {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to access template directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode template image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    NoConfigDir,
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown key name: {0}")]
    UnknownKey(String),
    #[error("Failed to simulate key press for {key}: {reason}")]
    Simulate { key: String, reason: String },
}
