pub mod buff_detector;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod focus;
pub mod key_dispatch;
pub mod policy;
pub mod potion_tracker;
pub mod resource_estimator;
pub mod screen_capture;
pub mod session;
pub mod template_store;
pub mod vision;

// Re-export main types
pub use buff_detector::{ActivityProbe, BuffDetector};
pub use classifier::SlotClassifier;
pub use clock::{Clock, SystemClock};
pub use config::ConfigManager;
pub use focus::{AlwaysFocused, FocusOracle, WindowFocusOracle};
pub use key_dispatch::{KeyDispatcher, KeyboardDispatcher, LogDispatcher};
pub use policy::PolicyEngine;
pub use potion_tracker::PotionTracker;
pub use resource_estimator::ResourceEstimator;
pub use screen_capture::{CaptureProvider, ScreenCapture};
pub use session::{LoopState, PotionSession, SessionSnapshot, TickOutcome};
pub use template_store::TemplateStore;
