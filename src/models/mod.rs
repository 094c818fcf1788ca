pub mod config;
pub mod game_state;
pub mod potion;
pub mod region;
pub mod slot;

pub use config::AppConfig;
pub use game_state::{ActiveEffect, GameState};
pub use potion::{ItemConfig, PotionCategory, PotionSubtype};
pub use region::{PixelPoint, Region, RgbColor};
pub use slot::{PotionSlot, SlotClassification};
