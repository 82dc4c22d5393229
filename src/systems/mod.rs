mod achievements;
mod citymap;
mod culture;

pub use achievements::AchievementSystem;
pub use citymap::CitymapSystem;
pub use culture::CultureSystem;
