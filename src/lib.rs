pub mod achievements;
pub mod citymap;
pub mod engine;
pub mod map;
pub mod rng;
pub mod ruleset;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod world;

pub use citymap::CityMap;
pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use world::World;
