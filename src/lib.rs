pub mod cities;
pub mod config;
pub mod error;
pub mod heightmap;
pub mod preview;
pub mod prng;
pub mod rivers;
pub mod world;

pub use cities::{City, place_cities};
pub use config::{MapConfig, RiverStreams};
pub use error::{MapGenError, Result};
pub use heightmap::{GridPoint, Heightmap, generate_heightmap};
pub use prng::{AleaPrng, AleaState, SeedValue};
pub use rivers::{RiverPath, trace_rivers};
pub use world::{GenerationResult, generate_world};
