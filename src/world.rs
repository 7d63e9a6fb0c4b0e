// src/world.rs
//! Полный цикл генерации: карта высот, затем реки и города.
//!
//! Результат создаётся целиком за один вызов и целиком заменяется при
//! следующей генерации. Единственное состояние, переживающее вызов, -
//! позиция в потоке генератора, которым владеет вызывающий.

use serde::Serialize;

use crate::cities::{City, place_cities};
use crate::config::{MapConfig, RiverStreams};
use crate::error::Result;
use crate::heightmap::{Heightmap, generate_heightmap};
use crate::prng::AleaPrng;
use crate::rivers::{RiverPath, trace_rivers, trace_rivers_partitioned};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub heightmap: Heightmap,
    pub rivers: Vec<RiverPath>,
    pub cities: Vec<City>,
}

/// Генерирует мир по конфигурации.
///
/// Числа из `prng` берутся в порядке: сид шума, истоки рек, выбор городов.
pub fn generate_world(config: &MapConfig, prng: &mut AleaPrng) -> Result<GenerationResult> {
    config.validate()?;

    let span = tracing::info_span!("generate_world", width = config.width, height = config.height);
    let _guard = span.enter();

    let heightmap = generate_heightmap(config, prng);
    let rivers = match config.river_streams {
        RiverStreams::Shared => trace_rivers(&heightmap, config.river_count, prng),
        RiverStreams::Partitioned => {
            trace_rivers_partitioned(&heightmap, config.river_count, prng)
        }
    };
    let cities = place_cities(&heightmap, config.city_count, prng);

    tracing::info!(
        rivers = rivers.len(),
        cities = cities.len(),
        "world generated"
    );

    Ok(GenerationResult {
        heightmap,
        rivers,
        cities,
    })
}

impl GenerationResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
