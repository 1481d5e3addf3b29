use anyhow::{Context, Result};
use footprint_common::{AnimationSettings, EngineConfig, EntityMetadata};
use glam::Vec2;
use std::path::Path;

/// Read a JSON array of entity records; `null` entries are entities without metadata.
pub fn load_entities(path: &Path) -> Result<Vec<Option<EntityMetadata>>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening entity file {}", path.display()))?;
    let entities: Vec<Option<EntityMetadata>> =
        serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("parsing entity file {}", path.display()))?;
    tracing::info!(count = entities.len(), path = %path.display(), "loaded entities");
    Ok(entities)
}

pub fn load_settings(path: Option<&Path>) -> Result<AnimationSettings> {
    load_yaml(path)
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    load_yaml(path)
}

fn load_yaml<T: serde::de::DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// A deterministic grid of buildings around `center`, cycling through every
/// palette category (including unrecognized and missing values).
pub fn synthetic_city(count: usize, center: Vec2) -> Vec<Option<EntityMetadata>> {
    const CLASSES: [&str; 9] = ["A1", "B2", "C0", "D4", "R4", "R5", "S2", "K1", "H3"];
    const ZONES: [&str; 6] = ["R6", "R7A", "C6-4", "M1-1", "PARK", "BPC"];

    let side = (count as f32).sqrt().ceil().max(1.0) as usize;
    (0..count)
        .map(|i| {
            if i % 97 == 96 {
                return None;
            }
            let x = (i % side) as f32 - side as f32 / 2.0;
            let y = (i / side) as f32 - side as f32 / 2.0;
            let year = 1800.0 + ((i * 37) % 220) as f64;
            Some(
                EntityMetadata::new()
                    .with_centroid(center + Vec2::new(x, y) * 0.5)
                    .with("YearBuilt", year)
                    .with("ZoneDist1", ZONES[(i * 7) % ZONES.len()])
                    .with("BldgClass", CLASSES[(i * 5) % CLASSES.len()]),
            )
        })
        .collect()
}
