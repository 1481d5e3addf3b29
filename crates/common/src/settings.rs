use crate::types::ColorCodeField;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Per-frame settings supplied by the driver on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Selected field. `None` (or an unknown key when deserialized) targets black.
    ///
    /// Every unknown key collapses to the same `None`, so moving from one
    /// unknown key to another is not a field change and keeps the current
    /// animation epoch. Both target black, so nothing visible differs.
    #[serde(with = "field_key")]
    pub color_code_field: Option<ColorCodeField>,
    /// Fraction of the remaining distance covered per frame once an entity has started.
    pub animation_speed: f32,
    /// Onset delay in milliseconds for an entity at the maximum normalized distance.
    pub animation_spread: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            color_code_field: Some(ColorCodeField::YearBuilt),
            animation_speed: 0.1,
            animation_spread: 4000.0,
        }
    }
}

impl AnimationSettings {
    pub fn with_field(self, field: Option<ColorCodeField>) -> Self {
        Self {
            color_code_field: field,
            ..self
        }
    }
}

/// Frame timing handed to `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameContext {
    /// Seconds since the driver started.
    pub time: f64,
}

impl FrameContext {
    pub fn at(time: f64) -> Self {
        Self { time }
    }

    /// Frame time in milliseconds, the unit the animator works in.
    pub fn time_ms(&self) -> f32 {
        (self.time * 1000.0) as f32
    }
}

/// Static engine configuration, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reference point the animation sweeps out from.
    pub center: Vec2,
    /// Multiplier from centroid distance to the packed distance byte.
    pub distance_scale: f32,
    /// Largest square texture side the engine may allocate.
    pub max_texture_side: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            center: Vec2::new(10.38, 21.57),
            distance_scale: 4.0,
            max_texture_side: 8192,
        }
    }
}

mod field_key {
    use crate::types::ColorCodeField;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        field: &Option<ColorCodeField>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match field {
            Some(f) => serializer.serialize_str(f.key()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ColorCodeField>, D::Error> {
        let key = Option::<String>::deserialize(deserializer)?;
        Ok(key.as_deref().and_then(ColorCodeField::parse))
    }
}
