//! Shared types for the footprint engine.
//!
//! # Invariants
//! - Entity indexes are dense and assigned by original list order.
//! - The set of color-code fields is closed; anything else selects no field.

mod settings;
mod types;

pub use settings::{AnimationSettings, EngineConfig, FrameContext};
pub use types::{ColorCodeField, EntityIndex, EntityMetadata, RawValue};

pub fn crate_info() -> &'static str {
    "footprint-common v0.1.0"
}
