//! Entity state-transition engine.
//!
//! Encodes per-entity target colors into a static metadata texture, keeps a
//! ring of three state buffers (previous, current, next), and on every tick
//! blends each entity's displayed color toward the selected field's target
//! with a distance-staggered onset.
//!
//! # Invariants
//! - The metadata texture, layout, and state buffers are created once and never resized.
//! - Buffer rotation reassigns roles only; storage is never copied or reallocated.
//! - The animation epoch resets exactly once per observed field change.
//! - Construction is the only fallible operation.
//!
//! The blend pass is behind [`TransitionBackend`]. [`CpuBackend`] is the
//! reference implementation; GPU backends implement the same trait.

mod animator;
mod backend;
mod encoder;
mod engine;
mod error;
mod layout;
mod ring;

pub use animator::{BlendParams, TransitionAnimator, blend_color, blend_pass, onset_ms};
pub use backend::{CpuBackend, CpuStateBuffer, TransitionBackend};
pub use encoder::{EncodedMetadata, MetadataEncoder, MetadataTexture};
pub use engine::{CpuEngine, TransitionEngine};
pub use error::EngineError;
pub use layout::{RUN_WIDTH, TextureLayout};
pub use ring::{Role, StateRing};

pub fn crate_info() -> &'static str {
    "footprint-transition v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("transition"));
    }
}
