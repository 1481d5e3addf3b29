//! wgpu backend for the transition engine.
//!
//! Uploads the metadata texture once, allocates three RGBA8 state textures,
//! and runs the blend pass as a full-screen render pass into the next state
//! texture each tick.
//!
//! # Invariants
//! - All GPU resources are created at engine construction; creation errors
//!   are captured and returned instead of reaching the device error handler.
//! - The transition program is versioned; uniforms mirror it byte for byte.
//! - Consumers may sample the current state texture but never render into it.

mod context;
mod gpu;
mod shaders;

pub use context::WgpuContext;
pub use gpu::{GpuStateBuffer, STATE_FORMAT, TransitionUniforms, WgpuBackend, WgpuEngine};
pub use shaders::{TRANSITION_SHADER, TRANSITION_SHADER_VERSION};

pub fn crate_info() -> &'static str {
    "footprint-render-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render-wgpu"));
    }
}
