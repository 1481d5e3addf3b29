/// Version of the transition program. Bump together with [`TransitionUniforms`]
/// whenever the uniform block or bindings change.
///
/// [`TransitionUniforms`]: crate::TransitionUniforms
pub const TRANSITION_SHADER_VERSION: u32 = 1;

/// WGSL transition program: full-screen strip vertex stage plus the blend
/// fragment stage.
pub const TRANSITION_SHADER: &str = include_str!("shaders/transition.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_declares_matching_version() {
        let header = format!("transition program v{TRANSITION_SHADER_VERSION}");
        assert!(TRANSITION_SHADER.contains(&header));
    }

    #[test]
    fn source_has_entry_points_and_bindings() {
        for needle in [
            "fn vs_fullscreen",
            "fn fs_transition",
            "@group(0) @binding(0)",
            "@group(0) @binding(1)",
            "@group(0) @binding(2)",
        ] {
            assert!(TRANSITION_SHADER.contains(needle), "missing {needle}");
        }
    }
}
