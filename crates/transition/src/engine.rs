use crate::animator::TransitionAnimator;
use crate::backend::{CpuBackend, TransitionBackend};
use crate::encoder::{EncodedMetadata, MetadataEncoder, MetadataTexture};
use crate::error::EngineError;
use crate::layout::TextureLayout;
use crate::ring::StateRing;
use footprint_common::{AnimationSettings, EngineConfig, EntityMetadata, FrameContext};
use footprint_palette::{CategoryCounter, ColorMapper};
use glam::Vec2;

/// Engine running the reference CPU backend.
pub type CpuEngine = TransitionEngine<CpuBackend>;

/// Animates every entity's displayed color toward the selected field's target.
///
/// Created once per entity list; the metadata texture, layout and the three
/// state buffers live as long as the engine. Call [`tick`] once per frame and
/// display [`state_texture`].
///
/// [`tick`]: TransitionEngine::tick
/// [`state_texture`]: TransitionEngine::state_texture
pub struct TransitionEngine<B: TransitionBackend> {
    backend: B,
    encoded: EncodedMetadata,
    states: StateRing<B::StateBuffer>,
    animator: TransitionAnimator,
    ticks: u64,
}

impl<B: TransitionBackend> TransitionEngine<B> {
    /// Build an engine with the default palette and no category counting.
    pub fn new(
        context: B::Context,
        entities: &[Option<EntityMetadata>],
        initial: &AnimationSettings,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        Self::with_mapper(context, entities, initial, config, &mut ColorMapper::new())
    }

    /// Build an engine, classifying entities through `mapper` (and its counter).
    pub fn with_mapper<C: CategoryCounter>(
        context: B::Context,
        entities: &[Option<EntityMetadata>],
        initial: &AnimationSettings,
        config: &EngineConfig,
        mapper: &mut ColorMapper<C>,
    ) -> Result<Self, EngineError> {
        let _span = tracing::info_span!("engine_init", entities = entities.len()).entered();

        let encoded = MetadataEncoder::new(*config).encode(entities, mapper)?;
        let side = encoded.layout.side();
        let mut backend = B::initialize(context, &encoded.layout, &encoded.texture)?;
        let states = StateRing::allocate(|| backend.create_state_buffer(side))?;

        tracing::info!(
            entities = entities.len(),
            side,
            field = ?initial.color_code_field,
            "transition engine ready"
        );

        Ok(Self {
            backend,
            encoded,
            states,
            animator: TransitionAnimator::new(initial),
            ticks: 0,
        })
    }

    /// Advance the animation by one frame.
    ///
    /// Resets the epoch if the selected field changed, rotates the buffers,
    /// then blends the new current buffer into the new next buffer. The
    /// written buffer becomes current on the following tick.
    pub fn tick(&mut self, frame: FrameContext, settings: &AnimationSettings) {
        let params = self.animator.prepare(frame, settings);
        self.states.cycle();
        let (current, next) = self.states.current_and_next();
        self.backend.blend(current, next, &params);
        self.ticks += 1;

        tracing::trace!(
            tick = self.ticks,
            time_ms = params.time_ms,
            epoch_ms = params.last_change_ms,
            "transition tick"
        );
    }

    /// The live display buffer. Read-only.
    pub fn state_texture(&self) -> &B::StateBuffer {
        self.states.current()
    }

    /// Normalized texture coordinate of every entity, parallel to the input list.
    pub fn state_indexes(&self) -> &[Vec2] {
        &self.encoded.indexes
    }

    pub fn layout(&self) -> &TextureLayout {
        &self.encoded.layout
    }

    pub fn metadata(&self) -> &MetadataTexture {
        &self.encoded.texture
    }

    pub fn states(&self) -> &StateRing<B::StateBuffer> {
        &self.states
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Time (seconds) of the last observed field change.
    pub fn animation_epoch(&self) -> Option<f64> {
        self.animator.epoch()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
