use crate::animator::{BlendParams, blend_pass};
use crate::encoder::MetadataTexture;
use crate::error::EngineError;
use crate::layout::TextureLayout;
use glam::Vec3;

/// Executes the blend pass on some device.
///
/// A backend owns the uploaded metadata texture and allocates state buffers;
/// the engine owns the buffers themselves and lends them to [`blend`] each
/// tick. Only [`initialize`] and [`create_state_buffer`] may fail.
///
/// [`blend`]: TransitionBackend::blend
/// [`initialize`]: TransitionBackend::initialize
/// [`create_state_buffer`]: TransitionBackend::create_state_buffer
pub trait TransitionBackend: Sized {
    /// Device handles needed to build the backend.
    type Context;
    /// One square RGBA8 state buffer.
    type StateBuffer;

    fn initialize(
        context: Self::Context,
        layout: &TextureLayout,
        metadata: &MetadataTexture,
    ) -> Result<Self, EngineError>;

    /// Allocate a zero-initialized state buffer of the given side.
    fn create_state_buffer(&mut self, side: u32) -> Result<Self::StateBuffer, EngineError>;

    /// Read `current` and the metadata, write the blended state into `next`.
    fn blend(
        &mut self,
        current: &Self::StateBuffer,
        next: &mut Self::StateBuffer,
        params: &BlendParams,
    );
}

/// State buffer held in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuStateBuffer {
    side: u32,
    texels: Vec<[u8; 4]>,
}

impl CpuStateBuffer {
    pub fn zeroed(side: u32) -> Self {
        Self {
            side,
            texels: vec![[0; 4]; side as usize * side as usize],
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn texels(&self) -> &[[u8; 4]] {
        &self.texels
    }

    /// Address of the backing storage, stable for the buffer's lifetime.
    pub fn storage_ptr(&self) -> *const [u8; 4] {
        self.texels.as_ptr()
    }

    /// Displayed color of the entity whose run starts at `flat`.
    pub fn color_at(&self, flat: usize) -> Vec3 {
        let [r, g, b, _] = self.texels[flat];
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }
}

/// Reference backend: runs the blend pass on the CPU.
#[derive(Debug, Clone)]
pub struct CpuBackend {
    layout: TextureLayout,
    metadata: MetadataTexture,
}

impl TransitionBackend for CpuBackend {
    type Context = ();
    type StateBuffer = CpuStateBuffer;

    fn initialize(
        _context: (),
        layout: &TextureLayout,
        metadata: &MetadataTexture,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            layout: *layout,
            metadata: metadata.clone(),
        })
    }

    fn create_state_buffer(&mut self, side: u32) -> Result<CpuStateBuffer, EngineError> {
        Ok(CpuStateBuffer::zeroed(side))
    }

    fn blend(&mut self, current: &CpuStateBuffer, next: &mut CpuStateBuffer, params: &BlendParams) {
        blend_pass(
            &self.layout,
            &self.metadata,
            &current.texels,
            &mut next.texels,
            params,
        );
    }
}
