use crate::context::WgpuContext;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use footprint_common::ColorCodeField;
use footprint_transition::{
    BlendParams, EngineError, MetadataTexture, TextureLayout, TransitionBackend, TransitionEngine,
};
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Texel format of the metadata and state textures.
pub const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Engine running the wgpu backend.
pub type WgpuEngine = TransitionEngine<WgpuBackend>;

/// Uniform block of the transition program (binding 0).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TransitionUniforms {
    pub time_ms: f32,
    pub last_change_ms: f32,
    pub animation_speed: f32,
    pub animation_spread: f32,
    pub show_year_built: u32,
    pub show_zone_dist1: u32,
    pub show_bldg_class: u32,
    pub entity_count: u32,
}

impl TransitionUniforms {
    pub fn new(params: &BlendParams, entity_count: u32) -> Self {
        let show = |field| u32::from(params.active_field == Some(field));
        Self {
            time_ms: params.time_ms,
            last_change_ms: params.last_change_ms,
            animation_speed: params.animation_speed,
            animation_spread: params.animation_spread,
            show_year_built: show(ColorCodeField::YearBuilt),
            show_zone_dist1: show(ColorCodeField::ZoneDist1),
            show_bldg_class: show(ColorCodeField::BldgClass),
            entity_count,
        }
    }
}

/// One state texture plus the bind group that reads it as the current state.
pub struct GpuStateBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl GpuStateBuffer {
    /// Texture for sampling by the host renderer.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Runs the blend pass as a render pass on a wgpu device.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    metadata_texture: wgpu::Texture,
    metadata_view: wgpu::TextureView,
    entity_count: u32,
}

impl WgpuBackend {
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn metadata_texture(&self) -> &wgpu::Texture {
        &self.metadata_texture
    }

    /// Copy a state texture back to host memory, row-major RGBA.
    pub fn read_state(&self, buffer: &GpuStateBuffer) -> Result<Vec<[u8; 4]>, EngineError> {
        let size = buffer.texture.size();
        let side = size.width;
        let unpadded = side * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let staging = guarded(&self.device, "readback buffer", || {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("state_readback"),
                size: padded as u64 * size.height as u64,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        })?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("state_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &buffer.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(size.height),
                },
            },
            size,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| EngineError::Device(e.to_string()))?
            .map_err(|e| EngineError::Device(e.to_string()))?;

        let mut texels = Vec::with_capacity(side as usize * size.height as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded as usize) {
                let row: &[u8] = &row[..unpadded as usize];
                texels.extend(row.chunks_exact(4).map(|t| [t[0], t[1], t[2], t[3]]));
            }
        }
        staging.unmap();
        Ok(texels)
    }

    fn create_texture(
        &self,
        label: &str,
        side: u32,
        data: &[u8],
    ) -> Result<(wgpu::Texture, wgpu::TextureView), EngineError> {
        create_texture(&self.device, &self.queue, label, side, data)
    }
}

impl TransitionBackend for WgpuBackend {
    type Context = WgpuContext;
    type StateBuffer = GpuStateBuffer;

    fn initialize(
        context: WgpuContext,
        layout: &TextureLayout,
        metadata: &MetadataTexture,
    ) -> Result<Self, EngineError> {
        let WgpuContext { device, queue } = context;

        let max = device.limits().max_texture_dimension_2d;
        if layout.side() > max {
            return Err(EngineError::TextureTooLarge {
                entities: layout.entity_count(),
                side: layout.side() as u64,
                max,
            });
        }

        let (metadata_texture, metadata_view) = create_texture(
            &device,
            &queue,
            "metadata_texture",
            metadata.side(),
            metadata.as_bytes(),
        )?;

        let (pipeline, bind_group_layout, uniform_buffer) =
            guarded(&device, "transition pipeline", || create_pipeline(&device))?;

        tracing::debug!(
            side = layout.side(),
            shader_version = shaders::TRANSITION_SHADER_VERSION,
            "wgpu transition backend initialized"
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            metadata_texture,
            metadata_view,
            entity_count: layout.entity_count() as u32,
        })
    }

    fn create_state_buffer(&mut self, side: u32) -> Result<GpuStateBuffer, EngineError> {
        let zeros = vec![0u8; side as usize * side as usize * 4];
        let (texture, view) = self.create_texture("state_texture", side, &zeros)?;
        let bind_group = guarded(&self.device, "state bind group", || {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("transition_bind_group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&self.metadata_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                ],
            })
        })?;
        Ok(GpuStateBuffer {
            texture,
            view,
            bind_group,
        })
    }

    fn blend(&mut self, current: &GpuStateBuffer, next: &mut GpuStateBuffer, params: &BlendParams) {
        let uniforms = TransitionUniforms::new(params, self.entity_count);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("transition_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("transition_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &next.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &current.bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Uniform buffer, bind group layout and render pipeline of the transition program.
fn create_pipeline(
    device: &wgpu::Device,
) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout, wgpu::Buffer) {
    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("transition_uniforms"),
        size: std::mem::size_of::<TransitionUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let state_texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("transition_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            state_texture_entry(1),
            state_texture_entry(2),
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("transition_pipeline_layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("transition_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::TRANSITION_SHADER.into()),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("transition_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_fullscreen"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_transition"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: STATE_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: Default::default(),
        multiview: None,
        cache: None,
    });

    (pipeline, bind_group_layout, uniform_buffer)
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    side: u32,
    data: &[u8],
) -> Result<(wgpu::Texture, wgpu::TextureView), EngineError> {
    guarded(device, label, || {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: side,
                    height: side,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: STATE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&Default::default());
        (texture, view)
    })
}

/// Run `create` inside out-of-memory and validation error scopes, turning any
/// captured error into [`EngineError::Allocation`].
fn guarded<T>(
    device: &wgpu::Device,
    what: &str,
    create: impl FnOnce() -> T,
) -> Result<T, EngineError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match out_of_memory.or(validation) {
        Some(err) => {
            tracing::error!(%err, what, "GPU resource creation failed");
            Err(EngineError::Allocation(format!("{what}: {err}")))
        }
        None => Ok(value),
    }
}
