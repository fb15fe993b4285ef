use wgpu::util::DeviceExt;
use crate::error::Result;
use crate::particles::particle_buffers::ParticleStateStore;
use crate::renderer::camera::CameraBounds;
use crate::renderer::sprite_texture::SpriteTexture;
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::program_compiler::{compile_module, link_pipeline, ProgramSource};

/// Half of a sprite's edge length in world units.
pub const SPRITE_HALF_SIZE: f32 = 0.0025;
/// Phase added to the tint cycle every frame.
pub const TINT_STEP: f32 = 0.001;
const VERTICES_PER_SPRITE: u32 = 6;

/// Sources and destinations both weighted by one, so overlapping sprites get brighter.
pub const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::Zero,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Slowly cycling swarm color.
#[derive(Debug, Default, Clone, Copy)]
pub struct TintCycle {
    phase: f32,
}

impl TintCycle {
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Steps the phase and returns the new tint.
    pub fn advance(&mut self) -> [f32; 4] {
        self.phase += TINT_STEP;
        self.tint()
    }

    pub fn tint(&self) -> [f32; 4] {
        [self.phase.sin(), self.phase.cos(), 1.0, 1.0]
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderParams {
    view_proj: [[f32; 4]; 4],
    tint: [f32; 4],
    sprite_half_size: f32,
    _padding: [f32; 3],
}

impl RenderParams {
    pub fn new(bounds: &CameraBounds) -> Self {
        Self {
            view_proj: bounds.projection().to_cols_array_2d(),
            tint: [1.0; 4],
            sprite_half_size: SPRITE_HALF_SIZE,
            _padding: [0.0; 3],
        }
    }
}

/// The particle render pipeline. Never writes to the particle buffers.
pub struct ParticleDrawer {
    render_pipeline: wgpu::RenderPipeline,
    params: RenderParams,
    params_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ParticleDrawer {
    pub fn builtin_source() -> ProgramSource {
        ProgramSource::new("render", include_str!("shaders/particle_drawer.wgsl"))
    }

    pub fn new(
        wgpu_context: &WgpuContext,
        source: &ProgramSource,
        store: &ParticleStateStore,
        sprite: &SpriteTexture,
        bounds: &CameraBounds,
    ) -> Result<Self> {
        let device = wgpu_context.get_device();
        let params = RenderParams::new(bounds);

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Render Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = Self::create_bind_group_layout(wgpu_context);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Render Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(sprite.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sprite.sampler()),
                },
            ],
        });

        let shader = compile_module(wgpu_context, source)?;
        let target_format = wgpu_context.target_format();

        let render_pipeline = link_pipeline(wgpu_context, source, |device| {
            let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Particle Render Pipeline Layout"),
                bind_group_layouts: &[store.view_layout(), &bind_group_layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Particle Render Pipeline"),
                layout: Some(&render_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    // Quads are generated in the shader, there is no vertex input.
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: Some(ADDITIVE_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        })?;

        log::info!("Render program ready (sprite {:?})", sprite.size());

        Ok(Self {
            render_pipeline,
            params,
            params_buffer,
            bind_group,
        })
    }

    fn create_bind_group_layout(wgpu_context: &WgpuContext) -> wgpu::BindGroupLayout {
        wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Render Bind Group Layout"),
            entries: &[
                // Binding 0: projection, tint and sprite size
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding 1: the sprite
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Binding 2: the sprite sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    pub fn set_tint(&mut self, tint: [f32; 4]) {
        self.params.tint = tint;
    }

    /// Uploads this frame's uniforms. Call before the render pass is submitted.
    pub fn prepare(&self, wgpu_context: &WgpuContext) {
        wgpu_context.get_queue().write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass, store: &ParticleStateStore) {
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, store.current_read_view(), &[]);
        render_pass.set_bind_group(1, &self.bind_group, &[]);
        render_pass.draw(0..VERTICES_PER_SPRITE, 0..store.particle_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_starts_at_phase_zero_and_cycles() {
        let mut cycle = TintCycle::default();
        assert_eq!(cycle.tint(), [0.0, 1.0, 1.0, 1.0]);

        let tint = cycle.advance();
        assert!((cycle.phase() - TINT_STEP).abs() < f32::EPSILON);
        assert!((tint[0] - TINT_STEP.sin()).abs() < 1e-6);
        assert!((tint[1] - TINT_STEP.cos()).abs() < 1e-6);
        assert_eq!(tint[2], 1.0);
    }

    #[test]
    fn tint_phase_increases_monotonically() {
        let mut cycle = TintCycle::default();
        let mut previous = cycle.phase();
        for _ in 0..1000 {
            cycle.advance();
            assert!(cycle.phase() > previous);
            previous = cycle.phase();
        }
        assert!((cycle.phase() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn render_params_match_the_uniform_layout() {
        // mat4x4, vec4, f32 rounded up to a 16 byte multiple.
        assert_eq!(std::mem::size_of::<RenderParams>(), 96);
    }

    #[test]
    fn blending_is_additive() {
        assert_eq!(ADDITIVE_BLENDING.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(ADDITIVE_BLENDING.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(ADDITIVE_BLENDING.color.operation, wgpu::BlendOperation::Add);
    }
}
