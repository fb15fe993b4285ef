use wgpu::util::DeviceExt;
use crate::error::Result;
use crate::input_manager::PointerSample;
use crate::particles::particle_buffers::ParticleStateStore;
use crate::renderer::camera::CameraBounds;
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::program_compiler::{ComputeProgram, ProgramSource};

/// Must match `@workgroup_size` of the advance entry point.
pub const WORKGROUP_SIZE: u32 = 64;
pub const ENTRY_POINT: &str = "advance";

/// Per frame inputs of the advance program.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AdvanceParams {
    pub camera_bounds: [f32; 4],
    /// x, y, pressed, unused
    pub pointer: [f32; 4],
    pub particle_count: u32,
    _padding: [u32; 3],
}

impl AdvanceParams {
    pub fn new(bounds: &CameraBounds, particle_count: u32) -> Self {
        Self {
            camera_bounds: bounds.as_array(),
            pointer: [0.0; 4],
            particle_count,
            _padding: [0; 3],
        }
    }

    pub fn set_pointer(&mut self, sample: &PointerSample) {
        self.pointer = [
            sample.position.x,
            sample.position.y,
            if sample.pressed { 1.0 } else { 0.0 },
            0.0,
        ];
    }
}

/// The particle update pass. Runs one invocation per particle, reading the
/// store's read view and writing the record with the same index into the
/// store's write buffer.
pub struct AdvanceProgram {
    program: ComputeProgram,
    params: AdvanceParams,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
}

impl AdvanceProgram {
    pub fn builtin_source() -> ProgramSource {
        ProgramSource::new("advance", include_str!("shaders/particle_advance.wgsl"))
    }

    pub fn new(
        wgpu_context: &WgpuContext,
        source: &ProgramSource,
        store: &ParticleStateStore,
        bounds: &CameraBounds,
    ) -> Result<Self> {
        let device = wgpu_context.get_device();
        let params = AdvanceParams::new(bounds, store.particle_count());

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Advance Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Advance Params Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Advance Params Bind Group"),
            layout: &params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let program = ComputeProgram::new(
            wgpu_context,
            source,
            ENTRY_POINT,
            &[store.view_layout(), store.capture_layout(), &params_layout],
            WORKGROUP_SIZE,
        )?;

        log::info!("Advance program ready ({} workgroups per frame)", program.workgroups_for(store.particle_count()));

        Ok(Self {
            program,
            params,
            params_buffer,
            params_bind_group,
        })
    }

    pub fn set_pointer(&mut self, sample: &PointerSample) {
        self.params.set_pointer(sample);
    }

    pub fn params(&self) -> &AdvanceParams {
        &self.params
    }

    /// Records the update pass. Every particle is processed; nothing is rasterized.
    pub fn dispatch(&self, wgpu_context: &WgpuContext, encoder: &mut wgpu::CommandEncoder, store: &ParticleStateStore) {
        wgpu_context.get_queue().write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));

        self.program.dispatch_by_items(
            encoder,
            "Particle Advance Pass",
            store.particle_count(),
            &[store.current_read_view(), store.current_capture_target(), &self.params_bind_group],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn params_match_the_uniform_layout() {
        // Two vec4 then a u32, rounded up to a 16 byte multiple.
        assert_eq!(std::mem::size_of::<AdvanceParams>(), 48);
    }

    #[test]
    fn pointer_sample_is_packed_with_pressed_flag() {
        let bounds = CameraBounds::from_resolution(640, 480);
        let mut params = AdvanceParams::new(&bounds, 10);
        assert_eq!(params.pointer, [0.0; 4]);

        params.set_pointer(&PointerSample { position: Vec2::new(0.25, -0.1), pressed: true });
        assert_eq!(params.pointer, [0.25, -0.1, 1.0, 0.0]);

        params.set_pointer(&PointerSample { position: Vec2::new(0.5, 0.5), pressed: false });
        assert_eq!(params.pointer[2], 0.0);
        assert_eq!(params.camera_bounds, bounds.as_array());
        assert_eq!(params.particle_count, 10);
    }
}
