// Not every test file will use every function.
#![allow(dead_code)]

use tbo_particles::particles::particle_advance::AdvanceProgram;
use tbo_particles::particles::particle_buffers::ParticleStateStore;
use tbo_particles::renderer::sprite_texture::{SpriteImage, SpriteTexture};
use tbo_particles::renderer::wgpu_context::WgpuContext;
use tbo_particles::utils::program_compiler::ProgramSource;

/// Shared interface of every advance program: read view, capture target, per frame params.
const ADVANCE_INTERFACE: &str = r#"
struct AdvanceParams {
    camera_bounds: vec4<f32>,
    pointer: vec4<f32>,
    particle_count: u32,
}

@group(0) @binding(0) var<storage, read> particles_in: array<vec4<f32>>;
@group(1) @binding(0) var<storage, read_write> particles_out: array<vec4<f32>>;
@group(2) @binding(0) var<uniform> params: AdvanceParams;
"#;

/// Builds an advance program whose body maps `particle` (the input record) to the output record.
pub fn advance_program_with(name: &str, expression: &str) -> ProgramSource {
    let wgsl = format!(
        "{ADVANCE_INTERFACE}
@compute @workgroup_size(64)
fn advance(@builtin(global_invocation_id) id: vec3<u32>) {{
    let index = id.x;
    if (index >= params.particle_count) {{
        return;
    }}
    let particle = particles_in[index];
    particles_out[index] = {expression};
}}
"
    );
    ProgramSource::new(name, wgsl)
}

pub fn identity_program() -> ProgramSource {
    advance_program_with("identity", "particle")
}

pub fn offset_program(offset: [f32; 4]) -> ProgramSource {
    advance_program_with(
        "offset",
        &format!(
            "particle + vec4<f32>({:?}, {:?}, {:?}, {:?})",
            offset[0], offset[1], offset[2], offset[3]
        ),
    )
}

/// Headless GPU context. `None` when the machine has no usable adapter,
/// in which case the GPU tests return early.
pub fn setup() -> Option<WgpuContext> {
    match pollster::block_on(WgpuContext::new_for_test()) {
        Ok(wgpu_context) => Some(wgpu_context),
        Err(e) => {
            eprintln!("Skipping GPU test: {}", e);
            None
        }
    }
}

/// Records and submits one advance pass, without swapping.
pub fn run_advance(wgpu_context: &WgpuContext, advance: &AdvanceProgram, store: &ParticleStateStore) {
    let mut encoder = wgpu_context.get_device().create_command_encoder(
        &wgpu::CommandEncoderDescriptor { label: Some("Advance test Encoder") }
    );
    advance.dispatch(wgpu_context, &mut encoder, store);
    let idx = wgpu_context.get_queue().submit([encoder.finish()]);
    wgpu_context.get_device().poll(wgpu::PollType::WaitForSubmissionIndex(idx)).unwrap();
}

/// Records as raw bits, for exact comparisons.
pub fn bits<T: bytemuck::Pod>(records: &[T]) -> Vec<u32> {
    bytemuck::cast_slice(records).to_vec()
}

/// Draw tests need storage buffer reads in the vertex stage.
pub fn supports_vertex_storage(wgpu_context: &WgpuContext) -> bool {
    let supported = wgpu_context
        .get_adapter()
        .get_downlevel_capabilities()
        .flags
        .contains(wgpu::DownlevelFlags::VERTEX_STORAGE);
    if !supported {
        eprintln!("Skipping draw test: adapter cannot read storage buffers from the vertex stage");
    }
    supported
}

pub fn white_sprite(wgpu_context: &WgpuContext) -> SpriteTexture {
    let image = SpriteImage { width: 1, height: 1, rgba: vec![255; 4] };
    SpriteTexture::from_image(wgpu_context, &image)
}

pub const TARGET_SIZE: u32 = 64;

/// Runs `draw` in one render pass over a cleared `TARGET_SIZE` square target
/// and reads the RGBA8 pixels back, rows top to bottom.
pub fn render_offscreen(wgpu_context: &WgpuContext, draw: impl FnOnce(&mut wgpu::RenderPass<'_>)) -> Vec<u8> {
    let device = wgpu_context.get_device();
    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d { width: TARGET_SIZE, height: TARGET_SIZE, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu_context.target_format(),
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let bytes_per_row = TARGET_SIZE * 4;
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Offscreen Readback"),
        size: (bytes_per_row * TARGET_SIZE) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Offscreen Encoder") });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Offscreen Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        draw(&mut render_pass);
    }
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(TARGET_SIZE),
            },
        },
        target.size(),
    );
    let idx = wgpu_context.get_queue().submit([encoder.finish()]);

    readback.slice(..).map_async(wgpu::MapMode::Read, |result| result.unwrap());
    device.poll(wgpu::PollType::WaitForSubmissionIndex(idx)).unwrap();
    device.poll(wgpu::PollType::Wait).unwrap();
    let pixels = readback.slice(..).get_mapped_range().to_vec();
    readback.unmap();
    pixels
}

pub fn pixel(pixels: &[u8], x: u32, y: u32) -> &[u8] {
    let offset = ((y * TARGET_SIZE + x) * 4) as usize;
    &pixels[offset..offset + 4]
}
