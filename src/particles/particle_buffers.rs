use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use crate::error::{ParticlesError, Result};
use crate::renderer::camera::CameraBounds;
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::gpu_buffer::GpuBuffer;
use crate::utils::ping_pong::PingPong;

/// Initial positions are drawn from [-1, 1] per axis and divided by this,
/// keeping them inside [-0.98, 0.98] of the camera half extents.
pub const SPAWN_DIVISOR: f32 = 1.02;

/// State of one particle, laid out as a single `vec4<f32>` texel.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleRecord {
    pub position: Vec2,
    /// Velocity in the built-in advance program. Zero at spawn.
    pub aux: Vec2,
}

impl ParticleRecord {
    pub fn new(position: Vec2) -> Self {
        Self { position, aux: Vec2::ZERO }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Seeded from the operating system.
    Entropy,
    /// Same distribution on every run.
    Fixed(u64),
}

/// Generates `count` particles uniformly distributed inside the camera bounds.
pub fn generate_initial_records(count: u32, seed: SeedPolicy, bounds: &CameraBounds) -> Vec<ParticleRecord> {
    match seed {
        SeedPolicy::Entropy => scatter(count, bounds, &mut StdRng::from_os_rng()),
        SeedPolicy::Fixed(seed) => scatter(count, bounds, &mut StdRng::seed_from_u64(seed)),
    }
}

fn scatter(count: u32, bounds: &CameraBounds, rng: &mut impl Rng) -> Vec<ParticleRecord> {
    let half_extents = bounds.half_extents();
    let center = Vec2::new(bounds.left + half_extents.x, bounds.bottom + half_extents.y);

    (0..count)
        .map(|_| {
            let normalized = Vec2::new(
                rng.random_range(-1.0f32..=1.0) / SPAWN_DIVISOR,
                rng.random_range(-1.0f32..=1.0) / SPAWN_DIVISOR,
            );
            ParticleRecord::new(center + normalized * half_extents)
        })
        .collect()
}

/// One physical particle buffer and the bind groups that expose it.
pub struct ParticleSlot {
    records: GpuBuffer<ParticleRecord>,
    /// Read-only texel view of `records`.
    view: wgpu::BindGroup,
    /// Read-write binding of `records` used as the advance output.
    capture: wgpu::BindGroup,
}

impl ParticleSlot {
    pub fn records(&self) -> &GpuBuffer<ParticleRecord> {
        &self.records
    }

    pub fn view(&self) -> &wgpu::BindGroup {
        &self.view
    }

    pub fn capture(&self) -> &wgpu::BindGroup {
        &self.capture
    }
}

/// The double buffered particle state.
///
/// Only the role bookkeeping lives here. Buffer contents change exclusively
/// through the advance program writing into the current write slot.
pub struct ParticleStateStore {
    slots: PingPong<ParticleSlot>,
    view_layout: wgpu::BindGroupLayout,
    capture_layout: wgpu::BindGroupLayout,
    particle_count: u32,
}

impl ParticleStateStore {
    pub fn initialize(wgpu_context: &WgpuContext, count: u32, seed: SeedPolicy, bounds: &CameraBounds) -> Result<Self> {
        if count == 0 {
            return Err(ParticlesError::ResourceAllocation("particle buffers: particle count is zero".to_string()));
        }
        let records = generate_initial_records(count, seed, bounds);
        Self::from_records(wgpu_context, &records)
    }

    /// Builds both buffers from the same initial records.
    pub fn from_records(wgpu_context: &WgpuContext, records: &[ParticleRecord]) -> Result<Self> {
        let particle_count = u32::try_from(records.len())
            .map_err(|_| ParticlesError::ResourceAllocation(format!("particle buffers: {} particles", records.len())))?;

        let view_layout = Self::create_view_layout(wgpu_context);
        let capture_layout = Self::create_capture_layout(wgpu_context);

        let first = Self::create_slot(wgpu_context, "Particle Buffer A", records, &view_layout, &capture_layout)?;
        let second = Self::create_slot(wgpu_context, "Particle Buffer B", records, &view_layout, &capture_layout)?;

        log::info!(
            "Allocated 2 particle buffers of {} records ({} bytes each)",
            particle_count,
            first.records.size_bytes()
        );

        Ok(Self {
            slots: PingPong::new(first, second),
            view_layout,
            capture_layout,
            particle_count,
        })
    }

    fn create_slot(
        wgpu_context: &WgpuContext,
        label: &str,
        records: &[ParticleRecord],
        view_layout: &wgpu::BindGroupLayout,
        capture_layout: &wgpu::BindGroupLayout,
    ) -> Result<ParticleSlot> {
        let records = GpuBuffer::new(wgpu_context, label, records, wgpu::BufferUsages::STORAGE)?;
        let device = wgpu_context.get_device();

        let view = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} View")),
            layout: view_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: records.buffer().as_entire_binding(),
            }],
        });

        let capture = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Capture")),
            layout: capture_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: records.buffer().as_entire_binding(),
            }],
        });

        Ok(ParticleSlot { records, view, capture })
    }

    fn create_view_layout(wgpu_context: &WgpuContext) -> wgpu::BindGroupLayout {
        // Vertex stage storage reads are missing on some downlevel backends.
        // Those can still advance particles, but cannot draw them.
        let mut visibility = wgpu::ShaderStages::COMPUTE;
        if wgpu_context.get_adapter().get_downlevel_capabilities().flags.contains(wgpu::DownlevelFlags::VERTEX_STORAGE) {
            visibility |= wgpu::ShaderStages::VERTEX;
        }

        wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle View Layout"),
            entries: &[
                // Binding 0: the particle records, one vec4<f32> per particle
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ParticleRecord>() as u64),
                    },
                    count: None,
                },
            ],
        })
    }

    fn create_capture_layout(wgpu_context: &WgpuContext) -> wgpu::BindGroupLayout {
        wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Capture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ParticleRecord>() as u64),
                    },
                    count: None,
                },
            ],
        })
    }

    /// Texel view of the buffer holding the latest particle state.
    pub fn current_read_view(&self) -> &wgpu::BindGroup {
        self.slots.read().view()
    }

    /// Buffer the next advance pass writes into.
    pub fn current_write_buffer(&self) -> &wgpu::Buffer {
        self.slots.write().records().buffer()
    }

    /// Binding of the write buffer as the advance output.
    pub fn current_capture_target(&self) -> &wgpu::BindGroup {
        self.slots.write().capture()
    }

    /// Exchanges the read and write roles. Views follow their slot, so after
    /// the swap the read view points at the freshly written buffer.
    pub fn swap(&mut self) {
        self.slots.swap();
        log::trace!("Particle buffers swapped, reading slot {}", self.slots.read_index());
    }

    pub fn read_index(&self) -> usize {
        self.slots.read_index()
    }

    pub fn slot(&self, index: usize) -> &ParticleSlot {
        self.slots.get(index)
    }

    pub fn view_layout(&self) -> &wgpu::BindGroupLayout {
        &self.view_layout
    }

    pub fn capture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.capture_layout
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn download_read(&self, wgpu_context: &WgpuContext) -> Result<Vec<ParticleRecord>> {
        self.slots.read().records().download(wgpu_context)
    }

    pub fn download_write(&self, wgpu_context: &WgpuContext) -> Result<Vec<ParticleRecord>> {
        self.slots.write().records().download(wgpu_context)
    }
}
