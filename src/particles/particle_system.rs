use crate::error::Result;
use crate::input_manager::PointerSample;
use crate::particles::particle_advance::AdvanceProgram;
use crate::particles::particle_buffers::{ParticleStateStore, SeedPolicy};
use crate::particles::particle_drawer::{ParticleDrawer, TintCycle};
use crate::renderer::camera::CameraBounds;
use crate::renderer::sprite_texture::SpriteTexture;
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::program_compiler::ProgramSource;

/// Program text for the two particle passes.
pub struct ParticlePrograms {
    pub advance: ProgramSource,
    pub render: ProgramSource,
}

impl Default for ParticlePrograms {
    fn default() -> Self {
        Self {
            advance: AdvanceProgram::builtin_source(),
            render: ParticleDrawer::builtin_source(),
        }
    }
}

/// Particle state plus the two programs operating on it.
pub struct ParticleSystem {
    store: ParticleStateStore,
    advance: AdvanceProgram,
    drawer: ParticleDrawer,
    tint: TintCycle,
}

impl ParticleSystem {
    pub fn new(
        wgpu_context: &WgpuContext,
        particle_count: u32,
        seed: SeedPolicy,
        bounds: &CameraBounds,
        sprite: &SpriteTexture,
        programs: &ParticlePrograms,
    ) -> Result<Self> {
        let store = ParticleStateStore::initialize(wgpu_context, particle_count, seed, bounds)?;
        let advance = AdvanceProgram::new(wgpu_context, &programs.advance, &store, bounds)?;
        let drawer = ParticleDrawer::new(wgpu_context, &programs.render, &store, sprite, bounds)?;

        Ok(Self {
            store,
            advance,
            drawer,
            tint: TintCycle::default(),
        })
    }

    /// Records the advance pass for every particle.
    pub fn advance(&mut self, wgpu_context: &WgpuContext, encoder: &mut wgpu::CommandEncoder, pointer: &PointerSample) {
        self.advance.set_pointer(pointer);
        self.advance.dispatch(wgpu_context, encoder, &self.store);
    }

    /// Makes the buffer written by the last advance the one that is read.
    pub fn swap(&mut self) {
        self.store.swap();
    }

    pub fn update_tint(&mut self, wgpu_context: &WgpuContext) {
        let tint = self.tint.advance();
        self.drawer.set_tint(tint);
        self.drawer.prepare(wgpu_context);
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        self.drawer.draw(render_pass, &self.store);
    }

    pub fn store(&self) -> &ParticleStateStore {
        &self.store
    }

    pub fn particle_count(&self) -> u32 {
        self.store.particle_count()
    }
}
