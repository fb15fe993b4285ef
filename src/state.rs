use std::path::Path;
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;
use crate::config::Config;
use crate::error::Result;
use crate::input_manager::{InputAction, InputManager};
use crate::particles::particle_buffers::SeedPolicy;
use crate::particles::particle_system::{ParticlePrograms, ParticleSystem};
use crate::renderer::camera::CameraBounds;
use crate::renderer::sprite_texture::SpriteTexture;
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::gpu_profiling::PassTimings;

/// Lifecycle of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLoopState {
    Uninitialized,
    Ready,
    Running,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Context, programs and buffers all exist.
    SetupComplete,
    SetupFailed,
    FrameStarted,
    CloseRequested,
}

impl FrameLoopState {
    /// Next state, or `None` if `event` is not valid in this state.
    pub fn transition(self, event: LoopEvent) -> Option<Self> {
        use FrameLoopState::*;
        match (self, event) {
            (Uninitialized, LoopEvent::SetupComplete) => Some(Ready),
            (Uninitialized, LoopEvent::SetupFailed) => Some(Terminated),
            (Ready | Running, LoopEvent::FrameStarted) => Some(Running),
            (Uninitialized | Ready | Running, LoopEvent::CloseRequested) => Some(Terminated),
            _ => None,
        }
    }
}

/// Resolution the camera aspect ratio is derived from. A borderless fullscreen
/// window covers its monitor, so the monitor size wins over the configured one.
pub fn camera_resolution(config: &Config, monitor: Option<PhysicalSize<u32>>) -> (u32, u32) {
    match monitor {
        Some(size) if config.fullscreen && size.width > 0 && size.height > 0 => (size.width, size.height),
        _ => (config.width, config.height),
    }
}

/// Everything the frame loop owns, created once and used for the process lifetime.
pub struct State {
    wgpu_context: WgpuContext,
    bounds: CameraBounds,
    particles: ParticleSystem,
    input_manager: InputManager,
    timings: PassTimings,
    background_color: wgpu::Color,
}

impl State {
    pub async fn new(window: Arc<Window>, config: &Config, sprite_path: &Path) -> Result<Self> {
        let monitor = if config.fullscreen {
            window.current_monitor().map(|monitor| monitor.size())
        } else {
            None
        };
        let wgpu_context = WgpuContext::new(window, config.vsync).await?;

        // The camera is fixed for the whole run.
        let (width, height) = camera_resolution(config, monitor);
        let bounds = CameraBounds::from_resolution(width, height);

        let sprite = SpriteTexture::from_file(&wgpu_context, sprite_path)?;
        let particles = ParticleSystem::new(
            &wgpu_context,
            config.particle_count,
            SeedPolicy::Entropy,
            &bounds,
            &sprite,
            &ParticlePrograms::default(),
        )?;
        let timings = PassTimings::new(&wgpu_context)?;

        log::info!("Simulating {} particles in {:?}", particles.particle_count(), bounds);

        Ok(Self {
            wgpu_context,
            bounds,
            particles,
            input_manager: InputManager::new(),
            timings,
            background_color: wgpu::Color::TRANSPARENT,
        })
    }

    pub fn request_redraw(&self) {
        if let Some(surface_manager) = self.wgpu_context.surface_manager() {
            surface_manager.get_window().request_redraw();
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.wgpu_context.resize(width, height);
    }

    pub fn input(&mut self, event: &WindowEvent) -> InputAction {
        self.input_manager.manage_input(event)
    }

    /// Runs one frame. Surface loss is recovered by reconfiguring and skipping the frame.
    pub fn frame(&mut self) {
        match self.render() {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.wgpu_context.window_size();
                self.wgpu_context.resize(size.x as u32, size.y as u32);
            }
            Err(e) => {
                log::error!("Unable to render: {:?}", e);
            }
        }
    }

    fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let Some(surface_manager) = self.wgpu_context.surface_manager() else {
            return Ok(());
        };
        // We can't render unless the window is configured
        if !surface_manager.is_surface_configured() {
            return Ok(());
        }

        let output = surface_manager.get_surface().get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.wgpu_context.get_device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        // 1. Clear
        {
            let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Self::color_attachment(&view, wgpu::LoadOp::Clear(self.background_color))],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        // 2. Pointer in world space
        let pointer = self.input_manager.sample(&self.bounds, self.wgpu_context.window_size());
        log::trace!("Pointer {:?}", pointer);

        // 3. Advance every particle into the write buffer
        {
            let mut scope = self.timings.profiler().scope("advance", &mut encoder);
            self.particles.advance(&self.wgpu_context, &mut scope, &pointer);
        }

        // 4. What was just written becomes what is read
        self.particles.swap();

        // 5. Tint
        self.particles.update_tint(&self.wgpu_context);

        // 6. Draw from the freshly written buffer
        {
            let mut scope = self.timings.profiler().scope("render", &mut encoder);
            let mut render_pass = scope.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Render Pass"),
                color_attachments: &[Self::color_attachment(&view, wgpu::LoadOp::Load)],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.particles.draw(&mut render_pass);
        }

        self.timings.resolve(&mut encoder);
        self.wgpu_context.get_queue().submit(std::iter::once(encoder.finish()));

        // 7. Present
        output.present();
        self.timings.end_frame();

        Ok(())
    }

    fn color_attachment(view: &wgpu::TextureView, load: wgpu::LoadOp<wgpu::Color>) -> Option<wgpu::RenderPassColorAttachment<'_>> {
        Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })
    }
}
