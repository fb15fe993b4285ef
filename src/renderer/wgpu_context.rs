use std::sync::Arc;
use glam::Vec2;
use wgpu::Adapter;
use winit::window::Window;

use crate::error::{ParticlesError, Result};
use crate::renderer::surface_manager::SurfaceManager;

/// Features used for GPU pass timings. Requested only when the adapter has them.
const PROFILING_FEATURES: wgpu::Features = wgpu::Features::TIMESTAMP_QUERY
    .union(wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS);

pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_manager: Option<SurfaceManager>,
    adapter: Adapter,
}

impl WgpuContext {
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self> {
        // The instance is a handle to our GPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| ParticlesError::ContextCreation(format!("surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            }).await
            .map_err(|e| ParticlesError::ContextCreation(format!("adapter: {e}")))?;

        let (device, queue) = Self::request_device(&adapter, "Particles Device").await?;

        let mut surface_manager = SurfaceManager::new(window, surface, &adapter, vsync)?;
        let size = surface_manager.window_size();
        surface_manager.resize(size.width, size.height, &device);

        log::info!("Using adapter {:?}", adapter.get_info());

        Ok(Self {
            device,
            queue,
            surface_manager: Some(surface_manager),
            adapter,
        })
    }

    /// Headless context without a window, used by the GPU tests.
    pub async fn new_for_test() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(_) => instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    compatible_surface: None,
                    force_fallback_adapter: true,
                })
                .await
                .map_err(|e| ParticlesError::ContextCreation(format!("adapter: {e}")))?,
        };

        let (device, queue) = Self::request_device(&adapter, "Test Device").await?;

        Ok(Self {
            device,
            queue,
            surface_manager: None,
            adapter,
        })
    }

    async fn request_device(adapter: &Adapter, label: &str) -> Result<(wgpu::Device, wgpu::Queue)> {
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(label),
                required_features: adapter.features() & PROFILING_FEATURES,
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .map_err(|e| ParticlesError::ContextCreation(format!("device: {e}")))
    }

    pub fn window_size(&self) -> Vec2 {
        match &self.surface_manager {
            Some(surface_manager) => {
                let size = surface_manager.window_size();
                Vec2::new(size.width as f32, size.height as f32)
            }
            None => Vec2::ZERO,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(surface_manager) = self.surface_manager.as_mut() {
            surface_manager.resize(width, height, &self.device);
        }
    }

    pub fn surface_manager(&self) -> Option<&SurfaceManager> {
        self.surface_manager.as_ref()
    }

    /// Format of the render target. Headless contexts render into a plain sRGB texture.
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.surface_manager
            .as_ref()
            .map(|s| s.get_config().format)
            .unwrap_or(wgpu::TextureFormat::Rgba8UnormSrgb)
    }

    pub fn supports_profiling(&self) -> bool {
        self.device.features().contains(PROFILING_FEATURES)
    }

    pub fn get_device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn get_queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn get_adapter(&self) -> &Adapter {
        &self.adapter
    }
}
