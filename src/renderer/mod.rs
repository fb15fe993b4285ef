pub mod wgpu_context;
pub mod surface_manager;
pub mod camera;
pub mod sprite_texture;
