pub mod particle_buffers;
pub mod particle_advance;
pub mod particle_drawer;
pub mod particle_system;
