pub mod gpu_buffer;
pub mod ping_pong;
pub mod program_compiler;
pub mod gpu_profiling;
