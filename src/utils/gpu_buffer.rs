use std::marker::PhantomData;
use crate::error::{ParticlesError, Result};
use crate::renderer::wgpu_context::WgpuContext;

/// A fixed size GPU buffer holding `len` elements of `T`.
#[derive(Debug)]
pub struct GpuBuffer<T> {
    buffer: wgpu::Buffer,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> GpuBuffer<T> {
    /// Allocates a buffer sized exactly for `data` and uploads it.
    pub fn new(wgpu_context: &WgpuContext, label: &str, data: &[T], usage: wgpu::BufferUsages) -> Result<Self> {
        let device = wgpu_context.get_device();
        let size = std::mem::size_of_val(data) as u64;
        let limits = device.limits();

        if size == 0 {
            return Err(ParticlesError::ResourceAllocation(format!("{label}: buffer would be empty")));
        }
        if size > limits.max_buffer_size {
            return Err(ParticlesError::ResourceAllocation(format!(
                "{label}: {size} bytes exceeds the device buffer limit of {} bytes",
                limits.max_buffer_size
            )));
        }
        if usage.contains(wgpu::BufferUsages::STORAGE) && size > limits.max_storage_buffer_binding_size as u64 {
            return Err(ParticlesError::ResourceAllocation(format!(
                "{label}: {size} bytes exceeds the storage binding limit of {} bytes",
                limits.max_storage_buffer_binding_size
            )));
        }

        let usage = usage | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC;

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ParticlesError::ResourceAllocation(format!("{label}: {error}")));
        }

        wgpu_context.get_queue().write_buffer(&buffer, 0, bytemuck::cast_slice(data));

        Ok(Self { buffer, len: data.len(), _marker: PhantomData })
    }

    /// Copies the buffer back to the CPU, blocking until the GPU is done with it.
    pub fn download(&self, wgpu_context: &WgpuContext) -> Result<Vec<T>> {
        let device = wgpu_context.get_device();
        let queue = wgpu_context.get_queue();
        let size = self.size_bytes();

        // A buffer the CPU can map, filled by a GPU side copy.
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer (Download)"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Download Encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging_buffer, 0, size);
        queue.submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| ParticlesError::ResourceAllocation(format!("readback poll: {e}")))?;

        match receiver.recv() {
            Ok(Ok(())) => {
                let mapped_range = buffer_slice.get_mapped_range();
                let downloaded: Vec<T> = bytemuck::cast_slice(&mapped_range).to_vec();
                drop(mapped_range);
                staging_buffer.unmap();
                Ok(downloaded)
            }
            Ok(Err(e)) => Err(ParticlesError::ResourceAllocation(format!("readback map: {e}"))),
            Err(e) => Err(ParticlesError::ResourceAllocation(format!("readback channel: {e}"))),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.buffer.size()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}
