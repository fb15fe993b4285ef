use std::borrow::Cow;
use crate::error::{ParticlesError, ProgramStage, Result};
use crate::renderer::wgpu_context::WgpuContext;

/// WGSL program text plus the name used in diagnostics.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    name: String,
    wgsl: Cow<'static, str>,
}

impl ProgramSource {
    pub fn new(name: impl Into<String>, wgsl: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into(), wgsl: wgsl.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wgsl(&self) -> &str {
        &self.wgsl
    }
}

/// Compiles the program text into a shader module.
///
/// Validation errors are captured instead of reaching the device's
/// uncaptured error handler, and reported with the compiler messages.
pub fn compile_module(wgpu_context: &WgpuContext, source: &ProgramSource) -> Result<wgpu::ShaderModule> {
    let device = wgpu_context.get_device();

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(source.name()),
        source: wgpu::ShaderSource::Wgsl(source.wgsl.clone()),
    });
    let scope_error = pollster::block_on(device.pop_error_scope());

    let info = pollster::block_on(module.get_compilation_info());
    let mut diagnostics = String::new();
    for message in &info.messages {
        match message.message_type {
            wgpu::CompilationMessageType::Error => {
                match &message.location {
                    Some(location) => diagnostics.push_str(&format!(
                        "{}:{}: {}\n",
                        location.line_number, location.line_position, message.message
                    )),
                    None => diagnostics.push_str(&format!("{}\n", message.message)),
                }
            }
            wgpu::CompilationMessageType::Warning => {
                log::warn!("{} program: {}", source.name(), message.message);
            }
            wgpu::CompilationMessageType::Info => {}
        }
    }

    if let Some(error) = scope_error {
        if diagnostics.is_empty() {
            diagnostics = error.to_string();
        }
    }

    if !diagnostics.is_empty() {
        return Err(ParticlesError::ProgramCompile {
            program: source.name().to_string(),
            stage: ProgramStage::Compile,
            log: diagnostics.trim_end().to_string(),
        });
    }

    log::debug!("Compiled {} program", source.name());
    Ok(module)
}

/// Runs a pipeline creation call and reports validation failures as link errors.
pub fn link_pipeline<P>(
    wgpu_context: &WgpuContext,
    source: &ProgramSource,
    create: impl FnOnce(&wgpu::Device) -> P,
) -> Result<P> {
    let device = wgpu_context.get_device();

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = create(device);

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(ParticlesError::ProgramCompile {
            program: source.name().to_string(),
            stage: ProgramStage::Link,
            log: error.to_string(),
        }),
        None => {
            log::debug!("Linked {} program", source.name());
            Ok(pipeline)
        }
    }
}

/// A compiled compute pipeline and the workgroup size its entry point declares.
pub struct ComputeProgram {
    pipeline: wgpu::ComputePipeline,
    workgroup_size: u32,
}

impl ComputeProgram {
    pub fn new(
        wgpu_context: &WgpuContext,
        source: &ProgramSource,
        entry_point: &str,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        workgroup_size: u32,
    ) -> Result<Self> {
        let module = compile_module(wgpu_context, source)?;

        let pipeline = link_pipeline(wgpu_context, source, |device| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("Compute Pipeline Layout for {}", entry_point)),
                bind_group_layouts,
                push_constant_ranges: &[],
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&format!("Compute Pipeline for {}", entry_point)),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(entry_point),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        })?;

        Ok(Self { pipeline, workgroup_size })
    }

    /// Dispatches one invocation per item, rounded up to whole workgroups.
    pub fn dispatch_by_items(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        item_count: u32,
        bind_groups: &[&wgpu::BindGroup],
    ) {
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        });

        compute_pass.set_pipeline(&self.pipeline);
        for (index, bind_group) in bind_groups.iter().enumerate() {
            compute_pass.set_bind_group(index as u32, *bind_group, &[]);
        }
        compute_pass.dispatch_workgroups(self.workgroups_for(item_count), 1, 1);
    }

    pub fn workgroups_for(&self, item_count: u32) -> u32 {
        item_count.div_ceil(self.workgroup_size)
    }
}
