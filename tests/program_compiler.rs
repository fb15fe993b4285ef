use glam::Vec2;
use tbo_particles::error::{ParticlesError, ProgramStage};
use tbo_particles::particles::particle_advance::AdvanceProgram;
use tbo_particles::particles::particle_buffers::{ParticleRecord, ParticleStateStore};
use tbo_particles::renderer::camera::CameraBounds;
use tbo_particles::utils::program_compiler::{compile_module, ProgramSource};

mod common;

fn store(wgpu_context: &tbo_particles::renderer::wgpu_context::WgpuContext) -> ParticleStateStore {
    ParticleStateStore::from_records(wgpu_context, &[ParticleRecord::new(Vec2::ZERO); 8]).unwrap()
}

#[test]
fn builtin_advance_program_builds() {
    let Some(wgpu_context) = common::setup() else { return };
    let bounds = CameraBounds::from_resolution(640, 480);

    let advance = AdvanceProgram::new(&wgpu_context, &AdvanceProgram::builtin_source(), &store(&wgpu_context), &bounds);
    assert!(advance.is_ok());
}

#[test]
fn syntax_errors_fail_at_compile_stage() {
    let Some(wgpu_context) = common::setup() else { return };
    let source = ProgramSource::new("broken", "fn advance( {");

    match compile_module(&wgpu_context, &source) {
        Err(ParticlesError::ProgramCompile { program, stage, log }) => {
            assert_eq!(program, "broken");
            assert_eq!(stage, ProgramStage::Compile);
            assert!(!log.is_empty());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("broken program compiled"),
    }
}

#[test]
fn missing_entry_point_fails_at_link_stage() {
    let Some(wgpu_context) = common::setup() else { return };
    let bounds = CameraBounds::from_resolution(640, 480);
    let source = ProgramSource::new(
        "no_entry",
        "@compute @workgroup_size(64)\nfn something_else(@builtin(global_invocation_id) id: vec3<u32>) {}\n",
    );

    match AdvanceProgram::new(&wgpu_context, &source, &store(&wgpu_context), &bounds) {
        Err(error @ ParticlesError::ProgramCompile { .. }) => {
            assert!(matches!(error, ParticlesError::ProgramCompile { stage: ProgramStage::Link, .. }));
            assert!(error.diagnostic().starts_with("[program] no_entry program link failure"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("program without an advance entry point linked"),
    }
}

#[test]
fn interface_mismatch_fails_at_link_stage() {
    let Some(wgpu_context) = common::setup() else { return };
    let bounds = CameraBounds::from_resolution(640, 480);
    // Declares the read-only view as writable.
    let source = common::advance_program_with("mismatch", "particle")
        .wgsl()
        .replace("var<storage, read> particles_in", "var<storage, read_write> particles_in");

    let result = AdvanceProgram::new(&wgpu_context, &ProgramSource::new("mismatch", source), &store(&wgpu_context), &bounds);
    assert!(matches!(result, Err(ParticlesError::ProgramCompile { stage: ProgramStage::Link, .. })));
}
