use std::path::PathBuf;
use thiserror::Error;

/// Which half of program creation rejected the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramStage {
    /// Shader module creation (parsing and validation of the source text).
    Compile,
    /// Pipeline creation (entry points and bind group interface).
    Link,
}

impl std::fmt::Display for ProgramStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramStage::Compile => write!(f, "compile"),
            ProgramStage::Link => write!(f, "link"),
        }
    }
}

/// Every failure the application can hit. All of them happen during setup and are fatal.
#[derive(Debug, Error)]
pub enum ParticlesError {
    #[error("could not load configuration from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("could not create graphics context: {0}")]
    ContextCreation(String),

    #[error("{program} program {stage} failure: {log}")]
    ProgramCompile {
        program: String,
        stage: ProgramStage,
        log: String,
    },

    #[error("could not load sprite texture {path}: {reason}")]
    TextureLoad { path: PathBuf, reason: String },

    #[error("could not allocate {0}")]
    ResourceAllocation(String),
}

impl ParticlesError {
    /// Short tag naming the setup stage that failed.
    pub fn stage_tag(&self) -> &'static str {
        match self {
            ParticlesError::ConfigLoad { .. } => "config",
            ParticlesError::ContextCreation(_) => "context",
            ParticlesError::ProgramCompile { .. } => "program",
            ParticlesError::TextureLoad { .. } => "texture",
            ParticlesError::ResourceAllocation(_) => "buffers",
        }
    }

    /// One line diagnostic printed before the process exits.
    pub fn diagnostic(&self) -> String {
        format!("[{}] {}", self.stage_tag(), self)
    }
}

pub type Result<T> = std::result::Result<T, ParticlesError>;
