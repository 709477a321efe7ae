//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`PipelineError`] covers the failure modes that can be
//! reported to a caller:
//! - Shader set configuration errors (fatal at pipeline construction)
//! - State vectors rejected by validation
//! - Failures reported by the backend build primitive or the shader compiler
//! - Configuration parsing errors
//!
//! The hot-path entry points of [`GraphicsPipeline`] never surface these;
//! they log and degrade to a null handle instead.
//!
//! [`GraphicsPipeline`]: crate::pipeline::GraphicsPipeline

use thiserror::Error;

use crate::shader::ShaderStage;

/// The main error type for pipeline creation and caching.
#[derive(Error, Debug)]
pub enum PipelineError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A shader was placed into a slot designated for another stage.
    #[error("Shader stage mismatch: {actual:?} shader bound to the {slot:?} slot")]
    ShaderStageMismatch {
        /// The slot the shader was assigned to
        slot: ShaderStage,
        /// The stage the shader reports
        actual: ShaderStage,
    },

    /// Graphics pipelines cannot be created without a vertex shader.
    #[error("Graphics pipeline requires a vertex shader")]
    MissingVertexShader,

    /// Settings could not be parsed.
    #[error("Invalid settings: {0}")]
    Config(#[from] serde_json::Error),

    // ========================================================================
    // State & Build Errors
    // ========================================================================
    /// The state vector failed validation.
    #[error("Invalid pipeline state: {0}")]
    InvalidState(String),

    /// The backend failed to create the pipeline object.
    #[error("Failed to build graphics pipeline: {0}")]
    BuildFailed(String),

    /// The shader compiler failed to produce a module for a stage.
    #[error("Failed to compile {stage:?} shader module: {reason}")]
    ShaderCompilationFailed {
        /// The stage being compiled
        stage: ShaderStage,
        /// Backend-provided reason
        reason: String,
    },

    // ========================================================================
    // Worker Errors
    // ========================================================================
    /// The background compile queue has been shut down.
    #[error("Pipeline compiler workers have shut down")]
    WorkerShutdown,

    /// A compiler thread could not be started.
    #[error("Failed to spawn compiler thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Alias for `Result<T, PipelineError>`.
pub type Result<T> = std::result::Result<T, PipelineError>;
