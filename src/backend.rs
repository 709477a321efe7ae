//! Collaborator interfaces.
//!
//! The cache never talks to a graphics API directly. Object creation goes
//! through [`PipelineBackend`], per-stage code generation through
//! [`ShaderModuleCompiler`], and persistence of successfully built state
//! vectors through [`StateCacheWriter`].

use std::sync::Arc;

use smallvec::SmallVec;

use crate::errors::Result;
use crate::pipeline::{
    FragmentOutputState, GraphicsPipelineFlags, PipelineHandle, PreRasterizationState, ShaderSetKey, VertexInputState,
};
use crate::shader::{Shader, ShaderStage};
use crate::state::{DepthStencilState, GraphicsPipelineStateInfo};

/// Native pipeline layout shared by every instance of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingLayout {
    pub handle: u64,
    pub label: String,
}

impl BindingLayout {
    #[must_use]
    pub fn new(handle: u64, label: impl Into<String>) -> Self {
        Self {
            handle,
            label: label.into(),
        }
    }
}

/// Stage-specific information needed to specialize a shader for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShaderModuleCreateInfo {
    /// Input locations consumed by the shader that the previous stage (or
    /// the vertex input layout, for vertex shaders) does not provide.
    pub undefined_inputs: u32,
    /// Transform feedback stream to rasterize, if any.
    pub rasterized_stream: Option<u32>,
}

/// Backend-specific shader blob handed to the build primitive.
#[derive(Debug, Clone)]
pub struct ShaderModule {
    pub stage: ShaderStage,
    pub code: Arc<[u8]>,
}

/// Everything the build primitive needs to create one pipeline object.
#[derive(Debug)]
pub struct GraphicsPipelineCreateInfo<'a> {
    pub state: &'a GraphicsPipelineStateInfo,
    pub vertex_input: &'a VertexInputState,
    pub pre_rasterization: &'a PreRasterizationState,
    pub fragment_output: &'a FragmentOutputState,
    pub depth_stencil: &'a DepthStencilState,
    pub modules: &'a SmallVec<[ShaderModule; 5]>,
    pub layout: &'a BindingLayout,
    pub flags: GraphicsPipelineFlags,
}

/// Pipeline object creation and destruction.
///
/// Both calls may happen concurrently from any thread, for any pipeline.
pub trait PipelineBackend: Send + Sync {
    fn create_graphics_pipeline(&self, info: &GraphicsPipelineCreateInfo<'_>) -> Result<PipelineHandle>;

    fn destroy_pipeline(&self, handle: PipelineHandle);
}

/// Converts a shader plus build-specific info into a backend module.
pub trait ShaderModuleCompiler: Send + Sync {
    fn create_shader_module(&self, shader: &Shader, info: &ShaderModuleCreateInfo) -> Result<ShaderModule>;
}

/// Hands the shader's code to the backend unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompiler;

impl ShaderModuleCompiler for PassthroughCompiler {
    fn create_shader_module(&self, shader: &Shader, _info: &ShaderModuleCreateInfo) -> Result<ShaderModule> {
        Ok(ShaderModule {
            stage: shader.stage(),
            code: shader.code().clone(),
        })
    }
}

/// Persistent state cache. Fire-and-forget; called after every successful
/// build when the state cache is enabled.
pub trait StateCacheWriter: Send + Sync {
    fn record(&self, shaders: &ShaderSetKey, state: &GraphicsPipelineStateInfo);
}
