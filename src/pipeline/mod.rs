//! Graphics pipelines and their instance caches.

mod barrier;
mod graphics;
mod instance;
mod library;
mod shaders;

pub use barrier::{AccessFlags, GlobalPipelineBarrier, PipelineStages};
pub use graphics::{GraphicsPipeline, GraphicsPipelineFlags};
pub use instance::{GraphicsPipelineInstance, GraphicsPipelineInstances, PipelineHandle};
pub use library::{
    FragmentOutputState, PreRasterizationState, VertexInputBinding, VertexInputDivisor, VertexInputState,
};
pub use shaders::{GraphicsPipelineShaders, ShaderSetKey};
