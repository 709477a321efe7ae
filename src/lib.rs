//! Graphics pipeline instance cache.
//!
//! A [`GraphicsPipeline`] owns a fixed shader set and memoizes one native
//! pipeline object per unique [`GraphicsPipelineStateInfo`]. Lookups are
//! lock-free, builds run outside any lock, and each unique state is built at
//! most once no matter how many render or worker threads request it.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod backend;
pub mod device;
pub mod errors;
pub mod manager;
pub mod pipeline;
pub mod settings;
pub mod shader;
pub mod state;
pub mod stats;
pub mod worker;

pub use backend::{
    BindingLayout, GraphicsPipelineCreateInfo, PassthroughCompiler, PipelineBackend, ShaderModule,
    ShaderModuleCompiler, ShaderModuleCreateInfo, StateCacheWriter,
};
pub use device::{DeviceFeatures, DeviceInfo, DeviceLimits};
pub use errors::{PipelineError, Result};
pub use manager::{PipelineContext, PipelineManager};
pub use pipeline::{
    GlobalPipelineBarrier, GraphicsPipeline, GraphicsPipelineFlags, GraphicsPipelineShaders, PipelineHandle,
    ShaderSetKey,
};
pub use settings::PipelineSettings;
pub use shader::{Shader, ShaderFlags, ShaderInfo, ShaderKey, ShaderStage};
pub use state::GraphicsPipelineStateInfo;
pub use stats::{PipelineCounters, PipelineStats};
pub use worker::PipelineWorkers;
