//! Pipeline Manager
//!
//! [`PipelineContext`] bundles everything a [`GraphicsPipeline`] needs from
//! the outside world: device capabilities, settings, the backend build
//! primitive, the shader compiler, an optional persistent state cache and
//! shared counters. It is created once and shared through an `Arc`.
//!
//! [`PipelineManager`] deduplicates pipeline objects by shader set, so that
//! every unique set of shaders owns exactly one instance cache.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pipeline_forge::{DeviceInfo, PipelineContext, PipelineManager, PipelineSettings};
//!
//! let context = PipelineContext::new(DeviceInfo::default(), PipelineSettings::default(), backend)
//!     .with_state_cache(state_cache);
//! let manager = PipelineManager::new(Arc::new(context));
//!
//! let pipeline = manager.create_graphics_pipeline(shaders, layout)?;
//! let handle = pipeline.get_pipeline_handle(&state);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::backend::{BindingLayout, PassthroughCompiler, PipelineBackend, ShaderModuleCompiler, StateCacheWriter};
use crate::device::DeviceInfo;
use crate::errors::Result;
use crate::pipeline::{GraphicsPipeline, GraphicsPipelineShaders, ShaderSetKey};
use crate::settings::PipelineSettings;
use crate::stats::PipelineStats;

/// Shared collaborators for every pipeline.
pub struct PipelineContext {
    device: DeviceInfo,
    settings: PipelineSettings,
    backend: Arc<dyn PipelineBackend>,
    compiler: Arc<dyn ShaderModuleCompiler>,
    state_cache: Option<Arc<dyn StateCacheWriter>>,
    stats: PipelineStats,
}

impl PipelineContext {
    /// Creates a context that passes shader code through unchanged and does
    /// not persist state vectors.
    #[must_use]
    pub fn new(device: DeviceInfo, settings: PipelineSettings, backend: Arc<dyn PipelineBackend>) -> Self {
        Self {
            device,
            settings,
            backend,
            compiler: Arc::new(PassthroughCompiler),
            state_cache: None,
            stats: PipelineStats::new(),
        }
    }

    #[must_use]
    pub fn with_shader_compiler(mut self, compiler: Arc<dyn ShaderModuleCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    #[must_use]
    pub fn with_state_cache(mut self, writer: Arc<dyn StateCacheWriter>) -> Self {
        self.state_cache = Some(writer);
        self
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> &dyn PipelineBackend {
        self.backend.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn shader_compiler(&self) -> &dyn ShaderModuleCompiler {
        self.compiler.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn state_cache(&self) -> Option<&dyn StateCacheWriter> {
        self.state_cache.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("device", &self.device)
            .field("settings", &self.settings)
            .field("state_cache", &self.state_cache.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Owns one [`GraphicsPipeline`] per unique shader set.
pub struct PipelineManager {
    context: Arc<PipelineContext>,
    graphics_pipelines: Mutex<FxHashMap<GraphicsPipelineShaders, Arc<GraphicsPipeline>>>,
}

impl PipelineManager {
    #[must_use]
    pub fn new(context: Arc<PipelineContext>) -> Self {
        Self {
            context,
            graphics_pipelines: Mutex::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.context
    }

    /// Returns the pipeline for `shaders`, creating it on first use.
    ///
    /// `layout` is only used when the pipeline does not exist yet.
    pub fn create_graphics_pipeline(
        &self,
        shaders: GraphicsPipelineShaders,
        layout: Arc<BindingLayout>,
    ) -> Result<Arc<GraphicsPipeline>> {
        let mut pipelines = self.graphics_pipelines.lock();

        if let Some(pipeline) = pipelines.get(&shaders) {
            return Ok(Arc::clone(pipeline));
        }

        let pipeline = Arc::new(GraphicsPipeline::new(
            Arc::clone(&self.context),
            shaders.clone(),
            layout,
        )?);

        log::debug!("PipelineManager: Created graphics pipeline {:?}", pipeline.key());
        pipelines.insert(shaders, Arc::clone(&pipeline));
        Ok(pipeline)
    }

    /// Finds a live pipeline by the persistent identity of its shaders, as
    /// needed when replaying a state cache.
    #[must_use]
    pub fn find_graphics_pipeline(&self, key: &ShaderSetKey) -> Option<Arc<GraphicsPipeline>> {
        self.graphics_pipelines
            .lock()
            .values()
            .find(|pipeline| pipeline.key() == key)
            .cloned()
    }

    #[must_use]
    pub fn pipeline_count(&self) -> usize {
        self.graphics_pipelines.lock().len()
    }
}

impl std::fmt::Debug for PipelineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineManager")
            .field("pipelines", &self.pipeline_count())
            .finish_non_exhaustive()
    }
}
