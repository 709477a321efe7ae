//! Pipeline cache counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by every pipeline sharing a context.
#[derive(Debug, Default)]
pub struct PipelineStats {
    graphics_pipelines: AtomicU64,
    pipeline_objects: AtomicU64,
    failed_builds: AtomicU64,
    rejected_states: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineCounters {
    /// Pipeline instances built successfully.
    pub graphics_pipelines: u64,
    /// Graphics pipeline objects (shader sets) created.
    pub pipeline_objects: u64,
    /// Build primitive failures.
    pub failed_builds: u64,
    /// State vectors rejected by validation.
    pub rejected_states: u64,
}

impl PipelineStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_graphics_pipeline(&self) {
        self.graphics_pipelines.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_pipeline_object(&self) {
        self.pipeline_objects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_failed_build(&self) {
        self.failed_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_rejected_state(&self) {
        self.rejected_states.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> PipelineCounters {
        PipelineCounters {
            graphics_pipelines: self.graphics_pipelines.load(Ordering::Relaxed),
            pipeline_objects: self.pipeline_objects.load(Ordering::Relaxed),
            failed_builds: self.failed_builds.load(Ordering::Relaxed),
            rejected_states: self.rejected_states.load(Ordering::Relaxed),
        }
    }
}
