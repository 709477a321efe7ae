//! Background pipeline compiler.
//!
//! A fixed pool of threads drains a `flume` queue of `(pipeline, state)`
//! pairs and calls [`GraphicsPipeline::compile_pipeline`] on each. Work goes
//! through the same get-or-create path as the render thread, so a state that
//! is precompiled here and requested by a draw at the same time is still
//! built only once.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::errors::{PipelineError, Result};
use crate::pipeline::GraphicsPipeline;
use crate::settings::PipelineSettings;
use crate::state::GraphicsPipelineStateInfo;

struct CompileJob {
    pipeline: Arc<GraphicsPipeline>,
    state: GraphicsPipelineStateInfo,
}

#[derive(Default)]
struct PendingCount {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingCount {
    fn increment(&self) {
        *self.count.lock() += 1;
    }

    fn decrement(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

/// Marks a job as finished even if compiling it panicked.
struct JobDone<'a>(&'a PendingCount);

impl Drop for JobDone<'_> {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Pool of background compiler threads.
pub struct PipelineWorkers {
    sender: Option<flume::Sender<CompileJob>>,
    pending: Arc<PendingCount>,
    threads: Vec<JoinHandle<()>>,
}

impl PipelineWorkers {
    /// Spawns [`PipelineSettings::compiler_thread_count`] worker threads.
    pub fn new(settings: &PipelineSettings) -> Result<Self> {
        let (sender, receiver) = flume::unbounded::<CompileJob>();
        let pending = Arc::new(PendingCount::default());
        let count = settings.compiler_thread_count();

        let mut threads = Vec::with_capacity(count);
        for index in 0..count {
            let receiver = receiver.clone();
            let pending = Arc::clone(&pending);

            let thread = std::thread::Builder::new()
                .name(format!("pipeline-compiler-{index}"))
                .spawn(move || {
                    log::debug!("PipelineWorkers: Compiler thread {index} started");

                    while let Ok(job) = receiver.recv() {
                        let _done = JobDone(&pending);
                        job.pipeline.compile_pipeline(&job.state);
                    }

                    log::debug!("PipelineWorkers: Compiler thread {index} stopped");
                })?;

            threads.push(thread);
        }

        log::info!("PipelineWorkers: Using {count} compiler threads");

        Ok(Self {
            sender: Some(sender),
            pending,
            threads,
        })
    }

    /// Queues `state` for background compilation on `pipeline`.
    pub fn compile_graphics_pipeline(
        &self,
        pipeline: Arc<GraphicsPipeline>,
        state: GraphicsPipelineStateInfo,
    ) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(PipelineError::WorkerShutdown)?;

        self.pending.increment();
        if sender.send(CompileJob { pipeline, state }).is_err() {
            self.pending.decrement();
            return Err(PipelineError::WorkerShutdown);
        }

        Ok(())
    }

    /// Blocks until every queued job has finished.
    pub fn wait_idle(&self) {
        let mut count = self.pending.count.lock();
        while *count > 0 {
            self.pending.idle.wait(&mut count);
        }
    }

    /// Number of queued or running jobs.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.pending.count.lock()
    }

    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

impl Drop for PipelineWorkers {
    fn drop(&mut self) {
        // Closing the queue lets workers finish what is queued and exit.
        self.sender = None;

        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                log::error!("PipelineWorkers: Compiler thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for PipelineWorkers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineWorkers")
            .field("threads", &self.threads.len())
            .field("pending", &self.pending())
            .finish()
    }
}
