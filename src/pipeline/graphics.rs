//! Graphics pipeline
//!
//! Owns the fixed shader set of a pipeline and every instance compiled for
//! it. Instances are looked up without locking; misses are built outside the
//! pipeline mutex so that different states compile in parallel, while a set
//! of in-flight states guarantees that each unique state is built at most
//! once at a time and inserted at most once overall.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use bitflags::bitflags;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::barrier::{AccessFlags, GlobalPipelineBarrier, PipelineStages};
use super::instance::{GraphicsPipelineInstance, GraphicsPipelineInstances, PipelineHandle};
use super::library::{FragmentOutputState, PreRasterizationState, VertexInputState};
use super::shaders::{GraphicsPipelineShaders, ShaderSetKey};
use crate::backend::{BindingLayout, GraphicsPipelineCreateInfo, ShaderModule, ShaderModuleCreateInfo};
use crate::device::DeviceFeatures;
use crate::errors::{PipelineError, Result};
use crate::manager::PipelineContext;
use crate::shader::{Shader, ShaderFlags, ShaderStage};
use crate::state::{ConservativeMode, GraphicsPipelineStateInfo};

bitflags! {
    /// Flags that describe pipeline properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GraphicsPipelineFlags: u32 {
        const HAS_TRANSFORM_FEEDBACK  = 1 << 0;
        const HAS_STORAGE_DESCRIPTORS = 1 << 1;
    }
}

/// Graphics pipeline
///
/// Stores the binding layout as well as methods to compile the pipeline
/// against a given state vector.
pub struct GraphicsPipeline {
    context: Arc<PipelineContext>,

    shaders: GraphicsPipelineShaders,
    key: ShaderSetKey,
    bindings: Arc<BindingLayout>,
    barrier: GlobalPipelineBarrier,
    flags: GraphicsPipelineFlags,

    vs_in: u32,
    fs_out: u32,

    // States currently being built; also serializes instance insertion.
    compiling: Mutex<FxHashSet<GraphicsPipelineStateInfo>>,
    compiled: Condvar,
    pipelines: GraphicsPipelineInstances,
}

impl GraphicsPipeline {
    /// Creates a pipeline for a fixed shader set.
    ///
    /// Fails if a shader sits in the slot of another stage or if there is no
    /// vertex shader; no pipeline object exists in that case.
    pub fn new(
        context: Arc<PipelineContext>,
        shaders: GraphicsPipelineShaders,
        bindings: Arc<BindingLayout>,
    ) -> Result<Self> {
        shaders.check_stages()?;

        let vs_in = shaders
            .vs
            .as_ref()
            .ok_or(PipelineError::MissingVertexShader)?
            .info()
            .input_mask;
        let fs_out = shaders.fs.as_ref().map_or(0, |fs| fs.info().output_mask);

        let mut barrier = GlobalPipelineBarrier::default();
        for shader in shaders.iter() {
            barrier.merge(GlobalPipelineBarrier::from_shader(shader));
        }

        let mut flags = GraphicsPipelineFlags::empty();

        if shaders
            .last_pre_rasterization_shader()
            .is_some_and(|s| s.info().flags.contains(ShaderFlags::HAS_TRANSFORM_FEEDBACK))
        {
            flags |= GraphicsPipelineFlags::HAS_TRANSFORM_FEEDBACK;
        }

        if shaders
            .iter()
            .flat_map(|s| s.info().bindings.iter())
            .any(|b| b.writable && b.kind.is_storage())
        {
            flags |= GraphicsPipelineFlags::HAS_STORAGE_DESCRIPTORS;
        }

        context.stats().add_pipeline_object();

        Ok(Self {
            key: shaders.key(),
            context,
            shaders,
            bindings,
            barrier,
            flags,
            vs_in,
            fs_out,
            compiling: Mutex::new(FxHashSet::default()),
            compiled: Condvar::new(),
            pipelines: GraphicsPipelineInstances::new(),
        })
    }

    /// Shaders used by the pipeline.
    #[must_use]
    pub fn shaders(&self) -> &GraphicsPipelineShaders {
        &self.shaders
    }

    /// Persistent identity of the shader set.
    #[must_use]
    pub fn key(&self) -> &ShaderSetKey {
        &self.key
    }

    #[must_use]
    pub fn flags(&self) -> GraphicsPipelineFlags {
        self.flags
    }

    #[must_use]
    pub fn bindings(&self) -> &Arc<BindingLayout> {
        &self.bindings
    }

    /// Queries the shader for a given stage, `None` if the slot is empty.
    #[must_use]
    pub fn get_shader(&self, stage: ShaderStage) -> Option<Arc<Shader>> {
        self.shaders.get(stage).cloned()
    }

    /// Number of compiled instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Queries the global resource barrier
    ///
    /// Returns the stages that can access resources in this pipeline with the
    /// given state, and the ways in which they are accessed. Render targets
    /// are not included. The barrier is meant to be executed after the render
    /// pass.
    #[must_use]
    pub fn get_global_barrier(&self, state: &GraphicsPipelineStateInfo) -> GlobalPipelineBarrier {
        let mut barrier = self.barrier;

        if state.il.binding_count() > 0 {
            barrier.stages |= PipelineStages::VERTEX_INPUT;
            barrier.access |= AccessFlags::INDEX_READ | AccessFlags::VERTEX_ATTRIBUTE_READ;
        }

        if self.flags.contains(GraphicsPipelineFlags::HAS_TRANSFORM_FEEDBACK) {
            barrier.stages |= PipelineStages::DRAW_INDIRECT | PipelineStages::TRANSFORM_FEEDBACK;
            barrier.access |= AccessFlags::INDIRECT_COMMAND_READ
                | AccessFlags::XFB_COUNTER_READ
                | AccessFlags::XFB_COUNTER_WRITE
                | AccessFlags::XFB_WRITE;
        }

        barrier
    }

    /// Retrieves a pipeline handle for the given state, compiling a new
    /// pipeline if necessary.
    ///
    /// Returns [`PipelineHandle::NULL`] if the state is invalid or the build
    /// fails; the caller decides whether to skip the draw.
    pub fn get_pipeline_handle(&self, state: &GraphicsPipelineStateInfo) -> PipelineHandle {
        self.get_or_create_instance(state, true)
            .unwrap_or(PipelineHandle::NULL)
    }

    /// Compiles the given state ahead of its first use.
    ///
    /// Meant for background workers replaying persisted state, so the state
    /// is validated as untrusted. Failures are logged and leave no trace in
    /// the cache.
    pub fn compile_pipeline(&self, state: &GraphicsPipelineStateInfo) {
        self.get_or_create_instance(state, false);
    }

    fn get_or_create_instance(&self, state: &GraphicsPipelineStateInfo, trusted: bool) -> Option<PipelineHandle> {
        let hash = state.hash_value();

        if let Some(instance) = self.find_instance(state, hash) {
            return Some(instance.handle());
        }

        if !self.validate_pipeline_state(state, trusted) {
            return None;
        }

        {
            let mut compiling = self.compiling.lock();

            loop {
                if let Some(instance) = self.find_instance(state, hash) {
                    return Some(instance.handle());
                }

                if !compiling.contains(state) {
                    break;
                }

                self.compiled.wait(&mut compiling);
            }

            compiling.insert(state.clone());
        }

        let handle = {
            let _in_flight = InFlight { pipeline: self, state };
            self.create_instance(state, hash)?.handle()
        };

        self.write_pipeline_state_to_cache(state);
        Some(handle)
    }

    fn find_instance(&self, state: &GraphicsPipelineStateInfo, hash: u64) -> Option<&GraphicsPipelineInstance> {
        self.pipelines.find_hashed(state, hash)
    }

    /// Builds the pipeline without holding the lock, then inserts it. The
    /// caller must have marked `state` as in flight.
    fn create_instance(&self, state: &GraphicsPipelineStateInfo, hash: u64) -> Option<&GraphicsPipelineInstance> {
        let handle = match self.create_pipeline(state) {
            Ok(handle) => handle,
            Err(e) => {
                self.context.stats().add_failed_build();
                log::error!("GraphicsPipeline: Failed to compile pipeline: {e}");
                self.log_pipeline_state(log::Level::Error, state);
                return None;
            }
        };

        let _lock = self.compiling.lock();
        debug_assert!(
            self.find_instance(state, hash).is_none(),
            "state compiled twice for the same pipeline"
        );
        Some(self.pipelines.insert(state.clone(), handle))
    }

    fn create_pipeline(&self, state: &GraphicsPipelineStateInfo) -> Result<PipelineHandle> {
        let started = Instant::now();
        let device = self.context.device();

        let vertex_input = VertexInputState::new(device, state);
        let pre_rasterization = PreRasterizationState::new(device, state, self.shaders.gs.as_deref());
        let fragment_output = FragmentOutputState::new(device, state, self.shaders.fs.as_deref());

        let mut modules: SmallVec<[ShaderModule; 5]> = SmallVec::new();
        for shader in self.shaders.iter() {
            modules.push(self.create_shader_module(shader, state, &pre_rasterization)?);
        }

        let info = GraphicsPipelineCreateInfo {
            state,
            vertex_input: &vertex_input,
            pre_rasterization: &pre_rasterization,
            fragment_output: &fragment_output,
            depth_stencil: &state.ds,
            modules: &modules,
            layout: &self.bindings,
            flags: self.flags,
        };

        let handle = self.context.backend().create_graphics_pipeline(&info)?;
        if handle.is_null() {
            return Err(PipelineError::BuildFailed("backend returned a null handle".into()));
        }

        self.context.stats().add_graphics_pipeline();
        log::debug!(
            "GraphicsPipeline: Finished in {} ms",
            started.elapsed().as_millis()
        );

        Ok(handle)
    }

    fn destroy_pipeline(&self, handle: PipelineHandle) {
        self.context.backend().destroy_pipeline(handle);
    }

    fn create_shader_module(
        &self,
        shader: &Shader,
        state: &GraphicsPipelineStateInfo,
        pre_rasterization: &PreRasterizationState,
    ) -> Result<ShaderModule> {
        let stage = shader.stage();

        let provided = if stage == ShaderStage::Vertex {
            state.il.attribute_location_mask()
        } else {
            self.get_prev_stage_shader(stage)
                .map_or(0, |prev| prev.info().output_mask)
        };

        let info = ShaderModuleCreateInfo {
            undefined_inputs: shader.info().input_mask & !provided,
            rasterized_stream: if stage == ShaderStage::Geometry {
                pre_rasterization.rasterized_stream
            } else {
                None
            },
        };

        self.context.shader_compiler().create_shader_module(shader, &info)
    }

    fn get_prev_stage_shader(&self, stage: ShaderStage) -> Option<&Arc<Shader>> {
        self.shaders.prev_stage(stage)
    }

    /// Validates a state vector before compiling it.
    ///
    /// Structural errors reject the state in both modes. Consistency checks
    /// only reject untrusted (replayed) state; for trusted state they are
    /// reported and the state is compiled anyway.
    fn validate_pipeline_state(&self, state: &GraphicsPipelineStateInfo, trusted: bool) -> bool {
        let level = if trusted { log::Level::Warn } else { log::Level::Debug };

        if let Err(e) = self.check_structure(state) {
            self.context.stats().add_rejected_state();
            log::log!(level, "GraphicsPipeline: Rejecting state: {e}");
            self.log_pipeline_state(log::Level::Debug, state);
            return false;
        }

        if let Err(e) = self.check_consistency(state) {
            if trusted {
                log::warn!("GraphicsPipeline: {e}");
                self.log_pipeline_state(log::Level::Debug, state);
            } else {
                self.context.stats().add_rejected_state();
                log::debug!("GraphicsPipeline: Skipping cached state: {e}");
                self.log_pipeline_state(log::Level::Debug, state);
                return false;
            }
        }

        true
    }

    fn check_structure(&self, state: &GraphicsPipelineStateInfo) -> Result<()> {
        let limits = &self.context.device().limits;

        if self.shaders.has_tessellation() != state.ia.uses_patches() {
            return Err(PipelineError::InvalidState(format!(
                "tessellation shaders {} but patch topology {}",
                if self.shaders.has_tessellation() { "present" } else { "absent" },
                if state.ia.uses_patches() { "used" } else { "not used" },
            )));
        }

        if state.ia.patch_control_points > limits.max_patch_control_points {
            return Err(PipelineError::InvalidState(format!(
                "{} patch control points exceed the limit of {}",
                state.ia.patch_control_points, limits.max_patch_control_points
            )));
        }

        if state.il.binding_count() > limits.max_vertex_bindings
            || state.il.attribute_count() > limits.max_vertex_attributes
        {
            return Err(PipelineError::InvalidState(format!(
                "{} bindings / {} attributes exceed device limits",
                state.il.binding_count(),
                state.il.attribute_count()
            )));
        }

        let samples = state.rs.sample_count;
        if samples != 0 && (!samples.is_power_of_two() || samples > 64) {
            return Err(PipelineError::InvalidState(format!("invalid sample count {samples}")));
        }

        Ok(())
    }

    fn check_consistency(&self, state: &GraphicsPipelineStateInfo) -> Result<()> {
        let device = self.context.device();

        let unbound_outputs = self.fs_out & !state.render_target_mask();
        if unbound_outputs != 0 {
            return Err(PipelineError::InvalidState(format!(
                "fragment shader writes render targets {unbound_outputs:#x} without a bound format"
            )));
        }

        if let Some((i, format)) = state
            .om
            .color_formats
            .iter()
            .enumerate()
            .find_map(|(i, f)| (*f).filter(wgpu::TextureFormat::is_depth_stencil_format).map(|f| (i, f)))
        {
            return Err(PipelineError::InvalidState(format!(
                "color target {i} uses depth format {format:?}"
            )));
        }

        if let Some(format) = state.om.depth_format
            && !format.is_depth_stencil_format()
        {
            return Err(PipelineError::InvalidState(format!(
                "depth target uses color format {format:?}"
            )));
        }

        if let Some(attribute) = state
            .il
            .attributes()
            .iter()
            .find(|a| state.il.find_binding(a.binding).is_none())
        {
            return Err(PipelineError::InvalidState(format!(
                "attribute {} references undeclared binding {}",
                attribute.location, attribute.binding
            )));
        }

        let missing_inputs = self.vs_in & !state.il.attribute_location_mask();
        if missing_inputs != 0 {
            return Err(PipelineError::InvalidState(format!(
                "vertex shader inputs {missing_inputs:#x} are not fed by any attribute"
            )));
        }

        if !device.supports(DeviceFeatures::VERTEX_ATTRIBUTE_DIVISOR)
            && state
                .il
                .bindings()
                .iter()
                .any(|b| b.step_mode == wgpu::VertexStepMode::Instance && b.divisor != 1)
        {
            return Err(PipelineError::InvalidState(
                "instance divisors used without device support".into(),
            ));
        }

        if state.rs.polygon_mode != wgpu::PolygonMode::Fill
            && !device.supports(DeviceFeatures::FILL_MODE_NON_SOLID)
        {
            return Err(PipelineError::InvalidState(format!(
                "polygon mode {:?} used without device support",
                state.rs.polygon_mode
            )));
        }

        if state.rs.conservative_mode != ConservativeMode::Disabled
            && !device.supports(DeviceFeatures::CONSERVATIVE_RASTERIZATION)
        {
            return Err(PipelineError::InvalidState(
                "conservative rasterization used without device support".into(),
            ));
        }

        Ok(())
    }

    fn write_pipeline_state_to_cache(&self, state: &GraphicsPipelineStateInfo) {
        if !self.context.settings().enable_state_cache {
            return;
        }

        if let Some(writer) = self.context.state_cache() {
            writer.record(&self.key, state);
        }
    }

    fn log_pipeline_state(&self, level: log::Level, state: &GraphicsPipelineStateInfo) {
        if log::log_enabled!(level) {
            log::log!(level, "{}", self.describe_state(state));
        }
    }

    fn describe_state(&self, state: &GraphicsPipelineStateInfo) -> String {
        let mut out = String::from("Pipeline state:\n  Shaders:\n");
        for stage in ShaderStage::ALL {
            if let Some(shader) = self.shaders.get(stage) {
                let _ = writeln!(out, "    {stage:?}: {}", shader.key());
                for binding in &shader.info().bindings {
                    let _ = writeln!(
                        out,
                        "      slot {}: {:?}{}",
                        binding.slot,
                        binding.kind,
                        if binding.writable { " (writable)" } else { "" }
                    );
                }
            }
        }

        let _ = writeln!(
            out,
            "  Input assembly: {:?}, restart: {}, patch control points: {}",
            state.ia.topology, state.ia.primitive_restart, state.ia.patch_control_points
        );

        for b in state.il.bindings() {
            let _ = writeln!(
                out,
                "  Binding {}: stride {}, {:?}, divisor {}",
                b.binding, b.stride, b.step_mode, b.divisor
            );
        }

        for a in state.il.attributes() {
            let _ = writeln!(
                out,
                "  Attribute {}: binding {}, {:?}, offset {}",
                a.location, a.binding, a.format, a.offset
            );
        }

        let rs = &state.rs;
        let _ = writeln!(
            out,
            "  Rasterizer: {:?}, cull {:?}, {:?}, depth clip {}, depth bias {}, conservative {:?}, samples {}, viewports {}",
            rs.polygon_mode,
            rs.cull_mode,
            rs.front_face,
            rs.depth_clip_enable,
            rs.depth_bias_enable,
            rs.conservative_mode,
            rs.sample_count,
            rs.viewport_count
        );
        let _ = writeln!(
            out,
            "  Multisample: mask {:#x}, alpha to coverage {}",
            state.ms.sample_mask, state.ms.alpha_to_coverage
        );

        let ds = &state.ds;
        let _ = writeln!(
            out,
            "  Depth-stencil: test {}, write {}, {:?}, stencil {}",
            ds.depth_test, ds.depth_write, ds.depth_compare, ds.stencil_test
        );

        for (i, format) in state.om.color_formats.iter().enumerate() {
            if let Some(format) = format {
                let blend = &state.om.blend[i];
                let _ = writeln!(
                    out,
                    "  Color {i}: {format:?}, blend {}, color {:?}, alpha {:?}, mask {:?}",
                    blend.blend_enable, blend.color, blend.alpha, blend.write_mask
                );
            }
        }

        let _ = writeln!(
            out,
            "  Depth: {:?}, logic op {:?}",
            state.om.depth_format, state.om.logic_op
        );

        out
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        for instance in self.pipelines.iter() {
            self.destroy_pipeline(instance.handle());
        }
    }
}

impl std::fmt::Debug for GraphicsPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsPipeline")
            .field("key", &self.key)
            .field("flags", &self.flags)
            .field("instances", &self.pipelines.len())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight marker for a state and wakes waiting threads, also
/// when the build unwinds.
struct InFlight<'a> {
    pipeline: &'a GraphicsPipeline,
    state: &'a GraphicsPipelineStateInfo,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.pipeline.compiling.lock().remove(self.state);
        self.pipeline.compiled.notify_all();
    }
}
