//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use pipeline_forge::shader::{DescriptorKind, ShaderBinding};
use pipeline_forge::state::{BlendAttachment, InputLayout, OutputMergerState, VertexAttribute, VertexBinding};
use pipeline_forge::{
    BindingLayout, DeviceInfo, GraphicsPipelineCreateInfo, GraphicsPipelineShaders, GraphicsPipelineStateInfo,
    PipelineBackend, PipelineContext, PipelineError, PipelineHandle, PipelineSettings, Result, Shader, ShaderInfo,
    ShaderSetKey, ShaderStage, StateCacheWriter,
};

type FailPredicate = Box<dyn Fn(&GraphicsPipelineStateInfo) -> bool + Send + Sync>;

/// Backend that hands out increasing handles and counts every call.
#[derive(Default)]
pub struct MockBackend {
    next_handle: AtomicU64,
    builds: AtomicU64,
    destroyed: Mutex<Vec<PipelineHandle>>,
    fail_if: Option<FailPredicate>,
    delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every build for which `predicate` holds fail.
    pub fn failing_when(mut self, predicate: impl Fn(&GraphicsPipelineStateInfo) -> bool + Send + Sync + 'static) -> Self {
        self.fail_if = Some(Box::new(predicate));
        self
    }

    /// Makes every build take at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> Vec<PipelineHandle> {
        self.destroyed.lock().clone()
    }
}

impl PipelineBackend for MockBackend {
    fn create_graphics_pipeline(&self, info: &GraphicsPipelineCreateInfo<'_>) -> Result<PipelineHandle> {
        self.builds.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.fail_if.as_ref().is_some_and(|fail| fail(info.state)) {
            return Err(PipelineError::BuildFailed("injected failure".into()));
        }

        Ok(PipelineHandle(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn destroy_pipeline(&self, handle: PipelineHandle) {
        self.destroyed.lock().push(handle);
    }
}

/// State cache writer that remembers every record.
#[derive(Default)]
pub struct RecordingCache {
    pub records: Mutex<Vec<(ShaderSetKey, GraphicsPipelineStateInfo)>>,
}

impl RecordingCache {
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}

impl StateCacheWriter for RecordingCache {
    fn record(&self, shaders: &ShaderSetKey, state: &GraphicsPipelineStateInfo) {
        self.records.lock().push((*shaders, state.clone()));
    }
}

pub fn context(backend: &Arc<MockBackend>) -> Arc<PipelineContext> {
    Arc::new(PipelineContext::new(
        DeviceInfo::default(),
        PipelineSettings::default(),
        Arc::clone(backend) as Arc<dyn PipelineBackend>,
    ))
}

pub fn layout() -> Arc<BindingLayout> {
    Arc::new(BindingLayout::new(1, "test-layout"))
}

pub fn shader(info: ShaderInfo, code: &[u8]) -> Arc<Shader> {
    Arc::new(Shader::new(info, code))
}

/// Vertex shader reading location 0 and writing location 0.
pub fn vertex_shader() -> Arc<Shader> {
    shader(ShaderInfo::new(ShaderStage::Vertex).with_inputs(0b1).with_outputs(0b1), b"vs-main")
}

/// Fragment shader reading location 0 and writing color target 0.
pub fn fragment_shader() -> Arc<Shader> {
    shader(
        ShaderInfo::new(ShaderStage::Fragment)
            .with_inputs(0b1)
            .with_outputs(0b1)
            .with_binding(ShaderBinding {
                slot: 0,
                kind: DescriptorKind::UniformBuffer,
                writable: false,
            }),
        b"fs-main",
    )
}

pub fn basic_shaders() -> GraphicsPipelineShaders {
    GraphicsPipelineShaders::basic(vertex_shader(), Some(fragment_shader()))
}

/// Triangle list with one vertex buffer feeding location 0 and one RGBA8
/// color target.
pub fn basic_state() -> GraphicsPipelineStateInfo {
    let mut state = GraphicsPipelineStateInfo::new();
    state.il = InputLayout::new()
        .with_binding(VertexBinding::per_vertex(0, 12))
        .with_attribute(VertexAttribute::new(0, 0, wgpu::VertexFormat::Float32x3, 0));
    state.om = OutputMergerState::default().with_color_target(0, wgpu::TextureFormat::Rgba8Unorm, BlendAttachment::OPAQUE);
    state
}

/// `basic_state` with alpha blending on target 0.
pub fn blended_state() -> GraphicsPipelineStateInfo {
    let mut state = basic_state();
    state.om.blend[0] = BlendAttachment::from_blend_state(wgpu::BlendState::ALPHA_BLENDING);
    state
}
