//! Global resource barrier description.

use bitflags::bitflags;

use crate::shader::{DescriptorKind, Shader, ShaderStage};

bitflags! {
    /// Pipeline stages that may access resources.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PipelineStages: u32 {
        const DRAW_INDIRECT          = 1 << 0;
        const VERTEX_INPUT           = 1 << 1;
        const VERTEX_SHADER          = 1 << 2;
        const TESS_CONTROL_SHADER    = 1 << 3;
        const TESS_EVAL_SHADER       = 1 << 4;
        const GEOMETRY_SHADER        = 1 << 5;
        const FRAGMENT_SHADER        = 1 << 6;
        const TRANSFORM_FEEDBACK     = 1 << 7;
    }
}

bitflags! {
    /// Ways in which resources are accessed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u32 {
        const INDIRECT_COMMAND_READ = 1 << 0;
        const INDEX_READ            = 1 << 1;
        const VERTEX_ATTRIBUTE_READ = 1 << 2;
        const UNIFORM_READ          = 1 << 3;
        const SHADER_READ           = 1 << 4;
        const SHADER_WRITE          = 1 << 5;
        const XFB_WRITE             = 1 << 6;
        const XFB_COUNTER_READ      = 1 << 7;
        const XFB_COUNTER_WRITE     = 1 << 8;

        const WRITE_MASK = Self::SHADER_WRITE.bits()
            | Self::XFB_WRITE.bits()
            | Self::XFB_COUNTER_WRITE.bits();
    }
}

impl ShaderStage {
    #[must_use]
    pub fn pipeline_stage(self) -> PipelineStages {
        match self {
            ShaderStage::Vertex => PipelineStages::VERTEX_SHADER,
            ShaderStage::TessControl => PipelineStages::TESS_CONTROL_SHADER,
            ShaderStage::TessEval => PipelineStages::TESS_EVAL_SHADER,
            ShaderStage::Geometry => PipelineStages::GEOMETRY_SHADER,
            ShaderStage::Fragment => PipelineStages::FRAGMENT_SHADER,
        }
    }
}

/// Stages and access kinds with which a pipeline may touch resources other
/// than its render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GlobalPipelineBarrier {
    pub stages: PipelineStages,
    pub access: AccessFlags,
}

impl GlobalPipelineBarrier {
    /// Barrier implied by a shader's declared resource bindings.
    #[must_use]
    pub fn from_shader(shader: &Shader) -> Self {
        let mut barrier = Self::default();

        for binding in &shader.info().bindings {
            barrier.stages |= shader.stage().pipeline_stage();
            barrier.access |= match binding.kind {
                DescriptorKind::UniformBuffer => AccessFlags::UNIFORM_READ,
                _ => AccessFlags::SHADER_READ,
            };

            if binding.writable && binding.kind.is_storage() {
                barrier.access |= AccessFlags::SHADER_WRITE;
            }
        }

        barrier
    }

    pub fn merge(&mut self, other: Self) {
        self.stages |= other.stages;
        self.access |= other.access;
    }

    #[inline]
    #[must_use]
    pub fn has_write(&self) -> bool {
        self.access.intersects(AccessFlags::WRITE_MASK)
    }
}
