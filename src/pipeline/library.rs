//! Pipeline sub-state descriptors.
//!
//! A full state vector is decomposed into independently cacheable pieces:
//!
//! - [`VertexInputState`]: depends only on device caps and the state vector,
//!   so it can be compiled as a standalone pipeline library fragment.
//! - [`FragmentOutputState`]: additionally depends on the fragment shader's
//!   output mask; also usable as a library fragment.
//! - [`PreRasterizationState`]: needs the geometry shader, so it is only
//!   ever built as part of a complete pipeline.
//!
//! Construction never fails: values the device cannot express are clamped
//! or dropped, and unused array slots are filled with a canonical value so
//! that two descriptors with the same live content compare and hash equal.

use crate::device::{DeviceFeatures, DeviceInfo, MAX_NUM_RENDER_TARGETS, MAX_NUM_VERTEX_ATTRIBUTES, MAX_NUM_VERTEX_BINDINGS};
use crate::shader::{Shader, ShaderFlags};
use crate::state::{BlendAttachment, ConservativeMode, GraphicsPipelineStateInfo, LogicOp, VertexAttribute, fx_hash_key};

// ─── Vertex Input ─────────────────────────────────────────────────────────────

/// Binding description as seen by the backend (divisor split out).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInputBinding {
    pub binding: u32,
    pub stride: u32,
    pub step_mode: wgpu::VertexStepMode,
}

impl VertexInputBinding {
    const UNUSED: Self = Self {
        binding: 0,
        stride: 0,
        step_mode: wgpu::VertexStepMode::Vertex,
    };
}

/// Instance step rate for one instance-rate binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInputDivisor {
    pub binding: u32,
    pub divisor: u32,
}

impl VertexInputDivisor {
    const UNUSED: Self = Self { binding: 0, divisor: 0 };
}

/// Vertex input and input assembly state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexInputState {
    pub topology: wgpu::PrimitiveTopology,
    pub primitive_restart: bool,
    pub patch_control_points: u32,

    binding_count: u32,
    divisor_count: u32,
    attribute_count: u32,

    bindings: [VertexInputBinding; MAX_NUM_VERTEX_BINDINGS],
    divisors: [VertexInputDivisor; MAX_NUM_VERTEX_BINDINGS],
    attributes: [VertexAttribute; MAX_NUM_VERTEX_ATTRIBUTES],
}

impl Default for VertexInputState {
    fn default() -> Self {
        Self {
            topology: wgpu::PrimitiveTopology::TriangleList,
            primitive_restart: false,
            patch_control_points: 0,
            binding_count: 0,
            divisor_count: 0,
            attribute_count: 0,
            bindings: [VertexInputBinding::UNUSED; MAX_NUM_VERTEX_BINDINGS],
            divisors: [VertexInputDivisor::UNUSED; MAX_NUM_VERTEX_BINDINGS],
            attributes: [VertexAttribute::UNUSED; MAX_NUM_VERTEX_ATTRIBUTES],
        }
    }
}

impl VertexInputState {
    #[must_use]
    pub fn new(device: &DeviceInfo, state: &GraphicsPipelineStateInfo) -> Self {
        let mut result = Self {
            topology: state.ia.topology,
            primitive_restart: state.ia.primitive_restart,
            patch_control_points: state.ia.patch_control_points,
            ..Default::default()
        };

        let has_divisor = device.supports(DeviceFeatures::VERTEX_ATTRIBUTE_DIVISOR);

        for binding in state.il.bindings().iter().take(device.max_vertex_bindings()) {
            result.bindings[result.binding_count as usize] = VertexInputBinding {
                binding: binding.binding,
                stride: binding.stride,
                step_mode: binding.step_mode,
            };
            result.binding_count += 1;

            if has_divisor && binding.step_mode == wgpu::VertexStepMode::Instance && binding.divisor != 1 {
                result.divisors[result.divisor_count as usize] = VertexInputDivisor {
                    binding: binding.binding,
                    divisor: binding.divisor,
                };
                result.divisor_count += 1;
            }
        }

        for attribute in state.il.attributes().iter().take(device.max_vertex_attributes()) {
            result.attributes[result.attribute_count as usize] = *attribute;
            result.attribute_count += 1;
        }

        result
    }

    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &[VertexInputBinding] {
        &self.bindings[..self.binding_count as usize]
    }

    #[inline]
    #[must_use]
    pub fn divisors(&self) -> &[VertexInputDivisor] {
        &self.divisors[..self.divisor_count as usize]
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes[..self.attribute_count as usize]
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        fx_hash_key(self)
    }
}

// ─── Fragment Output ──────────────────────────────────────────────────────────

/// Render target formats, blending and multisample state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentOutputState {
    pub color_formats: [Option<wgpu::TextureFormat>; MAX_NUM_RENDER_TARGETS],
    pub color_attachment_count: u32,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub attachments: [BlendAttachment; MAX_NUM_RENDER_TARGETS],
    pub logic_op: Option<LogicOp>,
    pub sample_count: u32,
    pub sample_mask: u32,
    pub alpha_to_coverage: bool,
}

impl Default for FragmentOutputState {
    fn default() -> Self {
        Self {
            color_formats: [None; MAX_NUM_RENDER_TARGETS],
            color_attachment_count: 0,
            depth_format: None,
            attachments: [BlendAttachment::DISABLED; MAX_NUM_RENDER_TARGETS],
            logic_op: None,
            sample_count: 1,
            sample_mask: 1,
            alpha_to_coverage: false,
        }
    }
}

impl FragmentOutputState {
    #[must_use]
    pub fn new(device: &DeviceInfo, state: &GraphicsPipelineStateInfo, fs: Option<&Shader>) -> Self {
        let fs_outputs = fs.map_or(0, |fs| fs.info().output_mask);
        let mut result = Self {
            depth_format: state.om.depth_format,
            logic_op: state.om.logic_op,
            ..Default::default()
        };

        let max_targets = device.max_render_targets().min(MAX_NUM_RENDER_TARGETS);

        for i in 0..max_targets {
            let Some(format) = state.om.color_formats[i] else {
                continue;
            };

            result.color_formats[i] = Some(format);
            result.color_attachment_count = i as u32 + 1;

            if fs_outputs & (1 << i) != 0 {
                let mut attachment = state.om.blend[i];
                if !attachment.blend_enable {
                    attachment.color = wgpu::BlendComponent::REPLACE;
                    attachment.alpha = wgpu::BlendComponent::REPLACE;
                }
                result.attachments[i] = attachment;
            }
        }

        result.sample_count = state.rs.effective_sample_count();
        result.sample_mask = state.ms.sample_mask & sample_count_mask(result.sample_count);
        result.alpha_to_coverage = state.ms.alpha_to_coverage && fs_outputs & 1 != 0;
        result
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        fx_hash_key(self)
    }
}

fn sample_count_mask(count: u32) -> u32 {
    if count >= 32 { !0 } else { (1 << count) - 1 }
}

// ─── Pre-Rasterization ────────────────────────────────────────────────────────

/// Viewport, tessellation and rasterization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreRasterizationState {
    pub viewport_count: u32,
    pub patch_control_points: u32,
    pub polygon_mode: wgpu::PolygonMode,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub depth_bias_enable: bool,
    /// Always set when the device has explicit depth-clip control; otherwise
    /// emulates disabled clipping.
    pub depth_clamp_enable: bool,
    /// Explicit depth-clip value, only present with device support.
    pub depth_clip_enable: Option<bool>,
    pub rasterized_stream: Option<u32>,
    pub conservative_mode: ConservativeMode,
}

impl PreRasterizationState {
    #[must_use]
    pub fn new(device: &DeviceInfo, state: &GraphicsPipelineStateInfo, gs: Option<&Shader>) -> Self {
        let polygon_mode = if device.supports(DeviceFeatures::FILL_MODE_NON_SOLID) {
            state.rs.polygon_mode
        } else {
            wgpu::PolygonMode::Fill
        };

        let (depth_clamp_enable, depth_clip_enable) = if device.supports(DeviceFeatures::DEPTH_CLIP_ENABLE) {
            (true, Some(state.rs.depth_clip_enable))
        } else {
            (!state.rs.depth_clip_enable, None)
        };

        let rasterized_stream = gs
            .filter(|gs| gs.info().flags.contains(ShaderFlags::HAS_TRANSFORM_FEEDBACK))
            .filter(|_| device.supports(DeviceFeatures::TRANSFORM_FEEDBACK))
            .and_then(|gs| gs.info().xfb_rasterized_stream)
            .filter(|&stream| stream > 0);

        let conservative_mode = if device.supports(DeviceFeatures::CONSERVATIVE_RASTERIZATION) {
            state.rs.conservative_mode
        } else {
            ConservativeMode::Disabled
        };

        Self {
            viewport_count: state.rs.viewport_count.clamp(1, device.limits.max_viewports.max(1)),
            patch_control_points: state.ia.patch_control_points,
            polygon_mode,
            cull_mode: state.rs.cull_mode,
            front_face: state.rs.front_face,
            depth_bias_enable: state.rs.depth_bias_enable,
            depth_clamp_enable,
            depth_clip_enable,
            rasterized_stream,
            conservative_mode,
        }
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        fx_hash_key(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{InputLayout, VertexBinding};

    #[test]
    fn test_divisor_dropped_without_feature() {
        let mut state = GraphicsPipelineStateInfo::new();
        state.il = InputLayout::new().with_binding(VertexBinding::per_instance(0, 16, 4));

        let without = VertexInputState::new(&DeviceInfo::default(), &state);
        assert!(without.divisors().is_empty());

        let device = DeviceInfo {
            features: DeviceFeatures::VERTEX_ATTRIBUTE_DIVISOR,
            ..Default::default()
        };
        let with = VertexInputState::new(&device, &state);
        assert_eq!(with.divisors(), &[VertexInputDivisor { binding: 0, divisor: 4 }]);
    }

    #[test]
    fn test_sample_mask_is_clamped_to_sample_count() {
        let mut state = GraphicsPipelineStateInfo::new();
        state.rs.sample_count = 4;
        let output = FragmentOutputState::new(&DeviceInfo::default(), &state, None);
        assert_eq!(output.sample_mask, 0b1111);
    }

    #[test]
    fn test_depth_clip_emulated_without_feature() {
        let mut state = GraphicsPipelineStateInfo::new();
        state.rs.depth_clip_enable = false;

        let emulated = PreRasterizationState::new(&DeviceInfo::default(), &state, None);
        assert!(emulated.depth_clamp_enable);
        assert_eq!(emulated.depth_clip_enable, None);

        let device = DeviceInfo {
            features: DeviceFeatures::DEPTH_CLIP_ENABLE,
            ..Default::default()
        };
        let native = PreRasterizationState::new(&device, &state, None);
        assert!(native.depth_clamp_enable);
        assert_eq!(native.depth_clip_enable, Some(false));
    }
}
