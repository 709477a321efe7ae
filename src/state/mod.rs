//! Graphics pipeline state vector.
//!
//! [`GraphicsPipelineStateInfo`] is the full, caller-supplied description of
//! one pipeline configuration. It is a plain value type: two state vectors
//! are interchangeable if and only if every field compares equal, and the
//! derived `Hash` is consistent with that equality.
//!
//! Fixed-capacity arrays inside the state are kept canonical (unused slots
//! always hold the same default value) so that padding never affects
//! equality or hashing.

mod input;
mod output;
mod raster;

use std::hash::{Hash, Hasher};

pub use input::{InputAssemblyState, InputLayout, VertexAttribute, VertexBinding};
pub use output::{BlendAttachment, LogicOp, OutputMergerState};
pub use raster::{ConservativeMode, DepthStencilState, MultisampleState, RasterizerState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineStateInfo {
    pub ia: InputAssemblyState,
    pub il: InputLayout,
    pub rs: RasterizerState,
    pub ms: MultisampleState,
    pub ds: DepthStencilState,
    pub om: OutputMergerState,
}

impl GraphicsPipelineStateInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full-state hash used to short-circuit instance lookups.
    #[inline]
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        fx_hash_key(self)
    }

    #[inline]
    #[must_use]
    pub fn render_target_mask(&self) -> u32 {
        self.om.render_target_mask()
    }
}

/// Compute a `u64` hash of any `Hash`-able value using `FxHasher`.
#[inline]
pub fn fx_hash_key<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> InputLayout {
        InputLayout::new()
            .with_binding(VertexBinding::per_vertex(0, 32))
            .with_attribute(VertexAttribute::new(0, 0, wgpu::VertexFormat::Float32x3, 0))
            .with_attribute(VertexAttribute::new(1, 0, wgpu::VertexFormat::Float32x2, 12))
    }

    #[test]
    fn test_equal_layouts_hash_equal() {
        let a = sample_layout();
        let b = sample_layout();
        assert_eq!(a, b);
        assert_eq!(fx_hash_key(&a), fx_hash_key(&b));
    }

    #[test]
    fn test_attribute_location_mask() {
        assert_eq!(sample_layout().attribute_location_mask(), 0b11);
    }

    #[test]
    fn test_push_past_capacity_fails() {
        let mut layout = InputLayout::new();
        for i in 0..crate::device::MAX_NUM_VERTEX_BINDINGS as u32 {
            assert!(layout.push_binding(VertexBinding::per_vertex(i, 4)));
        }
        assert!(!layout.push_binding(VertexBinding::per_vertex(99, 4)));
        assert_eq!(layout.bindings().len(), crate::device::MAX_NUM_VERTEX_BINDINGS);
    }

    #[test]
    fn test_render_target_mask() {
        let mut state = GraphicsPipelineStateInfo::new();
        state.om = state
            .om
            .with_color_target(0, wgpu::TextureFormat::Rgba8Unorm, BlendAttachment::OPAQUE)
            .with_color_target(2, wgpu::TextureFormat::Rgba16Float, BlendAttachment::OPAQUE);
        assert_eq!(state.render_target_mask(), 0b101);
    }
}
