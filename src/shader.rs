//! Shader objects and their reflection data.
//!
//! A [`Shader`] pairs backend-agnostic bytecode with the reflection info the
//! pipeline cache needs (stage, interface masks, resource bindings). Shaders
//! are shared through `Arc` and compared by identity; the content key is an
//! xxh3-128 of the bytecode and only serves as a stable hash.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_128;

/// Graphics shader stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 5] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEval,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
    ];
}

bitflags! {
    /// Properties reported by shader reflection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderFlags: u32 {
        const HAS_TRANSFORM_FEEDBACK = 1 << 0;
    }
}

/// Kind of descriptor a shader binding consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Sampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
}

impl DescriptorKind {
    /// Storage descriptors may be written by the shader.
    #[must_use]
    pub fn is_storage(self) -> bool {
        matches!(
            self,
            DescriptorKind::StorageImage | DescriptorKind::StorageTexelBuffer | DescriptorKind::StorageBuffer
        )
    }
}

/// One resource binding declared by a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderBinding {
    pub slot: u32,
    pub kind: DescriptorKind,
    pub writable: bool,
}

/// Reflection data of a single shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInfo {
    pub stage: ShaderStage,
    /// Input locations consumed by the shader.
    pub input_mask: u32,
    /// Output locations written by the shader. For fragment shaders, bit
    /// `i` means color target `i`.
    pub output_mask: u32,
    pub bindings: Vec<ShaderBinding>,
    pub flags: ShaderFlags,
    /// Stream that is rasterized when transform feedback is active.
    pub xfb_rasterized_stream: Option<u32>,
}

impl ShaderInfo {
    #[must_use]
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            input_mask: 0,
            output_mask: 0,
            bindings: Vec::new(),
            flags: ShaderFlags::empty(),
            xfb_rasterized_stream: None,
        }
    }

    #[must_use]
    pub fn with_inputs(mut self, mask: u32) -> Self {
        self.input_mask = mask;
        self
    }

    #[must_use]
    pub fn with_outputs(mut self, mask: u32) -> Self {
        self.output_mask = mask;
        self
    }

    #[must_use]
    pub fn with_binding(mut self, binding: ShaderBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ShaderFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// Content key of a shader (xxh3-128 of its bytecode).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShaderKey(pub u128);

impl ShaderKey {
    /// Folds the key into a `u64` for hashing.
    #[inline]
    #[must_use]
    pub fn hash64(self) -> u64 {
        (self.0 as u64) ^ ((self.0 >> 64) as u64)
    }
}

impl fmt::Debug for ShaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Display for ShaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// A shader object shared between pipelines.
#[derive(Debug)]
pub struct Shader {
    info: ShaderInfo,
    code: Arc<[u8]>,
    key: ShaderKey,
}

impl Shader {
    #[must_use]
    pub fn new(info: ShaderInfo, code: impl Into<Arc<[u8]>>) -> Self {
        let code = code.into();
        let key = ShaderKey(xxh3_128(&code));
        Self { info, code, key }
    }

    #[inline]
    #[must_use]
    pub fn info(&self) -> &ShaderInfo {
        &self.info
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.info.stage
    }

    #[inline]
    #[must_use]
    pub fn code(&self) -> &Arc<[u8]> {
        &self.code
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> ShaderKey {
        self.key
    }

    /// Hash of an optional shader slot. Empty slots hash to `0`.
    #[must_use]
    pub fn get_hash(shader: Option<&Arc<Shader>>) -> u64 {
        shader.map_or(0, |s| s.key.hash64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_depends_on_code() {
        let a = Shader::new(ShaderInfo::new(ShaderStage::Vertex), vec![1u8, 2, 3]);
        let b = Shader::new(ShaderInfo::new(ShaderStage::Vertex), vec![1u8, 2, 3]);
        let c = Shader::new(ShaderInfo::new(ShaderStage::Vertex), vec![3u8, 2, 1]);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_empty_slot_hash_is_sentinel() {
        assert_eq!(Shader::get_hash(None), 0);
    }
}
