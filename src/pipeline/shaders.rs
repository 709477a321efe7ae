//! Shader set forming the fixed identity of a graphics pipeline.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::shader::{Shader, ShaderKey, ShaderStage};

/// Shaders used by one graphics pipeline.
///
/// Equality is shader *identity* (`Arc::ptr_eq`), not content: two shader
/// objects with identical bytecode are different slots unless the caller
/// deduplicates them upstream. Hashing feeds each slot's content key in
/// fixed slot order, which is consistent with identity equality.
#[derive(Debug, Clone, Default)]
pub struct GraphicsPipelineShaders {
    pub vs: Option<Arc<Shader>>,
    pub tcs: Option<Arc<Shader>>,
    pub tes: Option<Arc<Shader>>,
    pub gs: Option<Arc<Shader>>,
    pub fs: Option<Arc<Shader>>,
}

fn same_shader(a: Option<&Arc<Shader>>, b: Option<&Arc<Shader>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for GraphicsPipelineShaders {
    fn eq(&self, other: &Self) -> bool {
        ShaderStage::ALL
            .iter()
            .all(|&stage| same_shader(self.get(stage), other.get(stage)))
    }
}

impl Eq for GraphicsPipelineShaders {}

impl Hash for GraphicsPipelineShaders {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for stage in ShaderStage::ALL {
            state.write_u64(Shader::get_hash(self.get(stage)));
        }
    }
}

impl GraphicsPipelineShaders {
    /// Shader set with only a vertex and a fragment shader.
    #[must_use]
    pub fn basic(vs: Arc<Shader>, fs: Option<Arc<Shader>>) -> Self {
        Self {
            vs: Some(vs),
            fs,
            ..Default::default()
        }
    }

    /// Shader bound to `stage`, if any.
    #[must_use]
    pub fn get(&self, stage: ShaderStage) -> Option<&Arc<Shader>> {
        match stage {
            ShaderStage::Vertex => self.vs.as_ref(),
            ShaderStage::TessControl => self.tcs.as_ref(),
            ShaderStage::TessEval => self.tes.as_ref(),
            ShaderStage::Geometry => self.gs.as_ref(),
            ShaderStage::Fragment => self.fs.as_ref(),
        }
    }

    /// Iterates the populated slots in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Shader>> + '_ {
        ShaderStage::ALL.into_iter().filter_map(|stage| self.get(stage))
    }

    /// Returns `false` if any shader sits in a slot for a different stage.
    #[must_use]
    pub fn validate(&self) -> bool {
        self.check_stages().is_ok()
    }

    /// Like [`validate`](Self::validate), but reports the offending slot.
    pub fn check_stages(&self) -> Result<()> {
        for slot in ShaderStage::ALL {
            if let Some(shader) = self.get(slot)
                && shader.stage() != slot
            {
                return Err(PipelineError::ShaderStageMismatch {
                    slot,
                    actual: shader.stage(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn has_tessellation(&self) -> bool {
        self.tcs.is_some() || self.tes.is_some()
    }

    /// Last active stage before rasterization.
    #[must_use]
    pub fn last_pre_rasterization_shader(&self) -> Option<&Arc<Shader>> {
        self.gs.as_ref().or(self.tes.as_ref()).or(self.vs.as_ref())
    }

    /// Nearest populated slot before `stage`.
    #[must_use]
    pub fn prev_stage(&self, stage: ShaderStage) -> Option<&Arc<Shader>> {
        let index = ShaderStage::ALL.iter().position(|&s| s == stage)?;
        ShaderStage::ALL[..index]
            .iter()
            .rev()
            .find_map(|&s| self.get(s))
    }

    /// Content keys of the set, as stored by the persistent state cache.
    #[must_use]
    pub fn key(&self) -> ShaderSetKey {
        ShaderSetKey {
            vs: self.vs.as_ref().map(|s| s.key()),
            tcs: self.tcs.as_ref().map(|s| s.key()),
            tes: self.tes.as_ref().map(|s| s.key()),
            gs: self.gs.as_ref().map(|s| s.key()),
            fs: self.fs.as_ref().map(|s| s.key()),
        }
    }
}

/// Serializable identity of a shader set, used to match persisted state
/// vectors back to a pipeline after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ShaderSetKey {
    pub vs: Option<ShaderKey>,
    pub tcs: Option<ShaderKey>,
    pub tes: Option<ShaderKey>,
    pub gs: Option<ShaderKey>,
    pub fs: Option<ShaderKey>,
}
