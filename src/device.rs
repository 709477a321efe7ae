//! Device capabilities consumed when deriving pipeline sub-states.

use bitflags::bitflags;

/// Size of the vertex binding array in a state vector.
pub const MAX_NUM_VERTEX_BINDINGS: usize = 32;

/// Size of the vertex attribute array in a state vector.
pub const MAX_NUM_VERTEX_ATTRIBUTES: usize = 32;

/// Size of the color target arrays in a state vector.
pub const MAX_NUM_RENDER_TARGETS: usize = 8;

bitflags! {
    /// Optional device features that change how sub-states are built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeviceFeatures: u32 {
        const VERTEX_ATTRIBUTE_DIVISOR   = 1 << 0;
        const DEPTH_CLIP_ENABLE          = 1 << 1;
        const CONSERVATIVE_RASTERIZATION = 1 << 2;
        const TRANSFORM_FEEDBACK         = 1 << 3;
        const FILL_MODE_NON_SOLID        = 1 << 4;
    }
}

/// Fixed device limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceLimits {
    pub max_vertex_bindings: u32,
    pub max_vertex_attributes: u32,
    pub max_render_targets: u32,
    pub max_patch_control_points: u32,
    pub max_viewports: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_vertex_bindings: MAX_NUM_VERTEX_BINDINGS as u32,
            max_vertex_attributes: MAX_NUM_VERTEX_ATTRIBUTES as u32,
            max_render_targets: MAX_NUM_RENDER_TARGETS as u32,
            max_patch_control_points: 32,
            max_viewports: 16,
        }
    }
}

impl DeviceLimits {
    /// Clamps every limit to what the state vector can actually express.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            max_vertex_bindings: self.max_vertex_bindings.min(MAX_NUM_VERTEX_BINDINGS as u32),
            max_vertex_attributes: self.max_vertex_attributes.min(MAX_NUM_VERTEX_ATTRIBUTES as u32),
            max_render_targets: self.max_render_targets.min(MAX_NUM_RENDER_TARGETS as u32),
            max_patch_control_points: self.max_patch_control_points,
            max_viewports: self.max_viewports.max(1),
        }
    }
}

/// Capability provider handed to every pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceInfo {
    pub limits: DeviceLimits,
    pub features: DeviceFeatures,
}

impl DeviceInfo {
    #[must_use]
    pub fn new(limits: DeviceLimits, features: DeviceFeatures) -> Self {
        Self {
            limits: limits.clamped(),
            features,
        }
    }

    #[inline]
    #[must_use]
    pub fn supports(&self, feature: DeviceFeatures) -> bool {
        self.features.contains(feature)
    }

    #[inline]
    #[must_use]
    pub fn max_vertex_bindings(&self) -> usize {
        self.limits.max_vertex_bindings as usize
    }

    #[inline]
    #[must_use]
    pub fn max_vertex_attributes(&self) -> usize {
        self.limits.max_vertex_attributes as usize
    }

    #[inline]
    #[must_use]
    pub fn max_render_targets(&self) -> usize {
        self.limits.max_render_targets as usize
    }
}
