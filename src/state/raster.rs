//! Rasterizer, multisample and depth-stencil state.

/// Conservative rasterization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConservativeMode {
    #[default]
    Disabled,
    Overestimate,
    Underestimate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    pub polygon_mode: wgpu::PolygonMode,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub depth_clip_enable: bool,
    pub depth_bias_enable: bool,
    pub conservative_mode: ConservativeMode,
    /// Rasterization sample count. `0` behaves like `1`.
    pub sample_count: u32,
    pub viewport_count: u32,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            polygon_mode: wgpu::PolygonMode::Fill,
            cull_mode: None,
            front_face: wgpu::FrontFace::Ccw,
            depth_clip_enable: true,
            depth_bias_enable: false,
            conservative_mode: ConservativeMode::Disabled,
            sample_count: 1,
            viewport_count: 1,
        }
    }
}

impl RasterizerState {
    /// Effective sample count, treating `0` as single-sampled.
    #[inline]
    #[must_use]
    pub fn effective_sample_count(&self) -> u32 {
        self.sample_count.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultisampleState {
    pub sample_mask: u32,
    pub alpha_to_coverage: bool,
}

impl Default for MultisampleState {
    fn default() -> Self {
        Self {
            sample_mask: !0,
            alpha_to_coverage: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub stencil_test: bool,
    pub front: wgpu::StencilFaceState,
    pub back: wgpu::StencilFaceState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil_test: false,
            front: wgpu::StencilFaceState::IGNORE,
            back: wgpu::StencilFaceState::IGNORE,
        }
    }
}
