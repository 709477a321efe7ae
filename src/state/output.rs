//! Output merger state: render target formats and blending.

use crate::device::MAX_NUM_RENDER_TARGETS;

/// Framebuffer logic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    Copy,
    AndInverted,
    NoOp,
    Xor,
    Or,
    Nor,
    Equivalent,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

/// Blend configuration of one color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendAttachment {
    pub blend_enable: bool,
    pub color: wgpu::BlendComponent,
    pub alpha: wgpu::BlendComponent,
    pub write_mask: wgpu::ColorWrites,
}

impl Default for BlendAttachment {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl BlendAttachment {
    /// Blending disabled, all channels written.
    pub const OPAQUE: Self = Self {
        blend_enable: false,
        color: wgpu::BlendComponent::REPLACE,
        alpha: wgpu::BlendComponent::REPLACE,
        write_mask: wgpu::ColorWrites::ALL,
    };

    /// Canonical value for targets that are not written at all.
    pub const DISABLED: Self = Self {
        blend_enable: false,
        color: wgpu::BlendComponent::REPLACE,
        alpha: wgpu::BlendComponent::REPLACE,
        write_mask: wgpu::ColorWrites::empty(),
    };

    #[must_use]
    pub fn from_blend_state(blend: wgpu::BlendState) -> Self {
        Self {
            blend_enable: true,
            color: blend.color,
            alpha: blend.alpha,
            write_mask: wgpu::ColorWrites::ALL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputMergerState {
    pub color_formats: [Option<wgpu::TextureFormat>; MAX_NUM_RENDER_TARGETS],
    pub depth_format: Option<wgpu::TextureFormat>,
    pub blend: [BlendAttachment; MAX_NUM_RENDER_TARGETS],
    pub logic_op: Option<LogicOp>,
}

impl Default for OutputMergerState {
    fn default() -> Self {
        Self {
            color_formats: [None; MAX_NUM_RENDER_TARGETS],
            depth_format: None,
            blend: [BlendAttachment::OPAQUE; MAX_NUM_RENDER_TARGETS],
            logic_op: None,
        }
    }
}

impl OutputMergerState {
    /// Binds `format` to color target `index` with the given blend state.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`MAX_NUM_RENDER_TARGETS`].
    #[must_use]
    pub fn with_color_target(mut self, index: usize, format: wgpu::TextureFormat, blend: BlendAttachment) -> Self {
        assert!(
            index < MAX_NUM_RENDER_TARGETS,
            "color target {index} out of range (max {MAX_NUM_RENDER_TARGETS})"
        );
        self.color_formats[index] = Some(format);
        self.blend[index] = blend;
        self
    }

    #[must_use]
    pub fn with_depth_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Bit mask of color targets with a bound format.
    #[must_use]
    pub fn render_target_mask(&self) -> u32 {
        self.color_formats
            .iter()
            .enumerate()
            .filter(|(_, format)| format.is_some())
            .fold(0, |mask, (i, _)| mask | (1 << i))
    }
}
