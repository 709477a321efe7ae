//! Input assembly and vertex input layout.

use crate::device::{MAX_NUM_VERTEX_ATTRIBUTES, MAX_NUM_VERTEX_BINDINGS};

/// Primitive assembly configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputAssemblyState {
    pub topology: wgpu::PrimitiveTopology,
    pub primitive_restart: bool,
    /// When non-zero, vertices are assembled into patches of this size for
    /// the tessellation stages and `topology` is ignored.
    pub patch_control_points: u32,
}

impl Default for InputAssemblyState {
    fn default() -> Self {
        Self {
            topology: wgpu::PrimitiveTopology::TriangleList,
            primitive_restart: false,
            patch_control_points: 0,
        }
    }
}

impl InputAssemblyState {
    #[must_use]
    pub fn new(topology: wgpu::PrimitiveTopology) -> Self {
        Self {
            topology,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn patches(control_points: u32) -> Self {
        Self {
            patch_control_points: control_points,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn uses_patches(&self) -> bool {
        self.patch_control_points != 0
    }
}

/// One vertex buffer binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
    pub step_mode: wgpu::VertexStepMode,
    /// Instance step rate; only meaningful for instance-rate bindings.
    pub divisor: u32,
}

impl VertexBinding {
    pub const UNUSED: Self = Self {
        binding: 0,
        stride: 0,
        step_mode: wgpu::VertexStepMode::Vertex,
        divisor: 0,
    };

    #[must_use]
    pub fn per_vertex(binding: u32, stride: u32) -> Self {
        Self {
            binding,
            stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            divisor: 0,
        }
    }

    #[must_use]
    pub fn per_instance(binding: u32, stride: u32, divisor: u32) -> Self {
        Self {
            binding,
            stride,
            step_mode: wgpu::VertexStepMode::Instance,
            divisor,
        }
    }
}

/// One vertex attribute fetched from a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: wgpu::VertexFormat,
    pub offset: u32,
}

impl VertexAttribute {
    pub const UNUSED: Self = Self {
        location: 0,
        binding: 0,
        format: wgpu::VertexFormat::Float32,
        offset: 0,
    };

    #[must_use]
    pub fn new(location: u32, binding: u32, format: wgpu::VertexFormat, offset: u32) -> Self {
        Self {
            location,
            binding,
            format,
            offset,
        }
    }
}

/// Vertex input layout with fixed-capacity storage.
///
/// Slots past `binding_count` / `attribute_count` always hold the `UNUSED`
/// value, so two layouts with the same live entries compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputLayout {
    binding_count: u32,
    attribute_count: u32,
    bindings: [VertexBinding; MAX_NUM_VERTEX_BINDINGS],
    attributes: [VertexAttribute; MAX_NUM_VERTEX_ATTRIBUTES],
}

impl Default for InputLayout {
    fn default() -> Self {
        Self {
            binding_count: 0,
            attribute_count: 0,
            bindings: [VertexBinding::UNUSED; MAX_NUM_VERTEX_BINDINGS],
            attributes: [VertexAttribute::UNUSED; MAX_NUM_VERTEX_ATTRIBUTES],
        }
    }
}

impl InputLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding. Returns `false` if the layout is full.
    pub fn push_binding(&mut self, binding: VertexBinding) -> bool {
        let index = self.binding_count as usize;
        if index >= MAX_NUM_VERTEX_BINDINGS {
            return false;
        }
        self.bindings[index] = binding;
        self.binding_count += 1;
        true
    }

    /// Appends an attribute. Returns `false` if the layout is full.
    pub fn push_attribute(&mut self, attribute: VertexAttribute) -> bool {
        let index = self.attribute_count as usize;
        if index >= MAX_NUM_VERTEX_ATTRIBUTES {
            return false;
        }
        self.attributes[index] = attribute;
        self.attribute_count += 1;
        true
    }

    /// Builder-style variant of [`push_binding`](Self::push_binding).
    #[must_use]
    pub fn with_binding(mut self, binding: VertexBinding) -> Self {
        self.push_binding(binding);
        self
    }

    /// Builder-style variant of [`push_attribute`](Self::push_attribute).
    #[must_use]
    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.push_attribute(attribute);
        self
    }

    #[inline]
    #[must_use]
    pub fn binding_count(&self) -> u32 {
        self.binding_count
    }

    #[inline]
    #[must_use]
    pub fn attribute_count(&self) -> u32 {
        self.attribute_count
    }

    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &[VertexBinding] {
        &self.bindings[..self.binding_count as usize]
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes[..self.attribute_count as usize]
    }

    /// Bit mask of the shader input locations fed by attributes.
    #[must_use]
    pub fn attribute_location_mask(&self) -> u32 {
        self.attributes()
            .iter()
            .filter(|a| a.location < 32)
            .fold(0, |mask, a| mask | (1 << a.location))
    }

    #[must_use]
    pub fn find_binding(&self, binding: u32) -> Option<&VertexBinding> {
        self.bindings().iter().find(|b| b.binding == binding)
    }
}
