//! State Descriptor Tests
//!
//! Tests for:
//! - Equality/hash consistency of the state vector
//! - Canonical sub-state descriptors (vertex input, fragment output,
//!   pre-rasterization)
//! - Shader set identity and persistent keys

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use pipeline_forge::pipeline::{FragmentOutputState, PreRasterizationState, VertexInputState};
use pipeline_forge::state::{BlendAttachment, ConservativeMode, InputLayout, VertexAttribute, VertexBinding};
use pipeline_forge::{
    DeviceFeatures, DeviceInfo, DeviceLimits, GraphicsPipelineShaders, GraphicsPipelineStateInfo, Shader, ShaderFlags,
    ShaderInfo, ShaderSetKey, ShaderStage,
};

// ============================================================================
// State vector
// ============================================================================

#[test]
fn equal_states_hash_equal() {
    let a = common::basic_state();
    let b = common::basic_state();
    assert_eq!(a, b);
    assert_eq!(a.hash_value(), b.hash_value());

    let c = common::blended_state();
    assert_ne!(a, c);

    let set: HashSet<GraphicsPipelineStateInfo> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn input_layout_padding_does_not_affect_equality() {
    let mut pushed = InputLayout::new();
    assert!(pushed.push_binding(VertexBinding::per_vertex(0, 12)));
    assert!(pushed.push_attribute(VertexAttribute::new(0, 0, wgpu::VertexFormat::Float32x3, 0)));

    let built = InputLayout::new()
        .with_binding(VertexBinding::per_vertex(0, 12))
        .with_attribute(VertexAttribute::new(0, 0, wgpu::VertexFormat::Float32x3, 0));

    assert_eq!(pushed, built);
    assert_eq!(pushed.bindings().len(), 1);
    assert_eq!(pushed.attribute_location_mask(), 0b1);
    assert!(pushed.find_binding(0).is_some());
    assert!(pushed.find_binding(1).is_none());
}

#[test]
fn input_layout_rejects_overflow() {
    let mut layout = InputLayout::new();
    for i in 0..32 {
        assert!(layout.push_binding(VertexBinding::per_vertex(i, 4)));
    }
    assert!(!layout.push_binding(VertexBinding::per_vertex(32, 4)));
    assert_eq!(layout.binding_count(), 32);
}

// ============================================================================
// Vertex input
// ============================================================================

#[test]
fn vertex_input_keeps_divisors_only_with_support() {
    let mut state = common::basic_state();
    state.il = InputLayout::new()
        .with_binding(VertexBinding::per_vertex(0, 12))
        .with_binding(VertexBinding::per_instance(1, 16, 1))
        .with_binding(VertexBinding::per_instance(2, 16, 3));

    let plain = VertexInputState::new(&DeviceInfo::default(), &state);
    assert_eq!(plain.bindings().len(), 3);
    assert!(plain.divisors().is_empty());

    let device = DeviceInfo::new(DeviceLimits::default(), DeviceFeatures::VERTEX_ATTRIBUTE_DIVISOR);
    let with_divisors = VertexInputState::new(&device, &state);
    assert_eq!(with_divisors.divisors().len(), 1);
    assert_eq!(with_divisors.divisors()[0].binding, 2);
    assert_eq!(with_divisors.divisors()[0].divisor, 3);
}

#[test]
fn vertex_input_is_clamped_to_device_limits() {
    let mut state = common::basic_state();
    state.il = InputLayout::new();
    for i in 0..4 {
        state.il.push_binding(VertexBinding::per_vertex(i, 4));
    }

    let device = DeviceInfo::new(
        DeviceLimits {
            max_vertex_bindings: 2,
            ..Default::default()
        },
        DeviceFeatures::empty(),
    );
    let vi = VertexInputState::new(&device, &state);
    assert_eq!(vi.bindings().len(), 2);
}

#[test]
fn vertex_input_ignores_bindings_past_device_limit() {
    let device = DeviceInfo::new(
        DeviceLimits {
            max_vertex_bindings: 2,
            max_vertex_attributes: 1,
            ..Default::default()
        },
        DeviceFeatures::VERTEX_ATTRIBUTE_DIVISOR,
    );

    let mut a = common::basic_state();
    a.il = InputLayout::new()
        .with_binding(VertexBinding::per_vertex(0, 12))
        .with_binding(VertexBinding::per_instance(1, 16, 2))
        .with_binding(VertexBinding::per_vertex(2, 4))
        .with_binding(VertexBinding::per_vertex(3, 4))
        .with_attribute(VertexAttribute::new(0, 0, wgpu::VertexFormat::Float32x3, 0))
        .with_attribute(VertexAttribute::new(1, 2, wgpu::VertexFormat::Float32, 0));

    let mut b = common::basic_state();
    b.il = InputLayout::new()
        .with_binding(VertexBinding::per_vertex(0, 12))
        .with_binding(VertexBinding::per_instance(1, 16, 2))
        .with_binding(VertexBinding::per_instance(2, 64, 7))
        .with_binding(VertexBinding::per_vertex(5, 32))
        .with_attribute(VertexAttribute::new(0, 0, wgpu::VertexFormat::Float32x3, 0))
        .with_attribute(VertexAttribute::new(3, 5, wgpu::VertexFormat::Uint32, 8));

    assert_ne!(a, b);

    let vi_a = VertexInputState::new(&device, &a);
    let vi_b = VertexInputState::new(&device, &b);
    assert_eq!(vi_a, vi_b);
    assert_eq!(vi_a.hash(), vi_b.hash());
    assert_eq!(vi_a.bindings().len(), 2);
    assert_eq!(vi_a.divisors().len(), 1);
    assert_eq!(vi_a.attributes().len(), 1);

    let unclamped = DeviceInfo::new(DeviceLimits::default(), DeviceFeatures::VERTEX_ATTRIBUTE_DIVISOR);
    assert_ne!(VertexInputState::new(&unclamped, &a), VertexInputState::new(&unclamped, &b));
}

// ============================================================================
// Fragment output
// ============================================================================

#[test]
fn fragment_output_ignores_blend_of_unwritten_targets() {
    let fs = Shader::new(ShaderInfo::new(ShaderStage::Fragment).with_outputs(0b01), b"fs".as_slice());
    let device = DeviceInfo::default();

    let mut a = common::basic_state();
    a.om.color_formats[1] = Some(wgpu::TextureFormat::Rgba8Unorm);
    let mut b = a.clone();
    b.om.blend[1] = BlendAttachment::from_blend_state(wgpu::BlendState::ALPHA_BLENDING);
    assert_ne!(a, b);

    let fo_a = FragmentOutputState::new(&device, &a, Some(&fs));
    let fo_b = FragmentOutputState::new(&device, &b, Some(&fs));
    assert_eq!(fo_a, fo_b);
    assert_eq!(fo_a.hash(), fo_b.hash());
    assert_eq!(fo_a.attachments[1], BlendAttachment::DISABLED);
    assert_eq!(fo_a.color_attachment_count, 2);
}

#[test]
fn fragment_output_canonicalizes_disabled_blending() {
    let fs = Shader::new(ShaderInfo::new(ShaderStage::Fragment).with_outputs(0b1), b"fs".as_slice());
    let device = DeviceInfo::default();

    let a = common::basic_state();
    let mut b = common::basic_state();
    b.om.blend[0] = BlendAttachment {
        blend_enable: false,
        ..BlendAttachment::from_blend_state(wgpu::BlendState::ALPHA_BLENDING)
    };

    assert_eq!(
        FragmentOutputState::new(&device, &a, Some(&fs)),
        FragmentOutputState::new(&device, &b, Some(&fs))
    );
}

#[test]
fn fragment_output_masks_samples() {
    let device = DeviceInfo::default();
    let mut state = common::basic_state();
    state.rs.sample_count = 4;
    state.ms.alpha_to_coverage = true;

    let fo = FragmentOutputState::new(&device, &state, None);
    assert_eq!(fo.sample_count, 4);
    assert_eq!(fo.sample_mask, 0b1111);
    // Without a fragment shader writing target 0 there is no alpha to cover.
    assert!(!fo.alpha_to_coverage);

    state.rs.sample_count = 0;
    let fo = FragmentOutputState::new(&device, &state, None);
    assert_eq!(fo.sample_count, 1);
    assert_eq!(fo.sample_mask, 0b1);
}

// ============================================================================
// Pre-rasterization
// ============================================================================

#[test]
fn pre_rasterization_drops_unsupported_features() {
    let mut state = common::basic_state();
    state.rs.polygon_mode = wgpu::PolygonMode::Line;
    state.rs.conservative_mode = ConservativeMode::Overestimate;
    state.rs.depth_clip_enable = false;
    state.rs.viewport_count = 0;

    let pr = PreRasterizationState::new(&DeviceInfo::default(), &state, None);
    assert_eq!(pr.polygon_mode, wgpu::PolygonMode::Fill);
    assert_eq!(pr.conservative_mode, ConservativeMode::Disabled);
    assert!(pr.depth_clamp_enable);
    assert_eq!(pr.depth_clip_enable, None);
    assert_eq!(pr.viewport_count, 1);

    let device = DeviceInfo::new(DeviceLimits::default(), DeviceFeatures::all());
    let pr = PreRasterizationState::new(&device, &state, None);
    assert_eq!(pr.polygon_mode, wgpu::PolygonMode::Line);
    assert_eq!(pr.conservative_mode, ConservativeMode::Overestimate);
    assert!(pr.depth_clamp_enable);
    assert_eq!(pr.depth_clip_enable, Some(false));
}

#[test]
fn pre_rasterization_ignores_state_the_device_cannot_express() {
    let mut a = common::basic_state();
    a.rs.polygon_mode = wgpu::PolygonMode::Line;
    a.rs.conservative_mode = ConservativeMode::Overestimate;
    a.rs.viewport_count = 20;

    let mut b = common::basic_state();
    b.rs.polygon_mode = wgpu::PolygonMode::Point;
    b.rs.conservative_mode = ConservativeMode::Underestimate;
    b.rs.viewport_count = 40;

    assert_ne!(a, b);

    let device = DeviceInfo::default();
    let pr_a = PreRasterizationState::new(&device, &a, None);
    let pr_b = PreRasterizationState::new(&device, &b, None);
    assert_eq!(pr_a, pr_b);
    assert_eq!(pr_a.hash(), pr_b.hash());
    assert_eq!(pr_a.viewport_count, device.limits.max_viewports);

    let capable = DeviceInfo::new(DeviceLimits::default(), DeviceFeatures::all());
    let pr_a = PreRasterizationState::new(&capable, &a, None);
    let pr_b = PreRasterizationState::new(&capable, &b, None);
    assert_ne!(pr_a, pr_b);
}

#[test]
fn pre_rasterization_takes_stream_from_geometry_shader() {
    let mut info = ShaderInfo::new(ShaderStage::Geometry).with_flags(ShaderFlags::HAS_TRANSFORM_FEEDBACK);
    info.xfb_rasterized_stream = Some(2);
    let gs = Shader::new(info, b"gs".as_slice());
    let state = common::basic_state();

    let device = DeviceInfo::new(DeviceLimits::default(), DeviceFeatures::TRANSFORM_FEEDBACK);
    let pr = PreRasterizationState::new(&device, &state, Some(&gs));
    assert_eq!(pr.rasterized_stream, Some(2));

    let pr = PreRasterizationState::new(&DeviceInfo::default(), &state, Some(&gs));
    assert_eq!(pr.rasterized_stream, None);
}

// ============================================================================
// Shader sets
// ============================================================================

#[test]
fn shader_sets_compare_by_identity() {
    let vs = common::vertex_shader();
    let fs = common::fragment_shader();

    let a = GraphicsPipelineShaders::basic(Arc::clone(&vs), Some(Arc::clone(&fs)));
    let b = GraphicsPipelineShaders::basic(Arc::clone(&vs), Some(Arc::clone(&fs)));
    assert_eq!(a, b);

    // Same bytecode, different object.
    let c = GraphicsPipelineShaders::basic(common::vertex_shader(), Some(fs));
    assert_ne!(a, c);
    assert_eq!(a.key(), c.key());

    let set: HashSet<GraphicsPipelineShaders> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn shader_set_key_round_trips_through_json() {
    let key = common::basic_shaders().key();
    assert!(key.vs.is_some() && key.fs.is_some() && key.gs.is_none());

    let json = serde_json::to_string(&key).unwrap();
    let back: ShaderSetKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
}

#[test]
fn prev_stage_skips_empty_slots() {
    let shaders = common::basic_shaders();
    let prev = shaders.prev_stage(ShaderStage::Fragment).unwrap();
    assert_eq!(prev.stage(), ShaderStage::Vertex);
    assert!(shaders.prev_stage(ShaderStage::Vertex).is_none());
    assert_eq!(shaders.last_pre_rasterization_shader().unwrap().stage(), ShaderStage::Vertex);
}
