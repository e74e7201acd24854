//! WGSL sources for the integrator kernel and the sprite pipeline.
//!
//! Both shaders are generated around [`Particle::WGSL_STRUCT`], so the record
//! layout they see is the one the CPU writes.

use crate::particle::{EmitterUniforms, Particle, ParticleGpu};
use crate::GpuRecord;

/// Lanes per integrator workgroup.
pub const WORKGROUP_SIZE: u32 = 64;

/// Workgroups needed to cover `count` lanes.
#[inline]
pub fn workgroup_count(count: u32) -> u32 {
    count.div_ceil(WORKGROUP_SIZE)
}

/// Compute shader advancing one emitter's live particles in place.
///
/// Bindings (group 0): `particles` storage at 0, `emitter` uniforms at 1.
pub fn compute_shader() -> String {
    let particle_struct = Particle::WGSL_STRUCT;
    let uniforms_struct = EmitterUniforms::WGSL_STRUCT;

    format!(
        r#"{particle_struct}

{uniforms_struct}

@group(0) @binding(0)
var<storage, read_write> particles: array<Particle>;

@group(0) @binding(1)
var<uniform> emitter: EmitterUniforms;

@compute @workgroup_size({WORKGROUP_SIZE})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= emitter.particle_count {{
        return;
    }}

    var p = particles[index];
    let dt = emitter.delta_time;

    p.velocity = (p.velocity + emitter.gravity * dt) / (1.0 + emitter.air_resistance * dt);
    p.position = p.position + p.velocity * dt;
    p.age = p.age + dt;

    var t = 1.0;
    if p.life > 0.0 {{
        t = clamp(p.age / p.life, 0.0, 1.0);
    }}
    if t >= 1.0 {{
        p.scale = p.end_scale;
    }} else {{
        let lo = min(p.start_scale, p.end_scale);
        let hi = max(p.start_scale, p.end_scale);
        p.scale = clamp(p.start_scale + (p.end_scale - p.start_scale) * t, lo, hi);
    }}

    particles[index] = p;
}}
"#
    )
}

/// Vertex attributes read per instance from the particle buffer.
///
/// Locations match the inputs of `vs_main` in [`render_shader`].
pub fn instance_attributes() -> [wgpu::VertexAttribute; 6] {
    [
        attribute(0, ParticleGpu::POSITION_OFFSET, wgpu::VertexFormat::Float32x3),
        attribute(1, ParticleGpu::COLOR_OFFSET, wgpu::VertexFormat::Float32x4),
        attribute(2, ParticleGpu::AGE_OFFSET, wgpu::VertexFormat::Float32),
        attribute(3, ParticleGpu::LIFE_OFFSET, wgpu::VertexFormat::Float32),
        attribute(4, ParticleGpu::SIZE_OFFSET, wgpu::VertexFormat::Float32),
        attribute(5, ParticleGpu::SCALE_OFFSET, wgpu::VertexFormat::Float32),
    ]
}

fn attribute(location: u32, offset: u32, format: wgpu::VertexFormat) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        offset: offset as wgpu::BufferAddress,
        shader_location: location,
        format,
    }
}

/// Render shader drawing each particle as a screen-aligned textured quad.
///
/// Positions are pixels with the origin at the bottom-left corner. Stale
/// particles collapse to a zero-area quad.
///
/// Bindings: viewport uniform (group 0), sprite texture and sampler
/// (group 1), per-emitter draw offset (group 2).
pub fn render_shader() -> String {
    r#"struct Viewport {
    size: vec2<f32>,
    _padding: vec2<f32>,
}

struct DrawParams {
    offset: vec3<f32>,
    _padding: f32,
}

@group(0) @binding(0)
var<uniform> viewport: Viewport;

@group(1) @binding(0)
var sprite: texture_2d<f32>;

@group(1) @binding(1)
var sprite_sampler: sampler;

@group(2) @binding(0)
var<uniform> draw: DrawParams;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) age: f32,
    @location(3) life: f32,
    @location(4) size: f32,
    @location(5) scale: f32,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[vertex_index];

    var extent = size * scale;
    if age >= life {
        extent = 0.0;
    }

    let pixel = position.xy + draw.offset.xy + corner * extent;
    let ndc = pixel / viewport.size * 2.0 - vec2<f32>(1.0, 1.0);

    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x + 0.5, 0.5 - corner.y);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sprite, sprite_sampler, in.uv) * in.color;
}
"#
    .to_string()
}

/// Uniform block for `Viewport` in [`render_shader`].
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewportUniforms {
    pub size: [f32; 2],
    pub _padding: [f32; 2],
}

/// Uniform block for `DrawParams` in [`render_shader`].
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub offset: [f32; 3],
    pub _padding: f32,
}
