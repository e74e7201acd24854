//! Per-particle integration step.
//!
//! [`step`] is the host-side twin of the WGSL kernel in
//! [`shader::compute_shader`](crate::shader::compute_shader). Both apply the
//! same update to one record:
//!
//! ```text
//! velocity = (velocity + gravity * dt) / (1 + air_resistance * dt)
//! position = position + velocity * dt
//! age      = age + dt
//! scale    = end_scale                                    if t >= 1
//!          = start_scale + (end_scale - start_scale) * t  otherwise
//! ```
//!
//! where `t = clamp(age / life, 0, 1)` and `t = 1` for `life <= 0`.
//! A step reads and writes only its own record, which is what lets the
//! backends run it across all live slots in parallel.

use crate::particle::{EmitterUniforms, Particle};

/// Time step actually applied for a requested `delta_time`.
///
/// Negative and non-finite steps count as zero, so a bad clock reading can
/// neither run particles backwards nor poison the pool with NaN.
#[inline]
pub fn sanitize_delta(delta_time: f32) -> f32 {
    if delta_time.is_finite() && delta_time > 0.0 {
        delta_time
    } else {
        0.0
    }
}

/// Scale at lifetime fraction `t`, saturating exactly at `end` for `t >= 1`.
///
/// Evaluated as `start + (end - start) * t` and kept between the endpoints,
/// so `start == end` stays exact and rounding never overshoots.
#[inline]
pub fn interpolate_scale(start: f32, end: f32, t: f32) -> f32 {
    if t >= 1.0 {
        end
    } else {
        (start + (end - start) * t).clamp(start.min(end), start.max(end))
    }
}

/// Advance one particle by `uniforms.delta_time`.
#[inline]
pub fn step(p: &mut Particle, uniforms: &EmitterUniforms) {
    let dt = uniforms.delta_time;

    p.velocity = (p.velocity + uniforms.gravity() * dt) / (1.0 + uniforms.air_resistance * dt);
    p.position += p.velocity * dt;
    p.age += dt;
    p.scale = interpolate_scale(p.start_scale, p.end_scale, p.life_fraction());
}
