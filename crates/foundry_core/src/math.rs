//! Math utilities for the simulation.
//!
//! Positions and velocities are [`glam::Vec2`] in world units. One unit of
//! tick delta corresponds to one 60 Hz frame, so every "per tick" constant in
//! the core is expressed against that frame length.

use std::f32::consts::TAU;

pub use glam::Vec2;
use rand::Rng;

/// Clamp a scalar to `[0, 1]`.
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Linear interpolation between two scalars.
#[must_use]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Frame-rate normalized exponential smoothing.
///
/// Moves `from` toward `to` by the fraction `alpha * delta`, clamped so a
/// large delta lands exactly on `to` and never overshoots it.
#[must_use]
pub fn lerp_delta(from: f32, to: f32, alpha: f32, delta: f32) -> f32 {
    lerp(from, to, clamp01(alpha * delta))
}

/// Uniform random value in `[0, max]`.
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    if max <= 0.0 {
        return 0.0;
    }
    rng.gen_range(0.0..=max)
}

/// Random offset with a uniformly random angle and a length in `[0, max_len]`.
pub fn random_offset<R: Rng + ?Sized>(rng: &mut R, max_len: f32) -> Vec2 {
    let length = random_range(rng, max_len);
    let angle = rng.gen_range(0.0..TAU);
    Vec2::from_angle(angle) * length
}
