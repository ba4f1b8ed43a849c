//! Pachinko Battler - a two-core arcade battler
//!
//! Core modules:
//! - `sim`: Deterministic simulation (field, weapons, collisions, damage, match flow)
//! - `physics`: Small rigid-body world the simulation drives
//! - `config`: Data-driven game balance
//! - `hooks`: Audio / stats / banter collaborators
//! - `snapshot`: Read-only view for renderers

pub mod config;
pub mod error;
pub mod hooks;
pub mod physics;
pub mod scoreboard;
pub mod sim;
pub mod snapshot;
pub mod stats;

pub use config::GameConfig;
pub use error::SimError;
pub use scoreboard::Scoreboard;
pub use stats::SessionStats;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World dimensions (screen coordinates, +y points down)
    pub const WORLD_WIDTH: f32 = 1600.0;
    pub const WORLD_HEIGHT: f32 = 1000.0;
    /// Thickness of the static walls framing the world
    pub const WALL_THICKNESS: f32 = 40.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Normalized angle to [0, 2π)
#[inline]
pub fn wrap_tau(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(std::f32::consts::TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= std::f32::consts::TAU { 0.0 } else { wrapped }
}

/// Signed shortest rotation taking `from` onto `to`, in [-π, π)
#[inline]
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Heading of a vector in radians
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_wrap_tau_range() {
        assert!((wrap_tau(-PI / 2.0) - 1.5 * PI).abs() < 1e-5);
        assert!((wrap_tau(TAU + 0.25) - 0.25).abs() < 1e-5);
        assert_eq!(wrap_tau(0.0), 0.0);
        assert!(wrap_tau(-1e-9) < TAU);
    }

    #[test]
    fn test_shortest_angle_wraps() {
        // 350° -> 10° is a +20° turn, not -340°
        let d = shortest_angle(350f32.to_radians(), 10f32.to_radians());
        assert!((d - 20f32.to_radians()).abs() < 1e-4);
        let d = shortest_angle(10f32.to_radians(), 350f32.to_radians());
        assert!((d + 20f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn test_polar_heading_roundtrip() {
        let v = polar_to_cartesian(10.0, 1.0);
        assert!((heading(v) - 1.0).abs() < 1e-5);
        assert!((v.length() - 10.0).abs() < 1e-4);
    }
}
