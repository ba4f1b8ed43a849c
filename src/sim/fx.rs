//! Transient visual records. Gameplay never reads these; renderers do.

use glam::Vec2;
use serde::Serialize;

use super::entities::{Side, WeaponKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BurstKind {
    Explosion,
    /// Proximity fuse or missile burnout; purely visual
    Fuse,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Burst {
    pub kind: BurstKind,
    pub pos: Vec2,
    pub radius: f32,
    pub at_ms: f64,
    pub ttl_ms: f64,
}

/// A projectile or beam tick landing on a core
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Impact {
    pub pos: Vec2,
    /// Side whose core was hit
    pub target: Side,
    pub shielded: bool,
    pub at_ms: f64,
    pub ttl_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BeamFx {
    pub side: Side,
    pub from: Vec2,
    pub to: Vec2,
    pub until_ms: f64,
}

/// Telegraph shown during a weapon's windup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindupMarker {
    pub side: Side,
    pub weapon: WeaponKind,
    pub pos: Vec2,
    pub fire_at_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CameraShake {
    pub amplitude: f32,
    pub until_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FxLists {
    pub bursts: Vec<Burst>,
    pub impacts: Vec<Impact>,
    pub beams: Vec<BeamFx>,
    pub windups: Vec<WindupMarker>,
    pub shake: CameraShake,
}

impl FxLists {
    /// Drop every record whose time is up
    pub fn prune(&mut self, now_ms: f64) {
        self.bursts.retain(|b| now_ms < b.at_ms + b.ttl_ms);
        self.impacts.retain(|i| now_ms < i.at_ms + i.ttl_ms);
        self.beams.retain(|b| now_ms < b.until_ms);
        self.windups.retain(|w| now_ms < w.fire_at_ms);
        if now_ms >= self.shake.until_ms {
            self.shake = CameraShake::default();
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Kick the camera; a stronger active shake is never weakened
    pub fn shake(&mut self, now_ms: f64, amplitude: f32, duration_ms: f64) {
        let active = now_ms < self.shake.until_ms;
        if !active || amplitude >= self.shake.amplitude {
            self.shake.amplitude = amplitude;
        }
        self.shake.until_ms = self.shake.until_ms.max(now_ms + duration_ms);
    }

    pub fn total(&self) -> usize {
        self.bursts.len() + self.impacts.len() + self.beams.len() + self.windups.len()
    }
}
