//! A side's defensive core: a rotating ring of segments around a center pool,
//! wrapped in an ablative shield.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entities::Side;
use crate::config::CoreConfig;
use crate::{heading, polar_to_cartesian, wrap_tau};

/// Two adjacent segments and how a hit is split between them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWeights {
    pub i0: usize,
    pub i1: usize,
    pub w0: f32,
    pub w1: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Core {
    pub side: Side,
    pub center: Vec2,
    pub outer_radius: f32,
    pub ring_radius: f32,
    pub center_radius: f32,
    /// Current rotation (radians, [0, 2π))
    pub rotation: f32,
    pub rotation_speed: f32,
    /// Fixed-length once built
    seg_hp: Vec<f32>,
    pub seg_hp_max: f32,
    center_hp: f32,
    pub center_hp_max: f32,
    shield_hp: f32,
    pub shield_hp_max: f32,
    pub color: u32,
}

impl Core {
    pub fn new(side: Side, center: Vec2, cfg: &CoreConfig) -> Self {
        let color = match side {
            Side::Left => cfg.left_color,
            Side::Right => cfg.right_color,
        };
        // Mirror the spin so both cores turn toward the middle of the field
        let rotation_speed = match side {
            Side::Left => cfg.rotation_speed,
            Side::Right => -cfg.rotation_speed,
        };
        Self {
            side,
            center,
            outer_radius: cfg.outer_radius,
            ring_radius: cfg.ring_radius,
            center_radius: cfg.center_radius,
            rotation: 0.0,
            rotation_speed,
            seg_hp: vec![cfg.seg_hp_max; cfg.segments],
            seg_hp_max: cfg.seg_hp_max,
            center_hp: cfg.center_hp_max,
            center_hp_max: cfg.center_hp_max,
            shield_hp: cfg.shield_start.clamp(0.0, cfg.shield_hp_max),
            shield_hp_max: cfg.shield_hp_max,
            color,
        }
    }

    /// Build a core with explicit segment values (clamped to `[0, seg_hp_max]`)
    pub fn with_segments(mut self, seg_hp: &[f32]) -> Self {
        self.seg_hp = seg_hp
            .iter()
            .map(|hp| hp.clamp(0.0, self.seg_hp_max))
            .collect();
        self
    }

    pub fn segment_count(&self) -> usize {
        self.seg_hp.len()
    }

    pub fn segments(&self) -> &[f32] {
        &self.seg_hp
    }

    pub fn segment_sum(&self) -> f32 {
        self.seg_hp.iter().sum()
    }

    pub fn center_hp(&self) -> f32 {
        self.center_hp
    }

    pub fn shield_hp(&self) -> f32 {
        self.shield_hp
    }

    /// Angular width of one segment
    pub fn segment_arc(&self) -> f32 {
        std::f32::consts::TAU / self.seg_hp.len() as f32
    }

    /// World-space start angle of a segment (for renderers)
    pub fn segment_start_angle(&self, index: usize) -> f32 {
        wrap_tau(self.rotation + index as f32 * self.segment_arc())
    }

    /// Map a world point onto the two segments it falls between.
    ///
    /// Recomputed on every call since the core rotates each tick.
    pub fn angle_to_segments(&self, point: Vec2) -> SegmentWeights {
        let n = self.seg_hp.len();
        let local = wrap_tau(heading(point - self.center) - self.rotation);
        let f = local / self.segment_arc();
        let base = f.floor();
        let t = (f - base).clamp(0.0, 1.0);
        let i0 = (base as usize) % n;
        SegmentWeights {
            i0,
            i1: (i0 + 1) % n,
            w0: 1.0 - t,
            w1: t,
        }
    }

    /// Point on the ring facing `target`
    pub fn ring_point_toward(&self, target: Vec2) -> Vec2 {
        let dir = heading(target - self.center);
        self.center + polar_to_cartesian(self.ring_radius, dir)
    }

    pub fn rotate(&mut self, dt: f32) {
        self.rotation = wrap_tau(self.rotation + self.rotation_speed * dt);
    }

    pub fn is_destroyed(&self) -> bool {
        self.center_hp <= 0.0
    }

    pub fn has_shield(&self, epsilon: f32) -> bool {
        self.shield_hp > epsilon
    }

    /// Absorb up to `aimed` damage into a segment; returns the amount absorbed
    pub fn absorb_segment(&mut self, index: usize, aimed: f32) -> f32 {
        let Some(hp) = self.seg_hp.get_mut(index) else {
            return 0.0;
        };
        let absorbed = hp.min(aimed.max(0.0));
        *hp = (*hp - absorbed).max(0.0);
        absorbed
    }

    /// Subtract from the center pool; returns the amount actually removed
    pub fn damage_center(&mut self, amount: f32) -> f32 {
        let before = self.center_hp;
        self.center_hp = (self.center_hp - amount.max(0.0)).max(0.0);
        before - self.center_hp
    }

    /// Subtract from the shield; returns the shield value before the hit
    pub fn damage_shield(&mut self, amount: f32) -> f32 {
        let before = self.shield_hp;
        self.shield_hp = (self.shield_hp - amount.max(0.0)).max(0.0);
        before
    }

    /// Add shield points (clamped to max); returns the amount gained
    pub fn add_shield(&mut self, points: f32) -> f32 {
        let before = self.shield_hp;
        self.shield_hp = (self.shield_hp + points.max(0.0)).min(self.shield_hp_max);
        self.shield_hp - before
    }

    /// Patch every segment and the center pool, never past their maxima
    pub fn repair(&mut self, seg_points: f32, center_points: f32) {
        let max = self.seg_hp_max;
        for hp in &mut self.seg_hp {
            *hp = (*hp + seg_points.max(0.0)).min(max);
        }
        self.center_hp = (self.center_hp + center_points.max(0.0)).min(self.center_hp_max);
    }

    /// Set the center pool directly (clamped)
    pub fn set_center_hp(&mut self, hp: f32) {
        self.center_hp = hp.clamp(0.0, self.center_hp_max);
    }

    pub fn set_shield_hp(&mut self, hp: f32) {
        self.shield_hp = hp.clamp(0.0, self.shield_hp_max);
    }
}
