//! Segment damage with overflow into the center pool
//!
//! A hit is split across the two segments nearest its angle. Whatever the
//! segments cannot absorb either spills into the center (default) or, with
//! spillover off, has a chance to chip a single point off it.

use glam::Vec2;
use rand::Rng;

use super::core::{Core, SegmentWeights};
use crate::config::DamageConfig;

/// Where a hit landed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPoint {
    pub pos: Vec2,
    /// Skip the segments and hit the center pool directly
    pub force_center: bool,
}

impl HitPoint {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            force_center: false,
        }
    }

    pub fn center(pos: Vec2) -> Self {
        Self {
            pos,
            force_center: true,
        }
    }
}

/// Damage actually removed from each pool
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageOutcome {
    pub segment_damage: f32,
    pub center_damage: f32,
}

impl DamageOutcome {
    pub fn total(&self) -> f32 {
        self.segment_damage + self.center_damage
    }
}

/// Apply a hit using the core's own angle mapping
pub fn apply_core_damage_at<R: Rng>(
    core: &mut Core,
    hit: HitPoint,
    damage: f32,
    rules: &DamageConfig,
    rng: &mut R,
) -> DamageOutcome {
    apply_core_damage(core, hit, damage, rules, rng, |core, pos| {
        core.angle_to_segments(pos)
    })
}

/// Apply a hit with an explicit angle mapper.
///
/// Never raises any HP value and never drives one below zero.
pub fn apply_core_damage<R, M>(
    core: &mut Core,
    hit: HitPoint,
    damage: f32,
    rules: &DamageConfig,
    rng: &mut R,
    mapper: M,
) -> DamageOutcome
where
    R: Rng,
    M: FnOnce(&Core, Vec2) -> SegmentWeights,
{
    if damage <= 0.0 {
        return DamageOutcome::default();
    }

    if hit.force_center {
        return DamageOutcome {
            segment_damage: 0.0,
            center_damage: core.damage_center(damage),
        };
    }

    let w = mapper(&*core, hit.pos);
    let segs = core.segments();
    let seg_hp = |i: usize| segs.get(i).copied().unwrap_or(0.0);
    let both_broken = seg_hp(w.i0) <= 0.0 && seg_hp(w.i1) <= 0.0;

    let absorbed0 = core.absorb_segment(w.i0, damage * w.w0);
    let absorbed1 = core.absorb_segment(w.i1, damage * w.w1);
    let segment_damage = absorbed0 + absorbed1;

    let mut overflow = damage - segment_damage;
    if both_broken {
        overflow = damage * rules.leak_when_broken;
    }

    let center_damage = if rules.spillover {
        if overflow > 0.0 {
            core.damage_center(overflow)
        } else {
            0.0
        }
    } else if rng.random::<f32>() < rules.chip_chance {
        core.damage_center(1.0)
    } else {
        0.0
    };

    DamageOutcome {
        segment_damage,
        center_damage,
    }
}
