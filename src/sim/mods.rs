//! Per-side timed buffs and debuffs.
//!
//! Each side has one buff slot and one debuff slot. Applying a new effect
//! replaces whatever was there, and expiry is checked on read, so there is no
//! per-tick cleanup pass and repeated reads are idempotent.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use super::entities::{BuffKind, PerSide, Side, WeaponKind};
use crate::config::ModsConfig;

/// One side's active effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SideMods {
    pub buff_kind: Option<BuffKind>,
    pub buff_until: f64,
    pub dmg_mul: f32,
    pub cooldown_mul: f32,
    pub bin_fill_mul: f32,
    pub disabled_type: Option<WeaponKind>,
    pub disable_until: f64,
}

impl Default for SideMods {
    fn default() -> Self {
        Self {
            buff_kind: None,
            buff_until: 0.0,
            dmg_mul: 1.0,
            cooldown_mul: 1.0,
            bin_fill_mul: 1.0,
            disabled_type: None,
            disable_until: 0.0,
        }
    }
}

impl SideMods {
    /// Reset the buff slot and every magnitude to neutral
    fn clear_buff(&mut self) {
        self.buff_kind = None;
        self.buff_until = 0.0;
        self.dmg_mul = 1.0;
        self.cooldown_mul = 1.0;
        self.bin_fill_mul = 1.0;
    }

    fn active(&self, kind: BuffKind, now_ms: f64) -> bool {
        self.buff_kind == Some(kind) && now_ms < self.buff_until
    }
}

/// Buff/debuff ledger for both sides
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mods {
    sides: PerSide<SideMods>,
}

impl Mods {
    pub fn side(&self, side: Side) -> &SideMods {
        &self.sides[side]
    }

    pub fn reset(&mut self) {
        self.sides = PerSide::default();
    }

    /// Timed damage multiplier
    pub fn apply_buff(&mut self, side: Side, now_ms: f64, cfg: &ModsConfig) {
        let m = &mut self.sides[side];
        m.clear_buff();
        m.buff_kind = Some(BuffKind::Damage);
        m.dmg_mul = cfg.dmg_mul;
        m.buff_until = now_ms + cfg.buff_duration_ms;
    }

    pub fn apply_cooldown_buff(&mut self, side: Side, now_ms: f64, cfg: &ModsConfig) {
        let m = &mut self.sides[side];
        m.clear_buff();
        m.buff_kind = Some(BuffKind::Cooldown);
        m.cooldown_mul = cfg.cooldown_mul;
        m.buff_until = now_ms + cfg.buff_duration_ms;
    }

    pub fn apply_bin_boost_buff(&mut self, side: Side, now_ms: f64, cfg: &ModsConfig) {
        let m = &mut self.sides[side];
        m.clear_buff();
        m.buff_kind = Some(BuffKind::BinBoost);
        m.bin_fill_mul = cfg.bin_fill_mul;
        m.buff_until = now_ms + cfg.buff_duration_ms;
    }

    /// Disable a weapon on `side`. With no kind given, one is drawn from the pool.
    /// Returns the disabled weapon, or `None` when the pool is empty.
    pub fn apply_debuff<R: Rng>(
        &mut self,
        side: Side,
        kind: Option<WeaponKind>,
        now_ms: f64,
        cfg: &ModsConfig,
        rng: &mut R,
    ) -> Option<WeaponKind> {
        let kind = match kind {
            Some(k) => k,
            None => *cfg.debuff_pool.choose(rng)?,
        };
        let m = &mut self.sides[side];
        m.disabled_type = Some(kind);
        m.disable_until = now_ms + cfg.debuff_duration_ms;
        Some(kind)
    }

    pub fn current_dmg_mul(&self, side: Side, now_ms: f64) -> f32 {
        let m = &self.sides[side];
        if m.active(BuffKind::Damage, now_ms) { m.dmg_mul } else { 1.0 }
    }

    pub fn current_cooldown_mul(&self, side: Side, now_ms: f64) -> f32 {
        let m = &self.sides[side];
        if m.active(BuffKind::Cooldown, now_ms) { m.cooldown_mul } else { 1.0 }
    }

    pub fn current_bin_fill_mul(&self, side: Side, now_ms: f64) -> f32 {
        let m = &self.sides[side];
        if m.active(BuffKind::BinBoost, now_ms) { m.bin_fill_mul } else { 1.0 }
    }

    pub fn is_disabled(&self, side: Side, weapon: WeaponKind, now_ms: f64) -> bool {
        let m = &self.sides[side];
        m.disabled_type == Some(weapon) && now_ms < m.disable_until
    }

    /// Currently active timed buff, if any
    pub fn active_buff(&self, side: Side, now_ms: f64) -> Option<BuffKind> {
        let m = &self.sides[side];
        m.buff_kind.filter(|_| now_ms < m.buff_until)
    }

    /// Currently disabled weapon, if any
    pub fn active_debuff(&self, side: Side, now_ms: f64) -> Option<WeaponKind> {
        let m = &self.sides[side];
        m.disabled_type.filter(|_| now_ms < m.disable_until)
    }
}
