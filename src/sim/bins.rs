//! Fill accumulators and weapon cooldowns

use serde::Serialize;

use super::entities::{BinKind, WeaponKind};
use crate::config::BinsConfig;

/// One accumulator; crossing `cap` arms the bin's effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bin {
    pub kind: BinKind,
    pub fill: u32,
    pub cap: u32,
}

impl Bin {
    pub fn is_full(&self) -> bool {
        self.fill >= self.cap
    }
}

/// All eight bins for one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinSet {
    bins: [Bin; 8],
}

impl BinSet {
    pub fn new(cfg: &BinsConfig) -> Self {
        Self {
            bins: BinKind::ALL.map(|kind| Bin {
                kind,
                fill: 0,
                cap: cfg.spec(kind).cap,
            }),
        }
    }

    pub fn get(&self, kind: BinKind) -> &Bin {
        &self.bins[kind.index()]
    }

    pub fn deposit(&mut self, kind: BinKind, amount: u32) {
        let bin = &mut self.bins[kind.index()];
        bin.fill = bin.fill.saturating_add(amount);
    }

    /// Empty a full bin. Returns whether it was full (and therefore fired).
    pub fn take_if_full(&mut self, kind: BinKind) -> bool {
        let bin = &mut self.bins[kind.index()];
        if bin.is_full() {
            bin.fill = 0;
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bin> {
        self.bins.iter()
    }
}

/// "Ready at" timestamps per weapon for one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Cooldowns {
    ready_at: [f64; 4],
}

impl Cooldowns {
    pub fn is_ready(&self, weapon: WeaponKind, now_ms: f64) -> bool {
        now_ms >= self.ready_at[weapon.index()]
    }

    pub fn ready_at(&self, weapon: WeaponKind) -> f64 {
        self.ready_at[weapon.index()]
    }

    /// Start a cooldown scaled by the side's current multiplier
    pub fn start(&mut self, weapon: WeaponKind, now_ms: f64, cooldown_ms: f64, multiplier: f32) {
        self.ready_at[weapon.index()] = now_ms + cooldown_ms * multiplier as f64;
    }
}
