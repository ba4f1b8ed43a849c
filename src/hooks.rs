//! Collaborators the simulation notifies but never depends on.
//!
//! Audio, stats, and banter are best-effort: every call goes through
//! [`Hooks`], which logs a failure and carries on. A broken sound device or
//! stats sink can cost a sound effect or a tally, never a match.

use std::fmt;

use serde::Serialize;

use crate::error::SimError;
use crate::sim::entities::{BinKind, BuffKind, Side, WeaponKind};
use crate::sim::lifecycle::{MatchResult, Winner};

pub type HookResult = Result<(), SimError>;

/// Sound cue keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SoundCue {
    /// Ammo dropped into a matching container
    Deposit,
    /// A bin crossed its cap
    BinFull(BinKind),
    Windup(WeaponKind),
    Fire(WeaponKind),
    ShieldHit,
    CoreHit,
    Explosion,
    Buff,
    Debuff,
    Repair,
    ShieldUp,
    MatchEnd,
}

pub trait AudioOut {
    fn play(&mut self, cue: SoundCue) -> HookResult;

    /// Temporarily lower background audio
    fn duck(&mut self, _amount: f32, _duration_ms: f64) -> HookResult {
        Ok(())
    }
}

/// Damage split for one resolved hit (a projectile or a whole laser beam)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitReport {
    pub shooter: Side,
    pub weapon: WeaponKind,
    pub shield_damage: f32,
    pub segment_damage: f32,
    pub center_damage: f32,
}

pub trait StatsRecorder {
    fn record_shot_fired(&mut self, _side: Side, _weapon: WeaponKind) -> HookResult {
        Ok(())
    }
    fn record_projectile_hit(&mut self, _hit: &HitReport) -> HookResult {
        Ok(())
    }
    fn record_miss(&mut self, _side: Side, _weapon: WeaponKind) -> HookResult {
        Ok(())
    }
    fn record_bin_deposit(&mut self, _side: Side, _bin: BinKind, _amount: u32) -> HookResult {
        Ok(())
    }
    fn record_bin_cap(&mut self, _side: Side, _bin: BinKind) -> HookResult {
        Ok(())
    }
    fn record_buff(&mut self, _side: Side, _kind: BuffKind) -> HookResult {
        Ok(())
    }
    fn record_debuff(&mut self, _target: Side, _weapon: WeaponKind) -> HookResult {
        Ok(())
    }
    fn record_match_end(&mut self, _result: &MatchResult) -> HookResult {
        Ok(())
    }
}

/// Moments the announcer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BanterEvent {
    /// First damage to any core proper this match
    FirstCoreDamage,
    /// A core's center dropped below the low-health fraction
    LowHealth,
    MatchEnd { winner: Winner },
}

pub trait BanterTrigger {
    fn trigger(&mut self, event: BanterEvent, side: Side) -> HookResult;
}

/// Does nothing; the default for every hook
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioOut for Silent {
    fn play(&mut self, _cue: SoundCue) -> HookResult {
        Ok(())
    }
}

impl StatsRecorder for Silent {}

impl BanterTrigger for Silent {
    fn trigger(&mut self, _event: BanterEvent, _side: Side) -> HookResult {
        Ok(())
    }
}

/// The simulation's handles to its collaborators
pub struct Hooks {
    pub audio: Box<dyn AudioOut>,
    pub stats: Box<dyn StatsRecorder>,
    pub banter: Box<dyn BanterTrigger>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            audio: Box::new(Silent),
            stats: Box::new(Silent),
            banter: Box::new(Silent),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

impl Hooks {
    pub fn play(&mut self, cue: SoundCue) {
        if let Err(e) = self.audio.play(cue) {
            log::warn!("audio cue {:?} dropped: {}", cue, e);
        }
    }

    pub fn duck(&mut self, amount: f32, duration_ms: f64) {
        if let Err(e) = self.audio.duck(amount, duration_ms) {
            log::warn!("audio duck dropped: {}", e);
        }
    }

    /// Run a stats call, logging instead of propagating failure
    pub fn stats(&mut self, record: impl FnOnce(&mut dyn StatsRecorder) -> HookResult) {
        if let Err(e) = record(self.stats.as_mut()) {
            log::warn!("stats record dropped: {}", e);
        }
    }

    pub fn banter(&mut self, event: BanterEvent, side: Side) {
        if let Err(e) = self.banter.trigger(event, side) {
            log::warn!("banter {:?} for {} dropped: {}", event, side.as_str(), e);
        }
    }
}
