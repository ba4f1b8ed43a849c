//! In-memory session statistics
//!
//! [`SessionStats`] implements the stats hook as plain tallies. Share one
//! between the simulation and the caller with `Rc<RefCell<_>>`:
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//! use pachinko_battler::{GameConfig, SessionStats};
//! use pachinko_battler::hooks::Hooks;
//! use pachinko_battler::sim::SimulationState;
//!
//! let stats = Rc::new(RefCell::new(SessionStats::default()));
//! let hooks = Hooks { stats: Box::new(stats.clone()), ..Default::default() };
//! let state = SimulationState::new(GameConfig::default(), 7).unwrap().with_hooks(hooks);
//! # let _ = state;
//! assert_eq!(stats.borrow().matches, 0);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::hooks::{HitReport, HookResult, StatsRecorder};
use crate::sim::entities::{BinKind, BuffKind, PerSide, Side, WeaponKind};
use crate::sim::lifecycle::MatchResult;

/// Fire/hit/miss counts for one weapon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeaponTally {
    /// Projectiles launched; a laser beam counts once
    pub fired: u32,
    pub hits: u32,
    pub misses: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DamageTally {
    pub shield: f32,
    pub segment: f32,
    pub center: f32,
}

impl DamageTally {
    pub fn total(&self) -> f32 {
        self.shield + self.segment + self.center
    }
}

/// Everything credited to one side
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SideStats {
    /// Indexed by `WeaponKind::index`
    pub weapons: [WeaponTally; 4],
    /// Damage this side dealt
    pub damage_dealt: DamageTally,
    /// Ammo units credited to bins
    pub deposits: u32,
    /// Bin threshold crossings, indexed by `BinKind::index`
    pub bin_caps: [u32; 8],
    pub buffs: u32,
    /// Debuffs this side suffered
    pub debuffs_taken: u32,
    pub wins: u32,
}

impl SideStats {
    pub fn weapon(&self, weapon: WeaponKind) -> &WeaponTally {
        &self.weapons[weapon.index()]
    }

    /// Hits over resolved shots, `None` before anything resolved
    pub fn accuracy(&self, weapon: WeaponKind) -> Option<f32> {
        let t = self.weapon(weapon);
        let resolved = t.hits + t.misses;
        (resolved > 0).then(|| t.hits as f32 / resolved as f32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub sides: PerSide<SideStats>,
    pub matches: u32,
    pub ties: u32,
    /// Sum of finished match durations
    pub time_played_ms: f64,
}

impl SessionStats {
    pub fn side(&self, side: Side) -> &SideStats {
        &self.sides[side]
    }
}

impl StatsRecorder for SessionStats {
    fn record_shot_fired(&mut self, side: Side, weapon: WeaponKind) -> HookResult {
        self.sides[side].weapons[weapon.index()].fired += 1;
        Ok(())
    }

    fn record_projectile_hit(&mut self, hit: &HitReport) -> HookResult {
        let s = &mut self.sides[hit.shooter];
        s.weapons[hit.weapon.index()].hits += 1;
        s.damage_dealt.shield += hit.shield_damage;
        s.damage_dealt.segment += hit.segment_damage;
        s.damage_dealt.center += hit.center_damage;
        Ok(())
    }

    fn record_miss(&mut self, side: Side, weapon: WeaponKind) -> HookResult {
        self.sides[side].weapons[weapon.index()].misses += 1;
        Ok(())
    }

    fn record_bin_deposit(&mut self, side: Side, _bin: BinKind, amount: u32) -> HookResult {
        self.sides[side].deposits += amount;
        Ok(())
    }

    fn record_bin_cap(&mut self, side: Side, bin: BinKind) -> HookResult {
        self.sides[side].bin_caps[bin.index()] += 1;
        Ok(())
    }

    fn record_buff(&mut self, side: Side, _kind: BuffKind) -> HookResult {
        self.sides[side].buffs += 1;
        Ok(())
    }

    fn record_debuff(&mut self, target: Side, _weapon: WeaponKind) -> HookResult {
        self.sides[target].debuffs_taken += 1;
        Ok(())
    }

    fn record_match_end(&mut self, result: &MatchResult) -> HookResult {
        self.matches += 1;
        self.time_played_ms += result.duration_ms;
        match result.winner.side() {
            Some(side) => self.sides[side].wins += 1,
            None => self.ties += 1,
        }
        Ok(())
    }
}

/// Lets the caller keep a handle on stats the simulation is writing
impl<T: StatsRecorder> StatsRecorder for Rc<RefCell<T>> {
    fn record_shot_fired(&mut self, side: Side, weapon: WeaponKind) -> HookResult {
        self.borrow_mut().record_shot_fired(side, weapon)
    }

    fn record_projectile_hit(&mut self, hit: &HitReport) -> HookResult {
        self.borrow_mut().record_projectile_hit(hit)
    }

    fn record_miss(&mut self, side: Side, weapon: WeaponKind) -> HookResult {
        self.borrow_mut().record_miss(side, weapon)
    }

    fn record_bin_deposit(&mut self, side: Side, bin: BinKind, amount: u32) -> HookResult {
        self.borrow_mut().record_bin_deposit(side, bin, amount)
    }

    fn record_bin_cap(&mut self, side: Side, bin: BinKind) -> HookResult {
        self.borrow_mut().record_bin_cap(side, bin)
    }

    fn record_buff(&mut self, side: Side, kind: BuffKind) -> HookResult {
        self.borrow_mut().record_buff(side, kind)
    }

    fn record_debuff(&mut self, target: Side, weapon: WeaponKind) -> HookResult {
        self.borrow_mut().record_debuff(target, weapon)
    }

    fn record_match_end(&mut self, result: &MatchResult) -> HookResult {
        self.borrow_mut().record_match_end(result)
    }
}
