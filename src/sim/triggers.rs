//! Bin-trigger evaluation
//!
//! Once per tick each side's bins are checked in a fixed order: buff, debuff,
//! the four weapons, repair, shield. A bin at cap is emptied and its effect
//! runs exactly once. Weapon bins also wait for their cooldown; a full weapon
//! bin on cooldown keeps its fill until the weapon is ready. A triggered
//! weapon always shows its windup marker, even when a debuff drops the shot.

use rand::seq::IndexedRandom;

use super::entities::{BinKind, BuffKind, Side, WeaponKind};
use super::spawn::side_order;
use super::state::SimulationState;
use super::weapons::{emit_windup, queue_fire};
use crate::error::SimError;
use crate::hooks::SoundCue;

/// Evaluate every bin on both sides
pub fn evaluate_triggers(state: &mut SimulationState) -> Result<(), SimError> {
    let order = side_order(
        state.config.spawn.order,
        state.tick_count,
        state.match_state.match_index,
    );
    for side in order {
        evaluate_side(state, side)?;
    }
    Ok(())
}

fn evaluate_side(state: &mut SimulationState, side: Side) -> Result<(), SimError> {
    if take_full(state, side, BinKind::Buff) {
        grant_buff(state, side);
    }

    if take_full(state, side, BinKind::Debuff) {
        let target = side.opposite();
        let now = state.now_ms;
        if let Some(weapon) =
            state
                .mods
                .apply_debuff(target, None, now, &state.config.mods, &mut state.rng)
        {
            log::debug!("{} disables {} {:?}", side.as_str(), target.as_str(), weapon);
            state.hooks.stats(|s| s.record_debuff(target, weapon));
            state.hooks.play(SoundCue::Debuff);
        }
    }

    for weapon in WeaponKind::ALL {
        let bin = BinKind::from(weapon);
        if !state.cooldowns[side].is_ready(weapon, state.now_ms) {
            continue;
        }
        if !take_full(state, side, bin) {
            continue;
        }
        let mul = state.mods.current_cooldown_mul(side, state.now_ms);
        let cooldown = state.config.cooldown_ms(weapon);
        state.cooldowns[side].start(weapon, state.now_ms, cooldown, mul);
        emit_windup(state, side, weapon)?;
        queue_fire(state, side, weapon)?;
    }

    if take_full(state, side, BinKind::Repair) {
        let cfg = &state.config.repair;
        state.cores[side].repair(cfg.seg_points, cfg.center_points);
        log::debug!("{} core repaired", side.as_str());
        state.hooks.play(SoundCue::Repair);
    }

    if take_full(state, side, BinKind::Shield) {
        let points = state.config.shield.pickup_points;
        apply_shield_buff(state, side, points);
    }
    Ok(())
}

/// Empty `bin` if it reached cap, recording the crossing
fn take_full(state: &mut SimulationState, side: Side, bin: BinKind) -> bool {
    if !state.bins[side].take_if_full(bin) {
        return false;
    }
    log::debug!("{} {:?} bin triggered", side.as_str(), bin);
    state.hooks.stats(|s| s.record_bin_cap(side, bin));
    state.hooks.play(SoundCue::BinFull(bin));
    true
}

/// Draw from the buff pool and apply it to `side`
fn grant_buff(state: &mut SimulationState, side: Side) {
    let Some(&kind) = state.config.mods.buff_pool.choose(&mut state.rng) else {
        return;
    };
    let now = state.now_ms;
    let cfg = &state.config.mods;
    match kind {
        BuffKind::Damage => state.mods.apply_buff(side, now, cfg),
        BuffKind::Cooldown => state.mods.apply_cooldown_buff(side, now, cfg),
        BuffKind::BinBoost => state.mods.apply_bin_boost_buff(side, now, cfg),
        BuffKind::Shield => {
            let points = cfg.shield_buff_points;
            apply_shield_buff(state, side, points);
        }
    }
    log::debug!("{} gains {:?} buff", side.as_str(), kind);
    state.hooks.stats(|s| s.record_buff(side, kind));
    state.hooks.play(SoundCue::Buff);
}

/// Add shield points immediately, clamped to max. Does not use the buff slot.
/// Returns the points actually gained.
pub fn apply_shield_buff(state: &mut SimulationState, side: Side, points: f32) -> f32 {
    let gained = state.cores[side].add_shield(points);
    if gained > 0.0 {
        state.hooks.play(SoundCue::ShieldUp);
    }
    gained
}
