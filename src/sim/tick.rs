//! Fixed timestep simulation tick
//!
//! Runs one step of the match in a fixed order. Later stages read what
//! earlier ones wrote, so the order below is part of the game rules:
//!
//! 1. Deferred weapon events that came due
//! 2. Physics pre-update: ammo lifecycle, gel, pipes, paddles, projectile
//!    lifetime, missile homing, core rotation
//! 3. Physics step, then collision resolution
//! 4. Ammo spawn regulation
//! 5. Bin triggers
//! 6. FX pruning
//! 7. Match-end and time-limit checks

use super::collision::resolve_collisions;
use super::entities::Side;
use super::field::{apply_gel, apply_pipes, move_paddles, update_ammo};
use super::lifecycle::{MatchResult, check_match_end, end_match, poll_restart};
use super::spawn::regulate_spawns;
use super::state::{SimulationState, require_arena};
use super::triggers::evaluate_triggers;
use super::weapons::{expire_projectiles, handle_deferred, tick_homing};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::error::SimError;

/// Advance the simulation by one fixed timestep.
///
/// Returns the result of the match if it ended on this tick. Once a match is
/// over only the clock moves, until the auto-restart deadline (if any) starts
/// the next one.
pub fn tick(state: &mut SimulationState, dt: f32) -> Result<Option<MatchResult>, SimError> {
    let dt_ms = dt as f64 * 1000.0;

    if state.match_state.game_over {
        state.now_ms += dt_ms;
        state.tick_count += 1;
        poll_restart(state)?;
        return Ok(None);
    }

    state.arena("tick")?;
    state.now_ms += dt_ms;
    state.tick_count += 1;

    while let Some((at_ms, event)) = state.scheduler.pop_due(state.now_ms) {
        handle_deferred(state, at_ms, event)?;
    }

    pre_update(state, dt)?;

    let pairs = require_arena(&mut state.arena, "tick")?.world.step(dt);
    resolve_collisions(state, &pairs)?;

    regulate_spawns(state, dt_ms)?;
    evaluate_triggers(state)?;
    state.fx.prune(state.now_ms);

    Ok(check_match_end(state).map(|winner| end_match(state, winner)))
}

fn pre_update(state: &mut SimulationState, dt: f32) -> Result<(), SimError> {
    let t_secs = (state.match_elapsed_ms() / 1000.0) as f32;
    let arena = require_arena(&mut state.arena, "tick")?;
    let cfg = &state.config;

    let culled = update_ammo(
        arena,
        &mut state.ammo_count,
        &cfg.ammo,
        &cfg.field.pipe,
        &mut state.rng,
        dt,
    );
    if culled > 0 {
        log::debug!("Culled {} idle or stray ammo", culled);
    }
    apply_gel(arena, &cfg.field.gel_zones, dt);
    apply_pipes(arena, &cfg.field.pipe, dt);
    move_paddles(arena, &cfg.field.paddles, t_secs);

    expire_projectiles(state)?;
    tick_homing(state, dt)?;
    for side in Side::BOTH {
        state.cores[side].rotate(dt);
    }
    Ok(())
}

/// Feed a variable frame time through fixed steps, capped per frame.
/// Returns every match that ended along the way.
pub fn advance(state: &mut SimulationState, frame_dt: f32) -> Result<Vec<MatchResult>, SimError> {
    state.accumulator += frame_dt.clamp(0.0, 0.1);

    let mut ended = Vec::new();
    let mut substeps = 0;
    while state.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
        if let Some(result) = tick(state, SIM_DT)? {
            ended.push(result);
        }
        state.accumulator -= SIM_DT;
        substeps += 1;
    }
    Ok(ended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::sim::lifecycle::{Winner, start_match};
    use glam::Vec2;

    fn running(seed: u64) -> SimulationState {
        let mut state = SimulationState::new(GameConfig::default(), seed).unwrap();
        start_match(&mut state).unwrap();
        state
    }

    fn positions(state: &SimulationState) -> Vec<Vec2> {
        state
            .arena
            .as_ref()
            .unwrap()
            .world
            .iter()
            .map(|(_, b)| b.pos)
            .collect()
    }

    #[test]
    fn test_tick_requires_started_match() {
        let mut state = SimulationState::new(GameConfig::default(), 1).unwrap();
        assert!(matches!(
            tick(&mut state, SIM_DT),
            Err(SimError::WorldNotInitialized { context: "tick" })
        ));
        assert_eq!(state.now_ms, 0.0);
    }

    #[test]
    fn test_clock_and_spawns_advance() {
        let mut state = running(3);
        for _ in 0..60 {
            tick(&mut state, SIM_DT).unwrap();
        }
        assert_eq!(state.tick_count, 60);
        assert!((state.now_ms - 1000.0).abs() < 1e-3);
        assert!(state.ammo_count[Side::Left] > 0);
        assert!(state.ammo_count[Side::Right] > 0);
    }

    #[test]
    fn test_ammo_counter_matches_world() {
        let mut state = running(17);
        for _ in 0..600 {
            tick(&mut state, SIM_DT).unwrap();
        }
        let world = &state.arena.as_ref().unwrap().world;
        for side in Side::BOTH {
            let in_world = world
                .iter()
                .filter(|(_, b)| {
                    matches!(b.payload, crate::sim::entities::BodyRole::Ammo(a) if a.side == side)
                })
                .count() as u32;
            assert_eq!(state.ammo_count[side], in_world);
        }
    }

    #[test]
    fn test_core_death_ends_match() {
        let mut state = running(5);
        state.cores.right.set_center_hp(0.0);

        let result = tick(&mut state, SIM_DT).unwrap().unwrap();
        assert_eq!(result.winner, Winner::Left);
        assert!(state.is_game_over());
        // Final frame stays drawable
        assert!(state.arena.is_some());
        assert_eq!(state.scoreboard.left_wins, 1);
    }

    #[test]
    fn test_time_limit_is_tie() {
        let mut config = GameConfig::default();
        config.match_rules.time_limit_ms = 100.0;
        let mut state = SimulationState::new(config, 5).unwrap();
        start_match(&mut state).unwrap();

        let mut result = None;
        for _ in 0..10 {
            if let Some(r) = tick(&mut state, SIM_DT).unwrap() {
                result = Some(r);
                break;
            }
        }
        assert_eq!(result.map(|r| r.winner), Some(Winner::Tie));
    }

    #[test]
    fn test_game_over_freezes_play() {
        let mut state = running(5);
        for _ in 0..30 {
            tick(&mut state, SIM_DT).unwrap();
        }
        state.cores.left.set_center_hp(0.0);
        tick(&mut state, SIM_DT).unwrap();
        let before = positions(&state);
        let ammo = state.ammo_count;

        for _ in 0..30 {
            assert!(tick(&mut state, SIM_DT).unwrap().is_none());
        }
        assert_eq!(positions(&state), before);
        assert_eq!(state.ammo_count, ammo);
    }

    #[test]
    fn test_auto_restart() {
        let mut config = GameConfig::default();
        config.match_rules.auto_restart_ms = Some(200.0);
        let mut state = SimulationState::new(config, 5).unwrap();
        start_match(&mut state).unwrap();
        state.cores.left.set_center_hp(0.0);
        tick(&mut state, SIM_DT).unwrap();
        assert!(state.is_game_over());

        for _ in 0..20 {
            tick(&mut state, SIM_DT).unwrap();
        }
        assert!(!state.is_game_over());
        assert_eq!(state.match_state.match_index, 2);
        assert_eq!(state.cores.left.center_hp(), state.cores.left.center_hp_max);
    }

    #[test]
    fn test_same_seed_same_match() {
        let mut a = running(1234);
        let mut b = running(1234);
        for _ in 0..300 {
            tick(&mut a, SIM_DT).unwrap();
            tick(&mut b, SIM_DT).unwrap();
        }
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(a.ammo_count, b.ammo_count);
    }

    #[test]
    fn test_advance_runs_fixed_steps() {
        let mut state = running(2);
        advance(&mut state, 0.04).unwrap();
        assert_eq!(state.tick_count, 2);

        // A long stall is capped
        let mut state = running(2);
        advance(&mut state, 10.0).unwrap();
        assert!(state.tick_count >= 5 && state.tick_count <= MAX_SUBSTEPS as u64);
    }
}
