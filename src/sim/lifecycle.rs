//! Match flow: start, win/tie detection, teardown, and auto-restart

use serde::{Deserialize, Serialize};

use super::bins::{BinSet, Cooldowns};
use super::core::Core;
use super::entities::{PerSide, Side};
use super::field::{self, build_arena};
use super::state::SimulationState;
use super::weapons::settle_in_flight;
use crate::error::SimError;
use crate::hooks::{BanterEvent, SoundCue};

/// Outcome of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Left,
    Right,
    Tie,
}

impl Winner {
    pub fn side(self) -> Option<Side> {
        match self {
            Winner::Left => Some(Side::Left),
            Winner::Right => Some(Side::Right),
            Winner::Tie => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Winner::Left => "left",
            Winner::Right => "right",
            Winner::Tie => "tie",
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Winner::Left,
            Side::Right => Winner::Right,
        }
    }
}

/// Summary handed to stats and the scoreboard when a match ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: Winner,
    pub duration_ms: f64,
    pub center_hp: PerSide<f32>,
    pub match_index: u32,
}

/// Per-match flags and timestamps
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchState {
    pub game_over: bool,
    pub winner: Option<Winner>,
    pub winner_at: Option<f64>,
    pub match_start: f64,
    /// Increments on every `start_match`; 0 before the first
    pub match_index: u32,
    /// The single outstanding auto-restart deadline
    pub restart_at: Option<f64>,
    pub(crate) first_damage_seen: bool,
    pub(crate) low_health_called: PerSide<bool>,
}

/// Decide a winner from which cores are dead. `None` while both stand.
pub fn determine_winner(left_dead: bool, right_dead: bool) -> Option<Winner> {
    match (left_dead, right_dead) {
        (true, true) => Some(Winner::Tie),
        (true, false) => Some(Winner::Right),
        (false, true) => Some(Winner::Left),
        (false, false) => None,
    }
}

/// Core deaths first, then the time limit (a tie regardless of HP)
pub fn check_match_end(state: &SimulationState) -> Option<Winner> {
    let by_hp = determine_winner(
        state.cores.left.is_destroyed(),
        state.cores.right.is_destroyed(),
    );
    if by_hp.is_some() {
        return by_hp;
    }
    let limit = state.config.match_rules.time_limit_ms;
    if limit > 0.0 && state.match_elapsed_ms() >= limit {
        return Some(Winner::Tie);
    }
    None
}

/// Tear down whatever is running and build a fresh arena
pub fn start_match(state: &mut SimulationState) -> Result<(), SimError> {
    settle_in_flight(state);
    let cfg = &state.config;
    state.cores = PerSide::from_fn(|side| Core::new(side, field::core_center(side), &cfg.core));
    state.bins = PerSide::from_fn(|_| BinSet::new(&cfg.bins));
    state.cooldowns = PerSide::<Cooldowns>::default();
    state.mods.reset();
    state.ammo_count = PerSide::default();
    state.fx.clear();
    state.scheduler.clear();
    state.explosions.reset();
    state.homing.clear();
    state.beams.clear();
    state.spawn_accum_ms = 0.0;

    state.arena = Some(build_arena(&state.config, &state.cores));

    let m = &mut state.match_state;
    m.game_over = false;
    m.winner = None;
    m.winner_at = None;
    m.restart_at = None;
    m.match_start = state.now_ms;
    m.match_index += 1;
    m.first_damage_seen = false;
    m.low_health_called = PerSide::default();

    log::info!(
        "Match {} started at {:.0}ms (seed {})",
        m.match_index,
        state.now_ms,
        state.seed
    );
    Ok(())
}

/// Finish the running match: freeze play, record the result, arm the restart.
///
/// The arena stays in place so the final frame can still be drawn. Deferred
/// weapon events are dropped so nothing carries into the next match, and
/// shots still in flight are settled as hits or misses.
pub fn end_match(state: &mut SimulationState, winner: Winner) -> MatchResult {
    let now = state.now_ms;
    state.match_state.game_over = true;
    state.match_state.winner = Some(winner);
    state.match_state.winner_at = Some(now);
    state.scheduler.clear();
    settle_in_flight(state);

    let result = MatchResult {
        winner,
        duration_ms: state.match_elapsed_ms(),
        center_hp: PerSide::from_fn(|side| state.cores[side].center_hp()),
        match_index: state.match_state.match_index,
    };
    state.scoreboard.record(&result);

    state.match_state.restart_at = state.config.match_rules.auto_restart_ms.map(|d| now + d);

    state.hooks.stats(|s| s.record_match_end(&result));
    state.hooks.play(SoundCue::MatchEnd);
    state.hooks.duck(0.5, 1500.0);
    for side in Side::BOTH {
        state.hooks.banter(BanterEvent::MatchEnd { winner }, side);
    }

    log::info!(
        "Match {} over after {:.1}s: {} (center hp {:.0} / {:.0})",
        result.match_index,
        result.duration_ms / 1000.0,
        winner.as_str(),
        result.center_hp.left,
        result.center_hp.right
    );
    result
}

/// Abort the running match: flag it over, empty the world, cancel the restart
pub fn stop_match(state: &mut SimulationState) {
    state.match_state.game_over = true;
    state.match_state.restart_at = None;
    state.scheduler.clear();
    settle_in_flight(state);
    state.arena = None;
    state.ammo_count = PerSide::default();
    log::info!("Match {} stopped", state.match_state.match_index);
}

/// Start the next match once the restart deadline passes. Returns whether it did.
pub fn poll_restart(state: &mut SimulationState) -> Result<bool, SimError> {
    match state.match_state.restart_at {
        Some(at) if state.now_ms >= at => {
            start_match(state)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Banter for damage that reached a core proper
pub(crate) fn announce_core_damage(state: &mut SimulationState, target: Side) {
    if !state.match_state.first_damage_seen {
        state.match_state.first_damage_seen = true;
        state.hooks.banter(BanterEvent::FirstCoreDamage, target);
    }

    let core = &state.cores[target];
    let threshold = core.center_hp_max * state.config.match_rules.low_health_fraction;
    if core.center_hp() < threshold && !state.match_state.low_health_called[target] {
        state.match_state.low_health_called[target] = true;
        state.hooks.banter(BanterEvent::LowHealth, target);
    }
}
