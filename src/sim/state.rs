//! Simulation state
//!
//! Everything a match needs lives in one owned struct. Systems take it by
//! `&mut`, so tests can build isolated instances and two simulations never
//! share anything.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::bins::{BinSet, Cooldowns};
use super::collision::ExplosionLimiter;
use super::core::Core;
use super::entities::{PerSide, Side};
use super::field::{self, Arena};
use super::fx::FxLists;
use super::lifecycle::MatchState;
use super::mods::Mods;
use super::schedule::Scheduler;
use super::weapons::{HomingMissile, LaserBeam};
use crate::config::GameConfig;
use crate::error::SimError;
use crate::hooks::Hooks;
use crate::scoreboard::Scoreboard;

#[derive(Debug)]
pub struct SimulationState {
    pub config: GameConfig,
    pub seed: u64,
    /// Sole source of randomness
    pub rng: Pcg32,
    /// Simulation clock; only `tick` advances it
    pub now_ms: f64,
    pub tick_count: u64,
    /// Frame time not yet consumed by fixed steps
    pub accumulator: f32,
    /// Physics world and field layout; `None` until `start_match`
    pub arena: Option<Arena>,
    pub cores: PerSide<Core>,
    pub bins: PerSide<BinSet>,
    pub cooldowns: PerSide<Cooldowns>,
    pub mods: Mods,
    /// Ammo bodies in play per side
    pub ammo_count: PerSide<u32>,
    pub fx: FxLists,
    pub scheduler: Scheduler,
    pub explosions: ExplosionLimiter,
    pub homing: Vec<HomingMissile>,
    pub beams: Vec<LaserBeam>,
    pub next_beam_id: u32,
    pub spawn_accum_ms: f64,
    pub match_state: MatchState,
    pub scoreboard: Scoreboard,
    pub hooks: Hooks,
}

impl SimulationState {
    /// Validate the config and build an idle state. Call `start_match` before ticking.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let cores = PerSide::from_fn(|side| Core::new(side, field::core_center(side), &config.core));
        let bins = PerSide::from_fn(|_| BinSet::new(&config.bins));
        Ok(Self {
            config,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            now_ms: 0.0,
            tick_count: 0,
            accumulator: 0.0,
            arena: None,
            cores,
            bins,
            cooldowns: PerSide::default(),
            mods: Mods::default(),
            ammo_count: PerSide::default(),
            fx: FxLists::default(),
            scheduler: Scheduler::default(),
            explosions: ExplosionLimiter::default(),
            homing: Vec::new(),
            beams: Vec::new(),
            next_beam_id: 1,
            spawn_accum_ms: 0.0,
            match_state: MatchState::default(),
            scoreboard: Scoreboard::new(),
            hooks: Hooks::default(),
        })
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn is_game_over(&self) -> bool {
        self.match_state.game_over
    }

    pub fn match_elapsed_ms(&self) -> f64 {
        self.now_ms - self.match_state.match_start
    }

    /// Arena for a physics-dependent operation; errors before `start_match`
    pub fn arena(&self, context: &'static str) -> Result<&Arena, SimError> {
        self.arena
            .as_ref()
            .ok_or(SimError::WorldNotInitialized { context })
    }

    pub fn arena_mut(&mut self, context: &'static str) -> Result<&mut Arena, SimError> {
        require_arena(&mut self.arena, context)
    }

    pub fn core(&self, side: Side) -> &Core {
        &self.cores[side]
    }
}

/// Field-level form of [`SimulationState::arena_mut`], for callers that also
/// need other parts of the state borrowed at the same time
pub(crate) fn require_arena<'a>(
    arena: &'a mut Option<Arena>,
    context: &'static str,
) -> Result<&'a mut Arena, SimError> {
    arena
        .as_mut()
        .ok_or(SimError::WorldNotInitialized { context })
}
