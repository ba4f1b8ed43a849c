//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Fixed timestep only, and the clock moves only inside `tick`
//! - One seeded RNG owned by the state
//! - Stable iteration order (bodies by handle)
//! - No rendering, audio, or platform dependencies (collaborators go through `hooks`)

pub mod bins;
pub mod collision;
pub mod core;
pub mod damage;
pub mod entities;
pub mod field;
pub mod fx;
pub mod lifecycle;
pub mod mods;
pub mod schedule;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod triggers;
pub mod weapons;

pub use collision::{ExplosionLimiter, explode_at, resolve_collisions};
pub use self::core::Core;
pub use damage::{DamageOutcome, HitPoint, apply_core_damage, apply_core_damage_at};
pub use entities::{
    AmmoType, BinKind, BodyRole, BuffKind, PerSide, ProjectileType, Side, WeaponKind,
};
pub use lifecycle::{MatchResult, Winner, end_match, poll_restart, start_match, stop_match};
pub use state::SimulationState;
pub use tick::{advance, tick};
pub use triggers::apply_shield_buff;
pub use weapons::{emit_windup, queue_fire, settle_in_flight};
