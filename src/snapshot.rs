//! Read-only per-frame view for renderers and tooling
//!
//! A [`Snapshot`] copies out everything a frontend draws, so the simulation
//! never has to hand out references into its own state.

use glam::Vec2;
use serde::Serialize;

use crate::sim::bins::Bin;
use crate::sim::core::Core;
use crate::sim::entities::{AmmoType, BodyRole, BuffKind, PerSide, ProjectileType, Side, WeaponKind};
use crate::sim::fx::FxLists;
use crate::sim::lifecycle::Winner;
use crate::sim::state::SimulationState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmmoView {
    pub pos: Vec2,
    pub side: Side,
    pub ammo_type: AmmoType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub vel: Vec2,
    pub side: Side,
    pub ptype: ProjectileType,
}

/// Timed effects visible on a side's HUD
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModsView {
    pub buff: Option<BuffKind>,
    pub disabled: Option<WeaponKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub now_ms: f64,
    pub match_index: u32,
    pub elapsed_ms: f64,
    pub game_over: bool,
    pub winner: Option<Winner>,
    pub cores: PerSide<Core>,
    pub bins: PerSide<Vec<Bin>>,
    pub mods: PerSide<ModsView>,
    pub ammo_count: PerSide<u32>,
    pub ammo: Vec<AmmoView>,
    pub projectiles: Vec<ProjectileView>,
    pub fx: FxLists,
    pub wins: (u32, u32, u32),
}

impl Snapshot {
    pub fn capture(state: &SimulationState) -> Self {
        let now = state.now_ms;
        let mut ammo = Vec::new();
        let mut projectiles = Vec::new();
        if let Some(arena) = &state.arena {
            for (_, body) in arena.world.iter() {
                match body.payload {
                    BodyRole::Ammo(a) => ammo.push(AmmoView {
                        pos: body.pos,
                        side: a.side,
                        ammo_type: a.ammo_type,
                    }),
                    BodyRole::Projectile(p) => projectiles.push(ProjectileView {
                        pos: body.pos,
                        vel: body.vel,
                        side: p.side,
                        ptype: p.ptype,
                    }),
                    _ => {}
                }
            }
        }

        let board = &state.scoreboard;
        Self {
            now_ms: now,
            match_index: state.match_state.match_index,
            elapsed_ms: state.match_elapsed_ms(),
            game_over: state.match_state.game_over,
            winner: state.match_state.winner,
            cores: state.cores.clone(),
            bins: PerSide::from_fn(|side| state.bins[side].iter().copied().collect()),
            mods: PerSide::from_fn(|side| ModsView {
                buff: state.mods.active_buff(side, now),
                disabled: state.mods.active_debuff(side, now),
            }),
            ammo_count: state.ammo_count,
            ammo,
            projectiles,
            fx: state.fx.clone(),
            wins: (board.left_wins, board.right_wins, board.ties),
        }
    }

    /// Current camera offset for a shake, zero once it has expired
    pub fn shake_offset(&self) -> Vec2 {
        let shake = &self.fx.shake;
        if self.now_ms >= shake.until_ms || shake.amplitude <= 0.0 {
            return Vec2::ZERO;
        }
        let t = (self.now_ms / 1000.0) as f32;
        Vec2::new((t * 91.0).sin(), (t * 73.0).cos()) * shake.amplitude
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
