//! Weapon fire routines.
//!
//! Every weapon follows the same shape: a full bin queues a `Fire` event one
//! windup later, and the fire routine either spawns projectiles (cannon,
//! missile, mortar) or opens a beam that deals damage on a repeating tick
//! (laser). Missiles are then steered each tick by [`tick_homing`].

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::damage::{HitPoint, apply_core_damage_at};
use super::entities::{BodyRole, ProjectileData, ProjectileType, Side, WeaponKind};
use super::fx::{BeamFx, Burst, BurstKind, Impact, WindupMarker};
use super::lifecycle::announce_core_damage;
use super::schedule::Deferred;
use super::state::{SimulationState, require_arena};
use crate::error::SimError;
use crate::hooks::{HitReport, Hooks, SoundCue};
use crate::physics::{Body, BodyHandle, PhysicsWorld, Shape};
use crate::{heading, polar_to_cartesian, shortest_angle};

/// A missile being steered toward the enemy core
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HomingMissile {
    pub handle: BodyHandle,
    pub side: Side,
    pub spawn_ms: f64,
}

/// An active laser and the damage it has dealt so far
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaserBeam {
    pub id: u32,
    pub side: Side,
    pub from: Vec2,
    pub to: Vec2,
    /// Sensor body covering the beam
    pub sensor: BodyHandle,
    pub until_ms: f64,
    /// Damage multiplier captured when the beam fired
    pub dmg_mul: f32,
    pub dealt: HitReport,
}

/// Arm a weapon: the shot fires one windup from now.
///
/// A no-op returning `false` once the match is over or while the weapon is
/// disabled by a debuff.
pub fn queue_fire(
    state: &mut SimulationState,
    side: Side,
    weapon: WeaponKind,
) -> Result<bool, SimError> {
    if state.match_state.game_over {
        return Ok(false);
    }
    if state.mods.is_disabled(side, weapon, state.now_ms) {
        log::debug!("{} {:?} is disabled, shot dropped", side.as_str(), weapon);
        return Ok(false);
    }

    state.arena("queue_fire")?;
    let fire_at = state.now_ms + state.config.weapons.windup_ms;
    state.scheduler.schedule(fire_at, Deferred::Fire { side, weapon });
    Ok(true)
}

/// Telegraph a triggered weapon at its mount for one windup
pub fn emit_windup(
    state: &mut SimulationState,
    side: Side,
    weapon: WeaponKind,
) -> Result<(), SimError> {
    let mount = state.arena("emit_windup")?.board(side).mount(weapon);
    state.fx.windups.push(WindupMarker {
        side,
        weapon,
        pos: mount,
        fire_at_ms: state.now_ms + state.config.weapons.windup_ms,
    });
    state.hooks.play(SoundCue::Windup(weapon));
    Ok(())
}

/// Run a deferred weapon event that came due at `at_ms`
pub fn handle_deferred(
    state: &mut SimulationState,
    at_ms: f64,
    event: Deferred,
) -> Result<(), SimError> {
    if state.match_state.game_over {
        return Ok(());
    }
    match event {
        Deferred::Fire { side, weapon } => fire(state, side, weapon),
        Deferred::CannonShot { side, .. } => fire_cannon_shot(state, side).map(|_| ()),
        Deferred::LaserTick { beam_id } => laser_tick(state, beam_id, at_ms),
        Deferred::LaserEnd { beam_id } => {
            laser_end(state, beam_id);
            Ok(())
        }
    }
}

/// Fire routine for a weapon whose windup has elapsed
pub fn fire(state: &mut SimulationState, side: Side, weapon: WeaponKind) -> Result<(), SimError> {
    log::debug!("{} fires {:?} at {:.0}ms", side.as_str(), weapon, state.now_ms);
    state.hooks.play(SoundCue::Fire(weapon));
    match weapon {
        WeaponKind::Cannon => {
            let cfg = &state.config.cannon;
            for index in 0..cfg.burst {
                let at = state.now_ms + cfg.stagger_ms * index as f64;
                state.scheduler.schedule(at, Deferred::CannonShot { side, index });
            }
            Ok(())
        }
        WeaponKind::Laser => fire_laser(state, side).map(|_| ()),
        WeaponKind::Missile => fire_missiles(state, side).map(|_| ()),
        WeaponKind::Mortar => fire_mortar(state, side).map(|_| ()),
    }
}

fn jitter<R: Rng>(rng: &mut R, amount: f32) -> f32 {
    if amount > 0.0 {
        rng.random_range(-amount..=amount)
    } else {
        0.0
    }
}

/// Launch geometry shared by every projectile
struct Launch {
    ptype: ProjectileType,
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    gravity_scale: f32,
    base_damage: f32,
}

fn spawn_projectile(
    state: &mut SimulationState,
    side: Side,
    launch: Launch,
) -> Result<BodyHandle, SimError> {
    let now = state.now_ms;
    let dmg = launch.base_damage * state.mods.current_dmg_mul(side, now);
    let arena = require_arena(&mut state.arena, "spawn_projectile")?;
    let body = Body::dynamic(
        launch.pos,
        Shape::Circle {
            radius: launch.radius,
        },
        BodyRole::Projectile(ProjectileData {
            ptype: launch.ptype,
            side,
            dmg,
            spawn_ms: now,
            did_damage: false,
        }),
    )
    .with_velocity(launch.vel)
    .with_gravity_scale(launch.gravity_scale)
    .sensor();
    let handle = arena.world.add(body);

    let weapon = WeaponKind::from(launch.ptype);
    state.hooks.stats(|s| s.record_shot_fired(side, weapon));
    Ok(handle)
}

/// One round of a cannon burst: aimed at the enemy core, faster at range
pub fn fire_cannon_shot(state: &mut SimulationState, side: Side) -> Result<BodyHandle, SimError> {
    let mount = state.arena("fire_cannon")?.board(side).mount(WeaponKind::Cannon);
    let target = state.cores[side.opposite()].center;
    let cfg = &state.config.cannon;

    let to_target = target - mount;
    let speed_mul = (to_target.length() / cfg.ref_distance.max(1.0))
        .clamp(cfg.min_speed_mul, cfg.max_speed_mul);
    let angle = heading(to_target) + jitter(&mut state.rng, cfg.jitter_rad);

    let launch = Launch {
        ptype: ProjectileType::Cannon,
        pos: mount,
        vel: polar_to_cartesian(cfg.speed * speed_mul, angle),
        radius: cfg.radius,
        gravity_scale: cfg.gravity_scale,
        base_damage: cfg.damage,
    };
    spawn_projectile(state, side, launch)
}

/// Fan of homing missiles, tilted so both sides' arcs bow upward
pub fn fire_missiles(state: &mut SimulationState, side: Side) -> Result<Vec<BodyHandle>, SimError> {
    let mount = state.arena("fire_missiles")?.board(side).mount(WeaponKind::Missile);
    let target = state.cores[side.opposite()].center;
    let cfg = state.config.missile.clone();

    let base = heading(target - mount) + side.tilt_sign() * cfg.arc_tilt_rad;
    let mut handles = Vec::with_capacity(cfg.count as usize);
    for i in 0..cfg.count {
        let offset = if cfg.count > 1 {
            -cfg.spread_rad / 2.0 + cfg.spread_rad * i as f32 / (cfg.count - 1) as f32
        } else {
            0.0
        };
        let angle = base + offset + jitter(&mut state.rng, cfg.jitter_rad);
        let launch = Launch {
            ptype: ProjectileType::Missile,
            pos: mount,
            vel: polar_to_cartesian(cfg.launch_speed, angle),
            radius: cfg.radius,
            gravity_scale: 0.0,
            base_damage: cfg.damage,
        };
        let handle = spawn_projectile(state, side, launch)?;
        state.homing.push(HomingMissile {
            handle,
            side,
            spawn_ms: state.now_ms,
        });
        handles.push(handle);
    }
    Ok(handles)
}

/// Initial velocity of a lofted shot from `from` landing on `to`.
///
/// Solves for the descending time of flight under `gravity`; when no real
/// solution exists (or gravity is off) the flight time falls back to
/// distance over loft speed.
pub fn ballistic_velocity(from: Vec2, to: Vec2, loft_speed: f32, gravity: f32) -> Vec2 {
    let d = to - from;
    let fallback = d.length() / loft_speed.max(1.0);
    let t = if gravity > 0.0 {
        let disc = loft_speed * loft_speed + 2.0 * gravity * d.y;
        if disc >= 0.0 {
            (loft_speed + disc.sqrt()) / gravity
        } else {
            fallback
        }
    } else {
        fallback
    };
    Vec2::new(d.x / t.max(1e-3), -loft_speed)
}

pub fn fire_mortar(state: &mut SimulationState, side: Side) -> Result<BodyHandle, SimError> {
    let mount = state.arena("fire_mortar")?.board(side).mount(WeaponKind::Mortar);
    let target = state.cores[side.opposite()].center;
    let cfg = &state.config.mortar;
    let gravity = state.config.field.gravity * cfg.gravity_scale;

    let launch = Launch {
        ptype: ProjectileType::Mortar,
        pos: mount,
        vel: ballistic_velocity(mount, target, cfg.loft_speed, gravity),
        radius: cfg.radius,
        gravity_scale: cfg.gravity_scale,
        base_damage: cfg.damage,
    };
    spawn_projectile(state, side, launch)
}

/// Open a beam from the laser mount to the facing point of the enemy ring
pub fn fire_laser(state: &mut SimulationState, side: Side) -> Result<u32, SimError> {
    let now = state.now_ms;
    let target = side.opposite();
    let cfg = state.config.laser.clone();
    let from = state.arena("fire_laser")?.board(side).mount(WeaponKind::Laser);
    let to = state.cores[target].ring_point_toward(from);

    let sensor = require_arena(&mut state.arena, "fire_laser")?.world.add(
        Body::fixed(
            (from + to) / 2.0,
            Shape::Segment {
                half: (to - from) / 2.0,
                radius: cfg.beam_half_width,
            },
            BodyRole::LaserBeam { side },
        )
        .sensor(),
    );

    let id = state.next_beam_id;
    state.next_beam_id += 1;
    let until_ms = now + cfg.duration_ms;
    state.beams.push(LaserBeam {
        id,
        side,
        from,
        to,
        sensor,
        until_ms,
        dmg_mul: state.mods.current_dmg_mul(side, now),
        dealt: HitReport {
            shooter: side,
            weapon: WeaponKind::Laser,
            shield_damage: 0.0,
            segment_damage: 0.0,
            center_damage: 0.0,
        },
    });
    state.fx.beams.push(BeamFx {
        side,
        from,
        to,
        until_ms,
    });
    state.scheduler.schedule(
        (now + cfg.tick_ms).min(until_ms),
        Deferred::LaserTick { beam_id: id },
    );
    state.hooks.stats(|s| s.record_shot_fired(side, WeaponKind::Laser));
    Ok(id)
}

/// One damage tick of an active beam; schedules the next tick or the beam's end
fn laser_tick(state: &mut SimulationState, beam_id: u32, at_ms: f64) -> Result<(), SimError> {
    let Some(index) = state.beams.iter().position(|b| b.id == beam_id) else {
        return Ok(());
    };
    let beam = state.beams[index].clone();
    let cfg = state.config.laser.clone();
    let target = beam.side.opposite();
    let amount = cfg.dps * (cfg.tick_ms / 1000.0) as f32 * beam.dmg_mul;

    let eps = state.config.shield.epsilon;
    let core = &mut state.cores[target];
    let mut shield_damage = 0.0;
    let mut proper = amount;
    let shielded = core.has_shield(eps);
    if shielded {
        let effective = amount * cfg.shield_pen_factor;
        let before = core.damage_shield(effective);
        shield_damage = effective.min(before);
        proper = (effective - before).max(0.0);
    }
    let outcome = apply_core_damage_at(
        core,
        HitPoint::at(beam.to),
        proper,
        &state.config.damage,
        &mut state.rng,
    );

    let dealt = &mut state.beams[index].dealt;
    dealt.shield_damage += shield_damage;
    dealt.segment_damage += outcome.segment_damage;
    dealt.center_damage += outcome.center_damage;

    state.fx.impacts.push(Impact {
        pos: beam.to,
        target,
        shielded,
        at_ms: state.now_ms,
        ttl_ms: cfg.tick_ms * 2.0,
    });
    if outcome.total() > 0.0 {
        announce_core_damage(state, target);
    }

    let next = at_ms + cfg.tick_ms;
    if next <= beam.until_ms {
        state.scheduler.schedule(next, Deferred::LaserTick { beam_id });
    } else {
        state
            .scheduler
            .schedule(beam.until_ms.max(at_ms), Deferred::LaserEnd { beam_id });
    }
    Ok(())
}

/// Close a beam, drop its sensor, and report the beam as one hit or a miss
fn laser_end(state: &mut SimulationState, beam_id: u32) {
    let Some(index) = state.beams.iter().position(|b| b.id == beam_id) else {
        return;
    };
    let beam = state.beams.swap_remove(index);
    if let Some(arena) = state.arena.as_mut() {
        arena.world.remove(beam.sensor);
    }
    let dealt = beam.dealt;
    if dealt.shield_damage + dealt.segment_damage + dealt.center_damage > 0.0 {
        state.hooks.stats(|s| s.record_projectile_hit(&dealt));
    } else {
        state.hooks.stats(|s| s.record_miss(beam.side, WeaponKind::Laser));
    }
}

/// Remove a projectile body; one that never dealt damage counts as a miss
pub(crate) fn retire_projectile(
    world: &mut PhysicsWorld<BodyRole>,
    hooks: &mut Hooks,
    handle: BodyHandle,
) -> Option<ProjectileData> {
    let body = world.remove(handle)?;
    let BodyRole::Projectile(data) = body.payload else {
        return None;
    };
    if !data.did_damage {
        hooks.stats(|s| s.record_miss(data.side, data.ptype.into()));
    }
    Some(data)
}

/// Account for everything still in flight when a match is torn down: open
/// beams close and report, projectiles retire (a miss unless they already
/// dealt damage). Idempotent.
pub fn settle_in_flight(state: &mut SimulationState) {
    let beam_ids: Vec<u32> = state.beams.iter().map(|b| b.id).collect();
    for beam_id in beam_ids {
        laser_end(state, beam_id);
    }
    state.homing.clear();

    let Some(arena) = state.arena.as_mut() else {
        return;
    };
    let in_flight =
        arena
            .world
            .handles_where(|b| matches!(b.payload, BodyRole::Projectile(_)));
    if !in_flight.is_empty() {
        log::debug!("Retiring {} projectiles still in flight", in_flight.len());
    }
    for handle in in_flight {
        retire_projectile(&mut arena.world, &mut state.hooks, handle);
    }
}

/// Steer in-flight missiles; burn out expired ones and fire proximity fuses
pub fn tick_homing(state: &mut SimulationState, dt: f32) -> Result<(), SimError> {
    let now = state.now_ms;
    let cfg = state.config.missile.clone();
    let fuse_ttl = state.config.fx.fuse_burst_ttl_ms;
    let arena = require_arena(&mut state.arena, "tick_homing")?;

    let mut active = Vec::with_capacity(state.homing.len());
    for missile in state.homing.drain(..) {
        let Some(body) = arena.world.get(missile.handle) else {
            continue;
        };
        let target = state.cores[missile.side.opposite()].center;
        let pos = body.pos;
        let vel = body.vel;

        let expired = now - missile.spawn_ms >= cfg.ttl_ms;
        let fused = cfg.fuse_radius > 0.0 && pos.distance(target) <= cfg.fuse_radius;
        if expired || fused {
            state.fx.bursts.push(Burst {
                kind: BurstKind::Fuse,
                pos,
                radius: cfg.radius * 4.0,
                at_ms: now,
                ttl_ms: fuse_ttl,
            });
            retire_projectile(&mut arena.world, &mut state.hooks, missile.handle);
            continue;
        }

        let current = heading(vel);
        let desired = heading(target - pos);
        let max_turn = cfg.max_turn_rad_per_sec * dt;
        let turn = shortest_angle(current, desired).clamp(-max_turn, max_turn);
        let speed = (vel.length() + cfg.accel_per_sec * dt).min(cfg.max_speed);
        arena
            .world
            .set_velocity(missile.handle, polar_to_cartesian(speed, current + turn));
        active.push(missile);
    }
    state.homing = active;
    Ok(())
}

/// Remove projectiles that outlived the safety lifetime
pub fn expire_projectiles(state: &mut SimulationState) -> Result<usize, SimError> {
    let now = state.now_ms;
    let max_age = state.config.ammo.projectile_max_lifetime_ms;
    let arena = require_arena(&mut state.arena, "expire_projectiles")?;
    let stale = arena.world.handles_where(|b| match b.payload {
        BodyRole::Projectile(p) => now - p.spawn_ms > max_age,
        _ => false,
    });
    for &handle in &stale {
        retire_projectile(&mut arena.world, &mut state.hooks, handle);
    }
    Ok(stale.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::SessionStats;
    use crate::sim::lifecycle::start_match;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn running() -> SimulationState {
        let mut state = SimulationState::new(GameConfig::default(), 42).unwrap();
        start_match(&mut state).unwrap();
        state
    }

    fn projectiles(state: &SimulationState) -> Vec<ProjectileData> {
        state
            .arena
            .as_ref()
            .unwrap()
            .world
            .iter()
            .filter_map(|(_, b)| match b.payload {
                BodyRole::Projectile(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_queue_schedules_after_windup() {
        let mut state = running();
        assert!(queue_fire(&mut state, Side::Left, WeaponKind::Mortar).unwrap());
        assert_eq!(state.scheduler.next_due(), Some(state.config.weapons.windup_ms));
    }

    #[test]
    fn test_windup_marker_at_mount() {
        let mut state = running();
        emit_windup(&mut state, Side::Right, WeaponKind::Missile).unwrap();
        let mount = state
            .arena
            .as_ref()
            .unwrap()
            .board(Side::Right)
            .mount(WeaponKind::Missile);
        let marker = state.fx.windups[0];
        assert_eq!(marker.pos, mount);
        assert_eq!(marker.fire_at_ms, state.config.weapons.windup_ms);
        assert!(state.scheduler.is_empty());
    }

    #[test]
    fn test_queue_noop_when_disabled_or_over() {
        let mut state = running();
        let cfg = state.config.mods.clone();
        state
            .mods
            .apply_debuff(Side::Left, Some(WeaponKind::Laser), 0.0, &cfg, &mut state.rng);
        assert!(!queue_fire(&mut state, Side::Left, WeaponKind::Laser).unwrap());
        assert!(queue_fire(&mut state, Side::Left, WeaponKind::Cannon).unwrap());

        state.match_state.game_over = true;
        assert!(!queue_fire(&mut state, Side::Right, WeaponKind::Cannon).unwrap());
        assert_eq!(state.scheduler.len(), 1);
    }

    #[test]
    fn test_cannon_burst_staggered() {
        let mut state = running();
        fire(&mut state, Side::Left, WeaponKind::Cannon).unwrap();
        let burst = state.config.cannon.burst as usize;
        assert_eq!(state.scheduler.len(), burst);

        // Drain as tick does
        while let Some((at, ev)) = state.scheduler.pop_due(f64::MAX) {
            state.now_ms = at;
            handle_deferred(&mut state, at, ev).unwrap();
        }
        let shots = projectiles(&state);
        assert_eq!(shots.len(), burst);
        assert!(shots.iter().all(|p| p.ptype == ProjectileType::Cannon && p.side == Side::Left));
    }

    #[test]
    fn test_cannon_aims_at_enemy() {
        let mut state = running();
        state.config.cannon.jitter_rad = 0.0;
        let h = fire_cannon_shot(&mut state, Side::Right).unwrap();
        let body = state.arena.as_ref().unwrap().world.get(h).unwrap();
        let to_target = state.cores.left.center - body.pos;
        assert!(body.vel.normalize().dot(to_target.normalize()) > 0.999);
    }

    #[test]
    fn test_damage_buff_scales_projectiles() {
        let mut state = running();
        let cfg = state.config.mods.clone();
        state.mods.apply_buff(Side::Left, 0.0, &cfg);
        fire_mortar(&mut state, Side::Left).unwrap();
        let p = projectiles(&state)[0];
        assert!((p.dmg - state.config.mortar.damage * cfg.dmg_mul).abs() < 1e-4);
    }

    #[test]
    fn test_missile_fan_registers_homing() {
        let mut state = running();
        let handles = fire_missiles(&mut state, Side::Left).unwrap();
        assert_eq!(handles.len(), state.config.missile.count as usize);
        assert_eq!(state.homing.len(), handles.len());
    }

    #[test]
    fn test_missile_tilt_mirrors() {
        let mut state = running();
        state.config.missile.jitter_rad = 0.0;
        state.config.missile.count = 1;
        let l = fire_missiles(&mut state, Side::Left).unwrap()[0];
        let r = fire_missiles(&mut state, Side::Right).unwrap()[0];
        let world = &state.arena.as_ref().unwrap().world;
        let lv = world.get(l).unwrap().vel;
        let rv = world.get(r).unwrap().vel;
        // Both bow upward (screen -y) and mirror each other
        assert!((lv.x + rv.x).abs() < 1e-3);
        assert!((lv.y - rv.y).abs() < 1e-3);
    }

    #[test]
    fn test_homing_turn_is_clamped() {
        let mut state = running();
        state.config.missile.count = 1;
        state.config.missile.jitter_rad = 0.0;
        let h = fire_missiles(&mut state, Side::Left).unwrap()[0];
        // Point it directly away from the target
        let away = state.cores.left.center - state.cores.right.center;
        state
            .arena
            .as_mut()
            .unwrap()
            .world
            .set_velocity(h, away.normalize() * 300.0);

        let dt = 1.0 / 60.0;
        tick_homing(&mut state, dt).unwrap();
        let vel = state.arena.as_ref().unwrap().world.get(h).unwrap().vel;
        let turned = shortest_angle(heading(away), heading(vel)).abs();
        let cfg = &state.config.missile;
        assert!(turned <= cfg.max_turn_rad_per_sec * dt + 1e-4);
        assert!((vel.length() - (300.0 + cfg.accel_per_sec * dt)).abs() < 1e-2);
    }

    #[test]
    fn test_homing_ttl_expiry() {
        let mut state = running();
        let handles = fire_missiles(&mut state, Side::Right).unwrap();
        state.now_ms += state.config.missile.ttl_ms;
        tick_homing(&mut state, 1.0 / 60.0).unwrap();
        assert!(state.homing.is_empty());
        let world = &state.arena.as_ref().unwrap().world;
        assert!(handles.iter().all(|h| !world.contains(*h)));
        assert_eq!(state.fx.bursts.len(), handles.len());
    }

    #[test]
    fn test_fuse_detonates_without_damage() {
        let mut state = running();
        state.config.missile.fuse_radius = 60.0;
        let handles = fire_missiles(&mut state, Side::Right).unwrap();
        assert!(!handles.is_empty());

        let target = state.cores.left.center;
        let world = &mut state.arena.as_mut().unwrap().world;
        for (i, &h) in handles.iter().enumerate() {
            world.set_position(h, target + Vec2::new(20.0 + i as f32 * 5.0, 0.0));
        }
        let before = state.cores.left.clone();

        tick_homing(&mut state, 1.0 / 60.0).unwrap();
        assert!(state.homing.is_empty());
        let world = &state.arena.as_ref().unwrap().world;
        assert!(handles.iter().all(|h| !world.contains(*h)));
        assert_eq!(state.fx.bursts.len(), handles.len());
        assert!(state.fx.bursts.iter().all(|b| b.kind == BurstKind::Fuse));

        let after = &state.cores.left;
        assert_eq!(after.center_hp(), before.center_hp());
        assert_eq!(after.segments(), before.segments());
        assert_eq!(after.shield_hp(), before.shield_hp());
    }

    #[test]
    fn test_fuse_ignores_distant_missiles() {
        let mut state = running();
        state.config.missile.fuse_radius = 60.0;
        let handles = fire_missiles(&mut state, Side::Right).unwrap();
        tick_homing(&mut state, 1.0 / 60.0).unwrap();
        assert_eq!(state.homing.len(), handles.len());
        assert!(state.fx.bursts.is_empty());
    }

    #[test]
    fn test_settle_in_flight_accounts_every_shot() {
        let stats = Rc::new(RefCell::new(SessionStats::default()));
        let hooks = Hooks {
            stats: Box::new(stats.clone()),
            ..Default::default()
        };
        let mut state = SimulationState::new(GameConfig::default(), 42)
            .unwrap()
            .with_hooks(hooks);
        start_match(&mut state).unwrap();

        fire_mortar(&mut state, Side::Left).unwrap();
        let scored = fire_cannon_shot(&mut state, Side::Left).unwrap();
        let world = &mut state.arena.as_mut().unwrap().world;
        if let Some(BodyRole::Projectile(p)) = world.get_mut(scored).map(|b| &mut b.payload) {
            p.did_damage = true;
        }
        fire_laser(&mut state, Side::Left).unwrap();

        settle_in_flight(&mut state);
        assert!(projectiles(&state).is_empty());
        assert!(state.beams.is_empty());
        let world = &state.arena.as_ref().unwrap().world;
        assert!(!world.iter().any(|(_, b)| matches!(b.payload, BodyRole::LaserBeam { .. })));

        // Settling twice changes nothing
        settle_in_flight(&mut state);
        let stats = stats.borrow();
        let left = stats.side(Side::Left);
        assert_eq!(left.weapon(WeaponKind::Mortar).fired, 1);
        assert_eq!(left.weapon(WeaponKind::Mortar).misses, 1);
        assert_eq!(left.weapon(WeaponKind::Cannon).misses, 0);
        assert_eq!(left.weapon(WeaponKind::Laser).fired, 1);
        assert_eq!(left.weapon(WeaponKind::Laser).misses, 1);
    }

    #[test]
    fn test_ballistic_lands_on_target() {
        let from = Vec2::new(590.0, 350.0);
        let to = Vec2::new(940.0, 640.0);
        let g = 900.0;
        let v = ballistic_velocity(from, to, 480.0, g);
        assert!(v.y < 0.0);

        let t = (to.x - from.x) / v.x;
        let y = from.y + v.y * t + 0.5 * g * t * t;
        assert!((y - to.y).abs() < 0.5);
    }

    #[test]
    fn test_laser_deals_dps_over_duration() {
        let mut state = running();
        let cfg = state.config.laser.clone();
        let before = state.cores.right.segment_sum() + state.cores.right.center_hp();
        fire_laser(&mut state, Side::Left).unwrap();
        assert_eq!(state.beams.len(), 1);

        while let Some((at, ev)) = state.scheduler.pop_due(f64::MAX) {
            state.now_ms = at;
            handle_deferred(&mut state, at, ev).unwrap();
        }
        let after = state.cores.right.segment_sum() + state.cores.right.center_hp();
        let expected = cfg.dps * (cfg.duration_ms / 1000.0) as f32;
        assert!((before - after - expected).abs() < 0.01);
        assert!(state.beams.is_empty());
        let world = &state.arena.as_ref().unwrap().world;
        assert!(!world.iter().any(|(_, b)| matches!(b.payload, BodyRole::LaserBeam { .. })));
    }

    #[test]
    fn test_laser_reduced_by_shield() {
        let mut state = running();
        state.cores.right.set_shield_hp(100.0);
        fire_laser(&mut state, Side::Left).unwrap();
        let (at, ev) = state.scheduler.pop_due(f64::MAX).unwrap();
        state.now_ms = at;
        handle_deferred(&mut state, at, ev).unwrap();

        let cfg = &state.config.laser;
        let per_tick = cfg.dps * (cfg.tick_ms / 1000.0) as f32;
        let shield = state.cores.right.shield_hp();
        assert!((100.0 - shield - per_tick * cfg.shield_pen_factor).abs() < 1e-4);
        assert_eq!(state.cores.right.center_hp(), state.cores.right.center_hp_max);
    }

    #[test]
    fn test_expire_projectiles() {
        let mut state = running();
        fire_mortar(&mut state, Side::Left).unwrap();
        assert_eq!(expire_projectiles(&mut state).unwrap(), 0);
        state.now_ms += state.config.ammo.projectile_max_lifetime_ms + 1.0;
        assert_eq!(expire_projectiles(&mut state).unwrap(), 1);
        assert!(projectiles(&state).is_empty());
    }
}
