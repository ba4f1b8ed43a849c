//! Collision resolution
//!
//! The physics world only reports which bodies started touching. This module
//! is the one place that decides what a contact means: each pair is
//! classified once by matching on both body roles, then handed to the deposit,
//! hit, or stray-contact handler. Handlers tolerate bodies that an earlier
//! pair in the same step already removed.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::damage::{HitPoint, apply_core_damage_at};
use super::entities::{BodyRole, Side};
use super::field::remove_ammo;
use super::fx::{Burst, BurstKind, Impact};
use super::lifecycle::announce_core_damage;
use super::state::{SimulationState, require_arena};
use super::weapons::retire_projectile;
use crate::error::SimError;
use crate::hooks::{HitReport, SoundCue};
use crate::physics::{BodyHandle, CollisionPair};

/// Window-reset counter capping explosions per second
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExplosionLimiter {
    window_start_ms: f64,
    count: u32,
}

impl ExplosionLimiter {
    /// Count an explosion if the current window has room. The first explosion
    /// of a window always passes, even with a limit of zero.
    pub fn allow(&mut self, now_ms: f64, max_per_sec: u32) -> bool {
        if now_ms - self.window_start_ms > 1000.0 {
            self.window_start_ms = now_ms;
            self.count = 0;
        }
        if self.count < max_per_sec.max(1) {
            self.count += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What a starting contact means for the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Deposit {
        ammo: BodyHandle,
        container: BodyHandle,
    },
    Hit {
        projectile: BodyHandle,
        target: Side,
        /// Struck the center sensor rather than the ring
        center: bool,
    },
    /// A projectile touched scenery, ammo, or an enemy beam
    Stray { projectile: BodyHandle },
    /// Two projectiles met
    Clash { a: BodyHandle, b: BodyHandle },
    Ignore,
}

/// Classify a pair by role. Argument order does not matter.
pub fn classify(a: (BodyHandle, &BodyRole), b: (BodyHandle, &BodyRole)) -> Interaction {
    use BodyRole::*;
    let ((ha, ra), (hb, rb)) = (a, b);
    match (ra, rb) {
        (Ammo(_), Container { .. }) => Interaction::Deposit {
            ammo: ha,
            container: hb,
        },
        (Container { .. }, Ammo(_)) => Interaction::Deposit {
            ammo: hb,
            container: ha,
        },

        (Projectile(_), Projectile(_)) => Interaction::Clash { a: ha, b: hb },
        (Projectile(_), CoreRing { side }) => Interaction::Hit {
            projectile: ha,
            target: *side,
            center: false,
        },
        (CoreRing { side }, Projectile(_)) => Interaction::Hit {
            projectile: hb,
            target: *side,
            center: false,
        },
        (Projectile(_), CoreCenter { side }) => Interaction::Hit {
            projectile: ha,
            target: *side,
            center: true,
        },
        (CoreCenter { side }, Projectile(_)) => Interaction::Hit {
            projectile: hb,
            target: *side,
            center: true,
        },
        (Projectile(_), WeaponMount { .. }) | (WeaponMount { .. }, Projectile(_)) => {
            Interaction::Ignore
        }
        (Projectile(p), LaserBeam { side }) | (LaserBeam { side }, Projectile(p))
            if p.side == *side =>
        {
            Interaction::Ignore
        }
        (Projectile(_), Ammo(_) | Container { .. } | Wall | Pin | Paddle | LaserBeam { .. }) => {
            Interaction::Stray { projectile: ha }
        }
        (Ammo(_) | Container { .. } | Wall | Pin | Paddle | LaserBeam { .. }, Projectile(_)) => {
            Interaction::Stray { projectile: hb }
        }

        // Ammo bouncing off scenery, sensors overlapping sensors
        (
            Ammo(_) | Container { .. } | CoreRing { .. } | CoreCenter { .. } | WeaponMount { .. }
            | Wall | Pin | Paddle | LaserBeam { .. },
            Ammo(_) | Container { .. } | CoreRing { .. } | CoreCenter { .. } | WeaponMount { .. }
            | Wall | Pin | Paddle | LaserBeam { .. },
        ) => Interaction::Ignore,
    }
}

/// Apply the gameplay effect of every contact that started this step
pub fn resolve_collisions(
    state: &mut SimulationState,
    pairs: &[CollisionPair],
) -> Result<(), SimError> {
    for pair in pairs {
        let interaction = {
            let world = &state.arena("resolve_collisions")?.world;
            let (Some(a), Some(b)) = (world.get(pair.a), world.get(pair.b)) else {
                continue;
            };
            classify((pair.a, &a.payload), (pair.b, &b.payload))
        };

        match interaction {
            Interaction::Deposit { ammo, container } => {
                deposit(state, ammo, container)?;
            }
            Interaction::Hit {
                projectile,
                target,
                center,
            } => resolve_hit(state, projectile, target, center)?,
            Interaction::Stray { projectile } => stray_contact(state, projectile)?,
            Interaction::Clash { a, b } => {
                stray_contact(state, a)?;
                stray_contact(state, b)?;
            }
            Interaction::Ignore => {}
        }
    }
    Ok(())
}

/// Drop ammo into a container if it accepts the type. Returns whether it did.
pub fn deposit(
    state: &mut SimulationState,
    ammo: BodyHandle,
    container: BodyHandle,
) -> Result<bool, SimError> {
    let arena = require_arena(&mut state.arena, "deposit")?;
    let (Some(ammo_body), Some(container_body)) =
        (arena.world.get(ammo), arena.world.get(container))
    else {
        return Ok(false);
    };
    let (BodyRole::Ammo(data), BodyRole::Container { side, bin, accepts }) =
        (ammo_body.payload, container_body.payload)
    else {
        return Ok(false);
    };
    if !accepts.contains(data.ammo_type) {
        return Ok(false);
    }

    remove_ammo(&mut arena.world, &mut state.ammo_count, ammo);
    let mul = state.mods.current_bin_fill_mul(side, state.now_ms);
    let amount = mul.max(1.0).round() as u32;
    state.bins[side].deposit(bin, amount);

    state.hooks.stats(|s| s.record_bin_deposit(side, bin, amount));
    state.hooks.play(SoundCue::Deposit);
    Ok(true)
}

/// A projectile reached a core: shield first, then segments or the center pool
pub fn resolve_hit(
    state: &mut SimulationState,
    projectile: BodyHandle,
    target: Side,
    center: bool,
) -> Result<(), SimError> {
    let arena = require_arena(&mut state.arena, "resolve_hit")?;
    let Some(body) = arena.world.get_mut(projectile) else {
        return Ok(());
    };
    let BodyRole::Projectile(data) = &mut body.payload else {
        return Ok(());
    };
    if data.did_damage {
        return Ok(());
    }
    data.did_damage = true;
    let data = *data;
    let pos = body.pos;

    let now = state.now_ms;
    let impact_ttl = state.config.fx.impact_ttl_ms;
    let mut report = HitReport {
        shooter: data.side,
        weapon: data.ptype.into(),
        shield_damage: 0.0,
        segment_damage: 0.0,
        center_damage: 0.0,
    };
    let mut dmg = data.dmg;

    if state.cores[target].has_shield(state.config.shield.epsilon) {
        let before = state.cores[target].damage_shield(dmg);
        report.shield_damage = dmg.min(before);
        let excess = (dmg - before).max(0.0);

        state.fx.impacts.push(Impact {
            pos,
            target,
            shielded: true,
            at_ms: now,
            ttl_ms: impact_ttl,
        });
        state.hooks.play(SoundCue::ShieldHit);
        explode_at(state, pos)?;

        if excess <= 0.0 {
            finish_hit(state, projectile, &report)?;
            return Ok(());
        }
        dmg = excess;
    }

    let hit = if center {
        HitPoint::center(pos)
    } else {
        HitPoint::at(pos)
    };
    let outcome = apply_core_damage_at(
        &mut state.cores[target],
        hit,
        dmg,
        &state.config.damage,
        &mut state.rng,
    );
    report.segment_damage = outcome.segment_damage;
    report.center_damage = outcome.center_damage;

    state.fx.impacts.push(Impact {
        pos,
        target,
        shielded: false,
        at_ms: now,
        ttl_ms: impact_ttl,
    });
    state.hooks.play(SoundCue::CoreHit);
    // A penetrating hit explodes twice; the limiter may drop the second
    explode_at(state, pos)?;
    finish_hit(state, projectile, &report)?;

    if outcome.total() > 0.0 {
        announce_core_damage(state, target);
    }
    Ok(())
}

fn finish_hit(
    state: &mut SimulationState,
    projectile: BodyHandle,
    report: &HitReport,
) -> Result<(), SimError> {
    let arena = require_arena(&mut state.arena, "resolve_hit")?;
    retire_projectile(&mut arena.world, &mut state.hooks, projectile);
    state.fx.shake(
        state.now_ms,
        state.config.fx.shake_amplitude,
        state.config.fx.shake_ms,
    );
    state.hooks.stats(|s| s.record_projectile_hit(report));
    Ok(())
}

/// Projectile hit something other than a core: explode and remove it once
/// the launch grace period is over
pub fn stray_contact(state: &mut SimulationState, projectile: BodyHandle) -> Result<(), SimError> {
    let arena = state.arena("stray_contact")?;
    let Some(body) = arena.world.get(projectile) else {
        return Ok(());
    };
    let BodyRole::Projectile(data) = body.payload else {
        return Ok(());
    };
    if state.now_ms - data.spawn_ms < state.config.weapons.grace_ms {
        return Ok(());
    }
    let pos = body.pos;

    explode_at(state, pos)?;
    let arena = require_arena(&mut state.arena, "stray_contact")?;
    retire_projectile(&mut arena.world, &mut state.hooks, projectile);
    Ok(())
}

/// Rate-limited blast: FX burst, outward impulse on ammo and projectiles,
/// and a destruction roll for each ammo body caught. Returns whether the
/// explosion happened.
pub fn explode_at(state: &mut SimulationState, pos: Vec2) -> Result<bool, SimError> {
    let arena = require_arena(&mut state.arena, "explode_at")?;
    let cfg = &state.config.explosion;
    if !cfg.enabled {
        return Ok(false);
    }
    if !state.explosions.allow(state.now_ms, cfg.max_per_sec) {
        log::debug!("Explosion at ({:.0}, {:.0}) suppressed", pos.x, pos.y);
        return Ok(false);
    }

    state.fx.bursts.push(Burst {
        kind: BurstKind::Explosion,
        pos,
        radius: cfg.radius,
        at_ms: state.now_ms,
        ttl_ms: cfg.fx_ttl_ms,
    });

    let reach = Vec2::splat(cfg.radius);
    let mut destroyed = Vec::new();
    for handle in arena.world.query_aabb(pos - reach, pos + reach) {
        let Some(body) = arena.world.get_mut(handle) else {
            continue;
        };
        let is_ammo = match body.payload {
            BodyRole::Ammo(_) => true,
            BodyRole::Projectile(_) => false,
            _ => continue,
        };
        let offset = body.pos - pos;
        let dist = offset.length();
        let dir = if dist > 1e-6 { offset / dist } else { Vec2::NEG_Y };
        let impulse = cfg.force / dist.max(cfg.min_distance);
        body.vel += dir * impulse / body.mass;

        if is_ammo && state.rng.random::<f32>() < cfg.ammo_destroy_pct {
            destroyed.push(handle);
        }
    }
    for handle in destroyed {
        remove_ammo(&mut arena.world, &mut state.ammo_count, handle);
    }

    state.hooks.play(SoundCue::Explosion);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::physics::{Body, Shape};
    use crate::sim::entities::{AmmoData, AmmoType, BinKind, ProjectileData, ProjectileType};
    use crate::sim::lifecycle::start_match;

    fn running() -> SimulationState {
        let mut state = SimulationState::new(GameConfig::default(), 5).unwrap();
        start_match(&mut state).unwrap();
        state
    }

    fn find(state: &SimulationState, pred: impl Fn(&BodyRole) -> bool) -> BodyHandle {
        state
            .arena
            .as_ref()
            .unwrap()
            .world
            .iter()
            .find(|(_, b)| pred(&b.payload))
            .map(|(h, _)| h)
            .unwrap()
    }

    fn container(state: &SimulationState, side: Side, kind: BinKind) -> BodyHandle {
        find(state, |r| {
            matches!(r, BodyRole::Container { side: s, bin, .. } if *s == side && *bin == kind)
        })
    }

    fn add_ammo(state: &mut SimulationState, side: Side, ammo_type: AmmoType, pos: Vec2) -> BodyHandle {
        state.ammo_count[side] += 1;
        state.arena.as_mut().unwrap().world.add(Body::dynamic(
            pos,
            Shape::Circle { radius: 7.0 },
            BodyRole::Ammo(AmmoData {
                side,
                ammo_type,
                age: 0.0,
                idle_time: 0.0,
            }),
        ))
    }

    fn add_projectile(state: &mut SimulationState, side: Side, pos: Vec2, dmg: f32) -> BodyHandle {
        let spawn_ms = state.now_ms;
        state.arena.as_mut().unwrap().world.add(
            Body::dynamic(
                pos,
                Shape::Circle { radius: 6.0 },
                BodyRole::Projectile(ProjectileData {
                    ptype: ProjectileType::Cannon,
                    side,
                    dmg,
                    spawn_ms,
                    did_damage: false,
                }),
            )
            .sensor(),
        )
    }

    fn pair(a: BodyHandle, b: BodyHandle) -> CollisionPair {
        CollisionPair { a, b }
    }

    fn alive(state: &SimulationState, h: BodyHandle) -> bool {
        state.arena.as_ref().unwrap().world.contains(h)
    }

    /// A point on the right core's ring
    fn ring_point(state: &SimulationState) -> Vec2 {
        let core = &state.cores.right;
        core.center - Vec2::new(core.ring_radius, 0.0)
    }

    #[test]
    fn test_limiter_zero_allows_first_only() {
        let mut limiter = ExplosionLimiter::default();
        assert!(limiter.allow(100.0, 0));
        assert!(!limiter.allow(200.0, 0));
        assert!(!limiter.allow(1100.0, 0));
        // Window resets once more than a second has passed
        assert!(limiter.allow(1101.0, 0));
    }

    #[test]
    fn test_explosion_rate_limited() {
        let mut state = running();
        state.config.explosion.max_per_sec = 0;
        assert!(explode_at(&mut state, Vec2::new(800.0, 500.0)).unwrap());
        assert!(!explode_at(&mut state, Vec2::new(800.0, 500.0)).unwrap());
        assert_eq!(state.fx.bursts.len(), 1);
    }

    #[test]
    fn test_explosion_disabled_is_silent() {
        let mut state = running();
        state.config.explosion.enabled = false;
        assert!(!explode_at(&mut state, Vec2::new(800.0, 500.0)).unwrap());
        assert!(state.fx.bursts.is_empty());
    }

    #[test]
    fn test_explosion_requires_world() {
        let mut state = SimulationState::new(GameConfig::default(), 5).unwrap();
        assert!(matches!(
            explode_at(&mut state, Vec2::ZERO),
            Err(SimError::WorldNotInitialized { .. })
        ));
    }

    #[test]
    fn test_explosion_pushes_outward() {
        let mut state = running();
        state.config.explosion.ammo_destroy_pct = 0.0;
        let center = Vec2::new(300.0, 400.0);
        let h = add_ammo(&mut state, Side::Left, AmmoType::Basic, center + Vec2::new(30.0, 0.0));
        explode_at(&mut state, center).unwrap();
        let vel = state.arena.as_ref().unwrap().world.get(h).unwrap().vel;
        let cfg = &state.config.explosion;
        assert!((vel.x - cfg.force / 30.0).abs() < 1e-3);
        assert_eq!(state.ammo_count[Side::Left], 1);
    }

    #[test]
    fn test_explosion_can_destroy_ammo() {
        let mut state = running();
        state.config.explosion.ammo_destroy_pct = 1.0;
        let center = Vec2::new(300.0, 400.0);
        let h = add_ammo(&mut state, Side::Left, AmmoType::Heavy, center);
        explode_at(&mut state, center).unwrap();
        assert!(!alive(&state, h));
        assert_eq!(state.ammo_count[Side::Left], 0);
    }

    #[test]
    fn test_deposit_matching_type() {
        let mut state = running();
        let c = container(&state, Side::Left, BinKind::Cannon);
        let a = add_ammo(&mut state, Side::Left, AmmoType::Basic, Vec2::new(300.0, 400.0));

        resolve_collisions(&mut state, &[pair(c, a)]).unwrap();
        assert!(!alive(&state, a));
        assert_eq!(state.ammo_count[Side::Left], 0);
        assert_eq!(state.bins.left.get(BinKind::Cannon).fill, 1);
    }

    #[test]
    fn test_deposit_with_bin_boost() {
        let mut state = running();
        let cfg = state.config.mods.clone();
        state.mods.apply_bin_boost_buff(Side::Left, 0.0, &cfg);
        let c = container(&state, Side::Left, BinKind::Debuff);
        let a = add_ammo(&mut state, Side::Left, AmmoType::Emp, Vec2::new(300.0, 400.0));

        resolve_collisions(&mut state, &[pair(a, c)]).unwrap();
        assert_eq!(
            state.bins.left.get(BinKind::Debuff).fill,
            cfg.bin_fill_mul.round() as u32
        );
    }

    #[test]
    fn test_deposit_wrong_type_is_noop() {
        let mut state = running();
        let c = container(&state, Side::Left, BinKind::Laser);
        let a = add_ammo(&mut state, Side::Left, AmmoType::Basic, Vec2::new(300.0, 400.0));

        resolve_collisions(&mut state, &[pair(a, c)]).unwrap();
        assert!(alive(&state, a));
        assert_eq!(state.ammo_count[Side::Left], 1);
        assert_eq!(state.bins.left.get(BinKind::Laser).fill, 0);
    }

    #[test]
    fn test_shield_absorbs_small_hit() {
        let mut state = running();
        state.cores.right.set_shield_hp(50.0);
        let segs = state.cores.right.segment_sum();
        let ring = find(&state, |r| matches!(r, BodyRole::CoreRing { side: Side::Right }));
        let pos = ring_point(&state);
        let p = add_projectile(&mut state, Side::Left, pos, 10.0);

        resolve_collisions(&mut state, &[pair(ring, p)]).unwrap();
        assert_eq!(state.cores.right.shield_hp(), 40.0);
        assert_eq!(state.cores.right.segment_sum(), segs);
        assert_eq!(state.cores.right.center_hp(), state.cores.right.center_hp_max);
        assert!(!alive(&state, p));
    }

    #[test]
    fn test_shield_excess_penetrates() {
        let mut state = running();
        state.cores.right.set_shield_hp(5.0);
        let segs = state.cores.right.segment_sum();
        let ring = find(&state, |r| matches!(r, BodyRole::CoreRing { side: Side::Right }));
        let pos = ring_point(&state);
        let p = add_projectile(&mut state, Side::Left, pos, 20.0);

        resolve_collisions(&mut state, &[pair(p, ring)]).unwrap();
        assert_eq!(state.cores.right.shield_hp(), 0.0);
        let lost = segs - state.cores.right.segment_sum();
        assert!(lost > 0.0);
        assert!((lost - 15.0).abs() < 1e-3);
        // Shield burst plus the core burst
        assert_eq!(state.fx.bursts.len(), 2);
    }

    #[test]
    fn test_penetrating_hit_second_burst_rate_limited() {
        let mut state = running();
        state.config.explosion.max_per_sec = 0;
        state.cores.right.set_shield_hp(5.0);
        let ring = find(&state, |r| matches!(r, BodyRole::CoreRing { side: Side::Right }));
        let pos = ring_point(&state);
        let p = add_projectile(&mut state, Side::Left, pos, 20.0);

        resolve_collisions(&mut state, &[pair(p, ring)]).unwrap();
        assert_eq!(state.fx.bursts.len(), 1);
        assert!(!alive(&state, p));
    }

    #[test]
    fn test_center_sensor_hits_center_directly() {
        let mut state = running();
        let center = find(&state, |r| matches!(r, BodyRole::CoreCenter { side: Side::Right }));
        let segs = state.cores.right.segment_sum();
        let pos = state.cores.right.center;
        let p = add_projectile(&mut state, Side::Left, pos, 42.0);

        resolve_collisions(&mut state, &[pair(center, p)]).unwrap();
        let core = &state.cores.right;
        assert_eq!(core.center_hp(), core.center_hp_max - 42.0);
        assert_eq!(core.segment_sum(), segs);
    }

    #[test]
    fn test_hit_processed_once() {
        let mut state = running();
        let ring = find(&state, |r| matches!(r, BodyRole::CoreRing { side: Side::Right }));
        let center = find(&state, |r| matches!(r, BodyRole::CoreCenter { side: Side::Right }));
        let before = state.cores.right.segment_sum() + state.cores.right.center_hp();
        let pos = ring_point(&state);
        let p = add_projectile(&mut state, Side::Left, pos, 12.0);

        resolve_collisions(&mut state, &[pair(ring, p), pair(center, p)]).unwrap();
        let after = state.cores.right.segment_sum() + state.cores.right.center_hp();
        assert!((before - after - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_stray_waits_for_grace() {
        let mut state = running();
        let wall = find(&state, |r| matches!(r, BodyRole::Wall));
        let p = add_projectile(&mut state, Side::Left, Vec2::new(800.0, 10.0), 10.0);

        resolve_collisions(&mut state, &[pair(wall, p)]).unwrap();
        assert!(alive(&state, p));

        state.now_ms += state.config.weapons.grace_ms;
        resolve_collisions(&mut state, &[pair(wall, p)]).unwrap();
        assert!(!alive(&state, p));
        assert_eq!(state.fx.bursts.len(), 1);
    }

    #[test]
    fn test_mount_and_own_beam_ignored() {
        let mut state = running();
        let mount = find(&state, |r| matches!(r, BodyRole::WeaponMount { .. }));
        let beam = state.arena.as_mut().unwrap().world.add(
            Body::fixed(
                Vec2::new(800.0, 300.0),
                Shape::Segment {
                    half: Vec2::new(50.0, 0.0),
                    radius: 4.0,
                },
                BodyRole::LaserBeam { side: Side::Left },
            )
            .sensor(),
        );
        let p = add_projectile(&mut state, Side::Left, Vec2::new(800.0, 300.0), 10.0);
        state.now_ms += 1000.0;

        resolve_collisions(&mut state, &[pair(mount, p), pair(beam, p)]).unwrap();
        assert!(alive(&state, p));
        assert!(state.fx.bursts.is_empty());
    }

    #[test]
    fn test_classify_is_symmetric() {
        let ammo = BodyRole::Ammo(AmmoData {
            side: Side::Left,
            ammo_type: AmmoType::Emp,
            age: 0.0,
            idle_time: 0.0,
        });
        let pin = BodyRole::Pin;
        let (a, b) = (BodyHandle(1), BodyHandle(2));
        assert_eq!(classify((a, &ammo), (b, &pin)), Interaction::Ignore);
        assert_eq!(classify((b, &pin), (a, &ammo)), Interaction::Ignore);

        let proj = BodyRole::Projectile(ProjectileData {
            ptype: ProjectileType::Mortar,
            side: Side::Right,
            dmg: 1.0,
            spawn_ms: 0.0,
            did_damage: false,
        });
        let enemy_beam = BodyRole::LaserBeam { side: Side::Left };
        assert_eq!(
            classify((a, &enemy_beam), (b, &proj)),
            Interaction::Stray { projectile: b }
        );
        let ring = BodyRole::CoreRing { side: Side::Left };
        assert_eq!(
            classify((a, &ring), (b, &proj)),
            Interaction::Hit {
                projectile: b,
                target: Side::Left,
                center: false
            }
        );
    }
}
