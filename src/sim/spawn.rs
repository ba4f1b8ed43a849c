//! Ammo spawn regulation

use glam::Vec2;
use rand::Rng;

use super::entities::{AmmoData, AmmoType, BodyRole, Side};
use super::state::{SimulationState, require_arena};
use crate::config::{AmmoWeights, SideOrder};
use crate::error::SimError;
use crate::physics::{Body, BodyHandle, Shape};

/// Sides in processing order for this tick
pub fn side_order(order: SideOrder, tick_count: u64, match_index: u32) -> [Side; 2] {
    let flipped = match order {
        SideOrder::LeftFirst => false,
        SideOrder::RightFirst => true,
        SideOrder::AlternateTick => tick_count % 2 == 1,
        SideOrder::AlternateMatch => match_index % 2 == 0,
    };
    if flipped {
        [Side::Right, Side::Left]
    } else {
        [Side::Left, Side::Right]
    }
}

/// Spawns per interval: two below 75% of target, one below 125%, none above
pub fn spawns_wanted(count: u32, target: u32) -> u32 {
    let count = count as f32;
    let target = target as f32;
    if count < target * 0.75 {
        2
    } else if count < target * 1.25 {
        1
    } else {
        0
    }
}

/// Weighted pick over the six ammo types
pub fn pick_ammo_type<R: Rng>(weights: &AmmoWeights, rng: &mut R) -> AmmoType {
    let mut roll = rng.random::<f32>() * weights.total();
    for ammo_type in AmmoType::ALL {
        let w = weights.weight(ammo_type).max(0.0);
        if roll < w {
            return ammo_type;
        }
        roll -= w;
    }
    // Float slop on the last bucket
    AmmoType::ALL
        .into_iter()
        .rev()
        .find(|t| weights.weight(*t) > 0.0)
        .unwrap_or(AmmoType::Basic)
}

/// Drop one ammo body at the top of `side`'s board
pub fn spawn_ammo(state: &mut SimulationState, side: Side) -> Result<BodyHandle, SimError> {
    let arena = require_arena(&mut state.arena, "spawn_ammo")?;
    let cfg = &state.config;
    let ammo_type = pick_ammo_type(&cfg.spawn.weights, &mut state.rng);
    let pos = arena.board(side).spawn_point(&mut state.rng);
    let drift = Vec2::new(state.rng.random_range(-20.0..20.0), 0.0);

    let body = Body::dynamic(
        pos,
        Shape::Circle {
            radius: cfg.spawn.ammo_radius,
        },
        BodyRole::Ammo(AmmoData {
            side,
            ammo_type,
            age: 0.0,
            idle_time: 0.0,
        }),
    )
    .with_velocity(drift)
    .with_restitution(cfg.spawn.ammo_restitution)
    .with_air_friction(cfg.ammo.air_friction);

    let handle = arena.world.add(body);
    state.ammo_count[side] += 1;
    Ok(handle)
}

/// Keep each side's ammo near its target population
pub fn regulate_spawns(state: &mut SimulationState, dt_ms: f64) -> Result<(), SimError> {
    let interval = 1000.0 / state.config.spawn.spawn_rate as f64;
    state.spawn_accum_ms += dt_ms;

    while state.spawn_accum_ms >= interval {
        state.spawn_accum_ms -= interval;
        let order = side_order(
            state.config.spawn.order,
            state.tick_count,
            state.match_state.match_index,
        );
        for side in order {
            let wanted = spawns_wanted(state.ammo_count[side], state.config.spawn.target_per_side);
            for _ in 0..wanted {
                spawn_ammo(state, side)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::sim::lifecycle::start_match;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_soft_thresholds() {
        assert_eq!(spawns_wanted(0, 40), 2);
        assert_eq!(spawns_wanted(29, 40), 2);
        assert_eq!(spawns_wanted(30, 40), 1);
        assert_eq!(spawns_wanted(49, 40), 1);
        assert_eq!(spawns_wanted(50, 40), 0);
    }

    #[test]
    fn test_side_order_modes() {
        use Side::*;
        assert_eq!(side_order(SideOrder::LeftFirst, 5, 3), [Left, Right]);
        assert_eq!(side_order(SideOrder::RightFirst, 5, 3), [Right, Left]);
        assert_eq!(side_order(SideOrder::AlternateTick, 0, 1), [Left, Right]);
        assert_eq!(side_order(SideOrder::AlternateTick, 1, 1), [Right, Left]);
        assert_eq!(side_order(SideOrder::AlternateMatch, 9, 1), [Left, Right]);
        assert_eq!(side_order(SideOrder::AlternateMatch, 9, 2), [Right, Left]);
    }

    #[test]
    fn test_pick_respects_zero_weights() {
        let weights = AmmoWeights {
            basic: 0.0,
            heavy: 0.0,
            volatile: 0.0,
            emp: 1.0,
            repair: 0.0,
            shield: 0.0,
        };
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..100 {
            assert_eq!(pick_ammo_type(&weights, &mut rng), AmmoType::Emp);
        }
    }

    #[test]
    fn test_spawn_requires_arena() {
        let mut state = SimulationState::new(GameConfig::default(), 1).unwrap();
        assert!(matches!(
            spawn_ammo(&mut state, Side::Left),
            Err(SimError::WorldNotInitialized { .. })
        ));
    }

    #[test]
    fn test_regulation_fills_both_sides() {
        let mut state = SimulationState::new(GameConfig::default(), 1).unwrap();
        start_match(&mut state).unwrap();
        let interval = 1000.0 / state.config.spawn.spawn_rate as f64;

        regulate_spawns(&mut state, interval * 3.0 + 1.0).unwrap();
        // Well below the soft minimum: two per side per interval
        assert_eq!(state.ammo_count[Side::Left], 6);
        assert_eq!(state.ammo_count[Side::Right], 6);

        let in_world = state
            .arena
            .as_ref()
            .unwrap()
            .world
            .iter()
            .filter(|(_, b)| b.payload.is_ammo())
            .count();
        assert_eq!(in_world, 12);
    }

    #[test]
    fn test_regulation_stops_at_soft_max() {
        let mut state = SimulationState::new(GameConfig::default(), 1).unwrap();
        start_match(&mut state).unwrap();
        state.ammo_count[Side::Left] = 50;
        regulate_spawns(&mut state, 1000.0).unwrap();
        assert_eq!(state.ammo_count[Side::Left], 50);
        assert!(state.ammo_count[Side::Right] > 0);
    }
}
