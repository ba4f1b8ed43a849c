//! Physics world backed by rapier2d
//!
//! Gameplay code reads and writes [`Body`] mirrors between steps. Each step
//! pushes the mirrors into rapier, runs its pipeline, reads positions and
//! velocities back, and turns rapier's `CollisionEvent::Started` events into
//! [`CollisionPair`]s sorted by handle.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::parry::bounding_volume::{Aabb, BoundingVolume};
use rapier2d::prelude::*;

use super::body::{Body, BodyHandle, BodyKind};
use crate::consts::SIM_DT;

/// World units are pixels; rapier's tolerances scale with this
const LENGTH_UNIT: f32 = 100.0;

/// A pair of bodies that started overlapping during a step (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollisionPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl CollisionPair {
    fn ordered(x: BodyHandle, y: BodyHandle) -> Self {
        Self {
            a: x.min(y),
            b: x.max(y),
        }
    }
}

struct Slot<P> {
    body: Body<P>,
    rigid: RigidBodyHandle,
    collider: ColliderHandle,
}

/// Collects collider pairs from `CollisionEvent::Started` during one step
#[derive(Default)]
struct StartedEvents {
    pairs: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl StartedEvents {
    fn into_pairs(self) -> Vec<(ColliderHandle, ColliderHandle)> {
        self.pairs
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventHandler for StartedEvents {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(h1, h2, _) = event {
            let mut pairs = self
                .pairs
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            pairs.push((h1, h2));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Rigid-body world with stable handles. Iteration is always in handle order.
pub struct PhysicsWorld<P> {
    slots: BTreeMap<BodyHandle, Slot<P>>,
    next_id: u32,
    pub gravity: Vec2,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
}

impl<P> fmt::Debug for PhysicsWorld<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.slots.len())
            .field("next_id", &self.next_id)
            .field("gravity", &self.gravity)
            .finish()
    }
}

impl<P> PhysicsWorld<P> {
    pub fn new(gravity: Vec2) -> Self {
        let params = IntegrationParameters {
            length_unit: LENGTH_UNIT,
            ..IntegrationParameters::default()
        };
        Self {
            slots: BTreeMap::new(),
            next_id: 1,
            gravity,
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
        }
    }

    pub fn add(&mut self, body: Body<P>) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;

        let builder = match body.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .linvel(to_vector(body.vel))
                .gravity_scale(body.gravity_scale)
                .linear_damping(damping_rate(body.air_friction))
                .additional_mass(body.mass)
                .lock_rotations()
                .can_sleep(false),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let rigid = self.bodies.insert(
            builder
                .translation(to_vector(body.pos))
                .user_data(handle.0 as u128)
                .build(),
        );

        // Body mass comes from `additional_mass`, so sensors and solids weigh the same
        let collider = ColliderBuilder::new(body.shape.collider_shape())
            .density(0.0)
            .friction(0.0)
            .restitution(body.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .sensor(body.sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            // Beams and paddles are not dynamic but still report contacts
            .active_collision_types(ActiveCollisionTypes::all())
            .user_data(handle.0 as u128)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, rigid, &mut self.bodies);

        self.slots.insert(
            handle,
            Slot {
                body,
                rigid,
                collider,
            },
        );
        handle
    }

    /// Remove a body. Removing an unknown handle is a no-op returning `None`.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body<P>> {
        let slot = self.slots.remove(&handle)?;
        self.bodies.remove(
            slot.rigid,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        Some(slot.body)
    }

    pub fn clear(&mut self) {
        let handles: Vec<BodyHandle> = self.slots.keys().copied().collect();
        for handle in handles {
            self.remove(handle);
        }
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body<P>> {
        self.slots.get(&handle).map(|slot| &slot.body)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body<P>> {
        self.slots.get_mut(&handle).map(|slot| &mut slot.body)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body<P>)> {
        self.slots.iter().map(|(h, slot)| (*h, &slot.body))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut Body<P>)> {
        self.slots.iter_mut().map(|(h, slot)| (*h, &mut slot.body))
    }

    /// Handles whose body matches `pred`, in handle order
    pub fn handles_where(&self, mut pred: impl FnMut(&Body<P>) -> bool) -> Vec<BodyHandle> {
        self.slots
            .iter()
            .filter(|(_, slot)| pred(&slot.body))
            .map(|(h, _)| *h)
            .collect()
    }

    /// Accumulate a force for the next step
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.force += force;
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.vel = vel;
        }
    }

    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.pos = pos;
        }
    }

    /// Bodies whose collider bounds overlap the given box.
    ///
    /// Bounds come from each collider's shape at the body's current mirror
    /// position, so bodies added or moved since the last step are included.
    pub fn query_aabb(&self, min: Vec2, max: Vec2) -> Vec<BodyHandle> {
        let region = Aabb::new(point![min.x, min.y], point![max.x, max.y]);
        self.slots
            .iter()
            .filter(|(_, slot)| {
                self.colliders.get(slot.collider).is_some_and(|collider| {
                    let at = Isometry::translation(slot.body.pos.x, slot.body.pos.y);
                    collider.shape().compute_aabb(&at).intersects(&region)
                })
            })
            .map(|(h, _)| *h)
            .collect()
    }

    /// Advance the world by `dt` seconds and report newly started contacts
    pub fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        self.push_state();

        self.params.dt = dt;
        let events = StartedEvents::default();
        self.pipeline.step(
            &to_vector(self.gravity),
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            &(),
            &events,
        );

        self.pull_state();

        let mut started: Vec<CollisionPair> = events
            .into_pairs()
            .into_iter()
            .filter_map(|(c1, c2)| {
                let a = self.owner(c1)?;
                let b = self.owner(c2)?;
                Some(CollisionPair::ordered(a, b))
            })
            .collect();
        // Channel order is not part of rapier's determinism guarantee
        started.sort_unstable();
        started.dedup();
        started
    }

    /// Copy mirror state into rapier; forces only last for the coming step
    fn push_state(&mut self) {
        for slot in self.slots.values_mut() {
            let body = &mut slot.body;
            let force = std::mem::take(&mut body.force);
            let Some(rb) = self.bodies.get_mut(slot.rigid) else {
                continue;
            };
            let pos = to_vector(body.pos);
            match body.kind {
                BodyKind::Dynamic => {
                    if *rb.translation() != pos {
                        rb.set_translation(pos, true);
                    }
                    let vel = to_vector(body.vel);
                    if *rb.linvel() != vel {
                        rb.set_linvel(vel, true);
                    }
                    rb.reset_forces(false);
                    if force != Vec2::ZERO {
                        rb.add_force(to_vector(force), true);
                    }
                }
                BodyKind::Kinematic => rb.set_next_kinematic_translation(pos),
                BodyKind::Static => {
                    if *rb.translation() != pos {
                        rb.set_translation(pos, false);
                    }
                }
            }
        }
    }

    fn pull_state(&mut self) {
        for slot in self.slots.values_mut() {
            let Some(rb) = self.bodies.get(slot.rigid) else {
                continue;
            };
            match slot.body.kind {
                BodyKind::Dynamic => {
                    slot.body.pos = to_vec2(rb.translation());
                    slot.body.vel = to_vec2(rb.linvel());
                }
                BodyKind::Kinematic => slot.body.pos = to_vec2(rb.translation()),
                BodyKind::Static => {}
            }
        }
    }

    fn owner(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        let handle = BodyHandle(self.colliders.get(collider)?.user_data as u32);
        self.slots.contains_key(&handle).then_some(handle)
    }
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Per-second damping that removes `fraction` of velocity each fixed step
fn damping_rate(fraction: f32) -> f32 {
    if fraction <= 0.0 {
        return 0.0;
    }
    fraction / ((1.0 - fraction).max(f32::EPSILON) * SIM_DT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Shape;

    const DT: f32 = 1.0 / 60.0;

    fn ball(pos: Vec2) -> Body<&'static str> {
        Body::dynamic(pos, Shape::Circle { radius: 5.0 }, "ball")
    }

    fn floor() -> Body<&'static str> {
        Body::fixed(
            Vec2::new(0.0, 100.0),
            Shape::Rect {
                half: Vec2::new(200.0, 10.0),
            },
            "floor",
        )
    }

    #[test]
    fn test_gravity_integration() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        let h = world.add(ball(Vec2::ZERO));
        world.step(0.1);
        let body = world.get(h).unwrap();
        assert!((body.vel.y - 10.0).abs() < 1e-3);
        assert!(body.pos.y > 0.0 && body.pos.y <= 1.0 + 1e-4);
    }

    #[test]
    fn test_gravity_scale_zero_floats() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        let h = world.add(ball(Vec2::ZERO).with_gravity_scale(0.0));
        world.step(0.1);
        assert_eq!(world.get(h).unwrap().vel, Vec2::ZERO);
    }

    #[test]
    fn test_static_bodies_do_not_move() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        let h = world.add(floor());
        world.step(0.5);
        assert_eq!(world.get(h).unwrap().pos, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn test_collision_start_reported_once() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = world.add(ball(Vec2::ZERO).sensor());
        let b = world.add(ball(Vec2::new(6.0, 0.0)));

        let events = world.step(DT);
        assert_eq!(events, vec![CollisionPair { a, b }]);

        // Still overlapping: no new start event
        let events = world.step(DT);
        assert!(events.is_empty());
    }

    #[test]
    fn test_sensor_pairs_reported() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let zone = world.add(floor().sensor());
        let token = world.add(ball(Vec2::new(0.0, 95.0)).sensor());
        assert_eq!(world.step(DT), vec![CollisionPair { a: zone, b: token }]);
    }

    #[test]
    fn test_solid_contact_stops_fall() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let f = world.add(floor());
        let h = world.add(
            ball(Vec2::new(0.0, 80.0))
                .with_velocity(Vec2::new(0.0, 120.0))
                .with_restitution(0.5),
        );
        let mut events = Vec::new();
        for _ in 0..30 {
            events.extend(world.step(DT));
        }
        assert_eq!(events.first(), Some(&CollisionPair { a: f, b: h }));

        let body = world.get(h).unwrap();
        // Center stays above the floor surface (y = 90) and no longer sinks
        assert!(body.pos.y < 90.0);
        assert!(body.vel.y <= 1e-3);
        assert_eq!(world.get(f).unwrap().pos, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn test_sensor_contact_not_resolved() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.add(floor().sensor());
        let h = world.add(ball(Vec2::new(0.0, 95.0)).with_velocity(Vec2::new(0.0, 60.0)));
        let events = world.step(DT);
        assert_eq!(events.len(), 1);
        assert!(world.get(h).unwrap().vel.y > 59.0);
    }

    #[test]
    fn test_mirror_edits_reach_solver() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let h = world.add(ball(Vec2::ZERO));
        world.set_position(h, Vec2::new(50.0, 0.0));
        world.set_velocity(h, Vec2::new(60.0, 0.0));
        world.step(0.5);
        let body = world.get(h).unwrap();
        assert!((body.vel.x - 60.0).abs() < 1e-3);
        assert!((body.pos.x - 80.0).abs() < 1e-2);
    }

    #[test]
    fn test_kinematic_follows_target() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        let paddle = world.add(Body::kinematic(
            Vec2::ZERO,
            Shape::Rect {
                half: Vec2::new(20.0, 4.0),
            },
            "paddle",
        ));
        world.set_position(paddle, Vec2::new(12.0, 0.0));
        world.step(DT);
        assert!((world.get(paddle).unwrap().pos - Vec2::new(12.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_remove_and_query() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = world.add(ball(Vec2::ZERO));
        let b = world.add(ball(Vec2::new(100.0, 0.0)));

        let hits = world.query_aabb(Vec2::splat(-10.0), Vec2::splat(10.0));
        assert_eq!(hits, vec![a]);

        assert!(world.remove(a).is_some());
        assert!(world.remove(a).is_none());
        assert!(!world.contains(a));
        assert!(world.contains(b));
        assert_eq!(world.len(), 1);

        world.step(DT);
        world.clear();
        assert!(world.is_empty());
    }

    #[test]
    fn test_apply_force_consumed_per_step() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let h = world.add(ball(Vec2::ZERO).with_mass(2.0));
        world.apply_force(h, Vec2::new(20.0, 0.0));
        world.step(1.0);
        assert!((world.get(h).unwrap().vel.x - 10.0).abs() < 1e-3);
        world.step(1.0);
        assert!((world.get(h).unwrap().vel.x - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_air_friction_matches_per_step_fraction() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let h = world.add(
            ball(Vec2::ZERO)
                .with_velocity(Vec2::new(100.0, 0.0))
                .with_air_friction(0.1),
        );
        world.step(SIM_DT);
        let vx = world.get(h).unwrap().vel.x;
        assert!((vx - 90.0).abs() < 0.5, "vx = {vx}");
    }
}
