//! Body descriptors and their collision shapes

use glam::Vec2;
use rapier2d::prelude::{SharedShape, point};
use serde::{Deserialize, Serialize};

/// Stable identifier for a body in a [`super::PhysicsWorld`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// Collision shape (rects are axis-aligned)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half: Vec2 },
    /// Capsule from `pos - half` to `pos + half`, thickened by `radius`
    Segment { half: Vec2, radius: f32 },
}

impl Shape {
    /// rapier collider shape in body-local coordinates
    pub fn collider_shape(&self) -> SharedShape {
        match *self {
            Shape::Circle { radius } => SharedShape::ball(radius),
            Shape::Rect { half } => SharedShape::cuboid(half.x, half.y),
            Shape::Segment { half, radius } => SharedShape::capsule(
                point![-half.x, -half.y],
                point![half.x, half.y],
                radius,
            ),
        }
    }
}

/// Dynamic bodies are simulated, kinematic bodies follow the position they
/// are given each step, static bodies only move when placed explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Dynamic,
    Kinematic,
    Static,
}

/// A body with an opaque payload the world never inspects.
///
/// Between steps this is the authoritative copy: `pos`, `vel` and `force`
/// are pushed into the solver before each step and `pos`/`vel` read back
/// after it. The remaining fields are fixed once the body is added.
#[derive(Debug, Clone)]
pub struct Body<P> {
    pub pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    pub kind: BodyKind,
    pub mass: f32,
    pub restitution: f32,
    /// Fraction of velocity lost per fixed step
    pub air_friction: f32,
    pub gravity_scale: f32,
    /// Sensors report contacts but are never pushed apart
    pub sensor: bool,
    /// Force applied during the next step only
    pub force: Vec2,
    pub payload: P,
}

impl<P> Body<P> {
    pub fn dynamic(pos: Vec2, shape: Shape, payload: P) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            shape,
            kind: BodyKind::Dynamic,
            mass: 1.0,
            restitution: 0.0,
            air_friction: 0.0,
            gravity_scale: 1.0,
            sensor: false,
            force: Vec2::ZERO,
            payload,
        }
    }

    pub fn fixed(pos: Vec2, shape: Shape, payload: P) -> Self {
        Self {
            kind: BodyKind::Static,
            gravity_scale: 0.0,
            ..Self::dynamic(pos, shape, payload)
        }
    }

    /// Moved by gameplay through `set_position`; pushes dynamic bodies it sweeps into
    pub fn kinematic(pos: Vec2, shape: Shape, payload: P) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            gravity_scale: 0.0,
            ..Self::dynamic(pos, shape, payload)
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass.max(f32::EPSILON);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_air_friction(mut self, air_friction: f32) -> Self {
        self.air_friction = air_friction.clamp(0.0, 1.0);
        self
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }
}
