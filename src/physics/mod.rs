//! 2D physics provider
//!
//! A thin layer over rapier2d. Bodies carry an opaque payload `P` which the
//! world stores and hands back but never interprets; gameplay code decides
//! what a contact means.

pub mod body;
pub mod world;

pub use body::{Body, BodyHandle, BodyKind, Shape};
pub use world::{CollisionPair, PhysicsWorld};
