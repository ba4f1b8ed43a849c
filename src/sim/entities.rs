//! Gameplay vocabulary shared by every system: sides, ammo and weapon kinds,
//! bins, and the role payload attached to each physics body.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// One of the two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Sign applied to arc tilts so both sides' missile fans bow upward
    pub fn tilt_sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// A value held once per side
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub left: T,
    pub right: T,
}

impl<T> PerSide<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self {
            left: f(Side::Left),
            right: f(Side::Right),
        }
    }
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Ammo flavors dropped into the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmmoType {
    Basic,
    Heavy,
    Volatile,
    Emp,
    Repair,
    Shield,
}

impl AmmoType {
    pub const ALL: [AmmoType; 6] = [
        AmmoType::Basic,
        AmmoType::Heavy,
        AmmoType::Volatile,
        AmmoType::Emp,
        AmmoType::Repair,
        AmmoType::Shield,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of ammo types a container accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoMask(u8);

impl AmmoMask {
    pub fn of(types: &[AmmoType]) -> Self {
        Self(types.iter().fold(0, |bits, t| bits | t.bit()))
    }

    pub fn contains(self, ammo_type: AmmoType) -> bool {
        self.0 & ammo_type.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Weapons a side can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    Cannon,
    Laser,
    Missile,
    Mortar,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 4] = [
        WeaponKind::Cannon,
        WeaponKind::Laser,
        WeaponKind::Missile,
        WeaponKind::Mortar,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Accumulator bins at the bottom of each board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinKind {
    Cannon,
    Laser,
    Missile,
    Mortar,
    Shield,
    Repair,
    Buff,
    Debuff,
}

impl BinKind {
    pub const ALL: [BinKind; 8] = [
        BinKind::Cannon,
        BinKind::Laser,
        BinKind::Missile,
        BinKind::Mortar,
        BinKind::Shield,
        BinKind::Repair,
        BinKind::Buff,
        BinKind::Debuff,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn weapon(self) -> Option<WeaponKind> {
        match self {
            BinKind::Cannon => Some(WeaponKind::Cannon),
            BinKind::Laser => Some(WeaponKind::Laser),
            BinKind::Missile => Some(WeaponKind::Missile),
            BinKind::Mortar => Some(WeaponKind::Mortar),
            _ => None,
        }
    }
}

impl From<WeaponKind> for BinKind {
    fn from(weapon: WeaponKind) -> Self {
        match weapon {
            WeaponKind::Cannon => BinKind::Cannon,
            WeaponKind::Laser => BinKind::Laser,
            WeaponKind::Missile => BinKind::Missile,
            WeaponKind::Mortar => BinKind::Mortar,
        }
    }
}

/// Physical projectiles (the laser has none)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectileType {
    Cannon,
    Missile,
    Mortar,
}

impl From<ProjectileType> for WeaponKind {
    fn from(ptype: ProjectileType) -> Self {
        match ptype {
            ProjectileType::Cannon => WeaponKind::Cannon,
            ProjectileType::Missile => WeaponKind::Missile,
            ProjectileType::Mortar => WeaponKind::Mortar,
        }
    }
}

/// Buff flavors the buff bin can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    Damage,
    Shield,
    BinBoost,
    Cooldown,
}

/// Gameplay payload of an ammo body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmmoData {
    pub side: Side,
    pub ammo_type: AmmoType,
    /// Seconds since spawn
    pub age: f32,
    /// Seconds spent below the idle speed threshold
    pub idle_time: f32,
}

/// Gameplay payload of a projectile body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileData {
    pub ptype: ProjectileType,
    /// Side that fired it
    pub side: Side,
    pub dmg: f32,
    pub spawn_ms: f64,
    /// Set once the projectile has resolved a core hit
    pub did_damage: bool,
}

/// What a physics body means to the game. The physics world stores this
/// opaquely; only the simulation reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyRole {
    Ammo(AmmoData),
    Projectile(ProjectileData),
    Container {
        side: Side,
        bin: BinKind,
        accepts: AmmoMask,
    },
    CoreRing { side: Side },
    CoreCenter { side: Side },
    WeaponMount { side: Side, weapon: WeaponKind },
    Wall,
    Pin,
    Paddle,
    LaserBeam { side: Side },
}

impl BodyRole {
    pub fn is_ammo(&self) -> bool {
        matches!(self, BodyRole::Ammo(_))
    }

    pub fn is_projectile(&self) -> bool {
        matches!(self, BodyRole::Projectile(_))
    }
}
