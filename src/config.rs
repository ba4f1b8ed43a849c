//! Game balance configuration
//!
//! Every tunable constant the simulation reads lives here. All sections are
//! `#[serde(default)]`, so a JSON file only needs the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::entities::{AmmoType, BinKind, BuffKind, WeaponKind};

/// Order in which the two sides are processed by spawn and trigger systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideOrder {
    #[default]
    LeftFirst,
    RightFirst,
    /// Flip every simulation tick
    AlternateTick,
    /// Flip every match
    AlternateMatch,
}

/// Core geometry and health pools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub segments: usize,
    pub seg_hp_max: f32,
    pub center_hp_max: f32,
    pub shield_hp_max: f32,
    /// Shield each core starts the match with
    pub shield_start: f32,
    pub outer_radius: f32,
    pub ring_radius: f32,
    pub center_radius: f32,
    /// Radians per second
    pub rotation_speed: f32,
    pub left_color: u32,
    pub right_color: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            segments: 12,
            seg_hp_max: 100.0,
            center_hp_max: 500.0,
            shield_hp_max: 150.0,
            shield_start: 0.0,
            outer_radius: 90.0,
            ring_radius: 80.0,
            center_radius: 36.0,
            rotation_speed: 0.4,
            left_color: 0x3fa9f5,
            right_color: 0xf5563f,
        }
    }
}

/// Segment overflow rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    /// Damage a segment cannot absorb flows into the center pool
    pub spillover: bool,
    /// Fraction of a hit that leaks to center when both targeted segments are broken
    pub leak_when_broken: f32,
    /// Probability of a 1-point center chip when spillover is off
    pub chip_chance: f32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            spillover: true,
            leak_when_broken: 1.0,
            chip_chance: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Shield values at or below this count as empty
    pub epsilon: f32,
    /// Points granted by a full shield bin
    pub pickup_points: f32,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            pickup_points: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionConfig {
    pub enabled: bool,
    /// Allowed explosions per one-second window (the first in a window always passes)
    pub max_per_sec: u32,
    pub radius: f32,
    /// Impulse numerator; velocity change is `force / max(distance, min_distance) / mass`
    pub force: f32,
    pub min_distance: f32,
    /// Chance that an ammo body caught in the blast is destroyed
    pub ammo_destroy_pct: f32,
    pub fx_ttl_ms: f64,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_per_sec: 12,
            radius: 90.0,
            force: 6000.0,
            min_distance: 12.0,
            ammo_destroy_pct: 0.15,
            fx_ttl_ms: 450.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CannonConfig {
    pub cooldown_ms: f64,
    pub damage: f32,
    pub speed: f32,
    /// Projectiles per burst
    pub burst: u32,
    pub stagger_ms: f64,
    /// Distance at which the speed multiplier is 1.0
    pub ref_distance: f32,
    pub min_speed_mul: f32,
    pub max_speed_mul: f32,
    pub jitter_rad: f32,
    pub radius: f32,
    pub gravity_scale: f32,
}

impl Default for CannonConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 2500.0,
            damage: 14.0,
            speed: 700.0,
            burst: 3,
            stagger_ms: 90.0,
            ref_distance: 500.0,
            min_speed_mul: 0.8,
            max_speed_mul: 1.4,
            jitter_rad: 0.04,
            radius: 6.0,
            gravity_scale: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserConfig {
    pub cooldown_ms: f64,
    pub dps: f32,
    pub duration_ms: f64,
    pub tick_ms: f64,
    /// Multiplier on laser damage while the target still has shield
    pub shield_pen_factor: f32,
    pub beam_half_width: f32,
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 5000.0,
            dps: 30.0,
            duration_ms: 1200.0,
            tick_ms: 50.0,
            shield_pen_factor: 0.5,
            beam_half_width: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissileConfig {
    pub cooldown_ms: f64,
    pub damage: f32,
    pub count: u32,
    /// Total fan angle across all missiles
    pub spread_rad: f32,
    pub jitter_rad: f32,
    pub arc_tilt_rad: f32,
    pub launch_speed: f32,
    pub max_speed: f32,
    pub accel_per_sec: f32,
    pub max_turn_rad_per_sec: f32,
    pub ttl_ms: f64,
    /// Proximity detonation radius; 0 disables
    pub fuse_radius: f32,
    pub radius: f32,
}

impl Default for MissileConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 4000.0,
            damage: 18.0,
            count: 3,
            spread_rad: 0.5,
            jitter_rad: 0.05,
            arc_tilt_rad: 0.6,
            launch_speed: 260.0,
            max_speed: 520.0,
            accel_per_sec: 420.0,
            max_turn_rad_per_sec: 3.2,
            ttl_ms: 6000.0,
            fuse_radius: 0.0,
            radius: 7.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MortarConfig {
    pub cooldown_ms: f64,
    pub damage: f32,
    /// Upward launch speed
    pub loft_speed: f32,
    pub radius: f32,
    pub gravity_scale: f32,
}

impl Default for MortarConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 4500.0,
            damage: 30.0,
            loft_speed: 480.0,
            radius: 9.0,
            gravity_scale: 1.0,
        }
    }
}

/// Points restored by a full repair bin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Added to every segment
    pub seg_points: f32,
    pub center_points: f32,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            seg_points: 15.0,
            center_points: 20.0,
        }
    }
}

/// Settings shared by every weapon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponsConfig {
    pub windup_ms: f64,
    /// Projectiles ignore stray contacts this soon after spawning
    pub grace_ms: f64,
}

impl Default for WeaponsConfig {
    fn default() -> Self {
        Self {
            windup_ms: 1500.0,
            grace_ms: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModsConfig {
    pub buff_duration_ms: f64,
    pub dmg_mul: f32,
    pub cooldown_mul: f32,
    pub bin_fill_mul: f32,
    pub shield_buff_points: f32,
    pub debuff_duration_ms: f64,
    /// Buffs the buff bin picks from
    pub buff_pool: Vec<BuffKind>,
    /// Weapons a debuff may disable
    pub debuff_pool: Vec<WeaponKind>,
}

impl Default for ModsConfig {
    fn default() -> Self {
        Self {
            buff_duration_ms: 8000.0,
            dmg_mul: 1.5,
            cooldown_mul: 0.6,
            bin_fill_mul: 2.0,
            shield_buff_points: 60.0,
            debuff_duration_ms: 6000.0,
            buff_pool: vec![
                BuffKind::Damage,
                BuffKind::Cooldown,
                BuffKind::BinBoost,
                BuffKind::Shield,
            ],
            debuff_pool: WeaponKind::ALL.to_vec(),
        }
    }
}

/// Threshold and accepted ammo for one bin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinSpec {
    pub cap: u32,
    pub accepts: Vec<AmmoType>,
}

impl BinSpec {
    fn new(cap: u32, accepts: &[AmmoType]) -> Self {
        Self {
            cap,
            accepts: accepts.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinsConfig {
    pub cannon: BinSpec,
    pub laser: BinSpec,
    pub missile: BinSpec,
    pub mortar: BinSpec,
    pub shield: BinSpec,
    pub repair: BinSpec,
    pub buff: BinSpec,
    pub debuff: BinSpec,
}

impl Default for BinsConfig {
    fn default() -> Self {
        use AmmoType::*;
        Self {
            cannon: BinSpec::new(8, &[Basic]),
            laser: BinSpec::new(10, &[Volatile]),
            missile: BinSpec::new(10, &[Heavy]),
            mortar: BinSpec::new(10, &[Heavy, Basic]),
            shield: BinSpec::new(6, &[Shield]),
            repair: BinSpec::new(6, &[Repair]),
            buff: BinSpec::new(6, &[Volatile, Repair]),
            debuff: BinSpec::new(6, &[Emp]),
        }
    }
}

impl BinsConfig {
    pub fn spec(&self, bin: BinKind) -> &BinSpec {
        match bin {
            BinKind::Cannon => &self.cannon,
            BinKind::Laser => &self.laser,
            BinKind::Missile => &self.missile,
            BinKind::Mortar => &self.mortar,
            BinKind::Shield => &self.shield,
            BinKind::Repair => &self.repair,
            BinKind::Buff => &self.buff,
            BinKind::Debuff => &self.debuff,
        }
    }
}

/// Relative spawn weights per ammo type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmmoWeights {
    pub basic: f32,
    pub heavy: f32,
    pub volatile: f32,
    pub emp: f32,
    pub repair: f32,
    pub shield: f32,
}

impl Default for AmmoWeights {
    fn default() -> Self {
        Self {
            basic: 40.0,
            heavy: 20.0,
            volatile: 14.0,
            emp: 8.0,
            repair: 9.0,
            shield: 9.0,
        }
    }
}

impl AmmoWeights {
    pub fn weight(&self, ammo_type: AmmoType) -> f32 {
        match ammo_type {
            AmmoType::Basic => self.basic,
            AmmoType::Heavy => self.heavy,
            AmmoType::Volatile => self.volatile,
            AmmoType::Emp => self.emp,
            AmmoType::Repair => self.repair,
            AmmoType::Shield => self.shield,
        }
    }

    pub fn total(&self) -> f32 {
        AmmoType::ALL.iter().map(|t| self.weight(*t)).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Spawn attempts per second
    pub spawn_rate: f32,
    /// Desired ammo in play per side
    pub target_per_side: u32,
    pub order: SideOrder,
    pub weights: AmmoWeights,
    pub ammo_radius: f32,
    pub ammo_restitution: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            spawn_rate: 6.0,
            target_per_side: 40,
            order: SideOrder::LeftFirst,
            weights: AmmoWeights::default(),
            ammo_radius: 7.0,
            ammo_restitution: 0.45,
        }
    }
}

/// Ammo housekeeping thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmmoConfig {
    pub idle_timeout_ms: f64,
    /// Below this speed an ammo body accrues idle time
    pub idle_speed: f32,
    /// Below this speed an ammo body gets a sideways nudge
    pub stall_speed: f32,
    pub nudge_speed: f32,
    /// Bodies further than this outside the world are culled
    pub out_of_bounds_margin: f32,
    /// Height of the conveyor strip above each board floor
    pub conveyor_band: f32,
    pub conveyor_speed: f32,
    pub air_friction: f32,
    pub projectile_max_lifetime_ms: f64,
}

impl Default for AmmoConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 8000.0,
            idle_speed: 8.0,
            stall_speed: 2.0,
            nudge_speed: 30.0,
            out_of_bounds_margin: 200.0,
            conveyor_band: 24.0,
            conveyor_speed: 160.0,
            air_friction: 0.01,
            projectile_max_lifetime_ms: 10_000.0,
        }
    }
}

/// A horizontal gel damper strip, positioned as a fraction of board height
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GelZoneConfig {
    pub rel_y: f32,
    pub height: f32,
    /// Exponential decay rates per second
    pub rate_x: f32,
    pub rate_y: f32,
}

/// An oscillating paddle, positioned as a fraction of board height
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaddleConfig {
    pub rel_y: f32,
    pub width: f32,
    pub amplitude: f32,
    pub frequency_hz: f32,
    pub phase: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    pub half_width: f32,
    pub intake_radius: f32,
    /// Acceleration toward the intake for ammo outside the channel
    pub suction: f32,
    pub lift_speed: f32,
    /// Velocity servo gain inside the channel (per second)
    pub lift_gain: f32,
    /// Lateral centering gain inside the channel (per second)
    pub centering: f32,
    /// Sideways speed given to ammo leaving the top of the pipe
    pub exit_kick: f32,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            half_width: 14.0,
            intake_radius: 60.0,
            suction: 900.0,
            lift_speed: 520.0,
            lift_gain: 8.0,
            centering: 10.0,
            exit_kick: 140.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Downward acceleration in px/s²
    pub gravity: f32,
    pub pin_rows: u32,
    pub pin_cols: u32,
    pub pin_radius: f32,
    pub gel_zones: Vec<GelZoneConfig>,
    pub paddles: Vec<PaddleConfig>,
    pub pipe: PipeConfig,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            gravity: 900.0,
            pin_rows: 8,
            pin_cols: 9,
            pin_radius: 5.0,
            gel_zones: vec![
                GelZoneConfig {
                    rel_y: 0.32,
                    height: 40.0,
                    rate_x: 3.0,
                    rate_y: 5.0,
                },
                GelZoneConfig {
                    rel_y: 0.72,
                    height: 30.0,
                    rate_x: 1.5,
                    rate_y: 2.5,
                },
            ],
            paddles: vec![
                PaddleConfig {
                    rel_y: 0.5,
                    width: 90.0,
                    amplitude: 120.0,
                    frequency_hz: 0.35,
                    phase: 0.0,
                },
                PaddleConfig {
                    rel_y: 0.84,
                    width: 70.0,
                    amplitude: 90.0,
                    frequency_hz: 0.5,
                    phase: std::f32::consts::FRAC_PI_2,
                },
            ],
            pipe: PipeConfig::default(),
        }
    }
}

/// Transient feedback durations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FxConfig {
    pub impact_ttl_ms: f64,
    pub fuse_burst_ttl_ms: f64,
    pub shake_amplitude: f32,
    pub shake_ms: f64,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            impact_ttl_ms: 300.0,
            fuse_burst_ttl_ms: 350.0,
            shake_amplitude: 6.0,
            shake_ms: 250.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    /// Match is a tie once this much time passes; 0 disables the limit
    pub time_limit_ms: f64,
    /// Delay before a finished match restarts; `None` waits for the host
    pub auto_restart_ms: Option<f64>,
    /// Center HP fraction that triggers the low-health banter hook
    pub low_health_fraction: f32,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            time_limit_ms: 180_000.0,
            auto_restart_ms: Some(4000.0),
            low_health_fraction: 0.25,
        }
    }
}

/// Complete balance configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub core: CoreConfig,
    pub damage: DamageConfig,
    pub shield: ShieldConfig,
    pub explosion: ExplosionConfig,
    pub weapons: WeaponsConfig,
    pub cannon: CannonConfig,
    pub laser: LaserConfig,
    pub missile: MissileConfig,
    pub mortar: MortarConfig,
    pub mods: ModsConfig,
    pub repair: RepairConfig,
    pub bins: BinsConfig,
    pub spawn: SpawnConfig,
    pub ammo: AmmoConfig,
    pub field: FieldConfig,
    pub fx: FxConfig,
    pub match_rules: MatchRules,
}

impl GameConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Cooldown for a weapon before mods are applied
    pub fn cooldown_ms(&self, weapon: WeaponKind) -> f64 {
        match weapon {
            WeaponKind::Cannon => self.cannon.cooldown_ms,
            WeaponKind::Laser => self.laser.cooldown_ms,
            WeaponKind::Missile => self.missile.cooldown_ms,
            WeaponKind::Mortar => self.mortar.cooldown_ms,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let core = &self.core;
        if core.segments < 6 {
            return Err(SimError::invalid("core.segments", "must be at least 6"));
        }
        if core.seg_hp_max <= 0.0 || core.center_hp_max <= 0.0 {
            return Err(SimError::invalid("core", "hp maxima must be positive"));
        }
        if core.shield_hp_max < 0.0 || core.shield_start > core.shield_hp_max {
            return Err(SimError::invalid(
                "core.shield_start",
                "must lie within [0, shield_hp_max]",
            ));
        }
        if core.center_radius <= 0.0 || core.ring_radius <= core.center_radius {
            return Err(SimError::invalid(
                "core.ring_radius",
                "must exceed a positive center_radius",
            ));
        }

        check_probability("damage.chip_chance", self.damage.chip_chance)?;
        check_probability("explosion.ammo_destroy_pct", self.explosion.ammo_destroy_pct)?;
        if self.damage.leak_when_broken < 0.0 {
            return Err(SimError::invalid(
                "damage.leak_when_broken",
                "must not be negative",
            ));
        }
        if self.explosion.min_distance <= 0.0 {
            return Err(SimError::invalid(
                "explosion.min_distance",
                "must be positive",
            ));
        }

        if self.laser.tick_ms <= 0.0 {
            return Err(SimError::invalid("laser.tick_ms", "must be positive"));
        }
        if self.cannon.min_speed_mul > self.cannon.max_speed_mul {
            return Err(SimError::invalid(
                "cannon.min_speed_mul",
                "must not exceed max_speed_mul",
            ));
        }
        if self.cannon.burst == 0 || self.missile.count == 0 {
            return Err(SimError::invalid(
                "cannon.burst",
                "burst and missile count must be at least 1",
            ));
        }

        if self.repair.seg_points < 0.0 || self.repair.center_points < 0.0 {
            return Err(SimError::invalid("repair", "points must not be negative"));
        }
        if self.mods.buff_pool.is_empty() {
            return Err(SimError::invalid("mods.buff_pool", "must not be empty"));
        }
        if self.mods.debuff_pool.is_empty() {
            return Err(SimError::invalid("mods.debuff_pool", "must not be empty"));
        }

        for bin in BinKind::ALL {
            let spec = self.bins.spec(bin);
            if spec.cap == 0 {
                return Err(SimError::invalid("bins", format!("{bin:?} cap must be positive")));
            }
            if spec.accepts.is_empty() {
                return Err(SimError::invalid(
                    "bins",
                    format!("{bin:?} must accept at least one ammo type"),
                ));
            }
        }

        if self.spawn.spawn_rate <= 0.0 {
            return Err(SimError::invalid("spawn.spawn_rate", "must be positive"));
        }
        if self.spawn.weights.total() <= 0.0 {
            return Err(SimError::invalid("spawn.weights", "must have a positive total"));
        }
        if self.match_rules.time_limit_ms < 0.0 {
            return Err(SimError::invalid(
                "match_rules.time_limit_ms",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

fn check_probability(field: &'static str, p: f32) -> Result<(), SimError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(SimError::invalid(field, format!("{p} is outside [0, 1]")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{
            "core": { "segments": 8 },
            "explosion": { "enabled": false },
            "spawn": { "order": "alternate_tick" }
        }"#;
        let config = GameConfig::from_json_str(json).unwrap();
        assert_eq!(config.core.segments, 8);
        assert!(!config.explosion.enabled);
        assert_eq!(config.spawn.order, SideOrder::AlternateTick);
        // Untouched keys keep their defaults
        assert_eq!(config.core.seg_hp_max, 100.0);
        assert!(config.damage.spillover);
    }

    #[test]
    fn test_rejects_too_few_segments() {
        let err = GameConfig::from_json_str(r#"{ "core": { "segments": 4 } }"#).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidConfig {
                field: "core.segments",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = GameConfig::default();
        config.damage.chip_chance = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }

    #[test]
    fn test_cooldown_lookup() {
        let config = GameConfig::default();
        assert_eq!(config.cooldown_ms(WeaponKind::Laser), config.laser.cooldown_ms);
        assert_eq!(config.cooldown_ms(WeaponKind::Mortar), config.mortar.cooldown_ms);
    }
}
