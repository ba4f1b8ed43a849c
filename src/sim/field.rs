//! Field layout and the passive/active geometry that moves ammo around.
//!
//! Each side owns one pachinko board; the middle strip holds the cores and
//! weapon mounts. The right board is the left one mirrored across the world's
//! vertical center line.
//!
//! ```text
//!  0        520 540        1060 1080       1600
//!  |pipe pins  |  | mounts  cores |  | pins pipe|
//!  |  gel      |  |               |  |   gel    |
//!  |containers |  |               |  |containers|
//! ```

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::core::Core;
use super::entities::{AmmoMask, BinKind, BodyRole, PerSide, Side, WeaponKind};
use crate::config::{AmmoConfig, GameConfig, GelZoneConfig, PaddleConfig, PipeConfig};
use crate::consts::{WALL_THICKNESS, WORLD_HEIGHT, WORLD_WIDTH};
use crate::physics::{Body, BodyHandle, PhysicsWorld, Shape};

/// Inner edge of the left board
const BOARD_WIDTH: f32 = 520.0;
const DIVIDER_HALF_WIDTH: f32 = 10.0;
const PIPE_X: f32 = 24.0;
/// Ammo rising past this height leaves the pipe
const PIPE_TOP: f32 = 80.0;
const CORE_CENTER: Vec2 = Vec2::new(660.0, 640.0);
const MOUNT_X: f32 = 590.0;
const MOUNT_TOP: f32 = 140.0;
const MOUNT_SPACING: f32 = 70.0;
const MOUNT_RADIUS: f32 = 14.0;
const CONTAINER_LEFT: f32 = 60.0;
const CONTAINER_RIGHT: f32 = 510.0;
const CONTAINER_HALF_HEIGHT: f32 = 12.0;
const PIN_LEFT: f32 = 80.0;
const PIN_RIGHT: f32 = 500.0;
const PIN_TOP: f32 = 160.0;
const PIN_BOTTOM: f32 = 820.0;
const PADDLE_HALF_HEIGHT: f32 = 6.0;
const SPAWN_Y: f32 = 60.0;
const SPAWN_MIN_X: f32 = 120.0;
const SPAWN_MAX_X: f32 = 480.0;

/// Reflect a left-board point onto `side`
pub fn mirror(side: Side, p: Vec2) -> Vec2 {
    match side {
        Side::Left => p,
        Side::Right => Vec2::new(WORLD_WIDTH - p.x, p.y),
    }
}

pub fn core_center(side: Side) -> Vec2 {
    mirror(side, CORE_CENTER)
}

/// One side's board geometry in world coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct BoardLayout {
    pub side: Side,
    pub min: Vec2,
    pub max: Vec2,
    pub pipe_x: f32,
    pub pipe_top: f32,
    /// Bottom of the pipe, where suction pulls floor ammo in
    pub intake: Vec2,
    /// +1 when "into the board" is +x (the pipe sits on the outer edge)
    pub inward: f32,
    /// Mount positions indexed by `WeaponKind::index`
    pub mounts: [Vec2; 4],
}

impl BoardLayout {
    pub fn new(side: Side) -> Self {
        let a = mirror(side, Vec2::ZERO);
        let b = mirror(side, Vec2::new(BOARD_WIDTH, WORLD_HEIGHT));
        let pipe_x = mirror(side, Vec2::new(PIPE_X, 0.0)).x;
        Self {
            side,
            min: a.min(b),
            max: a.max(b),
            pipe_x,
            pipe_top: PIPE_TOP,
            intake: Vec2::new(pipe_x, WORLD_HEIGHT - 40.0),
            inward: -side.tilt_sign(),
            mounts: std::array::from_fn(|i| {
                mirror(side, Vec2::new(MOUNT_X, MOUNT_TOP + i as f32 * MOUNT_SPACING))
            }),
        }
    }

    pub fn mount(&self, weapon: WeaponKind) -> Vec2 {
        self.mounts[weapon.index()]
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Random drop point along the top of the board
    pub fn spawn_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let x = rng.random_range(SPAWN_MIN_X..SPAWN_MAX_X);
        mirror(self.side, Vec2::new(x, SPAWN_Y))
    }

    fn in_pipe_column(&self, p: Vec2, half_width: f32) -> bool {
        (p.x - self.pipe_x).abs() <= half_width
    }
}

/// A paddle body and where it oscillates around
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleBody {
    pub handle: BodyHandle,
    pub side: Side,
    pub base: Vec2,
    /// Index into `FieldConfig::paddles`
    pub config_index: usize,
}

/// The physics world plus the layout that gives it meaning
#[derive(Debug)]
pub struct Arena {
    pub world: PhysicsWorld<BodyRole>,
    pub boards: PerSide<BoardLayout>,
    pub paddles: Vec<PaddleBody>,
}

impl Arena {
    pub fn board(&self, side: Side) -> &BoardLayout {
        &self.boards[side]
    }
}

/// Build the static field and the core/mount sensors for a fresh match
pub fn build_arena(cfg: &GameConfig, cores: &PerSide<Core>) -> Arena {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, cfg.field.gravity));
    let t = WALL_THICKNESS / 2.0;

    let walls = [
        (Vec2::new(WORLD_WIDTH / 2.0, -t), Vec2::new(WORLD_WIDTH / 2.0 + WALL_THICKNESS, t)),
        (
            Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT + t),
            Vec2::new(WORLD_WIDTH / 2.0 + WALL_THICKNESS, t),
        ),
        (Vec2::new(-t, WORLD_HEIGHT / 2.0), Vec2::new(t, WORLD_HEIGHT / 2.0)),
        (
            Vec2::new(WORLD_WIDTH + t, WORLD_HEIGHT / 2.0),
            Vec2::new(t, WORLD_HEIGHT / 2.0),
        ),
    ];
    for (pos, half) in walls {
        world.add(Body::fixed(pos, Shape::Rect { half }, BodyRole::Wall).with_restitution(0.3));
    }

    let boards = PerSide::from_fn(BoardLayout::new);
    let mut paddles = Vec::new();

    for side in Side::BOTH {
        let board = &boards[side];

        let divider = mirror(side, Vec2::new(BOARD_WIDTH + DIVIDER_HALF_WIDTH, WORLD_HEIGHT / 2.0));
        world.add(
            Body::fixed(
                divider,
                Shape::Rect {
                    half: Vec2::new(DIVIDER_HALF_WIDTH, WORLD_HEIGHT / 2.0),
                },
                BodyRole::Wall,
            )
            .with_restitution(0.3),
        );

        add_pins(&mut world, side, cfg);
        add_containers(&mut world, side, cfg);

        for weapon in WeaponKind::ALL {
            world.add(
                Body::fixed(
                    board.mount(weapon),
                    Shape::Circle {
                        radius: MOUNT_RADIUS,
                    },
                    BodyRole::WeaponMount { side, weapon },
                )
                .sensor(),
            );
        }

        let core = &cores[side];
        world.add(
            Body::fixed(
                core.center,
                Shape::Circle {
                    radius: core.outer_radius,
                },
                BodyRole::CoreRing { side },
            )
            .sensor(),
        );
        world.add(
            Body::fixed(
                core.center,
                Shape::Circle {
                    radius: core.center_radius,
                },
                BodyRole::CoreCenter { side },
            )
            .sensor(),
        );

        for (config_index, paddle) in cfg.field.paddles.iter().enumerate() {
            let base = Vec2::new(
                (board.min.x + board.max.x) / 2.0,
                board.min.y + paddle.rel_y * board.height(),
            );
            let handle = world.add(
                Body::kinematic(
                    base,
                    Shape::Rect {
                        half: Vec2::new(paddle.width / 2.0, PADDLE_HALF_HEIGHT),
                    },
                    BodyRole::Paddle,
                )
                .with_restitution(0.6),
            );
            paddles.push(PaddleBody {
                handle,
                side,
                base,
                config_index,
            });
        }
    }

    log::debug!("Arena built with {} bodies", world.len());
    Arena {
        world,
        boards,
        paddles,
    }
}

/// Staggered pin grid
fn add_pins(world: &mut PhysicsWorld<BodyRole>, side: Side, cfg: &GameConfig) {
    let rows = cfg.field.pin_rows.max(1);
    let cols = cfg.field.pin_cols.max(2);
    let dy = (PIN_BOTTOM - PIN_TOP) / (rows.max(2) - 1) as f32;
    let dx = (PIN_RIGHT - PIN_LEFT) / (cols - 1) as f32;
    for row in 0..rows {
        let offset = if row % 2 == 1 { dx / 2.0 } else { 0.0 };
        let y = PIN_TOP + row as f32 * dy;
        for col in 0..cols {
            let x = PIN_LEFT + offset + col as f32 * dx;
            if x > PIN_RIGHT {
                continue;
            }
            world.add(
                Body::fixed(
                    mirror(side, Vec2::new(x, y)),
                    Shape::Circle {
                        radius: cfg.field.pin_radius,
                    },
                    BodyRole::Pin,
                )
                .with_restitution(0.5),
            );
        }
    }
}

/// One sensor per bin along the board floor, in `BinKind::ALL` order from the pipe
fn add_containers(world: &mut PhysicsWorld<BodyRole>, side: Side, cfg: &GameConfig) {
    let width = (CONTAINER_RIGHT - CONTAINER_LEFT) / BinKind::ALL.len() as f32;
    let y = WORLD_HEIGHT - 30.0;
    for (i, bin) in BinKind::ALL.into_iter().enumerate() {
        let x = CONTAINER_LEFT + width * (i as f32 + 0.5);
        world.add(
            Body::fixed(
                mirror(side, Vec2::new(x, y)),
                Shape::Rect {
                    half: Vec2::new(width / 2.0 - 2.0, CONTAINER_HALF_HEIGHT),
                },
                BodyRole::Container {
                    side,
                    bin,
                    accepts: AmmoMask::of(&cfg.bins.spec(bin).accepts),
                },
            )
            .sensor(),
        );
    }
}

/// Remove an ammo body and decrement its side's counter. Only the call that
/// actually removes the body counts, so double removal cannot double count.
pub fn remove_ammo(
    world: &mut PhysicsWorld<BodyRole>,
    ammo_count: &mut PerSide<u32>,
    handle: BodyHandle,
) -> bool {
    let Some(body) = world.remove(handle) else {
        return false;
    };
    if let BodyRole::Ammo(ammo) = body.payload {
        ammo_count[ammo.side] = ammo_count[ammo.side].saturating_sub(1);
    }
    true
}

/// Age ammo, cull idle or escaped bodies, nudge stalled ones, run the floor conveyor.
/// Returns how many bodies were removed.
pub fn update_ammo<R: Rng>(
    arena: &mut Arena,
    ammo_count: &mut PerSide<u32>,
    cfg: &AmmoConfig,
    pipe: &PipeConfig,
    rng: &mut R,
    dt: f32,
) -> usize {
    let margin = cfg.out_of_bounds_margin;
    let idle_limit = (cfg.idle_timeout_ms / 1000.0) as f32;
    let mut expired = Vec::new();

    for (handle, body) in arena.world.iter_mut() {
        let BodyRole::Ammo(ammo) = &mut body.payload else {
            continue;
        };
        let board = &arena.boards[ammo.side];
        ammo.age += dt;

        let speed = body.vel.length();
        if speed < cfg.idle_speed {
            ammo.idle_time += dt;
        } else {
            ammo.idle_time = 0.0;
        }

        let p = body.pos;
        let escaped = p.x < -margin
            || p.x > WORLD_WIDTH + margin
            || p.y < -margin
            || p.y > WORLD_HEIGHT + margin;
        if escaped || ammo.idle_time > idle_limit {
            expired.push(handle);
            continue;
        }

        if speed < cfg.stall_speed {
            let dir = if rng.random::<bool>() { 1.0 } else { -1.0 };
            body.vel.x += dir * cfg.nudge_speed;
            body.vel.y -= cfg.nudge_speed * 0.5;
        }

        let on_floor = p.y > board.max.y - cfg.conveyor_band;
        if on_floor && !board.in_pipe_column(p, pipe.half_width) {
            body.vel.x = -board.inward * cfg.conveyor_speed;
        }
    }

    let removed = expired.len();
    for handle in expired {
        remove_ammo(&mut arena.world, ammo_count, handle);
    }
    removed
}

/// Exponential velocity decay inside gel strips
pub fn apply_gel(arena: &mut Arena, zones: &[GelZoneConfig], dt: f32) {
    let Arena { world, boards, .. } = arena;
    for (_, body) in world.iter_mut() {
        let BodyRole::Ammo(ammo) = &body.payload else {
            continue;
        };
        let board = &boards[ammo.side];
        for zone in zones {
            let y = board.min.y + zone.rel_y * board.height();
            if (body.pos.y - y).abs() <= zone.height / 2.0 {
                body.vel.x *= (-zone.rate_x * dt).exp();
                body.vel.y *= (-zone.rate_y * dt).exp();
            }
        }
    }
}

/// Pipe intake suction, in-channel lift servo with centering, and the exit kick
pub fn apply_pipes(arena: &mut Arena, pipe: &PipeConfig, dt: f32) {
    let Arena { world, boards, .. } = arena;
    let lift_k = (pipe.lift_gain * dt).min(1.0);
    let center_k = (pipe.centering * dt).min(1.0);

    for (_, body) in world.iter_mut() {
        let BodyRole::Ammo(ammo) = &body.payload else {
            continue;
        };
        let board = &boards[ammo.side];
        let p = body.pos;
        let in_column = board.in_pipe_column(p, pipe.half_width);

        if in_column && p.y >= board.pipe_top {
            body.vel.y += (-pipe.lift_speed - body.vel.y) * lift_k;
            let target_vx = (board.pipe_x - p.x) * pipe.centering;
            body.vel.x += (target_vx - body.vel.x) * center_k;
        } else if in_column && body.vel.y < 0.0 {
            body.vel.x = board.inward * pipe.exit_kick;
        } else {
            let to_intake = board.intake - p;
            if to_intake.length() <= pipe.intake_radius {
                body.force += to_intake.normalize_or_zero() * pipe.suction * body.mass;
            }
        }
    }
}

/// Sweep every paddle along its sine path; `t_secs` is match time
pub fn move_paddles(arena: &mut Arena, paddles: &[PaddleConfig], t_secs: f32) {
    let Arena {
        world,
        paddles: bodies,
        ..
    } = arena;
    for paddle in bodies.iter() {
        let Some(cfg) = paddles.get(paddle.config_index) else {
            continue;
        };
        let w = TAU * cfg.frequency_hz;
        let phase = w * t_secs + cfg.phase;
        // Mirrored so both boards sweep symmetrically
        let dir = -paddle.side.tilt_sign();
        let pos = paddle.base + Vec2::new(dir * cfg.amplitude * phase.sin(), 0.0);
        let vel = Vec2::new(dir * cfg.amplitude * w * phase.cos(), 0.0);
        world.set_position(paddle.handle, pos);
        world.set_velocity(paddle.handle, vel);
    }
}
