//! Pachinko Battler headless runner
//!
//! Plays matches at the fixed timestep with no frontend attached, then prints
//! the scoreboard and session stats as JSON.
//!
//! Usage: `pachinko-battler [seed] [seconds] [config.json]`

use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::Serialize;

use pachinko_battler::consts::SIM_DT;
use pachinko_battler::hooks::Hooks;
use pachinko_battler::sim::{SimulationState, start_match, tick};
use pachinko_battler::{GameConfig, Scoreboard, SessionStats};

const DEFAULT_SEED: u64 = 1;
const DEFAULT_SECONDS: f64 = 300.0;

#[derive(Serialize)]
struct Report<'a> {
    seed: u64,
    simulated_seconds: f64,
    scoreboard: &'a Scoreboard,
    stats: &'a SessionStats,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let seed = match args.first() {
        Some(s) => s.parse().with_context(|| format!("invalid seed {s:?}"))?,
        None => DEFAULT_SEED,
    };
    let seconds: f64 = match args.get(1) {
        Some(s) => s
            .parse()
            .with_context(|| format!("invalid duration {s:?}"))?,
        None => DEFAULT_SECONDS,
    };
    let mut config = match args.get(2) {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => GameConfig::default(),
    };
    // Headless runs chain matches back to back
    if config.match_rules.auto_restart_ms.is_none() {
        config.match_rules.auto_restart_ms = Some(0.0);
    }

    let stats = Rc::new(RefCell::new(SessionStats::default()));
    let hooks = Hooks {
        stats: Box::new(stats.clone()),
        ..Default::default()
    };
    let mut state = SimulationState::new(config, seed)
        .context("invalid game config")?
        .with_hooks(hooks);
    start_match(&mut state).context("failed to start the first match")?;

    log::info!("Running seed {} for {:.0} simulated seconds", seed, seconds);
    let ticks = (seconds / SIM_DT as f64).ceil() as u64;
    for _ in 0..ticks {
        tick(&mut state, SIM_DT).context("simulation step failed")?;
    }

    let stats = stats.borrow();
    let report = Report {
        seed,
        simulated_seconds: state.now_ms / 1000.0,
        scoreboard: &state.scoreboard,
        stats: &stats,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to encode report")?
    );
    Ok(())
}
