use bb_core::config::ScenarioLoader;
use bb_core::engine::PhysicsEngine;
use bb_core::scenario::{random_impulse, slider_to_time_scale, RandomFill, ScenarioConfig};
use bb_core::types::{ArenaBounds, BallId};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use std::path::PathBuf;

/// Run a ball arena headless and print the debug overlay each frame.
#[derive(Parser, Debug)]
#[command(name = "ballbox", version)]
struct Args {
    /// Scenario name (file stem inside --dir)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Directory holding scenario YAML files
    #[arg(long, default_value = "scenarios")]
    dir: PathBuf,

    /// Arena width when no scenario is given
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Arena height when no scenario is given
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: usize,

    /// Real seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_time: f64,

    /// Simulated seconds per real second (overrides the scenario)
    #[arg(short, long, conflicts_with = "slider")]
    time_scale: Option<f64>,

    /// Time scale as a logarithmic slider position in [0, 1]
    #[arg(long)]
    slider: Option<f64>,

    /// Seed for the random population and impulses
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Kick a random ball every N frames (0 disables)
    #[arg(long, default_value_t = 0)]
    impulse_every: usize,

    /// Print the overlay every N frames
    #[arg(long, default_value_t = 1)]
    print_every: usize,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn load_scenario(args: &Args) -> Result<ScenarioConfig> {
    match &args.scenario {
        Some(name) => {
            let loader = ScenarioLoader::new(&args.dir);
            loader.load(name).with_context(|| {
                format!(
                    "failed to load scenario '{}' from {}",
                    name,
                    args.dir.display()
                )
            })
        }
        None => {
            let mut scenario = ScenarioConfig::new(ArenaBounds::new(args.width, args.height));
            scenario.random = Some(RandomFill::with_seed(args.seed));
            scenario.validate().context("invalid arena for a random population")?;
            Ok(scenario)
        }
    }
}

fn overlay(engine: &PhysicsEngine, time_scale: f64) -> String {
    let diagnostics = engine.diagnostics();
    format!(
        "Min distance: {:.2}px | Balls: {} | Collisions: {} | Time Scale: {:.3}x",
        diagnostics.min_distance(),
        engine.len(),
        diagnostics.collisions_count(),
        time_scale
    )
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let scenario = load_scenario(&args)?;
    let time_scale = match (args.time_scale, args.slider) {
        (Some(scale), _) => scale,
        (None, Some(slider)) => slider_to_time_scale(slider),
        (None, None) => scenario.time_scale,
    };
    anyhow::ensure!(time_scale > 0.0, "time scale must be positive, got {}", time_scale);

    let mut engine = scenario.build_engine().context("failed to build engine")?;
    let mut rng = ChaChaRng::seed_from_u64(args.seed);
    let dt = args.frame_time * time_scale;

    info!(
        "{}x{} arena, {} balls, {:.3}x time scale, {} frames",
        scenario.arena.width,
        scenario.arena.height,
        engine.len(),
        time_scale,
        args.frames
    );

    for frame in 1..=args.frames {
        if args.impulse_every > 0 && frame % args.impulse_every == 0 && !engine.is_empty() {
            let id = BallId(rng.gen_range(0..engine.len()));
            let impulse = random_impulse(&mut rng);
            debug!("frame {}: kicking ball {} by {:?}", frame, id, impulse);
            engine.apply_impulse(id, impulse);
        }

        engine.step(dt, &scenario.arena);

        if args.print_every > 0 && frame % args.print_every == 0 {
            println!("{}", overlay(&engine, time_scale));
        }
    }

    info!(
        "simulated {:.4}s, {} collisions",
        engine.elapsed(),
        engine.diagnostics().collisions_count()
    );

    Ok(())
}
