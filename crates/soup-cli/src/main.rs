//! `soup` - command-line driver for the emotional-soup simulation.

mod ascii;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::Rng;
use soup_core::{SoupConfig, World};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(name = "soup")]
#[command(version)]
#[command(about = "Grid ecosystem driven by wandering joyful and sorrowful agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct WorldArgs {
    /// Named preset: compact, large or side_view
    #[arg(short, long, default_value = "large")]
    preset: String,

    /// JSON configuration file; overrides the preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Draw a fresh seed instead of the configured one
    #[arg(long, conflicts_with = "seed")]
    random_seed: bool,

    /// Initial number of agents
    #[arg(short, long)]
    agents: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and report sampled metrics
    Run {
        #[command(flatten)]
        world: WorldArgs,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "1000")]
        ticks: usize,

        /// Simulated milliseconds per tick
        #[arg(long, default_value = "16.0")]
        dt: f64,

        /// Record metrics every N ticks
        #[arg(long, default_value = "100")]
        sample_every: usize,

        /// Write the run summary JSON here
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write the final export record JSON here
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Run for a while, then print the grid as ASCII
    Render {
        #[command(flatten)]
        world: WorldArgs,

        /// Number of ticks before drawing
        #[arg(short, long, default_value = "500")]
        ticks: usize,

        /// Simulated milliseconds per tick
        #[arg(long, default_value = "16.0")]
        dt: f64,
    },

    /// Time ticks with and without per-tick metric collection
    Bench {
        #[command(flatten)]
        world: WorldArgs,

        /// Number of ticks per measurement
        #[arg(short, long, default_value = "1000")]
        ticks: usize,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            world,
            ticks,
            dt,
            sample_every,
            out,
            export,
        } => run_simulation(&world, ticks, dt, sample_every, out, export),
        Commands::Render { world, ticks, dt } => render(&world, ticks, dt),
        Commands::Bench { world, ticks } => run_benchmark(&world, ticks),
    }
}

fn load_config(args: &WorldArgs) -> Result<SoupConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SoupConfig::from_json_str(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => match SoupConfig::preset(&args.preset) {
            Some(config) => config,
            None => bail!(
                "unknown preset '{}' (expected compact, large or side_view)",
                args.preset
            ),
        },
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    } else if args.random_seed {
        config.seed = rand::rng().random::<u64>();
    }
    if let Some(agents) = args.agents {
        config.initial_agents = agents;
    }
    Ok(config)
}

fn build_world(args: &WorldArgs) -> Result<World> {
    let config = load_config(args)?;
    let seed = config.seed;
    let world = World::try_new(config).context("building world")?;
    info!(seed, "world ready");
    Ok(world)
}

fn write_json(path: &Path, json: &str) -> Result<()> {
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

fn run_simulation(
    args: &WorldArgs,
    ticks: usize,
    dt: f64,
    sample_every: usize,
    out: Option<PathBuf>,
    export: Option<PathBuf>,
) -> Result<()> {
    let mut world = build_world(args)?;
    let start = Instant::now();
    let summary = world.try_run(ticks, dt, sample_every)?;
    let elapsed = start.elapsed();

    println!(
        "{:>8} {:>10} {:>8} {:>8} {:>8} {:>7} {:>5}",
        "tick", "clock_ms", "mood", "mature", "growing", "agents", "fires"
    );
    for sample in &summary.samples {
        println!(
            "{:>8} {:>10.0} {:>8.3} {:>8} {:>8} {:>7} {:>5}",
            sample.tick,
            sample.clock_ms,
            sample.stats.avg_mood,
            sample.stats.mature_tiles,
            sample.growing_tiles,
            sample.joy_agents + sample.sorrow_agents,
            sample.fires_last_tick,
        );
    }
    println!(
        "{} ticks in {:?} ({:.1} ticks/s), {} clearing events",
        ticks,
        elapsed,
        ticks as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        summary.total_fires
    );

    if let Some(path) = out {
        write_json(&path, &serde_json::to_string_pretty(&summary)?)?;
        info!(path = %path.display(), "run summary written");
    }
    if let Some(path) = export {
        write_json(&path, &world.export_summary().to_json()?)?;
        info!(path = %path.display(), "export record written");
    }
    Ok(())
}

fn render(args: &WorldArgs, ticks: usize, dt: f64) -> Result<()> {
    let mut world = build_world(args)?;
    for _ in 0..ticks {
        world.tick(dt);
    }
    let stats = world.query_stats();
    println!("{}", ascii::render_frame(&world));
    println!(
        "tick {}  agents {}  mood {:.3}  mature {}  visits {}",
        world.tick_index(),
        world.agents.len(),
        stats.avg_mood,
        stats.mature_tiles,
        stats.total_visits
    );
    Ok(())
}

/// Average duration of one tick. Divides in floating point so tick counts past
/// `u32::MAX` still average correctly.
fn per_tick(total: Duration, ticks: usize) -> Duration {
    if ticks == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(total.as_secs_f64() / ticks as f64)
}

fn run_benchmark(args: &WorldArgs, ticks: usize) -> Result<()> {
    if ticks == 0 {
        bail!("ticks must be positive");
    }
    let mut plain = build_world(args)?;
    let mut sampled = plain.clone();
    println!(
        "Benchmarking {}x{} grid, {} agents, {} ticks",
        plain.grid().width(),
        plain.grid().height(),
        plain.agents.len(),
        ticks
    );

    let start = Instant::now();
    let mut phase_us = [0u64; 5];
    for _ in 0..ticks {
        let t = plain.tick(16.0);
        phase_us[0] += t.kinematics_us;
        phase_us[1] += t.influence_us;
        phase_us[2] += t.growth_us;
        phase_us[3] += t.diffusion_us;
        phase_us[4] += t.fire_us;
    }
    let without = start.elapsed();

    let start = Instant::now();
    sampled.try_run(ticks, 16.0, 1)?;
    let with = start.elapsed();

    let avg = |total: Duration| per_tick(total, ticks);
    println!("without metrics: {without:?} ({:?}/tick)", avg(without));
    println!("with metrics:    {with:?} ({:?}/tick)", avg(with));
    let overhead = with.saturating_sub(without);
    println!("metrics overhead: {overhead:?} ({:?}/tick)", avg(overhead));
    for (name, us) in ["kinematics", "influence", "growth", "diffusion", "fire"]
        .iter()
        .zip(phase_us)
    {
        println!("  {name:<11} {:>8.1} us/tick", us as f64 / ticks as f64);
    }
    Ok(())
}
