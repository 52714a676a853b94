//! Cleanbot Fleet - headless runner
//!
//! Builds a room from command-line flags (or a TOML file), runs it until
//! every cell is clean or the tick limit is hit, and prints the outcome.

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use cleanbot_fleet::core::error::Result;
use cleanbot_fleet::{SimulationConfig, StartMode, World};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StartArg {
    Fixed,
    Random,
}

/// Run a cleaning fleet simulation without a display
#[derive(Parser, Debug)]
#[command(name = "cleanbot-fleet")]
#[command(about = "Simulate a fleet of cleaning robots until the room is clean")]
struct Args {
    /// Room config in TOML; flags below are ignored when given
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Grid width
    #[arg(long, default_value_t = 20)]
    width: u32,

    /// Grid height
    #[arg(long, default_value_t = 20)]
    height: u32,

    /// Number of robots
    #[arg(long, default_value_t = 5)]
    robots: usize,

    /// Fraction of cells that start dirty
    #[arg(long, default_value_t = 0.3)]
    dirty: f64,

    /// Fraction of cells covered by furniture
    #[arg(long, default_value_t = 0.1)]
    furniture: f64,

    /// Robot start placement
    #[arg(long, value_enum, default_value = "fixed")]
    start: StartArg,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u64,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl Args {
    fn to_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig {
                width: self.width,
                height: self.height,
                num_robots: self.robots,
                dirty_fraction: self.dirty,
                furniture_fraction: self.furniture,
                start_mode: match self.start {
                    StartArg::Fixed => StartMode::Fixed,
                    StartArg::Random => StartMode::Random,
                },
                ..Default::default()
            },
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cleanbot_fleet=info")),
        )
        .init();

    let args = Args::parse();
    let config = args.to_config()?;

    let mut world = World::new(config)?;
    let summary = world.run(args.max_ticks)?;

    if world.is_running() {
        tracing::warn!(
            "Tick limit {} reached with {} dirty cells left",
            args.max_ticks,
            summary.dirty_remaining
        );
    }

    match args.format {
        OutputFormat::Json => println!("{}", world.snapshot().to_json()?),
        OutputFormat::Text => {
            println!("{}", world.snapshot().summary());
            for robot in world.robots() {
                println!(
                    "  robot {} at {} battery={} moves={}",
                    robot.id, robot.position, robot.battery, robot.movements
                );
            }
        }
    }

    Ok(())
}
