use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mob_client::{build_world, load_commands, resolve_settings, Driver};
use mob_core::Scenario;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenarioArg {
    MouseFollow,
    Bottleneck,
    Lanes,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::MouseFollow => Scenario::MouseFollow,
            ScenarioArg::Bottleneck => Scenario::Bottleneck,
            ScenarioArg::Lanes => Scenario::Lanes,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless mob steering simulation", long_about = None)]
struct Args {
    /// Scenario to lay out (overrides the one in the settings file)
    #[arg(short, long, value_enum)]
    scenario: Option<ScenarioArg>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// JSON settings file (scenario plus steering overrides)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// JSON array of { "tick": n, "command": ... } entries
    #[arg(short, long)]
    commands: Option<PathBuf>,

    /// Write a frame every N ticks
    #[arg(short, long, default_value_t = 1)]
    emit_every: u64,

    /// Output file for JSON-lines frames (stdout if absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for spawn positions and headings
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let settings = resolve_settings(args.settings.as_deref(), args.scenario.map(Scenario::from))?;

    log::info!("Mob simulation starting...");
    log::info!("Scenario: {:?}", settings.scenario);
    log::info!("Ticks: {}", args.ticks);

    let world = build_world(&settings, args.seed).context("Failed to build world")?;
    let script = match &args.commands {
        Some(path) => load_commands(path)?,
        None => Vec::new(),
    };
    log::info!("Loaded {} scripted command(s)", script.len());

    let mut driver = Driver::new(world)
        .with_script(script)
        .with_emit_every(args.emit_every);

    let out: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    driver.run(args.ticks, out).context("Simulation error")?;

    if driver.remaining_commands() > 0 {
        log::warn!(
            "{} scripted command(s) were scheduled past the last tick",
            driver.remaining_commands()
        );
    }

    Ok(())
}
