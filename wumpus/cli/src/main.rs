use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use shared_event_bus::FileEventPublisher;
use shared_logging::LogLevel;
use tokio::runtime::Runtime;
use wumpus_planning::{run_benchmark, EpisodeRunner, Explorer, PathOutcome};
use wumpus_world::{Cave, Episode, EpisodeConfig, Oracle, Position, WorldTelemetry};

#[derive(Parser, Debug)]
#[command(name = "wumpus", version, about = "Logic-driven wumpus world agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plans a safe path to the gold with the whole layout disclosed.
    Plan {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Plays one stepwise episode and prints its report.
    Play {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
        /// JSON-lines file receiving episode events.
        #[arg(long)]
        event_log: Option<PathBuf>,
        /// JSON-lines structured log.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Runs randomized episodes and prints aggregate results.
    Bench {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value_t = 10)]
        trials: usize,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Prints which cells are provably safe once the layout is disclosed.
    Safety {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Plan { config, seed } => handle_plan(&load_config(&config, seed)?),
        Commands::Play {
            config,
            seed,
            event_log,
            log,
        } => handle_play(load_config(&config, seed)?, event_log, log),
        Commands::Bench {
            config,
            trials,
            log,
        } => handle_bench(&load_config(&config, None)?, trials, log),
        Commands::Safety { config, seed } => handle_safety(load_config(&config, seed)?),
    }
}

fn load_config(path: &Path, seed: Option<u64>) -> Result<EpisodeConfig> {
    let mut config = EpisodeConfig::load(path)?;
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    if config.seed.is_none() {
        let drawn = rand::random::<u64>();
        eprintln!("using seed {drawn}");
        config.seed = Some(drawn);
    }
    Ok(config)
}

fn handle_plan(config: &EpisodeConfig) -> Result<()> {
    let cave = Cave::seeded(config)?;
    let mut episode = Episode::new(config.clone())?;
    let mut runner = EpisodeRunner::new(Explorer::from_config(config));
    let outcome = runner.plan(&mut episode, &cave)?;
    match outcome {
        PathOutcome::Found(path) => {
            let rendered: Vec<String> = path.iter().map(ToString::to_string).collect();
            println!("path ({} steps): {}", path.len(), rendered.join(" -> "));
        }
        PathOutcome::NoPathFound | PathOutcome::Abandoned => println!("no path"),
    }
    println!("{}", serde_json::to_string_pretty(cave.layout())?);
    Ok(())
}

fn handle_play(
    config: EpisodeConfig,
    event_log: Option<PathBuf>,
    log: Option<PathBuf>,
) -> Result<()> {
    let cave = Cave::seeded(&config)?;
    let telemetry = build_telemetry("wumpus.play", event_log, log)?;
    telemetry.log(
        LogLevel::Info,
        "episode.layout",
        json!({ "layout": cave.layout(), "seed": config.seed }),
    )?;
    let mut runner = EpisodeRunner::new(Explorer::from_config(&config));
    let mut episode = Episode::new(config)?.with_telemetry(telemetry);
    let report = runner.run(&mut episode, &cave)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn handle_bench(config: &EpisodeConfig, trials: usize, log: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(trials > 0, "trials must be positive");
    let telemetry = match log {
        Some(path) => Some(build_telemetry("wumpus.bench", None, Some(path))?),
        None => None,
    };
    let summary = run_benchmark(config, trials, telemetry.as_ref())?;
    println!("trials:                  {}", summary.trials);
    println!("success rate:            {:.1}%", summary.success_rate * 100.0);
    println!("average steps:           {:.2}", summary.average_steps);
    println!(
        "average hazards avoided: {:.2}",
        summary.average_hazards_avoided
    );
    println!(
        "logical consistency:     {}",
        if summary.consistent { "ok" } else { "violated" }
    );
    Ok(())
}

fn handle_safety(config: EpisodeConfig) -> Result<()> {
    let cave = Cave::seeded(&config)?;
    let mut episode = Episode::new(config)?;
    {
        let mut translator = episode.translator();
        translator.disclose_layout(cave.layout())?;
        translator.seal_layout();
    }
    let cells: Vec<Position> = episode.grid().cells().collect();
    let snapshot = episode.knowledge().snapshot();
    let runtime = Runtime::new().context("starting query runtime")?;
    let verdicts = runtime.block_on(Oracle::precompute_safety(
        episode.engine(),
        &snapshot,
        cells,
    ));
    let size = episode.grid().size();
    let mut rows = vec![vec!['?'; size]; size];
    for (cell, safe) in verdicts {
        if let (Ok(x), Ok(y)) = (usize::try_from(cell.x), usize::try_from(cell.y)) {
            rows[y][x] = if safe { '.' } else { 'X' };
        }
    }
    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
    Ok(())
}

fn build_telemetry(
    module: &str,
    event_log: Option<PathBuf>,
    log: Option<PathBuf>,
) -> Result<WorldTelemetry> {
    let mut builder = WorldTelemetry::builder(module);
    if let Some(path) = log {
        builder = builder.log_path(path);
    }
    if let Some(path) = event_log {
        let publisher = FileEventPublisher::new(&path)
            .with_context(|| format!("opening event log {}", path.display()))?;
        builder = builder.event_publisher(Arc::new(publisher));
    }
    builder.build()
}
