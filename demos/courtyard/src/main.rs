//! courtyard: a four-room horde run driven by scripted console commands.
//!
//! Two survivors hold a courtyard while the partitions around them fill with
//! zombies.  Console commands fire at fixed ticks (a horde, extra spawns, a
//! report), and every tick is written to CSV.
//!
//! Run with:
//!   cargo run -p courtyard --release -- --out output/courtyard
//!   cargo run -p courtyard -- --command 100:starthorde --command 900:aistats
//!
//! Logging follows `RUST_LOG` (default `info`).

mod level;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hz_behavior::BehaviorAsset;
use hz_core::{SimConfig, Tick};
use hz_output::{CsvWriter, OutputWriter, SimOutputObserver};
use hz_sim::{AgentSnapshot, AiStats, Console, SimBuilder, SimObserver, SurvivorConfig, TickSummary, ZombieConfig};
use hz_spatial::{HordeConfig, StalkerConfig};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:          u64  = 42;
const TOTAL_TICKS:   u64  = 3_000; // one minute at 50 Hz
const ZOMBIE_TREE:   &str = include_str!("../assets/zombie.xml");

/// Played when no `--command` is given.
const DEFAULT_SCRIPT: [(u64, &str); 5] = [
    (250, "aistats"),
    (500, "starthorde 10"),
    (1_250, "spawn 2"),
    (2_000, "wipe"),
    (2_900, "aistats"),
];

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(version, about = "Four-room zombie horde simulation")]
struct Args {
    /// JSON file with `sim`, `zombie`, `survivor`, `horde`, and `stalkers`
    /// sections; anything left out keeps its default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Behavior tree XML for every zombie.  Defaults to the bundled tree.
    #[arg(long)]
    tree: Option<PathBuf>,

    #[arg(long)]
    ticks: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Console command to run at a tick, as `TICK:COMMAND`.  Repeatable.
    #[arg(long = "command", value_name = "TICK:COMMAND", value_parser = parse_scheduled)]
    commands: Vec<(u64, String)>,

    /// Turn on the stalker timer.
    #[arg(long)]
    stalkers: bool,

    /// Directory for the CSV files.
    #[arg(long, default_value = "output/courtyard")]
    out: PathBuf,
}

fn parse_scheduled(raw: &str) -> Result<(u64, String), String> {
    let (tick, line) = raw.split_once(':').ok_or("expected TICK:COMMAND")?;
    let tick = tick.trim().parse::<u64>().map_err(|e| format!("bad tick '{tick}': {e}"))?;
    let line = line.trim();
    if line.is_empty() {
        return Err("empty command".to_owned());
    }
    Ok((tick, line.to_owned()))
}

// ── Config file ───────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct DemoConfig {
    sim:      Option<SimConfig>,
    zombie:   ZombieConfig,
    survivor: SurvivorConfig,
    horde:    HordeConfig,
    stalkers: StalkerConfig,
}

fn load_config(path: &Path) -> Result<DemoConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// ── Observer wrapper to count rows ───────────────────────────────────────────

struct CountingObserver<W: OutputWriter> {
    inner:         SimOutputObserver<W>,
    snapshot_rows: usize,
    summary_rows:  usize,
    peak_zombies:  usize,
}

impl<W: OutputWriter> CountingObserver<W> {
    fn new(inner: SimOutputObserver<W>) -> Self {
        Self { inner, snapshot_rows: 0, summary_rows: 0, peak_zombies: 0 }
    }
}

impl<W: OutputWriter> SimObserver for CountingObserver<W> {
    fn on_tick_end(&mut self, tick: Tick, summary: &TickSummary) {
        self.summary_rows += 1;
        self.peak_zombies = self.peak_zombies.max(summary.zombies_alive);
        self.inner.on_tick_end(tick, summary);
    }

    fn on_snapshot(&mut self, tick: Tick, stats: &AiStats, agents: &[AgentSnapshot]) {
        self.snapshot_rows += agents.len();
        self.inner.on_snapshot(tick, stats, agents);
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        self.inner.on_sim_end(final_tick);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // 1. Configuration: file first, flags on top.
    let file = match &args.config {
        Some(path) => load_config(path)?,
        None => DemoConfig::default(),
    };
    let mut config = file
        .sim
        .unwrap_or(SimConfig { total_ticks: TOTAL_TICKS, seed: SEED, ..SimConfig::default() });
    if let Some(ticks) = args.ticks {
        config.total_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let mut stalkers = file.stalkers;
    stalkers.enabled |= args.stalkers;

    // 2. Tree asset.
    let asset = match &args.tree {
        Some(path) => BehaviorAsset::load_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => BehaviorAsset::from_xml("zombie", ZOMBIE_TREE)?,
    };

    // 3. Level and sim.
    let mut builder = SimBuilder::new(config.clone(), level::world(), level::graph(config.seed)?, asset)
        .zombie_config(file.zombie)
        .survivor_config(file.survivor)
        .horde_config(file.horde)
        .stalker_config(stalkers);
    for spawn in level::survivors() {
        builder = builder.survivor(spawn);
    }
    let mut sim = builder.build()?;
    info!(
        ticks = config.total_ticks,
        seed = config.seed,
        partitions = sim.ctx.partitions.len(),
        survivors = sim.survivors().len(),
        "courtyard ready"
    );

    // 4. Output.
    let writer = CsvWriter::new(&args.out)?;
    let mut obs = CountingObserver::new(SimOutputObserver::new(writer, &config));

    // 5. Script.
    let mut script: Vec<(u64, String)> = if args.commands.is_empty() {
        DEFAULT_SCRIPT.iter().map(|&(t, line)| (t, line.to_owned())).collect()
    } else {
        args.commands.clone()
    };
    script.sort_by_key(|&(t, _)| t);
    let end = config.end_tick();
    let console = Console::new();

    // 6. Run: step to each command, execute it, then finish the run.
    let t0 = Instant::now();
    for (at, line) in &script {
        if Tick(*at) >= end {
            warn!(tick = *at, command = %line, "command scheduled past the end of the run");
            continue;
        }
        let now = sim.clock.current_tick;
        if Tick(*at) > now {
            sim.run_ticks(at - now.0, &mut obs)?;
        }
        match console.execute(&mut sim, line) {
            Ok(output) => println!("[tick {at:>5}] > {line}\n{output}\n"),
            Err(e) => println!("[tick {at:>5}] > {line}\nerror: {e}\n"),
        }
    }
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        bail!("output error: {e}");
    }

    // 7. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  tick_summaries.csv  : {} rows", obs.summary_rows);
    println!("  agent_snapshots.csv : {} rows", obs.snapshot_rows);
    println!("  peak zombies        : {}", obs.peak_zombies);
    println!();
    println!("{}", sim.stats());
    println!();

    println!("{:<12} {:>7} {:>7} {:>7} {:>9}", "Partition", "Active", "Target", "Killed", "Occupied");
    println!("{}", "-".repeat(46));
    for p in sim.stats().partitions {
        println!(
            "{:<12} {:>7} {:>7} {:>7} {:>9}",
            p.name,
            p.active,
            p.target,
            p.walkers_killed,
            if p.occupied { "yes" } else { "no" },
        );
    }

    Ok(())
}
