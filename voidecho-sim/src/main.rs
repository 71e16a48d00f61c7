//! Headless QA harness for Voidecho game logic: auto-played battles, gacha
//! distribution checks, and save-file inspection.
mod sim;
mod storage;

use anyhow::{Context, Result, bail};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use storage::FileStorage;
use voidecho_game::{Catalog, GachaPool, GameEngine, GameState, Rarity};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PoolArg {
    Hero,
    Item,
}

impl From<PoolArg> for GachaPool {
    fn from(value: PoolArg) -> Self {
        match value {
            PoolArg::Hero => Self::Hero,
            PoolArg::Item => Self::Item,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "voidecho-sim", version)]
#[command(about = "Headless QA harness for Voidecho - battles, gacha odds, save files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Auto-play a stage repeatedly and report the outcome distribution.
    Battle {
        /// Stage id to deploy into
        #[arg(long, default_value_t = 1)]
        stage: u32,
        /// Base RNG seed; each iteration offsets it
        #[arg(long, default_value_t = 1337)]
        seed: u64,
        /// Number of battles to play
        #[arg(long, default_value_t = 100)]
        iterations: u32,
        /// Probability the simulated player wins a minigame
        #[arg(long, default_value_t = 0.5)]
        minigame_skill: f64,
    },
    /// Roll the gacha many times and compare tiers against the table.
    Gacha {
        #[arg(long, value_enum, default_value = "hero")]
        pool: PoolArg,
        #[arg(long, default_value_t = 100_000)]
        rolls: u32,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
    /// Inspect (or initialize) a save slot on disk.
    Save {
        /// Directory holding save files
        #[arg(long, default_value = "saves")]
        dir: String,
        /// Slot name
        #[arg(long, default_value = "main")]
        slot: String,
        /// Create a fresh save in the slot if none exists
        #[arg(long)]
        init: bool,
        /// Dump the migrated state as pretty JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn now_ms() -> u64 {
    Local::now().timestamp_millis().max(0) as u64
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Command::Battle {
            stage,
            seed,
            iterations,
            minigame_skill,
        } => run_battle_report(stage, seed, iterations, minigame_skill),
        Command::Gacha { pool, rolls, seed } => run_gacha_report(pool.into(), rolls, seed),
        Command::Save {
            dir,
            slot,
            init,
            json,
        } => run_save_inspection(&dir, &slot, init, json),
    }
}

fn run_battle_report(stage_id: u32, seed: u64, iterations: u32, minigame_skill: f64) -> Result<()> {
    let catalog = Catalog::builtin();
    let stage = catalog
        .stage(stage_id)
        .with_context(|| format!("no stage with id {stage_id}"))?;
    if !(0.0..=1.0).contains(&minigame_skill) {
        bail!("--minigame-skill must be within [0, 1]");
    }

    println!(
        "{} {} ({} waves), {iterations} iterations, seed {seed}",
        "Simulating".bold(),
        stage.name.cyan(),
        stage.waves.len()
    );
    let report = sim::run_battles(catalog, stage, seed, iterations, minigame_skill);

    let rate = report.win_rate() * 100.0;
    let rate_str = format!("{rate:.1}%");
    let rate_col = if report.win_rate() >= 0.5 {
        rate_str.green()
    } else {
        rate_str.red()
    };
    println!("  victories: {} / {}", report.victories, report.iterations);
    println!("  defeats:   {}", report.defeats);
    println!("  win rate:  {rate_col}");
    println!("  actions:   {}", report.total_actions);
    println!("  minigames: {}", report.minigames_seen);
    Ok(())
}

fn run_gacha_report(pool: GachaPool, rolls: u32, seed: u64) -> Result<()> {
    if rolls == 0 {
        bail!("--rolls must be positive");
    }
    let catalog = Catalog::builtin();
    println!("{} {rolls} rolls, seed {seed}", "Sampling".bold());
    let tally = sim::sample_gacha(catalog, pool, rolls, seed);

    println!(
        "  {:<16} {:>8} {:>9} {:>9}",
        "tier", "draws", "observed", "expected"
    );
    for rarity in Rarity::POOL_TIERS.iter().rev() {
        let draws = tally.get(rarity).copied().unwrap_or(0);
        let observed = f64::from(draws) / f64::from(rolls) * 100.0;
        let expected = sim::expected_pct(*rarity);
        let drift = (observed - expected).abs();
        let line = format!(
            "  {:<16} {:>8} {:>8.2}% {:>8.2}%",
            rarity.as_str(),
            draws,
            observed,
            expected
        );
        if drift > expected.mul_add(0.25, 0.05) {
            println!("{}", line.yellow());
        } else {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_save_inspection(dir: &str, slot: &str, init: bool, json: bool) -> Result<()> {
    let engine = GameEngine::new(FileStorage::new(dir));
    let mut state: GameState = engine
        .load_or_new(slot, now_ms())
        .context("save storage unreadable")?;
    log::debug!("slot {slot} loaded (version {})", state.save_version);
    if init {
        engine
            .save_game(slot, &mut state, now_ms())
            .context("failed to write save")?;
        println!("{} slot '{slot}' in {dir}/", "Initialized".green().bold());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("{} {slot}", "Save".bold());
    println!("  version:   {}", state.save_version);
    println!("  shards:    {}", state.shards);
    println!(
        "  tickets:   {} hero / {} item",
        state.hero_tickets, state.item_tickets
    );
    println!(
        "  roster:    {} heroes ({} in party)",
        state.all_heroes.len(),
        state.party.len()
    );
    println!("  inventory: {} items", state.inventory.len());
    println!(
        "  stages:    {} unlocked, {} attempted",
        state.unlocked_stages.len(),
        state.attempted_stages.len()
    );
    println!(
        "  energy:    {}/{}",
        state.energy,
        voidecho_game::MAX_ENERGY
    );
    if let Some(saved_ms) = state.last_saved_ms {
        let stamp = Local
            .timestamp_millis_opt(saved_ms as i64)
            .single()
            .map_or_else(|| String::from("unknown"), |dt| dt.to_rfc3339());
        println!("  last save: {stamp}");
    }
    Ok(())
}
