//! Lofi Slot terminal driver
//!
//! Usage:
//!   lofi-slot play                  - Interactive session (type `help`)
//!   lofi-slot simulate --spins N    - Batch spins in virtual time, stats as JSON
//!
//! Global flags: --config <file.json|yaml>, --seed <n>, --turbo

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use lofi_slot::lofi_stage::Stage;
use lofi_slot::{
    Payline, REEL_COUNT, SessionStats, SlotConfig, SlotError, SlotMachine, Symbol, TimingConfig,
};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "lofi-slot", about = "Lofi Slot: cozy reels in the terminal")]
struct Cli {
    /// JSON or YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Fixed RNG seed for a reproducible session
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Fast spin timing
    #[arg(long, global = true)]
    turbo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session on stdin (default)
    Play,
    /// Run spins in virtual time and print session stats as JSON
    Simulate {
        /// Number of spins to attempt
        #[arg(short = 'n', long, default_value_t = 1000)]
        spins: u64,

        /// Bet per line
        #[arg(short, long, default_value_t = 1)]
        bet: u64,

        /// Play top and bottom lines too
        #[arg(long)]
        extra_lines: bool,

        /// Override starting credits
        #[arg(long)]
        credits: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => play(config),
        Commands::Simulate {
            spins,
            bet,
            extra_lines,
            credits,
        } => {
            let config = SlotConfig {
                starting_credits: credits.unwrap_or(config.starting_credits),
                ..config
            };
            simulate(config, spins, bet, extra_lines)
        }
    }
}

fn load_config(cli: &Cli) -> Result<SlotConfig> {
    let mut config = match &cli.config {
        Some(path) => SlotConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SlotConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if cli.turbo {
        config.timing = TimingConfig::turbo();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Spin,
    Bet(u64),
    BetUp,
    BetDown,
    MaxBet,
    MinBet,
    Lines(bool),
    Reset,
    State,
    Help,
    Quit,
}

/// An empty line spins
fn parse_input(line: &str) -> Result<Input> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Input::Spin);
    };

    let input = match head.to_ascii_lowercase().as_str() {
        "spin" | "s" => Input::Spin,
        "bet" => {
            let n = words.next().context("usage: bet <n>")?;
            Input::Bet(n.parse().with_context(|| format!("not a number: {n}"))?)
        }
        "+" => Input::BetUp,
        "-" => Input::BetDown,
        "max" => Input::MaxBet,
        "min" => Input::MinBet,
        "lines" => match words.next() {
            Some("on") => Input::Lines(true),
            Some("off") => Input::Lines(false),
            _ => bail!("usage: lines on|off"),
        },
        "reset" => Input::Reset,
        "state" => Input::State,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => bail!("unknown command `{other}` (try `help`)"),
    };
    Ok(input)
}

fn play(config: SlotConfig) -> Result<()> {
    let mut machine = SlotMachine::with_config(config).context("Failed to start slot machine")?;
    machine.on_stage(|event| {
        if let Stage::ReelStop {
            reel_index,
            symbols,
        } = &event.stage
        {
            println!("  reel {} ▸ {}", reel_index + 1, glyphs(symbols));
        }
    });

    log::info!("Starting Lofi Slot...");
    println!("🌙 Lofi Slot · cozy reels • chill vibes");
    print_reels(&machine);
    print_status(&machine);

    prompt()?;
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        match parse_input(&line) {
            Ok(Input::Quit) => break,
            Ok(input) => run_input(&mut machine, input)?,
            Err(err) => println!("{err}"),
        }
        prompt()?;
    }

    print_stats(machine.stats());
    Ok(())
}

fn run_input(machine: &mut SlotMachine, input: Input) -> Result<()> {
    let outcome = match input {
        Input::Spin => return spin_realtime(machine),
        Input::Bet(n) => machine.set_bet(n).map(drop),
        Input::BetUp => machine.increase_bet().map(drop),
        Input::BetDown => machine.decrease_bet().map(drop),
        Input::MaxBet => machine.max_bet().map(drop),
        Input::MinBet => machine.reset_bet().map(drop),
        Input::Lines(on) => machine.set_extra_lines(on),
        Input::Reset => {
            machine.reset();
            print_reels(machine);
            Ok(())
        }
        Input::State => {
            let state = serde_json::to_string_pretty(&machine.state())?;
            println!("{state}");
            return Ok(());
        }
        Input::Help => {
            print_help();
            return Ok(());
        }
        Input::Quit => return Ok(()),
    };

    if let Err(err) = outcome {
        println!("{err}");
    }
    print_status(machine);
    Ok(())
}

/// Spin and feed wall-clock time into the machine until it resolves
fn spin_realtime(machine: &mut SlotMachine) -> Result<()> {
    match machine.spin() {
        Ok(_) => {}
        Err(SlotError::InsufficientCredits { .. }) => {
            print_status(machine);
            return Ok(());
        }
        Err(err) => return Err(err).context("Spin failed"),
    }

    let start = Instant::now();
    let mut fed_ms = 0u64;
    while machine.is_spinning() {
        thread::sleep(FRAME);
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        machine.advance_ms(elapsed_ms.saturating_sub(fed_ms));
        fed_ms = elapsed_ms;
    }

    print_reels(machine);
    print_status(machine);
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush().context("Failed to flush stdout")
}

fn glyphs(ids: &[u32]) -> String {
    ids.iter()
        .filter_map(|&id| Symbol::from_id(id))
        .map(|s| s.glyph())
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_reels(machine: &SlotMachine) {
    let highlighted = machine.state().highlighted_lines;
    for line in Payline::ALL {
        let cells: Vec<&str> = (0..REEL_COUNT)
            .filter_map(|reel| machine.reel_symbol_at(reel, line.row_offset()))
            .map(Symbol::glyph)
            .collect();
        let marker = if highlighted.contains(&line) { " ◂" } else { "" };
        println!("  │ {} │{marker}", cells.join(" │ "));
    }
}

fn print_status(machine: &SlotMachine) {
    let state = machine.state();
    println!(
        "Credits {} · Bet {} · Cost {} · Lines {}",
        state.credits,
        state.bet,
        state.spin_cost,
        if state.extra_lines { 3 } else { 1 }
    );
    if !state.message.is_empty() {
        println!("{}", state.message);
    }
}

fn print_help() {
    println!("spin | <enter>   spin the reels");
    println!("bet <n>          set bet per line");
    println!("+ / -            raise or lower bet");
    println!("max / min        max bet / bet 1");
    println!("lines on|off     top and bottom lines (3x cost)");
    println!("reset            start over with 100 credits");
    println!("state            dump game state as JSON");
    println!("quit             leave");
}

fn print_stats(stats: &SessionStats) {
    println!(
        "{} spins · wagered {} · won {} · RTP {:.1}% · hit rate {:.1}%",
        stats.total_spins,
        stats.total_wagered,
        stats.total_won,
        stats.rtp(),
        stats.hit_rate()
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct SimulationReport {
    spins_requested: u64,
    bet: u64,
    extra_lines: bool,
    final_credits: u64,
    rtp: f64,
    hit_rate: f64,
    stats: SessionStats,
}

fn simulate(config: SlotConfig, spins: u64, bet: u64, extra_lines: bool) -> Result<()> {
    let mut machine = SlotMachine::with_config(config).context("Failed to start slot machine")?;
    machine.set_extra_lines(extra_lines)?;
    let bet = machine.set_bet(bet)?;

    let started = Instant::now();
    for _ in 0..spins {
        if !machine.can_spin() {
            log::info!(
                "out of credits after {} spins",
                machine.stats().total_spins
            );
            break;
        }
        machine.spin()?;
        machine.run_to_idle();
    }
    log::info!(
        "simulated {} spins in {:?}",
        machine.stats().total_spins,
        started.elapsed()
    );

    let stats = machine.stats().clone();
    let report = SimulationReport {
        spins_requested: spins,
        bet,
        extra_lines,
        final_credits: machine.credits(),
        rtp: stats.rtp(),
        hit_rate: stats.hit_rate(),
        stats,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
