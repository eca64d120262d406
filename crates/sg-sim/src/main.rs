//! Singularity simulator
//!
//! Usage:
//!   sg-sim simulate --spins 100000 --sessions 8   - Batch RTP / hit-rate run
//!   sg-sim spin --force big-cluster               - Inspect a single spin
//!   sg-sim play --spins 5 --profile turbo         - Drive spins through the sequencer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use rayon::prelude::*;

use sg_engine::{
    AnimationSequencer, ForcedOutcome, GameConfig, GameSession, SessionStats, SpinOutcome,
    TimedAnimation, TimingConfig, TimingProfile, Transition,
};

/// Fixed frame delta for `play` (60 fps)
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Frames after which a single spin presentation is considered stuck
const MAX_FRAMES_PER_SPIN: u64 = 60 * 600;

#[derive(Parser)]
#[command(name = "sg-sim", about = "Singularity cluster-pays simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run seeded sessions in parallel and report merged statistics
    Simulate {
        /// Spins per session
        #[arg(short = 'n', long, default_value_t = 10_000)]
        spins: u64,
        /// Number of sessions
        #[arg(short, long, default_value_t = 4)]
        sessions: u64,
        /// Base seed (session i uses seed + i)
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Bet ladder index
        #[arg(short, long)]
        bet_index: Option<usize>,
        /// Game config (JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Play one spin and print the grid and wins
    Spin {
        /// Forced outcome (BIG_CLUSTER, DEAD_SPIN, CASCADE_CHAIN, SCATTER_TRIGGER)
        #[arg(short, long)]
        force: Option<ForcedOutcome>,
        /// RNG seed (OS entropy when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Game config (JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Present spins through the animation sequencer
    Play {
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 5)]
        spins: u64,
        /// Timing profile (normal, turbo, studio)
        #[arg(short, long, default_value = "normal")]
        profile: TimingProfile,
        /// RNG seed (OS entropy when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Game config (JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            spins,
            sessions,
            seed,
            bet_index,
            config,
            json,
        } => simulate(load_config(config.as_deref())?, spins, sessions, seed, bet_index, json),
        Commands::Spin {
            force,
            seed,
            config,
            json,
        } => inspect_spin(load_config(config.as_deref())?, force, seed, json),
        Commands::Play {
            spins,
            profile,
            seed,
            config,
        } => play(load_config(config.as_deref())?, spins, profile, seed),
    }
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

fn new_session(config: GameConfig, seed: Option<u64>) -> Result<GameSession> {
    let session = match seed {
        Some(seed) => GameSession::with_seed(config, seed),
        None => GameSession::new(config),
    };
    session.context("invalid game config")
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATE
// ═══════════════════════════════════════════════════════════════════════════════

fn simulate(
    config: GameConfig,
    spins: u64,
    sessions: u64,
    seed: u64,
    bet_index: Option<usize>,
    json: bool,
) -> Result<()> {
    log::info!("simulating {sessions} sessions x {spins} spins (seed {seed})");

    let results: Vec<SessionStats> = (0..sessions)
        .into_par_iter()
        .map(|i| run_session(config.clone(), seed.wrapping_add(i), spins, bet_index))
        .collect::<Result<_>>()?;

    let mut stats = SessionStats::default();
    for result in &results {
        stats.merge(result);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn run_session(config: GameConfig, seed: u64, spins: u64, bet_index: Option<usize>) -> Result<SessionStats> {
    let mut session = new_session(config, Some(seed))?;
    if let Some(index) = bet_index {
        if !session.set_bet_index(index) {
            bail!("bet index {index} out of range");
        }
    }

    // Bonus spins do not count against the budget
    let mut base_spins = 0;
    while base_spins < spins || session.bonus().is_active() {
        let in_bonus = session.bonus().is_active();
        if session.spin_settled(None).is_none() {
            bail!("spin rejected in state {}", session.state().current());
        }
        if !in_bonus {
            base_spins += 1;
        }
    }
    log::debug!("session {seed}: RTP {:.2}%", session.stats().rtp());
    Ok(session.stats().clone())
}

fn print_stats(stats: &SessionStats) {
    println!("Spins:            {} ({} base, {} bonus)", stats.total_spins, stats.base_spins, stats.bonus_spins);
    println!("Total bet:        {:.2}", stats.total_bet);
    println!("Total win:        {:.2}", stats.total_win);
    println!("RTP:              {:.2}%", stats.rtp());
    println!("Hit rate:         {:.2}%", stats.hit_rate());
    println!("Bonus triggers:   {}", stats.bonus_triggers);
    match stats.bonus_frequency() {
        Some(freq) => println!("Bonus frequency:  1 in {freq:.0}"),
        None => println!("Bonus frequency:  -"),
    }
    println!("Retriggers:       {}", stats.retriggers);
    println!("Max cascade:      {}", stats.max_cascade_depth);
    println!("Max win:          {:.2}x", stats.max_win_ratio);
    println!(
        "Thresholds:       25%: {}  50%: {}  75%: {}  100%: {}",
        stats.thresholds_crossed[0],
        stats.thresholds_crossed[1],
        stats.thresholds_crossed[2],
        stats.thresholds_crossed[3]
    );
    println!(
        "Bubbles:          {} spawned, {} activated",
        stats.bubbles_spawned, stats.bubbles_activated
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPIN
// ═══════════════════════════════════════════════════════════════════════════════

fn inspect_spin(config: GameConfig, force: Option<ForcedOutcome>, seed: Option<u64>, json: bool) -> Result<()> {
    let mut session = new_session(config, seed)?;
    let Some(outcome) = session.spin_settled(force) else {
        bail!("spin rejected");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if let Some(forced) = outcome.forced {
        println!("Forced: {forced} ({})", forced.description());
    }
    println!("Bet {:.2}, {} scatters", outcome.bet, outcome.scatter_count);
    print!("{}", outcome.initial_grid);

    for (i, (step, win)) in outcome.cascades.iter().zip(&outcome.wins.steps).enumerate() {
        println!();
        println!("Step {}: x{} bubbles, win {:.2}", i + 1, win.bubble_multiplier, win.win);
        for cw in &win.cluster_wins {
            println!("  {} x{} (tier {}) pays {:.2}", cw.symbol.name(), cw.size, cw.tier, cw.win);
        }
        print!("{}", step.grid_after);
    }

    println!();
    println!("Total win {:.2} ({:.2}x), meter {:.0}%", outcome.total_win(), outcome.win_ratio(), outcome.meter_value);
    if outcome.event_horizon {
        println!("EVENT HORIZON triggered");
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAY
// ═══════════════════════════════════════════════════════════════════════════════

fn play(config: GameConfig, spins: u64, profile: TimingProfile, seed: Option<u64>) -> Result<()> {
    let mut session = new_session(config, seed)?;
    session.set_timing(profile);
    session
        .state_mut()
        .on_change(|new, old| log::info!("state {old} -> {new}"));
    session
        .meter_mut()
        .on_threshold(|threshold, value| log::info!("meter crossed {threshold:.0}% ({value:.0})"));

    let timing = session.config().timing_config();
    let session = Arc::new(Mutex::new(session));
    let mut sequencer = AnimationSequencer::new();

    for _ in 0..spins {
        let outcome = session.lock().spin();
        let Some(outcome) = outcome else {
            bail!("spin rejected in state {}", session.lock().state().current());
        };
        log::info!(
            "spin {}: {} cascades, win {:.2}{}",
            outcome.spin_index,
            outcome.cascade_count(),
            outcome.total_win(),
            if outcome.in_bonus { " (bonus)" } else { "" }
        );

        for animation in presentation(&outcome, &timing, &session) {
            sequencer.enqueue(animation);
        }
        sequencer.play_next();

        let mut frames = 0;
        while sequencer.is_playing() {
            sequencer.update(FRAME_MS);
            session.lock().advance_orbits(1);
            frames += 1;
            if frames > MAX_FRAMES_PER_SPIN {
                bail!("presentation of spin {} did not finish", outcome.spin_index);
            }
        }
        log::info!(
            "spin {} presented in {frames} frames ({:.0} ms timeline)",
            outcome.spin_index,
            outcome.duration_ms()
        );
    }

    let session = session.lock();
    print_stats(session.stats());
    Ok(())
}

/// One animation per state transition; each applies its transition on completion.
fn presentation(outcome: &SpinOutcome, timing: &TimingConfig, session: &Arc<Mutex<GameSession>>) -> Vec<TimedAnimation> {
    let present_ms = timing.win_present_duration(outcome.win_ratio());

    outcome
        .transitions()
        .into_iter()
        .map(|transition| {
            let (label, duration_ms) = match transition {
                Transition::SpinComplete => ("land", timing.spin_duration()),
                Transition::StartCascade => ("glow", timing.win_duration()),
                Transition::CascadeComplete => ("cascade", timing.cascade_duration()),
                Transition::ShowWin => ("resolve", 0.0),
                Transition::ReturnToIdle { .. } | Transition::StartEventHorizon => ("present", present_ms),
                Transition::EnterBonus => ("event horizon", timing.event_horizon_ms),
            };
            let session = Arc::clone(session);
            TimedAnimation::new(label, duration_ms).then(move || {
                if !transition.apply(session.lock().state_mut()) {
                    log::warn!("transition {transition:?} rejected");
                }
            })
        })
        .collect()
}
