//! IVID CLI Tool
//!
//! Command-line interface for inspecting interactive video documents and
//! simulating playback sessions against them.

mod sim;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use ivid_core::{InteractiveVideoParams, PreviousState};
use ivid_engine::{
    Collaborators, ContentEvent, ContinueAffordance, EndscreenSummary, EngineConfig,
    InteractiveVideo, PlaybackState, PlayerEvent, PlayerEventKind, VideoEvent, VideoSource,
};
use sim::{LoggingAnnouncer, LoggingDialog, SimulatedContentFactory, SimulatedVideo};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{info, warn, Level};

type SimulatedPlayer = InteractiveVideo<SimulatedVideo, LoggingDialog, LoggingAnnouncer>;

#[derive(Parser)]
#[command(name = "ivid")]
#[command(about = "IVID - Timed interactions on top of a video")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the interactions and bookmarks of a document
    Info {
        /// Input JSON document
        input: PathBuf,
    },

    /// Play a document headlessly, answering interactions as scripted
    Simulate {
        /// Input JSON document
        input: PathBuf,

        /// Stop at this time in seconds (defaults to the video duration)
        #[arg(long)]
        until: Option<f64>,

        /// Host clock step in milliseconds
        #[arg(long, default_value = "40")]
        tick_ms: u64,

        /// Answer an interaction once it is visible, as INDEX=SCORE/MAX
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<ScriptedAnswer>,

        /// Seek once playback reaches a time, as AT=TARGET
        #[arg(long = "seek", value_parser = parse_seek)]
        seeks: Vec<ScriptedSeek>,

        /// Resume from a saved state file
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Save the state reached at the end of the session
        #[arg(long)]
        save_state: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScriptedAnswer {
    index: usize,
    score: u32,
    max_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScriptedSeek {
    at: f64,
    target: f64,
}

/// Learner behaviour replayed by `simulate`
#[derive(Debug, Clone)]
struct Script {
    until: f64,
    tick_ms: u64,
    answers: Vec<ScriptedAnswer>,
    seeks: Vec<ScriptedSeek>,
}

fn parse_answer(s: &str) -> std::result::Result<ScriptedAnswer, String> {
    let (index, score) = s.split_once('=').ok_or("expected INDEX=SCORE/MAX")?;
    let (score, max_score) = score.split_once('/').ok_or("expected SCORE/MAX after '='")?;
    Ok(ScriptedAnswer {
        index: index.trim().parse().map_err(|e| format!("invalid index: {e}"))?,
        score: score.trim().parse().map_err(|e| format!("invalid score: {e}"))?,
        max_score: max_score.trim().parse().map_err(|e| format!("invalid max score: {e}"))?,
    })
}

fn parse_seek(s: &str) -> std::result::Result<ScriptedSeek, String> {
    let (at, target) = s.split_once('=').ok_or("expected AT=TARGET")?;
    Ok(ScriptedSeek {
        at: at.trim().parse().map_err(|e| format!("invalid time: {e}"))?,
        target: target.trim().parse().map_err(|e| format!("invalid target: {e}"))?,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    match cli.command {
        Commands::Info { input } => {
            let params = read_params(&input)?;
            print_info(&params)?;
        }

        Commands::Simulate {
            input,
            until,
            tick_ms,
            answers,
            seeks,
            resume,
            save_state,
        } => simulate(&input, until, tick_ms, answers, seeks, resume, save_state)?,
    }

    Ok(())
}

fn read_params(path: &Path) -> Result<InteractiveVideoParams> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    InteractiveVideoParams::read(BufReader::new(file))
        .context("Failed to read interactive video document")
}

fn simulate(
    input: &Path,
    until: Option<f64>,
    tick_ms: u64,
    answers: Vec<ScriptedAnswer>,
    mut seeks: Vec<ScriptedSeek>,
    resume: Option<PathBuf>,
    save_state: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(tick_ms > 0, "--tick-ms must be greater than zero");

    let params = read_params(input)?;
    let duration = video_duration(&params)
        .context("Video duration is unknown and there are no interactions")?;

    let previous = match resume {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state file {}", path.display()))?;
            Some(PreviousState::from_json(&json).context("Failed to parse previous state")?)
        }
        None => None,
    };

    let id = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video")
        .to_string();
    println!("Simulating {} ({:.2} seconds)", input.display(), duration);

    let mut player = build_player(id, params, duration, tick_ms, previous.as_ref())?;

    seeks.sort_by(|a, b| a.at.total_cmp(&b.at));
    let script = Script {
        until: until.unwrap_or(duration),
        tick_ms,
        answers,
        seeks,
    };
    let endscreen = run_session(&mut player, &script)?;

    print_summary(&player, endscreen.as_ref());

    if let Some(path) = save_state {
        let json = player.current_state().to_json().context("Failed to serialize state")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write state file {}", path.display()))?;
        println!("Saved state to {}", path.display());
    }

    Ok(())
}

/// Authored duration, else the end of the last interaction
fn video_duration(params: &InteractiveVideoParams) -> Option<f64> {
    params.video_duration.or_else(|| {
        params
            .interactions
            .iter()
            .filter_map(|i| i.duration)
            .map(|w| w.hide_at())
            .reduce(f64::max)
    })
}

fn build_player(
    id: String,
    params: InteractiveVideoParams,
    duration: f64,
    tick_ms: u64,
    previous: Option<&PreviousState>,
) -> Result<SimulatedPlayer> {
    let collaborators = Collaborators {
        video: SimulatedVideo::new(duration),
        dialog: LoggingDialog::default(),
        announcer: LoggingAnnouncer,
        factory: Box::new(SimulatedContentFactory::default()),
    };
    let config = EngineConfig {
        tick_interval_ms: tick_ms,
        ..EngineConfig::default()
    };
    let player = InteractiveVideo::new(id, params, collaborators, previous)
        .context("Failed to create player")?
        .with_config(config);
    Ok(player)
}

/// Delivers the state changes the simulated video reported to the player
fn deliver_video_events(player: &mut SimulatedPlayer) {
    loop {
        let reported = player.video_mut().take_reported();
        if reported.is_empty() {
            break;
        }
        for state in reported {
            player.on_video_event(VideoEvent::StateChange(state));
        }
    }
}

/// Plays the session until `until`, the end of the video, or a required
/// interaction nobody answers. A looping video stops the first time it
/// wraps around. Returns the endscreen if one was shown.
fn run_session(
    player: &mut SimulatedPlayer,
    script: &Script,
) -> Result<Option<EndscreenSummary>> {
    let endscreen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&endscreen);
    player.subscribe(PlayerEventKind::Endscreen, move |event| {
        if let PlayerEvent::Endscreen(summary) = event {
            *sink.borrow_mut() = Some(summary.clone());
        }
    });
    let looped = Rc::new(Cell::new(false));
    let wrapped = Rc::clone(&looped);
    player.subscribe(PlayerEventKind::Looped, move |_| wrapped.set(true));

    player.on_video_event(VideoEvent::Loaded);
    player.start();
    player.play();

    let mut answered = HashSet::new();
    let mut next_seek = 0;
    let mut now_ms = 0u64;

    loop {
        deliver_video_events(player);
        let time = player.video().current_time();
        if looped.get() {
            info!(time, "video looped, ending simulation");
            break;
        }
        if time >= script.until {
            info!(time, "reached end of simulation");
            break;
        }
        if player.playback_state() == PlaybackState::Ended {
            break;
        }

        let visible = player.visible_interactions();
        for answer in &script.answers {
            if !visible.contains(&answer.index) || !answered.insert(answer.index) {
                continue;
            }
            let event = ContentEvent::answered(answer.score, answer.max_score);
            player
                .handle_content_event(answer.index, event)
                .with_context(|| format!("Failed to answer interaction {}", answer.index))?;
            if matches!(player.pending_continue(), Some(ContinueAffordance::Branch { .. })) {
                player.activate_continue().context("Failed to follow adaptivity branch")?;
            }
        }

        if let Some(seek) = script.seeks.get(next_seek).filter(|s| time >= s.at) {
            next_seek += 1;
            let landed = player.seek_to(seek.target);
            info!(requested = seek.target, landed, "scripted seek");
            continue;
        }

        if !player.video().is_playing() {
            if let Some(gate) = player.gate() {
                warn!(
                    interaction = gate,
                    time, "playback held by a required interaction with no answer left"
                );
                break;
            }
            if !player.play() {
                break;
            }
        }

        now_ms += script.tick_ms;
        player.video_mut().advance(script.tick_ms as f64 / 1000.0);
        deliver_video_events(player);
        player.advance_clock(now_ms);
    }

    let summary = endscreen.borrow_mut().take();
    Ok(summary)
}

fn print_summary(player: &SimulatedPlayer, endscreen: Option<&EndscreenSummary>) {
    println!("\n=== Session Summary ===");
    println!("Stopped at: {:.2} seconds", player.video().current_time());
    println!("State: {:?}", player.playback_state());
    if let Some(gate) = player.gate() {
        println!("Held by required interaction: {}", gate);
    }
    println!("Answered: {}", player.answered_count());
    println!("Score: {} / {}", player.score(), player.max_score());

    println!("\n=== Interactions ===");
    for interaction in player.interactions() {
        let score = match interaction.score_record() {
            Some(record) => format!("{}/{}", record.score, record.max_score),
            None => "-".to_string(),
        };
        println!(
            "  [{}] {:<24} {:?}, score {}",
            interaction.index(),
            interaction.title(),
            interaction.progress(),
            score
        );
    }

    if let Some(summary) = endscreen {
        println!("\n=== Endscreen ===");
        for entry in &summary.entries {
            let score = entry.score.map_or("-".to_string(), |s| s.to_string());
            let max_score = entry.max_score.map_or("-".to_string(), |s| s.to_string());
            println!("  {:>7.2}s {:<24} {}/{}", entry.time, entry.title, score, max_score);
        }
        println!("  Total: {} / {}", summary.total_score, summary.total_max_score);
    }
}

fn print_info(params: &InteractiveVideoParams) -> Result<()> {
    let windows = params.validate().context("Document is not valid")?;

    println!("\n=== Interactive Video ===");
    if params.title.is_empty() {
        println!("Title: (untitled)");
    } else {
        println!("Title: {}", params.title);
    }
    match video_duration(params) {
        Some(duration) => println!("Duration: {:.2} seconds", duration),
        None => println!("Duration: unknown"),
    }
    let settings = &params.settings;
    println!(
        "Start at: {:.2}s, autoplay: {}, loop: {}, prevent skipping: {}",
        settings.start_at, settings.autoplay, settings.loop_video, settings.prevent_skipping
    );
    println!("Interactions: {}", params.interactions.len());

    println!("\n=== Interactions ===");
    for (i, (interaction, window)) in params.interactions.iter().zip(&windows).enumerate() {
        let mut flags = Vec::new();
        if interaction.requires_completion {
            flags.push("required".to_string());
        }
        if interaction.pause {
            flags.push("pause".to_string());
        }
        if interaction.adaptivity.is_some() {
            flags.push("adaptive".to_string());
        }
        if let Some(goto) = interaction.goto {
            flags.push(format!("goto {:.2}s", goto));
        }
        println!(
            "  [{}] {:>7.2}s to {:>7.2}s {:<8} {:<24} {}",
            i,
            window.from,
            window.to,
            format!("{:?}", interaction.display_mode),
            interaction.title(),
            flags.join(", ")
        );
    }

    if !params.bookmarks.is_empty() {
        println!("\n=== Bookmarks ===");
        for bookmark in &params.bookmarks {
            println!("  {:>7.2}s {}", bookmark.time, bookmark.label);
        }
    }

    Ok(())
}
