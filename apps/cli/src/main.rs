use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use tokio::sync::{broadcast, mpsc};

use courtside_core::{
    AnalysisKind, AnalysisOutcome, AnalysisRequest, BlobRegistry, CachedAnalysis, Canvas,
    DisplayList, FrameInput, InMemoryBlobRegistry, LiveStats, OverlayConfig, OverlayData,
    OverlayRenderer, OverlaySession, PlayableSource, PlaybackCommand, Provider, ProviderAnalyzer,
    ShotResult, SimulatedMedia, Size, TimestampPolicy, VideoBlob, current_shot, format_failure,
    format_outcome_readable, format_timestamp, get_analysis_path, get_cache_dir,
    get_root_cache_dir, list_cached_analyses, load_analysis, normalize, overlay::badge_text,
    run_analysis, save_analysis, save_metadata,
};

use crate::canvas::{HudCanvas, JsonLinesCanvas};

mod canvas;

/// How often the simulated video raises time updates, like a browser does.
const TIME_UPDATE_EVERY: Duration = Duration::from_millis(250);

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

fn format_age(modified: SystemTime) -> String {
    let secs = SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default()
        .as_secs();
    match secs {
        0..60 => "just now".to_string(),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86400 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86400),
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CliKind {
    ServeOnly,
    #[value(alias = "full-gameplay")]
    Gameplay,
}

impl From<CliKind> for AnalysisKind {
    fn from(cli: CliKind) -> Self {
        match cli {
            CliKind::ServeOnly => AnalysisKind::ServeOnly,
            CliKind::Gameplay => AnalysisKind::Gameplay,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CliTimestampPolicy {
    Reject,
    Skip,
    Clamp,
}

impl From<CliTimestampPolicy> for TimestampPolicy {
    fn from(cli: CliTimestampPolicy) -> Self {
        match cli {
            CliTimestampPolicy::Reject => TimestampPolicy::Reject,
            CliTimestampPolicy::Skip => TimestampPolicy::Skip,
            CliTimestampPolicy::Clamp => TimestampPolicy::ClampToZero,
        }
    }
}

#[derive(Parser)]
#[command(name = "courtside")]
#[command(about = "Analyze tennis videos with AI and replay the analysis as a live overlay")]
struct Cli {
    /// Overlay config file (JSON). Flags given on the command line win over it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// What to do with shots whose timestamp does not parse [default: reject]
    #[arg(long, global = true)]
    timestamp_policy: Option<CliTimestampPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask an AI provider to analyze a tennis video
    Analyze {
        /// Publicly reachable URL of the MP4 video
        video_url: String,

        /// Professional whose voice the feedback is written in
        #[arg(long)]
        player: String,

        #[arg(short, long, default_value = "serve-only")]
        kind: CliKind,

        /// AI provider for the analysis
        #[arg(short, long, default_value = "gemini")]
        provider: CliProvider,

        /// Force re-analysis even if a cached result exists
        #[arg(short, long)]
        force: bool,

        /// Also write the analysis JSON here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print an analysis file as a readable report
    Show { file: PathBuf },

    /// List cached analyses, newest first
    History {
        /// Print the report of entry N of the list
        #[arg(long)]
        open: Option<usize>,
    },

    /// Live statistics and the highlighted shot at a playback position
    Stats {
        file: PathBuf,

        /// Playback position in seconds
        #[arg(long)]
        at: f64,
    },

    /// Render one overlay frame as JSON draw commands
    Frame {
        file: PathBuf,

        #[arg(long)]
        at: f64,

        /// Video duration in seconds
        #[arg(long)]
        duration: f64,

        #[arg(long, default_value_t = 1280.0)]
        width: f64,

        #[arg(long, default_value_t = 720.0)]
        height: f64,
    },

    /// Play the analysis against a simulated video clock
    Replay {
        file: PathBuf,

        /// Video duration in seconds
        #[arg(long)]
        duration: f64,

        /// Local MP4 to register as the video source
        #[arg(long)]
        video: Option<PathBuf>,

        /// Playback rate
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Overlay refresh interval while playing [default: 100]
        #[arg(long)]
        refresh_ms: Option<u64>,

        /// Print every frame as a JSON line instead of a live HUD
        #[arg(long)]
        json: bool,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn create_playback_bar(duration: f64) -> ProgressBar {
    let pb = ProgressBar::new((duration * 10.0).round() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:30.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    pb
}

/// Load an analysis file and turn it into overlay data. An analysis that holds
/// the error variant is reported and ends the process: it is never rendered.
async fn load_overlay(path: &Path, policy: TimestampPolicy) -> Result<OverlayData> {
    let outcome = load_analysis(path)
        .await
        .with_context(|| format!("Failed to load analysis from {}", path.display()))?;

    match outcome {
        AnalysisOutcome::Analysis(result) => Ok(normalize(&result, policy)?),
        AnalysisOutcome::Failed(failure) => {
            eprintln!("{} {}", style("Error:").red().bold(), format_failure(&failure));
            std::process::exit(1);
        }
    }
}

async fn analyze(
    video_url: String,
    player: String,
    kind: AnalysisKind,
    provider: Provider,
    force: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    // Validate API key early
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    println!(
        "\n{}  {}\n",
        style("courtside").cyan().bold(),
        style("Tennis Analyzer").dim()
    );

    let cache_dir = get_cache_dir(&video_url);
    let analysis_path = get_analysis_path(&cache_dir, &provider, kind);

    let outcome = if !force && analysis_path.exists() {
        let outcome = load_analysis(&analysis_path).await?;
        println!(
            "{} Analyzed ({}) {}",
            style("✓").green().bold(),
            provider.name(),
            style("(cached)").dim()
        );
        outcome
    } else {
        let started = Instant::now();
        let spinner = create_spinner(&format!(
            "Analyzing {} video with {}...",
            kind.name(),
            provider.name()
        ));
        let request = AnalysisRequest {
            video_url,
            player,
            kind,
        };
        let outcome = run_analysis(&ProviderAnalyzer::new(provider), &request).await;

        match &outcome {
            AnalysisOutcome::Analysis(_) => {
                save_analysis(&outcome, &analysis_path).await?;
                save_metadata(&request.metadata(), &cache_dir).await?;
                spinner.finish_with_message(format!(
                    "{} Analyzed ({}) in {}",
                    style("✓").green().bold(),
                    provider.name(),
                    style(format_duration(started.elapsed())).dim()
                ));
            }
            AnalysisOutcome::Failed(_) => {
                spinner.finish_with_message(format!(
                    "{} Analysis failed ({})",
                    style("✗").red().bold(),
                    provider.name()
                ));
            }
        }
        outcome
    };

    if let Some(out) = &out {
        save_analysis(&outcome, out).await?;
        println!("\n{} {}", style("Saved:").dim(), style(out.display()).cyan());
    } else if matches!(outcome, AnalysisOutcome::Analysis(_)) {
        println!(
            "\n{} {}",
            style("Saved:").dim(),
            style(analysis_path.display()).cyan()
        );
    }
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_outcome_readable(&outcome));

    if matches!(outcome, AnalysisOutcome::Failed(_)) {
        std::process::exit(1);
    }
    Ok(())
}

async fn show(file: &Path) -> Result<()> {
    let outcome = load_analysis(file)
        .await
        .with_context(|| format!("Failed to load analysis from {}", file.display()))?;
    println!("{}", format_outcome_readable(&outcome));
    if matches!(outcome, AnalysisOutcome::Failed(_)) {
        std::process::exit(1);
    }
    Ok(())
}

async fn history(open: Option<usize>) -> Result<()> {
    let root = get_root_cache_dir();
    let entries = list_cached_analyses(&root)
        .await
        .with_context(|| format!("Failed to read cache at {}", root.display()))?;

    if let Some(n) = open {
        let Some(entry) = n.checked_sub(1).and_then(|i| entries.get(i)) else {
            eprintln!(
                "{} No analysis #{} ({} in history)",
                style("Error:").red().bold(),
                n,
                entries.len()
            );
            std::process::exit(1);
        };
        println!("{}", style(entry.path.display()).dim());
        println!("{}", format_outcome_readable(&entry.outcome));
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", style("No analyses yet").dim());
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        print_history_entry(i + 1, entry);
    }
    Ok(())
}

fn print_history_entry(n: usize, entry: &CachedAnalysis) {
    let summary = match &entry.outcome {
        AnalysisOutcome::Analysis(result) => format!(
            "{} serves, {} faults, {} strokes",
            result.total_serves(),
            result.faults(),
            result.total_strokes()
        ),
        AnalysisOutcome::Failed(failure) => format!("failed: {}", failure.error),
    };

    println!(
        "{:>3}. {} {} {}",
        n,
        style(entry.kind.name()).cyan().bold(),
        style(entry.provider.name()).dim(),
        style(format_age(entry.modified)).dim()
    );
    if let Some(metadata) = &entry.metadata {
        print!("     {}", metadata.player);
        if let Some(video) = &metadata.video_file {
            print!(" {}", style(video).underlined());
        }
        println!();
    }
    println!("     {}", summary);
}

async fn stats(file: &Path, at: f64, config: &OverlayConfig) -> Result<()> {
    let overlay = load_overlay(file, config.timestamp_policy).await?;
    let stats = LiveStats::at(&overlay, at);

    println!("{} {}", style("At").dim(), format_timestamp(at));
    for line in stats.lines() {
        println!("  {}", line);
    }

    match current_shot(&overlay, at, config.badge_window_secs) {
        Some(shot) => {
            let badge = badge_text(shot);
            let badge = match shot.result {
                ShotResult::Successful => style(badge).green().bold(),
                ShotResult::Fault => style(badge).red().bold(),
            };
            print!("\n  {}", badge);
            if let Some(speed) = shot.display_speed() {
                print!(" {}", style(speed).yellow());
            }
            println!();
            if let Some(feedback) = &shot.feedback {
                println!("  {}", style(feedback).dim());
            }
        }
        None => println!("\n  {}", style("No shot in view").dim()),
    }
    Ok(())
}

async fn frame(file: &Path, at: f64, duration: f64, size: Size, config: &OverlayConfig) -> Result<()> {
    let overlay = load_overlay(file, config.timestamp_policy).await?;
    let renderer = OverlayRenderer::new(config.theme.clone(), config.badge_window_secs);
    let mut list = DisplayList::new();

    renderer.draw(&mut list, &FrameInput::at(&overlay, at, duration, size))?;
    println!("{}", serde_json::to_string_pretty(list.commands())?);
    Ok(())
}

async fn replay<C: Canvas>(
    overlay: OverlayData,
    canvas: C,
    source: PlayableSource,
    duration: f64,
    speed: f64,
    config: &OverlayConfig,
    bar: Option<&ProgressBar>,
) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let media = SimulatedMedia::new(duration, Size::new(1280.0, 720.0), tx.clone()).with_rate(speed);
    let _pump = media.start_clock(TIME_UPDATE_EVERY);

    let mut session = OverlaySession::new(media, canvas, overlay, config);
    session.controller_mut().load(&source);
    let mut state_rx = session.subscribe();

    debug!("Replaying {} for {:.1}s at {}x", source, duration, speed);
    tx.send(PlaybackCommand::Play.into())?;

    // Stop once the video has played through, or on Ctrl-C.
    let driver = async {
        let mut started = false;
        loop {
            tokio::select! {
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *state_rx.borrow_and_update();
                    if let Some(bar) = bar {
                        bar.set_position((state.current_time * 10.0).round() as u64);
                    }
                    let at_end = state.duration > 0.0 && state.current_time >= state.duration;
                    if state.is_playing {
                        started = true;
                    } else if started || at_end {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        let _ = shutdown_tx.send(());
    };

    let (report, ()) = tokio::join!(session.run(rx, shutdown_rx), driver);
    let report = report?;

    if let Some(bar) = bar {
        bar.finish();
    }
    eprintln!(
        "{} {} frames, {} ticks",
        style("✓").green().bold(),
        report.frames_drawn,
        report.ticks
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => OverlayConfig::from_file(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => OverlayConfig::default(),
    };
    if let Some(policy) = cli.timestamp_policy {
        config.timestamp_policy = policy.into();
    }

    match cli.command {
        Command::Analyze {
            video_url,
            player,
            kind,
            provider,
            force,
            out,
        } => analyze(video_url, player, kind.into(), provider.into(), force, out).await,
        Command::Show { file } => show(&file).await,
        Command::History { open } => history(open).await,
        Command::Stats { file, at } => stats(&file, at, &config).await,
        Command::Frame {
            file,
            at,
            duration,
            width,
            height,
        } => frame(&file, at, duration, Size::new(width, height), &config).await,
        Command::Replay {
            file,
            duration,
            video,
            speed,
            refresh_ms,
            json,
        } => {
            if let Some(refresh_ms) = refresh_ms {
                config.refresh_interval = Duration::from_millis(refresh_ms);
            }
            let overlay = load_overlay(&file, config.timestamp_policy).await?;

            let source = match video {
                Some(video) => {
                    let mut registry = InMemoryBlobRegistry::new();
                    let blob = VideoBlob::from_file(&video).await?;
                    let id = registry.register(blob);
                    registry
                        .resolve_source(&id)
                        .context("Registered video is not resolvable")?
                }
                None => PlayableSource::new(format!("simulated://{}", file.display())),
            };

            if json {
                replay(overlay, JsonLinesCanvas::default(), source, duration, speed, &config, None).await
            } else {
                let bar = create_playback_bar(duration);
                let canvas = HudCanvas::new(bar.clone());
                replay(overlay, canvas, source, duration, speed, &config, Some(&bar)).await
            }
        }
    }
}
