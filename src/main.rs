use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackreplay::{
    config::{self, Config},
    export,
    filter::{format_time_input, TimeWindow, ValidationError},
    player::{PlaybackEvent, Player},
    sample::Sample,
    serve,
    source::{read_or_fallback, FileSource, StdinSource},
    store::Trajectory,
};

#[derive(Debug, Parser)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Track to load, `-` for stdin. Defaults to the configured source.
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print point count, time range, bounds and endpoints
    Summary,
    /// Print the points inside a time window
    Filter {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        geojson: bool,
    },
    /// Replay the track point by point, or only the points inside a time window
    Play {
        #[arg(short, long)]
        rate: Option<f64>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Write the track as GeoJSON
    Export,
    /// Serve the track over HTTP
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = config::load_or_default(cli.config.as_deref())?;
    let trajectory = load_trajectory(cli.input, &config);

    match cli.command {
        Command::Summary => print!("{}", summary(&trajectory)),
        Command::Filter {
            start,
            end,
            geojson,
        } => {
            let window = TimeWindow::from_inputs(start.as_deref(), end.as_deref())?;
            let visible = trajectory.filter_by_time_range(Some(window.start), Some(window.end));
            if geojson {
                print_geojson(visible)?;
            } else {
                for sample in visible {
                    println!("{sample}");
                }
                let stats = trajectory.stats(visible);
                println!("showing {} of {} points", stats.visible, stats.total);
            }
        }
        Command::Play { rate, start, end } => {
            let samples = replay_samples(&trajectory, start.as_deref(), end.as_deref())?;
            play(samples, &config, rate.unwrap_or(config.playback.default_rate)).await?
        }
        Command::Export => print_geojson(trajectory.get_all())?,
        Command::Serve { port } => {
            serve::run(trajectory, port.unwrap_or(config.http_port)).await?
        }
    };

    Ok(())
}

fn load_trajectory(input: Option<PathBuf>, config: &Config) -> Trajectory {
    let input = input.unwrap_or_else(|| config.source.clone());
    let text = if input == Path::new("-") {
        read_or_fallback(&StdinSource)
    } else {
        read_or_fallback(&FileSource(input))
    };
    Trajectory::from_text(&text).with_fallback_bounds(config.fallback_bounds.into())
}

fn summary(trajectory: &Trajectory) -> String {
    let range = trajectory.get_time_range();
    let bounds = trajectory.get_bounds();
    let ((min_lat, min_lng), (max_lat, max_lng)) = bounds.corners();
    let center = bounds.center();

    let mut out = String::new();
    let _ = writeln!(out, "points: {}", trajectory.len());
    let _ = writeln!(out, "from:   {} ({})", range.min, format_time_input(&range.min));
    let _ = writeln!(out, "to:     {} ({})", range.max, format_time_input(&range.max));
    let _ = writeln!(
        out,
        "bounds: ({min_lat:.6}, {min_lng:.6}) - ({max_lat:.6}, {max_lng:.6})"
    );
    let _ = writeln!(out, "center: ({:.6}, {:.6})", center.y(), center.x());
    if let Some((start, end)) = trajectory.endpoints() {
        let _ = writeln!(out, "start:  {start}");
        let _ = writeln!(out, "end:    {end}");
    }
    out
}

/// The whole track, or only the window given by `--start`/`--end`.
fn replay_samples<'a>(
    trajectory: &'a Trajectory,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<&'a [Sample], ValidationError> {
    if start.is_none() && end.is_none() {
        return Ok(trajectory.get_all());
    }
    let window = TimeWindow::from_inputs(start, end)?;
    Ok(trajectory.filter_by_time_range(Some(window.start), Some(window.end)))
}

fn print_geojson(samples: &[Sample]) -> Result<()> {
    let fc = export::feature_collection(samples);
    println!("{}", serde_json::to_string_pretty(&fc)?);
    Ok(())
}

async fn play(samples: &[Sample], config: &Config, rate: f64) -> Result<()> {
    let (mut player, mut events) = Player::new(config.playback);
    player.start(samples.to_vec(), rate)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(PlaybackEvent::Started { total, interval }) => {
                    println!("replaying {total} points, one every {interval:?}");
                }
                Some(PlaybackEvent::Tick { index, total, sample }) => {
                    println!("[{} of {total}] {sample}", index + 1);
                }
                Some(PlaybackEvent::Finished) | Some(PlaybackEvent::Stopped) | None => break,
            },
            _ = &mut ctrl_c => {
                player.stop();
                break;
            }
        }
    }

    Ok(())
}
