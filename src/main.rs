use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use ledplayer::player::{PlaybackOrchestrator, PlaybackSlot, PlayerEvent};
use ledplayer::playlist::PlaylistCollectionManager;
use ledplayer::quick::QuickMediaBank;
use ledplayer::renderer::{MatrixRenderer, SimulatedCanvas, StreamRenderer};
use ledplayer::storage::{JsonStore, MediaFiles, PlaylistStore};
use ledplayer::utils::Config;

/// ledplayer - playlist and quick media playback for RGB LED matrix panels
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to the user config file)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Playlist to activate instead of the persisted one
    #[arg(short, long, value_name = "NAME")]
    playlist: Option<String>,

    /// Data directory for playlists and media copies
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Global brightness (0-100)
    #[arg(short, long, value_name = "PERCENT")]
    brightness: Option<u8>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration; command line flags win
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(brightness) = args.brightness {
        config.matrix.brightness = brightness;
    }
    config.validate()?;

    // Initialize logging
    let log_level = if args.debug { "debug".to_string() } else { config.general.log_level.clone() };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting ledplayer v{}", env!("CARGO_PKG_VERSION"));
    debug!("Configuration: {:?}", config);

    // Display pipeline
    let canvas = SimulatedCanvas::new(config.matrix.display_options());
    let renderer = Arc::new(MatrixRenderer::new(canvas, &config));
    let orchestrator = Arc::new(PlaybackOrchestrator::new(renderer.clone()));

    // Collections
    let data_dir = config.storage.data_dir.clone();
    let store: Arc<dyn PlaylistStore> = Arc::new(JsonStore::open(data_dir.clone())?);
    let manager = PlaylistCollectionManager::new(
        Arc::clone(&orchestrator),
        Arc::clone(&store),
        MediaFiles::new(data_dir.join("media")),
    )?;
    info!("Playlists: {:?}", manager.playlist_names());

    let _disabled = manager.subscribe(|event| {
        let PlayerEvent::EntryDisabled { entry } = event;
        warn!("'{}' was disabled after a playback failure", entry.name());
    });

    match args.playlist {
        Some(name) => manager.set_active_playlist_state(true, Some(&name))?,
        None => manager.restore()?,
    }

    let quick = Arc::new(QuickMediaBank::new(
        config.quick_media.slots,
        Arc::clone(&orchestrator),
        store,
        MediaFiles::new(data_dir.join("quick_media")),
    ));
    quick.load()?;

    // Stdin stands in for the button interrupts
    info!(
        "Type 1-{} + Enter to press a quick media button, 's' for status, 'q' to quit",
        quick.len()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted");
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !handle_command(line.trim(), &quick, &orchestrator).await {
                        break;
                    }
                }
                None => {
                    debug!("stdin closed, waiting for Ctrl-C");
                    stdin_open = false;
                }
            }
        }
    }

    // Stop joins the render thread; keep it off the async workers
    let stopper = Arc::clone(&orchestrator);
    tokio::task::spawn_blocking(move || stopper.stop()).await?;
    renderer.clear();

    info!("ledplayer stopped");
    Ok(())
}

/// Handle one console command; returns `false` to quit
async fn handle_command(
    command: &str,
    quick: &Arc<QuickMediaBank>,
    orchestrator: &Arc<PlaybackOrchestrator>,
) -> bool {
    match command {
        "" => true,
        "q" | "quit" => false,
        "s" | "status" => {
            match orchestrator.now_playing() {
                PlaybackSlot::Idle => info!("Idle"),
                PlaybackSlot::Playlist(entry) => info!("Playlist: '{}' ({})", entry.name(), entry.play_mode()),
                PlaybackSlot::Override(entry) => info!("Quick media: '{}' ({})", entry.name(), entry.play_mode()),
            }
            true
        }
        _ => {
            match command.parse::<usize>() {
                Ok(button) if button >= 1 => {
                    let bank = Arc::clone(quick);
                    match tokio::task::spawn_blocking(move || bank.press(button - 1)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!("Button {}: {}", button, e),
                        Err(e) => error!("Button task failed: {}", e),
                    }
                }
                _ => warn!("Unknown command '{}'", command),
            }
            true
        }
    }
}
