//! Dualview - dual-window media controller
//!
//! Boots the three parties of the application in one process:
//! - the window host (monitors, dialogs, folder scans)
//! - the display surface with its playback loop
//! - the control surface, driven from an operator console on stdin
//!
//! Closing either surface closes both.

use anyhow::Context;
use clap::Parser;
use dualview_core::host::serve;
use dualview_core::{
    connect, AppConfig, ControlSurface, DisplayRuntime, DisplaySurface, HeadlessHost,
    PlaybackDriver, Relay, Shutdown, SimulatedEmbed, SimulatedMedia, Size,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

/// Dualview - drive a 2880x960 output window from an operator console
#[derive(Parser)]
#[command(name = "dualview")]
#[command(version)]
#[command(about = "Dual-window media controller", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder listed in the file browser at startup
    #[arg(short, long)]
    media_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(verbose: bool, json: bool) {
    let fallback = if verbose { "debug" } else { "info,dualview=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if cli.media_dir.is_some() {
        config.media_dir = cli.media_dir;
    }
    config.validate()?;
    dualview_core::init();

    let Relay { control, control_inbox, display, display_inbox, host } = connect();
    let shutdown = Shutdown::new();

    let host_task = tokio::spawn(serve(HeadlessHost::default(), host));

    let driver = PlaybackDriver::new(
        Box::new(SimulatedMedia::new(212.0, config.embed_source)),
        Box::new(SimulatedMedia::new(90.0, Size::new(1920.0, 1080.0))),
    );
    let runtime = DisplayRuntime::new(
        &config,
        DisplaySurface::new(&config, driver),
        display_inbox,
        display,
        shutdown.clone(),
    );
    let frames = runtime.subscribe_frames();
    let display_task = tokio::spawn(runtime.run(SimulatedEmbed::ready_after(Duration::from_millis(800))));

    let mut surface = ControlSurface::new(&config, control);
    surface.set_always_on_top(config.always_on_top);
    surface.refresh_displays().await;
    if let Some(id) = surface.selected_display() {
        if let Err(e) = surface.move_to_display(id) {
            warn!(error = %e, "Could not place display window");
        }
    }
    if let Some(dir) = config.media_dir.clone() {
        surface.scan_folder(dir).await;
    }

    info!(
        canvas = %config.canvas,
        displays = surface.displays().len(),
        "Dualview started, type 'help' for commands"
    );

    let result = commands::console(&mut surface, control_inbox, frames, shutdown.clone()).await;

    shutdown.close();
    drop(surface);
    display_task.await?;
    host_task.await?;
    info!("Dualview stopped");

    result
}
