use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use command_deck::config::Config;
use command_deck::exec::{CommandResolver, CommandRunner, Shell};
use command_deck::slots::SlotStore;
use command_deck::{web, App};

#[derive(Parser, Debug)]
#[command(name = "command-deck")]
#[command(about = "Paged panel of buttons that run shell commands, with F-key hotkeys")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/command-deck/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding commands.txt, descriptions.txt and colors.txt
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Port for the local panel
    #[arg(long)]
    port: Option<u16>,

    /// Do not install the global keyboard hook
    #[arg(long)]
    no_hotkeys: bool,

    /// Start in a normal window instead of full screen
    #[arg(long)]
    windowed: bool,

    /// Reset every command to the default on the next start and exit
    #[arg(long)]
    reset: bool,

    /// Print how a command line would be resolved and exit
    #[arg(long, value_name = "COMMAND")]
    resolve: Option<String>,

    /// Run one slot's stored command, print its output and exit
    #[arg(long, value_name = "N")]
    run_slot: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if cli.no_hotkeys {
        config.hotkeys.enabled = false;
    }
    if cli.windowed {
        config.appearance.start_fullscreen = false;
    }

    // Handle simple commands first
    if cli.reset {
        return request_reset(&config);
    }

    if let Some(command) = cli.resolve {
        let resolver = CommandResolver::from_env(&config.shell.extra_search_paths);
        println!("{}", resolver.resolve(&command));
        return Ok(());
    }

    if let Some(number) = cli.run_slot {
        return run_slot(&config, number).await;
    }

    info!("Starting command-deck");

    let mut app = App::new(config.clone())?;

    let server_events = app.sender();
    let port = config.web.port;
    tokio::spawn(async move {
        if let Err(e) = web::start_server(port, server_events).await {
            error!("Panel server stopped: {}", e);
        }
    });

    let result = tokio::select! {
        result = app.run() => {
            result
        }
        _ = shutdown_signal() => {
            Ok(())
        }
    };

    // Always run shutdown
    app.shutdown().await;
    result
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                let _ = signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down...");
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down...");
    }
}

fn request_reset(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.storage.data_dir)?;
    let store = SlotStore::new(config.store_paths(), config.pages.max_pages);
    store.request_reset()?;
    println!(
        "✓ Commands will be reset on next start ({:?})",
        store.paths().reset_flag
    );
    Ok(())
}

async fn run_slot(config: &Config, number: usize) -> Result<()> {
    let store = SlotStore::new(config.store_paths(), config.pages.max_pages);
    let table = store.load();

    let Some(slot) = number.checked_sub(1).and_then(|index| table.slot(index)) else {
        bail!(
            "button {} does not exist (1..={})",
            number,
            table.total_slots()
        );
    };
    let command = slot.command.trim();
    if command.is_empty() {
        bail!("Please enter a command for button {}.", number);
    }

    // Reports only matter to the interactive loop
    let (report_tx, _report_rx) = tokio::sync::mpsc::unbounded_channel();
    let resolver = CommandResolver::from_env(&config.shell.extra_search_paths);
    let runner = CommandRunner::new(Shell::from_config(&config.shell), resolver, report_tx);

    let resolved = runner.resolver().resolve(command);
    info!("Running button {}: {}", number, resolved);
    if let Some(report) = runner.execute(&resolved).await?.report() {
        println!("{}", report);
    }
    Ok(())
}
