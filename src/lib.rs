pub mod config;
pub mod display;
pub mod exec;
pub mod hotkey;
pub mod input;
pub mod slots;
pub mod state;
pub mod web;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use config::Config;
use display::Palette;
use exec::{CommandResolver, CommandRunner, Shell};
use hotkey::{HotkeyBridge, HotkeyRegistration, Key};
use input::{Flow, InputHandler, PanelEvent};
use slots::SlotStore;
use state::{AppState, PanelSnapshot};

/// Line terminator for store files and captured output
#[cfg(windows)]
pub(crate) const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub(crate) const LINE_ENDING: &str = "\n";

/// Main application struct
pub struct App {
    events_tx: UnboundedSender<PanelEvent>,
    events_rx: UnboundedReceiver<PanelEvent>,
    input: InputHandler,
    hotkeys: Option<HotkeyRegistration>,
}

impl App {
    /// Load the stored slots and colours and install the keyboard hook
    pub fn new(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
            format!(
                "creating data directory {}",
                config.storage.data_dir.display()
            )
        })?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let store = SlotStore::new(config.store_paths(), config.pages.max_pages);
        let table = store.load();
        info!(
            "Loaded {} slots across {} pages",
            table.total_slots(),
            table.max_pages()
        );

        let colors_path = config.colors_path();
        let palette = Palette::load(&colors_path);
        let maximized = config.appearance.start_fullscreen;
        let state = AppState::new(table, palette, maximized);
        let snapshot = Arc::new(PanelSnapshot::new(state.pages.max_pages(), maximized));

        let resolver = CommandResolver::from_env(&config.shell.extra_search_paths);
        let runner = CommandRunner::new(
            Shell::from_config(&config.shell),
            resolver,
            events_tx.clone(),
        );
        let input = InputHandler::new(state, store, runner, snapshot.clone(), colors_path);

        let hotkeys = if config.hotkeys.enabled {
            install_hotkeys(&config, snapshot, events_tx.clone())
        } else {
            info!("Global hotkeys disabled");
            None
        };

        Ok(Self {
            events_tx,
            events_rx,
            input,
            hotkeys,
        })
    }

    /// Channel for posting events to the interactive loop
    pub fn sender(&self) -> UnboundedSender<PanelEvent> {
        self.events_tx.clone()
    }

    pub fn hotkeys_active(&self) -> bool {
        self.hotkeys
            .as_ref()
            .is_some_and(HotkeyRegistration::is_installed)
    }

    /// Run the interactive loop until the panel is closed
    pub async fn run(&mut self) -> Result<()> {
        info!("Panel ready");
        while let Some(event) = self.events_rx.recv().await {
            if self.input.handle_event(event) == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Gracefully shutdown the application
    pub async fn shutdown(&mut self) {
        info!("Shutting down command-deck...");

        self.input.flush();
        if let Some(mut hotkeys) = self.hotkeys.take() {
            hotkeys.release();
        }

        info!("Shutdown complete");
    }
}

fn install_hotkeys(
    config: &Config,
    snapshot: Arc<PanelSnapshot>,
    events: UnboundedSender<PanelEvent>,
) -> Option<HotkeyRegistration> {
    let restore_key = config
        .hotkeys
        .restore_key
        .parse::<Key>()
        .unwrap_or_else(|e| {
            warn!("{}; using Escape", e);
            Key::Escape
        });
    let bridge = HotkeyBridge::new(snapshot, events, restore_key, config.hotkeys.slot_keys);

    match HotkeyRegistration::install(hotkey::platform_hook(), bridge) {
        Ok(registration) => Some(registration),
        Err(e) => {
            warn!("Global hotkeys unavailable: {}", e);
            None
        }
    }
}
