//! Clips - Clipboard monitoring and history engine
//!
//! Watches the system clipboard, keeps a bounded, deduplicated and persisted
//! history of what was copied, and lets a user recall or favorite past entries.

pub mod clipboard;
pub mod commands;
pub mod config;
pub mod history;
pub mod pasteboard;
pub mod storage;

use std::sync::Arc;

use clipboard::ClipboardMonitor;
use config::Settings;
use history::HistoryEngine;
use pasteboard::{Pasteboard, SystemPasteboard};
use storage::{KeyValueStore, MemoryStore, SqliteStore};

/// Components owned by the composition root
pub struct Clips {
    pub settings: Settings,
    pub engine: Arc<HistoryEngine>,
    pub monitor: ClipboardMonitor,
    pub commands: commands::Commands,
}

impl Clips {
    /// Build the engine and monitor and connect the monitor's output to the engine
    pub fn new(store: Arc<dyn KeyValueStore>, pasteboard: Arc<dyn Pasteboard>) -> Self {
        let settings = Settings::load(store.as_ref());
        let engine = Arc::new(HistoryEngine::new(
            Arc::clone(&store),
            settings.history_capacity,
        ));

        let monitor = ClipboardMonitor::new(Arc::clone(&pasteboard), settings.poll_interval());
        let sink = Arc::clone(&engine);
        monitor.subscribe(move |content| {
            sink.on_new_content(content.clone());
        });

        let commands =
            commands::Commands::new(Arc::clone(&engine), pasteboard, store, settings.clone());

        Self {
            settings,
            engine,
            monitor,
            commands,
        }
    }
}

/// Open the on-disk store, falling back to memory for this session
fn open_store() -> Arc<dyn KeyValueStore> {
    let data_dir = config::data_dir();
    log::info!("Data directory: {:?}", data_dir);

    match SqliteStore::open(&data_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("Failed to open database: {}, using in-memory fallback", e);
            Arc::new(MemoryStore::new())
        }
    }
}

/// Application main entry point
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Clips starting...");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let clips = Clips::new(open_store(), Arc::new(SystemPasteboard::new()));
        clips.monitor.start()?;
        log::info!(
            "Clips initialized with {} entries (capacity {})",
            clips.engine.len(),
            clips.engine.capacity()
        );

        tokio::signal::ctrl_c().await?;

        clips.monitor.stop();
        log::info!("Clips stopped with {} entries", clips.engine.len());
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
