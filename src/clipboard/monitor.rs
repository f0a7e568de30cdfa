//! Clips - Clipboard monitoring module
//!
//! Polls the pasteboard change token and publishes newly classified content

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::classify::classify;
use super::models::ClipboardContent;
use crate::pasteboard::{ChangeToken, Pasteboard};

/// Default polling interval (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

type Listener = Box<dyn Fn(&ClipboardContent) + Send + Sync>;

/// Monitor error type
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Clipboard monitor must be started inside a tokio runtime")]
    NoRuntime,
}

/// Per-session monitor state
#[derive(Debug, Default)]
struct MonitorState {
    last_seen_token: Option<ChangeToken>,
}

struct Shared {
    pasteboard: Arc<dyn Pasteboard>,
    /// Held for the whole tick body so tick bodies never overlap
    state: Mutex<MonitorState>,
    listeners: Mutex<Vec<Listener>>,
    latest: watch::Sender<Option<ClipboardContent>>,
}

impl Shared {
    fn poll(&self) -> bool {
        let mut state = self.state.lock();

        let token = match self.pasteboard.change_token() {
            Ok(token) => token,
            Err(e) => {
                log::debug!("[Monitor] Failed to read change token: {}", e);
                return false;
            }
        };
        if state.last_seen_token == Some(token) {
            return false;
        }
        state.last_seen_token = Some(token);

        self.read_and_publish()
    }

    /// Read the current clipboard, classify it and publish the result
    fn read_and_publish(&self) -> bool {
        let snapshot = match self.pasteboard.read_current() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                log::debug!("[Monitor] Clipboard changed but nothing readable");
                return false;
            }
            Err(e) => {
                log::debug!("[Monitor] Failed to read clipboard: {}", e);
                return false;
            }
        };

        let Some(content) = classify(snapshot) else {
            log::debug!("[Monitor] Unsupported clipboard content");
            return false;
        };

        log::debug!("[Monitor] New content detected: {:?}", content.kind());
        for listener in self.listeners.lock().iter() {
            listener(&content);
        }
        self.latest.send_replace(Some(content));
        true
    }
}

struct PollTask {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Clipboard monitor
pub struct ClipboardMonitor {
    shared: Arc<Shared>,
    poll_interval: Duration,
    task: Mutex<Option<PollTask>>,
}

impl ClipboardMonitor {
    /// Create a new monitor
    pub fn new(pasteboard: Arc<dyn Pasteboard>, poll_interval: Duration) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                pasteboard,
                state: Mutex::new(MonitorState::default()),
                listeners: Mutex::new(Vec::new()),
                latest,
            }),
            poll_interval,
            task: Mutex::new(None),
        }
    }

    /// Register a callback invoked with every published content.
    ///
    /// Callbacks run on the tick, in registration order, and must not call
    /// back into the monitor.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&ClipboardContent) + Send + Sync + 'static,
    {
        self.shared.listeners.lock().push(Box::new(listener));
    }

    /// Latest observed content signal
    pub fn latest(&self) -> watch::Receiver<Option<ClipboardContent>> {
        self.shared.latest.subscribe()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Start monitoring.
    ///
    /// Captures whatever is already on the clipboard, then polls on a fixed
    /// interval. Calling while running has no effect.
    pub fn start(&self) -> Result<(), MonitorError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        let mut task = self.task.lock();
        if task.is_some() {
            log::warn!("[Monitor] Clipboard monitor is already running");
            return Ok(());
        }

        {
            let mut state = self.shared.state.lock();
            match self.shared.pasteboard.change_token() {
                Ok(token) => state.last_seen_token = Some(token),
                Err(e) => log::debug!("[Monitor] Failed to read change token: {}", e),
            }
            self.shared.read_and_publish();
        }

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let period = self.poll_interval;

        let handle = runtime.spawn(async move {
            log::info!(
                "[Monitor] Clipboard monitor started with {}ms interval",
                period.as_millis()
            );

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        // Pasteboard reads block, keep them off the runtime threads
                        let tick = Arc::clone(&shared);
                        if let Err(e) = tokio::task::spawn_blocking(move || tick.poll()).await {
                            log::error!("[Monitor] Poll task failed: {}", e);
                        }
                    }
                }
            }

            log::info!("[Monitor] Clipboard monitor stopped");
        });

        *task = Some(PollTask { shutdown, handle });
        Ok(())
    }

    /// Stop monitoring. An in-flight tick is allowed to finish.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            // The task may already be gone if the runtime shut down
            let _ = task.shutdown.send(());
            drop(task.handle);
        }
    }

    /// Run a single tick, returns whether content was published
    pub fn poll(&self) -> bool {
        self.shared.poll()
    }
}

impl Drop for ClipboardMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
