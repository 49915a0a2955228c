use crate::{
    alarms::TokioAlarms,
    clock::{Clock, SystemClock},
    config::CoreConfig,
    controller::{Host, SessionController},
    events::{dispatch, Event},
    host::{FileStatusIndicator, LogNotifier},
    ipc::{listen, DaemonIpcHandler},
    rule_engine::SqliteRuleEngine,
    rules::RuleCompiler,
    watcher::StorageWatcher,
};
use anyhow::Result;
use focusflow_storage::{Database, StorageArea, SETTINGS_KEY};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver},
    time::interval,
};

pub const SOCKET_FILE_NAME: &str = "focusflow.sock";
pub const STATUS_FILE_NAME: &str = "status";

const MIN_TICK_MS: u64 = 100;

pub struct Daemon {
    database: Arc<Database>,
    controller: SessionController,
    events: UnboundedReceiver<Event>,
    ipc_handler: Arc<DaemonIpcHandler>,
    shutdown_signal: Arc<AtomicBool>,
    data_dir: PathBuf,
    tick_interval: Duration,
}

impl Daemon {
    /// # Errors
    ///
    /// Returns an error if the configured blocked page URL is invalid
    pub fn new(db: Database, config: &CoreConfig, data_dir: PathBuf) -> Result<Self> {
        let database = Arc::new(db);
        let shutdown_signal = Arc::new(AtomicBool::new(false));
        let (events_tx, events) = mpsc::unbounded_channel();

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let host = Host {
            rule_engine: Arc::new(SqliteRuleEngine::new(database.clone(), config.rule_quota)),
            alarms: Arc::new(TokioAlarms::new(clock.clone(), events_tx.clone())),
            indicator: Arc::new(FileStatusIndicator::new(data_dir.join(STATUS_FILE_NAME))),
            notifier: Arc::new(LogNotifier::new(config.notifications)),
            clock,
        };
        let compiler = RuleCompiler::new(&config.blocked_page_url)?;

        Ok(Self {
            controller: SessionController::new(database.clone(), compiler, host),
            database,
            events,
            ipc_handler: Arc::new(DaemonIpcHandler::new(events_tx, shutdown_signal.clone())),
            shutdown_signal,
            data_dir,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(MIN_TICK_MS)),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read at startup
    pub async fn run_with_signals(&mut self) -> Result<()> {
        let sock_path = self.data_dir.join(SOCKET_FILE_NAME);
        let ipc_handler = self.ipc_handler.clone();
        let listen_path = sock_path.clone();

        tokio::spawn(async move {
            if let Err(e) = listen(ipc_handler, &listen_path).await {
                log::error!("IPC listener failed: {e}");
            }
        });

        let first_event = if self.database.has_value(StorageArea::Sync, SETTINGS_KEY)? {
            Event::Startup
        } else {
            Event::Installed
        };
        self.handle_event(first_event).await;

        // baseline after startup so our own writes are not reported back
        let mut watcher = StorageWatcher::new(self.database.clone())?;
        let mut interval = interval(self.tick_interval);
        log::info!("Daemon started with signal handling and IPC");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match watcher.poll() {
                        Ok(changes) => {
                            for event in changes {
                                self.handle_event(event).await;
                            }
                        }
                        Err(e) => log::error!("Storage poll failed: {e:#}"),
                    }
                }
                Some(event) = self.events.recv() => {
                    self.handle_event(event).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received Ctrl-C, shutting down...");
                    self.shutdown_signal.store(true, Ordering::SeqCst);
                }
            }

            if self.shutdown_signal.load(Ordering::SeqCst) {
                break;
            }
        }

        if let Err(e) = std::fs::remove_file(&sock_path) {
            log::debug!("Could not remove socket {}: {e}", sock_path.display());
        }
        log::info!("Daemon shut down gracefully.");
        Ok(())
    }

    async fn handle_event(&self, event: Event) {
        log::debug!("Handling event: {event:?}");
        if let Err(e) = dispatch(&self.controller, event).await {
            log::error!("Event handling failed: {e:#}");
        }
    }
}
