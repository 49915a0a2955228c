pub mod alarms;
pub mod applier;
pub mod blocked_page;
pub mod clock;
pub mod config;
pub mod controller;
pub mod daemon;
pub mod error;
pub mod events;
pub mod host;
pub mod ipc;
pub mod rule_engine;
pub mod rules;
pub mod watcher;

pub use config::CoreConfig;
pub use controller::{SessionController, SessionStatus, FOCUS_ALARM_NAME};
pub use daemon::Daemon;
pub use error::SessionError;
