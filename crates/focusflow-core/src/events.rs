//! Host events and their routing to the session controller.

use anyhow::Result;
use focusflow_storage::{StorageArea, SETTINGS_KEY};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::controller::{SessionController, SessionStatus};

/// Requests from the user-facing surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    StartSession { duration_minutes: u32 },
    StopSession,
    Status,
    SettingsChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Done,
    Status(SessionStatus),
    Failed(String),
}

#[derive(Debug)]
pub enum Event {
    /// First run with no stored settings
    Installed,
    Startup,
    Alarm(String),
    StorageChanged {
        area: StorageArea,
        key: String,
    },
    Command {
        command: Command,
        reply: oneshot::Sender<CommandReply>,
    },
}

/// Route one event to its handler.
///
/// Command failures are answered to the caller and not returned.
///
/// # Errors
///
/// Returns the handler's error for non-command events
pub async fn dispatch(controller: &SessionController, event: Event) -> Result<()> {
    match event {
        Event::Installed => controller.on_installed().await,
        Event::Startup => controller.reconcile().await,
        Event::Alarm(name) => controller.on_alarm(&name).await,
        Event::StorageChanged { area, key } => {
            if area == StorageArea::Sync && key == SETTINGS_KEY {
                log::info!("Settings changed, updating rules");
                controller.on_settings_changed().await
            } else {
                Ok(())
            }
        }
        Event::Command { command, reply } => {
            let response = match run_command(controller, command).await {
                Ok(response) => response,
                Err(e) => {
                    log::error!("Command failed: {e:#}");
                    CommandReply::Failed(format!("{e:#}"))
                }
            };
            if reply.send(response).is_err() {
                log::warn!("Command caller went away before the reply");
            }
            Ok(())
        }
    }
}

async fn run_command(controller: &SessionController, command: Command) -> Result<CommandReply> {
    match command {
        Command::StartSession { duration_minutes } => {
            controller.start_session(duration_minutes).await?;
            Ok(CommandReply::Done)
        }
        Command::StopSession => {
            controller.end_session().await?;
            Ok(CommandReply::Done)
        }
        Command::Status => Ok(CommandReply::Status(controller.status().await?)),
        Command::SettingsChanged => {
            controller.on_settings_changed().await?;
            Ok(CommandReply::Done)
        }
    }
}
