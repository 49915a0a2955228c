//! User-facing side effects of session transitions: the status indicator and
//! completion notifications.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const COMPLETION_TITLE: &str = "Focus Session Complete!";
const COMPLETION_BUTTON: &str = "Start Another Session";
const COMPLETION_MESSAGES: [&str; 7] = [
    "Great job! Your focus session is complete!",
    "Well done! You stayed focused!",
    "Amazing! You completed your focus session!",
    "Excellent work! Time for a well-deserved break!",
    "Congratulations! You crushed your focus session!",
    "Outstanding! Your focus session is complete!",
    "Fantastic! You made it through your focus time!",
];

/// Two-state session indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorState {
    Inactive,
    Active,
}

impl IndicatorState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
        }
    }
}

#[async_trait]
pub trait StatusIndicator: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the indicator cannot be updated
    async fn set_state(&self, state: IndicatorState) -> Result<()>;
}

/// Indicator that mirrors the session state into a file
pub struct FileStatusIndicator {
    path: PathBuf,
}

impl FileStatusIndicator {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl StatusIndicator for FileStatusIndicator {
    async fn set_state(&self, state: IndicatorState) -> Result<()> {
        tokio::fs::write(&self.path, state.as_str())
            .await
            .with_context(|| format!("Failed to write status to {}", self.path.display()))?;
        log::debug!("Status indicator set to {}", state.as_str());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub button: Option<String>,
}

/// Session completion notice; `seed` picks one of the encouraging messages
#[must_use]
pub fn completion_notification(seed: i64) -> Notification {
    let len = i64::try_from(COMPLETION_MESSAGES.len()).unwrap_or(1);
    let index = usize::try_from(seed.rem_euclid(len)).unwrap_or(0);
    Notification {
        title: COMPLETION_TITLE.to_string(),
        message: COMPLETION_MESSAGES[index].to_string(),
        button: Some(COMPLETION_BUTTON.to_string()),
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the notification could not be shown
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log
pub struct LogNotifier {
    enabled: bool,
}

impl LogNotifier {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        if self.enabled {
            log::info!("{}: {}", notification.title, notification.message);
        }
        Ok(())
    }
}
