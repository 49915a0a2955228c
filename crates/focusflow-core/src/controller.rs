//! Focus session state machine.
//!
//! Every transition re-reads the settings and session stores, so handlers are
//! safe to run cold after a restart.

use anyhow::Result;
use focusflow_storage::{Database, SessionPatch, SessionState, SettingsPatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    alarms::AlarmScheduler,
    applier::RuleApplier,
    clock::Clock,
    error::SessionError,
    host::{completion_notification, IndicatorState, Notifier, StatusIndicator},
    rule_engine::RuleEngine,
    rules::RuleCompiler,
};


/// The one alarm that ends a focus session
pub const FOCUS_ALARM_NAME: &str = "focus-session-alarm";

const MS_PER_MINUTE: i64 = 60_000;

/// Services the controller drives
#[derive(Clone)]
pub struct Host {
    pub rule_engine: Arc<dyn RuleEngine>,
    pub alarms: Arc<dyn AlarmScheduler>,
    pub indicator: Arc<dyn StatusIndicator>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// Snapshot for status surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub active: bool,
    pub ends_at_epoch_ms: i64,
    pub remaining_ms: i64,
    pub installed_rule_ids: Vec<u32>,
    pub alarm_scheduled: bool,
}

pub struct SessionController {
    database: Arc<Database>,
    compiler: RuleCompiler,
    applier: RuleApplier,
    host: Host,
}

impl SessionController {
    #[must_use]
    pub fn new(database: Arc<Database>, compiler: RuleCompiler, host: Host) -> Self {
        Self {
            database,
            compiler,
            applier: RuleApplier::new(host.rule_engine.clone()),
            host,
        }
    }

    /// Start (or restart) a focus session lasting `duration_minutes`
    ///
    /// # Errors
    ///
    /// Returns an error for a zero duration, or if applying rules, persisting
    /// the session or scheduling the alarm fails
    pub async fn start_session(&self, duration_minutes: u32) -> Result<SessionState> {
        if duration_minutes == 0 {
            return Err(SessionError::InvalidDuration.into());
        }

        let ends_at_epoch_ms =
            self.host.clock.now_ms() + i64::from(duration_minutes) * MS_PER_MINUTE;

        let rule_ids = self.sync_rules(true).await?;
        let session = self.database.set_session(SessionPatch {
            active: Some(true),
            ends_at_epoch_ms: Some(ends_at_epoch_ms),
            active_rule_ids: Some(rule_ids),
        })?;

        self.host
            .alarms
            .create(FOCUS_ALARM_NAME, ends_at_epoch_ms)
            .await?;
        self.set_indicator(IndicatorState::Active).await;

        log::info!("Focus session started for {duration_minutes} minutes.");
        Ok(session)
    }

    /// End the session, keeping only permanent blocks. Safe to call when no
    /// session is active.
    ///
    /// # Errors
    ///
    /// Returns an error if applying rules or clearing the session fails
    pub async fn end_session(&self) -> Result<()> {
        let was_active = self.database.get_session()?.active;

        self.sync_rules(false).await?;
        self.database.clear_session()?;
        self.host.alarms.clear(FOCUS_ALARM_NAME).await;
        self.set_indicator(IndicatorState::Inactive).await;

        if was_active {
            self.show_completion_notification().await;
            log::info!("Focus session ended.");
        }
        Ok(())
    }

    /// End the session when its alarm fires. An alarm that arrives before the
    /// stored end time belongs to a replaced session and is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the session or ending it fails
    pub async fn on_alarm(&self, name: &str) -> Result<()> {
        if name != FOCUS_ALARM_NAME {
            log::debug!("Ignoring unknown alarm: {name}");
            return Ok(());
        }

        let session = self.database.get_session()?;
        if session.active && !session.is_expired(self.host.clock.now_ms()) {
            log::debug!(
                "Ignoring stale session alarm; session runs until {}",
                session.ends_at_epoch_ms
            );
            return Ok(());
        }
        self.end_session().await
    }

    /// First run: store default settings, then bring rules in line
    ///
    /// # Errors
    ///
    /// Returns an error if persisting settings or reconciling fails
    pub async fn on_installed(&self) -> Result<()> {
        self.database.set_settings(SettingsPatch::default())?;
        log::info!("Default settings stored");
        self.reconcile().await
    }

    /// Bring rules, alarm and indicator in line with the persisted session
    /// after a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if reading state, applying rules or scheduling fails
    pub async fn reconcile(&self) -> Result<()> {
        let session = self.database.get_session()?;

        if session.is_expired(self.host.clock.now_ms()) {
            log::info!("Session expired while the daemon was down");
            return self.end_session().await;
        }

        let rule_ids = self.sync_rules(session.active).await?;

        if !session.active {
            self.set_indicator(IndicatorState::Inactive).await;
            return Ok(());
        }

        self.database.set_session(SessionPatch {
            active_rule_ids: Some(rule_ids),
            ..SessionPatch::default()
        })?;

        if self.host.alarms.get(FOCUS_ALARM_NAME).await.is_none() {
            self.host
                .alarms
                .create(FOCUS_ALARM_NAME, session.ends_at_epoch_ms)
                .await?;
            log::info!(
                "Re-created session alarm for {}",
                session.ends_at_epoch_ms
            );
        }
        self.set_indicator(IndicatorState::Active).await;
        Ok(())
    }

    /// Re-apply rules after the block list changed, in either state
    ///
    /// # Errors
    ///
    /// Returns an error if applying rules or persisting the new rule ids fails
    pub async fn on_settings_changed(&self) -> Result<()> {
        let session = self.database.get_session()?;
        let rule_ids = self.sync_rules(session.active).await?;

        if session.active {
            self.database.set_session(SessionPatch {
                active_rule_ids: Some(rule_ids),
                ..SessionPatch::default()
            })?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the session or installed rules cannot be read
    pub async fn status(&self) -> Result<SessionStatus> {
        let session = self.database.get_session()?;
        let now = self.host.clock.now_ms();

        Ok(SessionStatus {
            active: session.active,
            ends_at_epoch_ms: session.ends_at_epoch_ms,
            remaining_ms: session.remaining_ms(now),
            installed_rule_ids: self.applier.installed_ids().await?,
            alarm_scheduled: self.host.alarms.get(FOCUS_ALARM_NAME).await.is_some(),
        })
    }

    async fn sync_rules(&self, session_active: bool) -> Result<Vec<u32>> {
        let settings = self.database.get_settings()?;
        let rules = self
            .compiler
            .compile(&settings.blocked_domains, session_active);
        self.applier.apply(rules).await
    }

    async fn set_indicator(&self, state: IndicatorState) {
        if let Err(e) = self.host.indicator.set_state(state).await {
            log::warn!("Could not update status indicator: {e:#}");
        }
    }

    async fn show_completion_notification(&self) {
        let notification = completion_notification(self.host.clock.now_ms() / 1000);
        if let Err(e) = self.host.notifier.notify(&notification).await {
            log::warn!("Could not show notification: {e:#}");
        }
    }
}
