use anyhow::Result;
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc::UnboundedSender, Mutex},
    task::JoinHandle,
};

use crate::{clock::Clock, events::Event};

/// A scheduled one-shot alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub name: String,
    pub scheduled_time_ms: i64,
}

/// Named one-shot timers. Creating an alarm replaces any alarm with the same name.
#[async_trait]
pub trait AlarmScheduler: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the alarm cannot be scheduled
    async fn create(&self, name: &str, when_ms: i64) -> Result<()>;

    async fn get(&self, name: &str) -> Option<Alarm>;

    /// Cancel an alarm, returning whether one existed
    async fn clear(&self, name: &str) -> bool;
}

struct PendingAlarm {
    alarm: Alarm,
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct AlarmTable {
    pending: HashMap<String, PendingAlarm>,
    next_generation: u64,
}

/// Alarms backed by tokio timers; a firing alarm posts `Event::Alarm` to the daemon.
///
/// Pending alarms live only in memory and do not survive a restart.
pub struct TokioAlarms {
    table: Arc<Mutex<AlarmTable>>,
    clock: Arc<dyn Clock>,
    events: UnboundedSender<Event>,
}

impl TokioAlarms {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, events: UnboundedSender<Event>) -> Self {
        Self {
            table: Arc::new(Mutex::new(AlarmTable::default())),
            clock,
            events,
        }
    }
}

#[async_trait]
impl AlarmScheduler for TokioAlarms {
    async fn create(&self, name: &str, when_ms: i64) -> Result<()> {
        let delay_ms = u64::try_from(when_ms - self.clock.now_ms()).unwrap_or(0);
        let mut table = self.table.lock().await;

        table.next_generation += 1;
        let generation = table.next_generation;

        let fire_table = self.table.clone();
        let events = self.events.clone();
        let fire_name = name.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;

            {
                let mut table = fire_table.lock().await;
                let current = table
                    .pending
                    .get(&fire_name)
                    .is_some_and(|p| p.generation == generation);
                if !current {
                    return;
                }
                table.pending.remove(&fire_name);
            }

            log::info!("Alarm fired: {fire_name}");
            if events.send(Event::Alarm(fire_name)).is_err() {
                log::warn!("Alarm fired after the event loop stopped");
            }
        });

        let replaced = table.pending.insert(
            name.to_string(),
            PendingAlarm {
                alarm: Alarm {
                    name: name.to_string(),
                    scheduled_time_ms: when_ms,
                },
                generation,
                handle,
            },
        );
        if let Some(previous) = replaced {
            previous.handle.abort();
        }

        log::debug!("Alarm {name} scheduled in {delay_ms}ms");
        Ok(())
    }

    async fn get(&self, name: &str) -> Option<Alarm> {
        self.table
            .lock()
            .await
            .pending
            .get(name)
            .map(|p| p.alarm.clone())
    }

    async fn clear(&self, name: &str) -> bool {
        match self.table.lock().await.pending.remove(name) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }
}
