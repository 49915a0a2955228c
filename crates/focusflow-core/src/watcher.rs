use anyhow::Result;
use focusflow_storage::{Database, StorageArea, SETTINGS_KEY};
use std::sync::Arc;

use crate::events::Event;

struct WatchedKey {
    area: StorageArea,
    key: &'static str,
    revision: i64,
}

/// Turns store writes made by other processes into `StorageChanged` events
/// by comparing per-key revisions between polls.
pub struct StorageWatcher {
    database: Arc<Database>,
    watched: Vec<WatchedKey>,
}

impl StorageWatcher {
    /// Watch the synced settings, starting from their current revision
    ///
    /// # Errors
    ///
    /// Returns an error if the current revision cannot be read
    pub fn new(database: Arc<Database>) -> Result<Self> {
        let revision = database.revision(StorageArea::Sync, SETTINGS_KEY)?;
        Ok(Self {
            database,
            watched: vec![WatchedKey {
                area: StorageArea::Sync,
                key: SETTINGS_KEY,
                revision,
            }],
        })
    }

    /// Events for every watched key written since the last poll
    ///
    /// # Errors
    ///
    /// Returns an error if a revision cannot be read
    pub fn poll(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        for watched in &mut self.watched {
            let revision = self.database.revision(watched.area, watched.key)?;
            if revision != watched.revision {
                log::debug!(
                    "{}/{} changed (revision {} -> {revision})",
                    watched.area,
                    watched.key,
                    watched.revision
                );
                watched.revision = revision;
                events.push(Event::StorageChanged {
                    area: watched.area,
                    key: watched.key.to_string(),
                });
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusflow_storage::{SessionPatch, SiteType};

    #[test]
    fn test_poll_reports_settings_writes_once() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mut watcher = StorageWatcher::new(db.clone()).unwrap();
        assert!(watcher.poll().unwrap().is_empty());

        db.add_site("x.com", SiteType::Focus).unwrap();
        let events = watcher.poll().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Event::StorageChanged { area: StorageArea::Sync, key } if key == SETTINGS_KEY
        ));

        assert!(watcher.poll().unwrap().is_empty());
    }

    #[test]
    fn test_session_writes_are_not_reported() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mut watcher = StorageWatcher::new(db.clone()).unwrap();

        db.set_session(SessionPatch {
            active: Some(true),
            ..SessionPatch::default()
        })
        .unwrap();
        assert!(watcher.poll().unwrap().is_empty());
    }
}
