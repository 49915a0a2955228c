use anyhow::Result;
use async_trait::async_trait;
use focusflow_storage::{BlockRule, Database};
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};
use thiserror::Error;
use tokio::sync::Mutex;

/// Reasons the rule engine refuses an update
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleEngineError {
    #[error("rule id {0} is invalid (ids start at 1)")]
    InvalidRuleId(u32),

    #[error("rule {0} has an empty url filter")]
    EmptyUrlFilter(u32),

    #[error("rule id {0} appears more than once in the update")]
    DuplicateRuleId(u32),

    #[error("rule id {0} is already installed")]
    RuleIdInUse(u32),

    #[error("dynamic rule quota exceeded: {requested} rules requested, limit is {limit}")]
    QuotaExceeded { requested: usize, limit: usize },
}

/// Declarative redirect rule engine.
///
/// `update_dynamic_rules` is all-or-nothing: either every removal and
/// addition is applied or the installed set is left unchanged.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// Currently installed rules
    ///
    /// # Errors
    ///
    /// Returns an error if the installed set cannot be read
    async fn dynamic_rules(&self) -> Result<Vec<BlockRule>>;

    /// Remove `remove_ids` and add `add_rules` atomically
    ///
    /// # Errors
    ///
    /// Returns a `RuleEngineError` for invalid updates, or the backend's error
    async fn update_dynamic_rules(&self, remove_ids: &[u32], add_rules: &[BlockRule])
        -> Result<()>;
}

/// Check an update against the installed ids and the rule quota
///
/// # Errors
///
/// Returns the first violation found
pub fn validate_update(
    installed_ids: &[u32],
    remove_ids: &[u32],
    add_rules: &[BlockRule],
    quota: usize,
) -> Result<(), RuleEngineError> {
    let removing: HashSet<u32> = remove_ids.iter().copied().collect();
    let remaining: HashSet<u32> = installed_ids
        .iter()
        .copied()
        .filter(|id| !removing.contains(id))
        .collect();

    let mut adding = HashSet::new();
    for rule in add_rules {
        if rule.id == 0 {
            return Err(RuleEngineError::InvalidRuleId(rule.id));
        }
        if rule.url_filter.trim_start_matches('|').is_empty() {
            return Err(RuleEngineError::EmptyUrlFilter(rule.id));
        }
        if !adding.insert(rule.id) {
            return Err(RuleEngineError::DuplicateRuleId(rule.id));
        }
        if remaining.contains(&rule.id) {
            return Err(RuleEngineError::RuleIdInUse(rule.id));
        }
    }

    let requested = remaining.len() + adding.len();
    if requested > quota {
        return Err(RuleEngineError::QuotaExceeded {
            requested,
            limit: quota,
        });
    }
    Ok(())
}

/// Rule engine persisted in the `dynamic_rules` table
pub struct SqliteRuleEngine {
    database: Arc<Database>,
    quota: usize,
}

impl SqliteRuleEngine {
    #[must_use]
    pub fn new(database: Arc<Database>, quota: usize) -> Self {
        Self { database, quota }
    }
}

#[async_trait]
impl RuleEngine for SqliteRuleEngine {
    async fn dynamic_rules(&self) -> Result<Vec<BlockRule>> {
        self.database.dynamic_rules()
    }

    async fn update_dynamic_rules(
        &self,
        remove_ids: &[u32],
        add_rules: &[BlockRule],
    ) -> Result<()> {
        let installed: Vec<u32> = self
            .database
            .dynamic_rules()?
            .iter()
            .map(|rule| rule.id)
            .collect();
        validate_update(&installed, remove_ids, add_rules, self.quota)?;
        self.database.replace_dynamic_rules(remove_ids, add_rules)
    }
}

/// In-process rule engine with the same validation as the persisted one
pub struct MemoryRuleEngine {
    rules: Mutex<BTreeMap<u32, BlockRule>>,
    updates: Mutex<usize>,
    quota: usize,
}

impl MemoryRuleEngine {
    #[must_use]
    pub fn new(quota: usize) -> Self {
        Self {
            rules: Mutex::new(BTreeMap::new()),
            updates: Mutex::new(0),
            quota,
        }
    }

    /// Number of successful updates so far
    pub async fn update_count(&self) -> usize {
        *self.updates.lock().await
    }
}

#[async_trait]
impl RuleEngine for MemoryRuleEngine {
    async fn dynamic_rules(&self) -> Result<Vec<BlockRule>> {
        Ok(self.rules.lock().await.values().cloned().collect())
    }

    async fn update_dynamic_rules(
        &self,
        remove_ids: &[u32],
        add_rules: &[BlockRule],
    ) -> Result<()> {
        let mut rules = self.rules.lock().await;
        let installed: Vec<u32> = rules.keys().copied().collect();
        validate_update(&installed, remove_ids, add_rules, self.quota)?;

        for id in remove_ids {
            rules.remove(id);
        }
        for rule in add_rules {
            rules.insert(rule.id, rule.clone());
        }
        *self.updates.lock().await += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: u32, domain: &str) -> BlockRule {
        BlockRule {
            id,
            priority: 1,
            url_filter: format!("||{domain}"),
            redirect_url: format!("focusflow://blocked?domain={domain}"),
            main_frame_only: true,
        }
    }

    #[test]
    fn test_validate_accepts_full_replace() {
        let result = validate_update(
            &[1000, 1001],
            &[1000, 1001],
            &[rule(1000, "a.com"), rule(1001, "b.com")],
            10,
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_rules() {
        assert_eq!(
            validate_update(&[], &[], &[rule(0, "a.com")], 10),
            Err(RuleEngineError::InvalidRuleId(0))
        );
        assert_eq!(
            validate_update(&[], &[], &[rule(5, "")], 10),
            Err(RuleEngineError::EmptyUrlFilter(5))
        );
        assert_eq!(
            validate_update(&[], &[], &[rule(5, "a.com"), rule(5, "b.com")], 10),
            Err(RuleEngineError::DuplicateRuleId(5))
        );
        assert_eq!(
            validate_update(&[5], &[], &[rule(5, "a.com")], 10),
            Err(RuleEngineError::RuleIdInUse(5))
        );
    }

    #[test]
    fn test_validate_enforces_quota() {
        assert_eq!(
            validate_update(&[1], &[], &[rule(2, "a.com"), rule(3, "b.com")], 2),
            Err(RuleEngineError::QuotaExceeded {
                requested: 3,
                limit: 2
            })
        );
    }

    #[tokio::test]
    async fn test_memory_engine_rejects_without_changes() {
        let engine = MemoryRuleEngine::new(1);
        engine
            .update_dynamic_rules(&[], &[rule(1000, "a.com")])
            .await
            .unwrap();

        let err = engine
            .update_dynamic_rules(&[], &[rule(1001, "b.com")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RuleEngineError>(),
            Some(RuleEngineError::QuotaExceeded { .. })
        ));
        assert_eq!(engine.dynamic_rules().await.unwrap(), vec![rule(1000, "a.com")]);
        assert_eq!(engine.update_count().await, 1);
    }

    #[tokio::test]
    async fn test_sqlite_engine_round_trip() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let engine = SqliteRuleEngine::new(db.clone(), 100);

        engine
            .update_dynamic_rules(&[], &[rule(1000, "a.com"), rule(1001, "b.com")])
            .await
            .unwrap();
        engine
            .update_dynamic_rules(&[1000, 1001], &[rule(1000, "c.com")])
            .await
            .unwrap();

        assert_eq!(engine.dynamic_rules().await.unwrap(), vec![rule(1000, "c.com")]);
        assert_eq!(db.dynamic_rules().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_engine_validates_before_writing() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let engine = SqliteRuleEngine::new(db, 100);

        let err = engine
            .update_dynamic_rules(&[], &[rule(0, "a.com")])
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RuleEngineError>(),
            Some(&RuleEngineError::InvalidRuleId(0))
        );
        assert!(engine.dynamic_rules().await.unwrap().is_empty());
    }
}
