use anyhow::Result;
use focusflow_storage::BlockRule;
use std::sync::Arc;

use crate::rule_engine::RuleEngine;

/// Swaps the installed rule set for a freshly compiled one
#[derive(Clone)]
pub struct RuleApplier {
    engine: Arc<dyn RuleEngine>,
}

impl RuleApplier {
    #[must_use]
    pub fn new(engine: Arc<dyn RuleEngine>) -> Self {
        Self { engine }
    }

    /// Replace everything installed with `rules` in one update, returning the new ids
    ///
    /// # Errors
    ///
    /// Returns the rule engine's error; nothing is retried
    pub async fn apply(&self, rules: Vec<BlockRule>) -> Result<Vec<u32>> {
        let current_ids = self.installed_ids().await?;
        let new_ids: Vec<u32> = rules.iter().map(|rule| rule.id).collect();

        log::info!(
            "Updating rules: removing {} rules, adding {} rules.",
            current_ids.len(),
            rules.len()
        );

        self.engine
            .update_dynamic_rules(&current_ids, &rules)
            .await?;
        Ok(new_ids)
    }

    /// Remove every installed rule
    ///
    /// # Errors
    ///
    /// Returns the rule engine's error
    pub async fn clear(&self) -> Result<()> {
        let current_ids = self.installed_ids().await?;
        log::info!("Clearing {} rules.", current_ids.len());
        self.engine.update_dynamic_rules(&current_ids, &[]).await
    }

    /// Ids of the rules currently installed
    ///
    /// # Errors
    ///
    /// Returns the rule engine's error
    pub async fn installed_ids(&self) -> Result<Vec<u32>> {
        Ok(self
            .engine
            .dynamic_rules()
            .await?
            .iter()
            .map(|rule| rule.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule_engine::{MemoryRuleEngine, RuleEngineError};
    use crate::rules::RuleCompiler;
    use focusflow_storage::{BlockedSite, SiteType};

    fn sites() -> Vec<BlockedSite> {
        vec![
            BlockedSite::new("reddit.com", SiteType::Focus).unwrap(),
            BlockedSite::new("casino.example", SiteType::Permanent).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_apply_replaces_installed_rules() {
        let engine = Arc::new(MemoryRuleEngine::new(100));
        let applier = RuleApplier::new(engine.clone());
        let compiler = RuleCompiler::new("focusflow://blocked").unwrap();

        let ids = applier.apply(compiler.compile(&sites(), true)).await.unwrap();
        assert_eq!(ids, vec![1000, 1001]);

        let ids = applier.apply(compiler.compile(&sites(), false)).await.unwrap();
        assert_eq!(ids, vec![1000]);

        let installed = engine.dynamic_rules().await.unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].url_filter, "||casino.example");
    }

    #[tokio::test]
    async fn test_apply_twice_is_idempotent() {
        let engine = Arc::new(MemoryRuleEngine::new(100));
        let applier = RuleApplier::new(engine.clone());
        let compiler = RuleCompiler::new("focusflow://blocked").unwrap();

        applier.apply(compiler.compile(&sites(), true)).await.unwrap();
        let first = engine.dynamic_rules().await.unwrap();
        applier.apply(compiler.compile(&sites(), true)).await.unwrap();
        let second = engine.dynamic_rules().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.update_count().await, 2);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let engine = Arc::new(MemoryRuleEngine::new(100));
        let applier = RuleApplier::new(engine.clone());
        let compiler = RuleCompiler::new("focusflow://blocked").unwrap();

        applier.apply(compiler.compile(&sites(), true)).await.unwrap();
        applier.clear().await.unwrap();
        assert!(applier.installed_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_failure_propagates() {
        let engine = Arc::new(MemoryRuleEngine::new(1));
        let applier = RuleApplier::new(engine.clone());
        let compiler = RuleCompiler::new("focusflow://blocked").unwrap();

        let err = applier
            .apply(compiler.compile(&sites(), true))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RuleEngineError>(),
            Some(&RuleEngineError::QuotaExceeded {
                requested: 2,
                limit: 1
            })
        );
        assert!(engine.dynamic_rules().await.unwrap().is_empty());
    }
}
