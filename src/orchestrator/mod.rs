//! Orchestrator (§4.6): the single entry point tying the Remote Client,
//! Pattern Analyzer, Similarity Index, Session Store, and Batch Executor
//! together into one session lifecycle.

use crate::analyzer;
use crate::batch::{BatchConfig, BatchExecutor};
use crate::config::Config;
use crate::error::Error;
use crate::model::{
    BatchOperation, BatchResult, CatalogSnapshot, PatternGroup, PatternStatus, RecentOperation,
    SessionState,
};
use crate::remote::RemoteClient;
use crate::session::{LoadFailure, LoadOutcome, SessionStore};
use crate::similarity;
use std::collections::HashMap;
use std::sync::Arc;

/// What the Orchestrator found when attempting to resume a prior session,
/// surfaced to the CLI layer for an operator decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    StartedFresh,
    Resumed,
    RecoveredFrom(LoadFailure),
}

pub struct Orchestrator<R: RemoteClient, S: SessionStore> {
    remote: Arc<R>,
    store: S,
    executor: BatchExecutor<R>,
    similarity_threshold: f64,
    catalog: CatalogSnapshot,
    patterns: HashMap<String, PatternGroup>,
    pattern_order: Vec<String>,
    session: SessionState,
}

impl<R: RemoteClient + 'static, S: SessionStore> Orchestrator<R, S> {
    /// Fetches the three catalogs, analyzes the snapshot, and reconciles it
    /// against whatever the Session Store has (§4.6 steps 1-4).
    ///
    /// # Errors
    /// Propagates any fatal error from the Remote Client (notably auth
    /// failures, per §7).
    pub async fn bootstrap(remote: Arc<R>, store: S, config: &Config) -> Result<(Self, ResumeOutcome), Error> {
        let (recipes, units, foods) = tokio::try_join!(
            remote.list_recipes(),
            remote.list_units(),
            remote.list_foods(),
        )?;

        let catalog = CatalogSnapshot { recipes, units, foods };
        let mut groups = analyzer::analyze(&catalog.recipes, &catalog.units);
        similarity::index(&mut groups, config.similarity_threshold);

        let (mut session, outcome) = match store.load().await {
            LoadOutcome::Present(state) => (state, ResumeOutcome::Resumed),
            LoadOutcome::Absent(LoadFailure::Missing) => {
                (SessionState::new(now()), ResumeOutcome::StartedFresh)
            }
            LoadOutcome::Absent(failure) => {
                store.discard().await.ok();
                (SessionState::new(now()), ResumeOutcome::RecoveredFrom(failure))
            }
        };

        let mut patterns: HashMap<String, PatternGroup> = HashMap::new();
        let mut pattern_order = Vec::new();
        for mut group in groups {
            reconcile_status(&mut group, &session);
            pattern_order.push(group.id.clone());
            patterns.insert(group.id.clone(), group);
        }

        // Ids whose pattern no longer appears in this fresh analysis are
        // dropped, not carried forward forever (§4.6 step 4, P4).
        session
            .completed_pattern_ids
            .retain(|id| patterns.contains_key(id));
        session
            .skipped_pattern_ids
            .retain(|id| patterns.contains_key(id));

        let executor = BatchExecutor::new(Arc::clone(&remote), BatchConfig {
            concurrency: config.batch_width,
        });

        Ok((
            Self {
                remote,
                store,
                executor,
                similarity_threshold: config.similarity_threshold,
                catalog,
                patterns,
                pattern_order,
                session,
            },
            outcome,
        ))
    }

    #[must_use]
    pub fn pending_patterns(&self) -> Vec<&PatternGroup> {
        self.pattern_order
            .iter()
            .filter_map(|id| self.patterns.get(id))
            .filter(|p| p.status == PatternStatus::Pending)
            .collect()
    }

    #[must_use]
    pub fn pattern(&self, pattern_id: &str) -> Option<&PatternGroup> {
        self.patterns.get(pattern_id)
    }

    /// The most recently fetched catalog snapshot, for operator prompts that
    /// need to look up an existing food by name (e.g. the alias-attach path).
    #[must_use]
    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    /// Marks a pending pattern as skipped and persists the session.
    ///
    /// # Errors
    /// Returns an error if the pattern is unknown/not pending, or if saving
    /// the session fails.
    pub async fn skip(&mut self, pattern_id: &str) -> Result<(), Error> {
        let group = self
            .patterns
            .get_mut(pattern_id)
            .ok_or_else(|| Error::not_found(format!("pattern '{pattern_id}'")))?;
        if group.status != PatternStatus::Pending {
            return Err(Error::validation_error(format!(
                "pattern '{pattern_id}' is not pending"
            )));
        }
        group.status = PatternStatus::Skipped;
        self.session.skipped_pattern_ids.push(pattern_id.to_string());
        self.persist_session().await
    }

    /// Moves a skipped pattern back to pending and persists the session.
    ///
    /// # Errors
    /// Returns an error if the pattern is unknown/not skipped, or if saving
    /// the session fails.
    pub async fn unskip(&mut self, pattern_id: &str) -> Result<(), Error> {
        let group = self
            .patterns
            .get_mut(pattern_id)
            .ok_or_else(|| Error::not_found(format!("pattern '{pattern_id}'")))?;
        if group.status != PatternStatus::Skipped {
            return Err(Error::validation_error(format!(
                "pattern '{pattern_id}' is not skipped"
            )));
        }
        group.status = PatternStatus::Pending;
        self.session.skipped_pattern_ids.retain(|id| id != pattern_id);
        self.persist_session().await
    }

    /// Runs one `BatchOperation` through the executor, folds the result back
    /// into the pattern's status and the session state, refreshes the
    /// affected catalog, and persists (§4.5 steps 6-7).
    ///
    /// # Errors
    /// Returns an error only if persisting the updated session fails; the
    /// `BatchResult` itself never errors (failures are captured inside it).
    pub async fn run_batch(&mut self, op: BatchOperation) -> Result<BatchResult, Error> {
        let pattern_id = op.pattern_id().to_string();
        if let Some(group) = self.patterns.get_mut(&pattern_id) {
            group.status = PatternStatus::Processing;
        }

        let result = self.executor.execute(&op, &self.catalog).await;
        let newly_succeeded = result.succeeded.len();
        self.apply_result(&op, &result, newly_succeeded).await;
        self.persist_session().await?;
        Ok(result)
    }

    /// Re-runs the failed subset of a prior `BatchResult`.
    ///
    /// # Errors
    /// Returns an error only if persisting the updated session fails.
    pub async fn retry_failed(&mut self, op: BatchOperation, prev: &BatchResult) -> Result<BatchResult, Error> {
        let previously_succeeded = prev.succeeded.len();
        let result = self.executor.retry_failed(&op, prev).await;
        // `result.succeeded` is cumulative (prior successes + this retry's),
        // but the prior successes were already counted into
        // `ingredients_updated` the first time around — only the delta from
        // this retry is new.
        let newly_succeeded = result.succeeded.len().saturating_sub(previously_succeeded);
        self.apply_result(&op, &result, newly_succeeded).await;
        self.persist_session().await?;
        Ok(result)
    }

    async fn apply_result(&mut self, op: &BatchOperation, result: &BatchResult, newly_succeeded: usize) {
        use crate::model::BatchFinalStatus;

        let pattern_id = op.pattern_id().to_string();
        if let Some(group) = self.patterns.get_mut(&pattern_id) {
            group.status = match result.final_status {
                BatchFinalStatus::AllOk => PatternStatus::Completed,
                BatchFinalStatus::Partial | BatchFinalStatus::Aborted => PatternStatus::Pending,
            };
        }

        match result.final_status {
            BatchFinalStatus::AllOk => {
                self.session.completed_pattern_ids.push(pattern_id.clone());
                self.session.stats.patterns_completed += 1;
            }
            BatchFinalStatus::Partial | BatchFinalStatus::Aborted => {}
        }

        self.session.stats.ingredients_updated += newly_succeeded as u64;
        if let Some(entity_id) = &result.created_entity_id {
            match op {
                BatchOperation::CreateUnit { .. } => {
                    self.session.created_unit_ids.push(entity_id.clone());
                    self.session.stats.units_created += 1;
                }
                BatchOperation::CreateFood { .. } => {
                    self.session.created_food_ids.push(entity_id.clone());
                    self.session.stats.foods_created += 1;
                }
                BatchOperation::AddFoodAlias { alias_text, .. } => {
                    self.session.alias_additions.push(crate::model::AliasAddition {
                        food_id: entity_id.clone(),
                        alias: alias_text.clone(),
                    });
                    self.session.stats.aliases_added += 1;
                }
            }
        }

        self.session.push_recent_operation(RecentOperation {
            ts: now(),
            op: op.kind_str().to_string(),
            pattern_id,
            count: result.succeeded.len() + result.failed.len(),
            status: final_status_label(result.final_status).to_string(),
        });

        self.refresh_catalog_for(op).await;
    }

    async fn refresh_catalog_for(&mut self, op: &BatchOperation) {
        let refreshed = match op {
            BatchOperation::CreateUnit { .. } => self.remote.list_units().await.map(|units| self.catalog.units = units),
            BatchOperation::CreateFood { .. } | BatchOperation::AddFoodAlias { .. } => {
                self.remote.list_foods().await.map(|foods| self.catalog.foods = foods)
            }
        };
        if let Err(e) = refreshed {
            tracing::warn!(target: "garde::orchestrator", "catalog refresh failed, will retry next batch: {e}");
        }
    }

    async fn persist_session(&mut self) -> Result<(), Error> {
        self.session.timestamp = now();
        self.store.save(&self.session).await
    }

    /// Persists one final `SessionState` on clean exit (§4.6 step 6).
    ///
    /// # Errors
    /// Returns an error if the final save fails.
    pub async fn finalize(&mut self) -> Result<(), Error> {
        self.persist_session().await
    }

    #[must_use]
    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }
}

fn final_status_label(status: crate::model::BatchFinalStatus) -> &'static str {
    use crate::model::BatchFinalStatus;
    match status {
        BatchFinalStatus::AllOk => "all_ok",
        BatchFinalStatus::Partial => "partial",
        BatchFinalStatus::Aborted => "aborted",
    }
}

/// Reconciles one freshly-analyzed pattern against the loaded session: ids
/// already recorded `completed`/`skipped` keep that status; everything else
/// starts `pending` (§4.6 step 4). Patterns no longer present in the fresh
/// analysis simply never get inserted by the caller.
fn reconcile_status(group: &mut PatternGroup, session: &SessionState) {
    if session.completed_pattern_ids.iter().any(|id| id == &group.id) {
        group.status = PatternStatus::Completed;
    } else if session.skipped_pattern_ids.iter().any(|id| id == &group.id) {
        group.status = PatternStatus::Skipped;
    } else {
        group.status = PatternStatus::Pending;
    }
}

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatternKind;

    fn group(id: &str) -> PatternGroup {
        PatternGroup {
            id: id.to_string(),
            kind: PatternKind::Food,
            canonical_text: id.to_string(),
            display_text: id.to_string(),
            ingredient_refs: Vec::new(),
            recipe_ids: Vec::new(),
            similar_group_ids: Vec::new(),
            status: PatternStatus::Pending,
        }
    }

    #[test]
    fn test_reconcile_marks_completed_ids() {
        let mut session = SessionState::new(chrono::Utc::now());
        session.completed_pattern_ids.push("p1".to_string());
        let mut g = group("p1");
        reconcile_status(&mut g, &session);
        assert_eq!(g.status, PatternStatus::Completed);
    }

    #[test]
    fn test_reconcile_marks_skipped_ids() {
        let mut session = SessionState::new(chrono::Utc::now());
        session.skipped_pattern_ids.push("p2".to_string());
        let mut g = group("p2");
        reconcile_status(&mut g, &session);
        assert_eq!(g.status, PatternStatus::Skipped);
    }

    #[test]
    fn test_reconcile_defaults_to_pending() {
        let session = SessionState::new(chrono::Utc::now());
        let mut g = group("p3");
        reconcile_status(&mut g, &session);
        assert_eq!(g.status, PatternStatus::Pending);
    }
}
