//! Batch Executor (§4.5): turns one `BatchOperation` into one `BatchResult`,
//! maintaining all invariants even under partial failure.

use crate::constants::DEFAULT_BATCH_WIDTH;
use crate::error::{Error, ErrorKind};
use crate::model::{
    BatchFinalStatus, BatchOperation, BatchResult, CatalogSnapshot, FailedUpdate, IngredientRef,
};
use crate::remote::RemoteClient;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Configuration for the fan-out worker pool (§5: W must not exceed the
/// connection pool size).
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_BATCH_WIDTH,
        }
    }
}

pub struct BatchExecutor<R: RemoteClient> {
    remote: Arc<R>,
    config: BatchConfig,
}

impl<R: RemoteClient + 'static> BatchExecutor<R> {
    #[must_use]
    pub const fn new(remote: Arc<R>, config: BatchConfig) -> Self {
        Self { remote, config }
    }

    /// Runs the full pipeline for one `BatchOperation` against `catalog`.
    ///
    /// Never returns `Err`; all failures are captured in the returned
    /// `BatchResult`'s `final_status` and `failed` list, per §4.5.
    pub async fn execute(&self, op: &BatchOperation, catalog: &CatalogSnapshot) -> BatchResult {
        let started = Instant::now();

        if let Err(message) = preflight_validate(op, catalog) {
            return aborted_result(op, started, &message);
        }

        let created_entity_id = match self.mutate_catalog(op, catalog).await {
            Ok(id) => id,
            Err(message) => return aborted_result(op, started, &message),
        };

        let (succeeded, failed) = self.fan_out(op, created_entity_id.as_deref()).await;
        Self::finish(op, started, created_entity_id, succeeded, failed)
    }

    /// Re-runs only the previously failed ingredient set against the
    /// already-created entity; no second catalog mutation is attempted.
    pub async fn retry_failed(&self, op: &BatchOperation, prev: &BatchResult) -> BatchResult {
        let started = Instant::now();
        let retry_refs: Vec<IngredientRef> =
            prev.failed.iter().map(|f| f.ingredient_ref.clone()).collect();

        let (retried_ok, retried_failed) = self
            .fan_out_refs(op, prev.created_entity_id.as_deref(), &retry_refs)
            .await;

        let mut succeeded = prev.succeeded.clone();
        succeeded.extend(retried_ok);

        Self::finish(op, started, prev.created_entity_id.clone(), succeeded, retried_failed)
    }

    async fn mutate_catalog(
        &self,
        op: &BatchOperation,
        catalog: &CatalogSnapshot,
    ) -> Result<Option<String>, String> {
        match op {
            BatchOperation::CreateUnit {
                name, abbreviation, ..
            } => self.create_unit_with_conflict_retry(name, abbreviation.as_deref(), catalog).await,
            BatchOperation::CreateFood { name, .. } => {
                self.create_food_with_conflict_retry(name, catalog).await
            }
            BatchOperation::AddFoodAlias {
                target_entity_id,
                alias_text,
                ..
            } => match self.remote.add_food_alias(target_entity_id, alias_text).await {
                Ok(()) => Ok(Some(target_entity_id.clone())),
                Err(e) if is_alias_already_exists(&e) => Ok(Some(target_entity_id.clone())),
                Err(e) => Err(e.to_string()),
            },
        }
    }

    async fn create_unit_with_conflict_retry(
        &self,
        name: &str,
        abbreviation: Option<&str>,
        catalog: &CatalogSnapshot,
    ) -> Result<Option<String>, String> {
        match self.remote.create_unit(name, abbreviation).await {
            Ok(id) => Ok(Some(id)),
            Err(e) if is_permanent_conflict(&e) => {
                if catalog.unit_name_or_abbreviation_taken(name, abbreviation) {
                    Err(format!("unit '{name}' already exists"))
                } else {
                    self.remote
                        .create_unit(name, abbreviation)
                        .await
                        .map(Some)
                        .map_err(|e| e.to_string())
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }

    async fn create_food_with_conflict_retry(
        &self,
        name: &str,
        catalog: &CatalogSnapshot,
    ) -> Result<Option<String>, String> {
        match self.remote.create_food(name).await {
            Ok(id) => Ok(Some(id)),
            Err(e) if is_permanent_conflict(&e) => {
                if catalog.food_name_taken(name) {
                    Err(format!("food '{name}' already exists"))
                } else {
                    self.remote.create_food(name).await.map(Some).map_err(|e| e.to_string())
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }

    async fn fan_out(
        &self,
        op: &BatchOperation,
        created_entity_id: Option<&str>,
    ) -> (Vec<IngredientRef>, Vec<FailedUpdate>) {
        self.fan_out_refs(op, created_entity_id, op.affected()).await
    }

    async fn fan_out_refs(
        &self,
        op: &BatchOperation,
        created_entity_id: Option<&str>,
        refs: &[IngredientRef],
    ) -> (Vec<IngredientRef>, Vec<FailedUpdate>) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = Vec::with_capacity(refs.len());

        for ingredient_ref in refs {
            let permit = Arc::clone(&semaphore);
            let remote = Arc::clone(&self.remote);
            let ingredient_ref = ingredient_ref.clone();
            let (unit_ref, food_ref) = patch_for(op, created_entity_id);

            tasks.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await;
                let result = remote
                    .update_ingredient(&ingredient_ref, unit_ref.as_deref(), food_ref.as_deref())
                    .await;
                (ingredient_ref, result)
            }));
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for task in tasks {
            match task.await {
                Ok((ingredient_ref, Ok(()))) => succeeded.push(ingredient_ref),
                Ok((ingredient_ref, Err(e))) => failed.push(FailedUpdate {
                    ingredient_ref,
                    error_kind: e.kind().map_or("unknown", |k| k.as_str()).to_string(),
                    message: e.to_string(),
                }),
                Err(join_err) => {
                    tracing::error!(target: "garde::batch", "ingredient update task panicked: {join_err}");
                }
            }
        }
        (succeeded, failed)
    }

    fn finish(
        op: &BatchOperation,
        started: Instant,
        created_entity_id: Option<String>,
        succeeded: Vec<IngredientRef>,
        failed: Vec<FailedUpdate>,
    ) -> BatchResult {
        let final_status = if failed.is_empty() {
            BatchFinalStatus::AllOk
        } else if succeeded.is_empty() {
            BatchFinalStatus::Aborted
        } else {
            BatchFinalStatus::Partial
        };

        BatchResult {
            pattern_id: op.pattern_id().to_string(),
            op_kind: op.kind_str().to_string(),
            created_entity_id,
            succeeded,
            failed,
            duration_ms: started.elapsed().as_millis().try_into().unwrap_or(u64::MAX),
            final_status,
        }
    }
}

fn patch_for(op: &BatchOperation, created_entity_id: Option<&str>) -> (Option<String>, Option<String>) {
    match op {
        BatchOperation::CreateUnit { .. } => (created_entity_id.map(String::from), None),
        BatchOperation::CreateFood { .. } => (None, created_entity_id.map(String::from)),
        BatchOperation::AddFoodAlias { target_entity_id, .. } => {
            (None, Some(target_entity_id.clone()))
        }
    }
}

fn aborted_result(op: &BatchOperation, started: Instant, message: &str) -> BatchResult {
    tracing::warn!(target: "garde::batch", "batch operation aborted: {message}");
    BatchResult {
        pattern_id: op.pattern_id().to_string(),
        op_kind: op.kind_str().to_string(),
        created_entity_id: None,
        succeeded: Vec::new(),
        failed: Vec::new(),
        duration_ms: started.elapsed().as_millis().try_into().unwrap_or(u64::MAX),
        final_status: BatchFinalStatus::Aborted,
    }
}

fn is_permanent_conflict(error: &Error) -> bool {
    error.kind() == Some(ErrorKind::Conflict)
}

fn is_alias_already_exists(error: &Error) -> bool {
    is_permanent_conflict(error) && error.to_string().to_lowercase().contains("alias")
}

/// Pre-flight validation against cached catalogs only (§4.5 step 1). No
/// remote writes are attempted here.
fn preflight_validate(op: &BatchOperation, catalog: &CatalogSnapshot) -> Result<(), String> {
    match op {
        BatchOperation::CreateUnit {
            name, abbreviation, ..
        } => {
            if name.trim().is_empty() {
                return Err("unit name must not be empty".to_string());
            }
            if catalog.unit_name_or_abbreviation_taken(name, abbreviation.as_deref()) {
                return Err(format!("unit '{name}' already exists"));
            }
            Ok(())
        }
        BatchOperation::CreateFood { name, .. } => {
            if name.trim().is_empty() {
                return Err("food name must not be empty".to_string());
            }
            if catalog.food_name_taken(name) {
                return Err(format!("food '{name}' already exists"));
            }
            Ok(())
        }
        BatchOperation::AddFoodAlias {
            target_entity_id,
            alias_text,
            ..
        } => {
            let Some(food) = catalog.food_by_id(target_entity_id) else {
                return Err(format!("food '{target_entity_id}' not found in cache"));
            };
            if alias_text.trim().is_empty() {
                return Err("alias text must not be empty".to_string());
            }
            if food.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias_text)) {
                return Err(format!("alias '{alias_text}' already attached to '{target_entity_id}'"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Food;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRemote {
        update_failures: Mutex<std::collections::HashSet<String>>,
    }

    #[async_trait]
    impl RemoteClient for FakeRemote {
        async fn list_recipes(&self) -> Result<Vec<crate::model::Recipe>, Error> {
            Ok(Vec::new())
        }
        async fn list_units(&self) -> Result<Vec<crate::model::Unit>, Error> {
            Ok(Vec::new())
        }
        async fn list_foods(&self) -> Result<Vec<Food>, Error> {
            Ok(Vec::new())
        }
        async fn create_unit(&self, _name: &str, _abbreviation: Option<&str>) -> Result<String, Error> {
            Ok("new-unit-id".to_string())
        }
        async fn create_food(&self, _name: &str) -> Result<String, Error> {
            Ok("new-food-id".to_string())
        }
        async fn add_food_alias(&self, _food_id: &str, _alias: &str) -> Result<(), Error> {
            Ok(())
        }
        async fn update_ingredient(
            &self,
            ingredient_ref: &IngredientRef,
            _unit_ref: Option<&str>,
            _food_ref: Option<&str>,
        ) -> Result<(), Error> {
            if self.update_failures.lock().unwrap().contains(&ingredient_ref.ingredient_id) {
                Err(Error::not_found("ingredient vanished"))
            } else {
                Ok(())
            }
        }
    }

    fn ingredient_ref(id: &str) -> IngredientRef {
        IngredientRef {
            recipe_id: "r1".to_string(),
            ingredient_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_all_ok_marks_completed() {
        let remote = Arc::new(FakeRemote::default());
        let executor = BatchExecutor::new(remote, BatchConfig::default());
        let op = BatchOperation::CreateUnit {
            pattern_id: "p1".to_string(),
            name: "teaspoon".to_string(),
            abbreviation: Some("tsp".to_string()),
            description: None,
            affected: vec![ingredient_ref("i1"), ingredient_ref("i2")],
        };
        let catalog = CatalogSnapshot::default();
        let result = executor.execute(&op, &catalog).await;
        assert_eq!(result.final_status, BatchFinalStatus::AllOk);
        assert_eq!(result.succeeded.len(), 2);
        assert!(result.failed.is_empty());
        assert_eq!(result.created_entity_id.as_deref(), Some("new-unit-id"));
    }

    #[tokio::test]
    async fn test_execute_aborts_on_preflight_failure() {
        let remote = Arc::new(FakeRemote::default());
        let executor = BatchExecutor::new(remote, BatchConfig::default());
        let op = BatchOperation::CreateUnit {
            pattern_id: "p1".to_string(),
            name: String::new(),
            abbreviation: None,
            description: None,
            affected: vec![ingredient_ref("i1")],
        };
        let catalog = CatalogSnapshot::default();
        let result = executor.execute(&op, &catalog).await;
        assert_eq!(result.final_status, BatchFinalStatus::Aborted);
        assert!(result.created_entity_id.is_none());
    }

    #[tokio::test]
    async fn test_execute_partial_on_some_ingredient_failures() {
        let remote = Arc::new(FakeRemote::default());
        remote.update_failures.lock().unwrap().insert("i2".to_string());
        let executor = BatchExecutor::new(remote, BatchConfig::default());
        let op = BatchOperation::CreateFood {
            pattern_id: "p2".to_string(),
            name: "kale".to_string(),
            description: None,
            affected: vec![ingredient_ref("i1"), ingredient_ref("i2")],
        };
        let catalog = CatalogSnapshot::default();
        let result = executor.execute(&op, &catalog).await;
        assert_eq!(result.final_status, BatchFinalStatus::Partial);
        assert_eq!(result.succeeded.len(), 1);
        assert_eq!(result.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_retry_failed_only_resubmits_failed_subset() {
        let remote = Arc::new(FakeRemote::default());
        remote.update_failures.lock().unwrap().insert("i2".to_string());
        let executor = BatchExecutor::new(remote, BatchConfig::default());
        let op = BatchOperation::CreateFood {
            pattern_id: "p2".to_string(),
            name: "kale".to_string(),
            description: None,
            affected: vec![ingredient_ref("i1"), ingredient_ref("i2")],
        };
        let catalog = CatalogSnapshot::default();
        let first = executor.execute(&op, &catalog).await;
        assert_eq!(first.failed.len(), 1);

        executor.remote.update_failures.lock().unwrap().clear();
        let retried = executor.retry_failed(&op, &first).await;
        assert_eq!(retried.final_status, BatchFinalStatus::AllOk);
        assert_eq!(retried.succeeded.len(), 2);
    }
}
