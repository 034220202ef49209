//! Integration-level tests for `BatchExecutor` against a hand-written
//! `RemoteClient` fake, covering the conflict-retry heuristic and
//! alias-attach preflight checks that the in-crate unit tests don't reach.

use async_trait::async_trait;
use garde::batch::{BatchConfig, BatchExecutor};
use garde::error::Error;
use garde::model::{
    BatchFinalStatus, BatchOperation, CatalogSnapshot, Food, IngredientRef, Recipe, Unit,
};
use garde::remote::RemoteClient;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct FakeRemote {
    create_unit_calls: AtomicUsize,
    create_food_calls: AtomicUsize,
    add_alias_calls: AtomicUsize,
    fail_alias_as_already_exists: bool,
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, Error> {
        Ok(Vec::new())
    }
    async fn list_units(&self) -> Result<Vec<Unit>, Error> {
        Ok(Vec::new())
    }
    async fn list_foods(&self) -> Result<Vec<Food>, Error> {
        Ok(Vec::new())
    }
    async fn create_unit(&self, _name: &str, _abbreviation: Option<&str>) -> Result<String, Error> {
        let n = self.create_unit_calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            Err(Error::conflict("unit already exists"))
        } else {
            Ok("u-new".to_string())
        }
    }
    async fn create_food(&self, _name: &str) -> Result<String, Error> {
        let n = self.create_food_calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            Err(Error::conflict("food already exists"))
        } else {
            Ok("f-new".to_string())
        }
    }
    async fn add_food_alias(&self, _food_id: &str, _alias: &str) -> Result<(), Error> {
        self.add_alias_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_alias_as_already_exists {
            Err(Error::conflict("alias already exists"))
        } else {
            Ok(())
        }
    }
    async fn update_ingredient(
        &self,
        _ingredient_ref: &IngredientRef,
        _unit_ref: Option<&str>,
        _food_ref: Option<&str>,
    ) -> Result<(), Error> {
        Ok(())
    }
}

fn ingredient_ref(id: &str) -> IngredientRef {
    IngredientRef {
        recipe_id: "r1".to_string(),
        ingredient_id: id.to_string(),
    }
}

#[tokio::test]
async fn test_conflict_on_create_unit_retries_once_when_not_in_cached_catalog() {
    // Simulates a race: the unit was created by someone else between our
    // cache snapshot and our create call. The cached catalog doesn't know
    // about it, so the 409 is treated as a stale-cache race, not a genuine
    // duplicate, and the create is retried.
    let remote = Arc::new(FakeRemote::default());
    let executor = BatchExecutor::new(Arc::clone(&remote), BatchConfig::default());
    let op = BatchOperation::CreateUnit {
        pattern_id: "p1".to_string(),
        name: "teaspoon".to_string(),
        abbreviation: Some("tsp".to_string()),
        description: None,
        affected: vec![ingredient_ref("i1")],
    };
    let catalog = CatalogSnapshot::default();

    let result = executor.execute(&op, &catalog).await;

    assert_eq!(result.final_status, BatchFinalStatus::AllOk);
    assert_eq!(result.created_entity_id.as_deref(), Some("u-new"));
    assert_eq!(remote.create_unit_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_conflict_on_create_food_aborts_when_cache_confirms_duplicate() {
    // Here the cached catalog already lists the food, so the 409 is a real
    // duplicate and the operation aborts without a second create attempt.
    let remote = Arc::new(FakeRemote::default());
    let executor = BatchExecutor::new(Arc::clone(&remote), BatchConfig::default());
    let op = BatchOperation::CreateFood {
        pattern_id: "p2".to_string(),
        name: "kale".to_string(),
        description: None,
        affected: vec![ingredient_ref("i1")],
    };
    let catalog = CatalogSnapshot {
        foods: vec![Food {
            id: "f1".to_string(),
            name: "kale".to_string(),
            aliases: Vec::new(),
        }],
        ..Default::default()
    };

    let result = executor.execute(&op, &catalog).await;

    assert_eq!(result.final_status, BatchFinalStatus::Aborted);
    assert_eq!(remote.create_food_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_alias_already_attached_in_cache_aborts_at_preflight() {
    let remote = Arc::new(FakeRemote::default());
    let executor = BatchExecutor::new(Arc::clone(&remote), BatchConfig::default());
    let catalog = CatalogSnapshot {
        foods: vec![Food {
            id: "f1".to_string(),
            name: "courgette".to_string(),
            aliases: vec!["zucchini".to_string()],
        }],
        ..Default::default()
    };
    let op = BatchOperation::AddFoodAlias {
        pattern_id: "p3".to_string(),
        target_entity_id: "f1".to_string(),
        alias_text: "zucchini".to_string(),
        affected: vec![ingredient_ref("i1")],
    };

    let result = executor.execute(&op, &catalog).await;

    assert_eq!(result.final_status, BatchFinalStatus::Aborted);
    // Preflight caught it before any remote call was attempted.
    assert_eq!(remote.add_alias_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_alias_conflict_from_remote_is_treated_as_success() {
    // The alias attach races with another client and the remote reports a
    // conflict; since the end state (alias attached) matches what we
    // wanted, this should not abort the batch.
    let remote = Arc::new(FakeRemote {
        fail_alias_as_already_exists: true,
        ..Default::default()
    });
    let executor = BatchExecutor::new(Arc::clone(&remote), BatchConfig::default());
    let catalog = CatalogSnapshot {
        foods: vec![Food {
            id: "f1".to_string(),
            name: "courgette".to_string(),
            aliases: Vec::new(),
        }],
        ..Default::default()
    };
    let op = BatchOperation::AddFoodAlias {
        pattern_id: "p3".to_string(),
        target_entity_id: "f1".to_string(),
        alias_text: "zucchini".to_string(),
        affected: vec![ingredient_ref("i1")],
    };

    let result = executor.execute(&op, &catalog).await;

    assert_eq!(result.final_status, BatchFinalStatus::AllOk);
    assert_eq!(result.created_entity_id.as_deref(), Some("f1"));
}

#[tokio::test]
async fn test_preflight_rejects_blank_food_name_before_any_remote_call() {
    let remote = Arc::new(FakeRemote::default());
    let executor = BatchExecutor::new(Arc::clone(&remote), BatchConfig::default());
    let op = BatchOperation::CreateFood {
        pattern_id: "p4".to_string(),
        name: "   ".to_string(),
        description: None,
        affected: vec![ingredient_ref("i1")],
    };
    let catalog = CatalogSnapshot::default();

    let result = executor.execute(&op, &catalog).await;

    assert_eq!(result.final_status, BatchFinalStatus::Aborted);
    assert_eq!(remote.create_food_calls.load(Ordering::SeqCst), 0);
}
