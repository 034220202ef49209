//! Domain data model for the recipe service (§3).
//!
//! All identifiers are opaque strings assigned by the recipe service; this
//! crate never interprets their internal structure.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type EntityId = String;

/// A recipe snapshot fetched from the recipe service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: EntityId,
    pub slug: String,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
}

/// A single ingredient line on a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: EntityId,
    pub recipe_id: EntityId,
    /// Free-text note as entered by the recipe author.
    pub note: Option<String>,
    /// Original, unnormalized text captured at ingestion time.
    pub original_text: Option<String>,
    pub unit_ref: Option<EntityId>,
    pub food_ref: Option<EntityId>,
    pub quantity: Option<f64>,
}

impl Ingredient {
    /// An ingredient is unparsed when a free-text note exists and at least
    /// one of `unit_ref`/`food_ref` is missing.
    #[must_use]
    pub fn is_unparsed(&self) -> bool {
        let has_text = self.note.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self
                .original_text
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty());
        has_text && (self.unit_ref.is_none() || self.food_ref.is_none())
    }

    /// The text this ingredient contributes to pattern analysis: prefers
    /// `note`, falling back to `original_text`.
    #[must_use]
    pub fn source_text(&self) -> Option<&str> {
        self.note
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.original_text.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: EntityId,
    pub name: String,
    pub abbreviation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// The kind of catalog entity a pattern resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Unit,
    Food,
}

impl PatternKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Food => "food",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStatus {
    Pending,
    Processing,
    Completed,
    Skipped,
}

/// A reference to a single ingredient within a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRef {
    pub recipe_id: EntityId,
    pub ingredient_id: EntityId,
}

/// A group of unparsed ingredients sharing the same canonicalized pattern text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternGroup {
    pub id: String,
    pub kind: PatternKind,
    pub canonical_text: String,
    pub display_text: String,
    pub ingredient_refs: Vec<IngredientRef>,
    pub recipe_ids: Vec<EntityId>,
    #[serde(default)]
    pub similar_group_ids: Vec<String>,
    pub status: PatternStatus,
}

impl PatternGroup {
    #[must_use]
    pub fn ingredient_count(&self) -> usize {
        self.ingredient_refs.len()
    }
}

/// An operator decision applied to every ingredient in a `PatternGroup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchOperation {
    CreateUnit {
        pattern_id: String,
        name: String,
        abbreviation: Option<String>,
        description: Option<String>,
        affected: Vec<IngredientRef>,
    },
    CreateFood {
        pattern_id: String,
        name: String,
        description: Option<String>,
        affected: Vec<IngredientRef>,
    },
    AddFoodAlias {
        pattern_id: String,
        target_entity_id: EntityId,
        alias_text: String,
        affected: Vec<IngredientRef>,
    },
}

impl BatchOperation {
    #[must_use]
    pub fn pattern_id(&self) -> &str {
        match self {
            Self::CreateUnit { pattern_id, .. }
            | Self::CreateFood { pattern_id, .. }
            | Self::AddFoodAlias { pattern_id, .. } => pattern_id,
        }
    }

    #[must_use]
    pub fn affected(&self) -> &[IngredientRef] {
        match self {
            Self::CreateUnit { affected, .. }
            | Self::CreateFood { affected, .. }
            | Self::AddFoodAlias { affected, .. } => affected,
        }
    }

    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::CreateUnit { .. } => "create_unit",
            Self::CreateFood { .. } => "create_food",
            Self::AddFoodAlias { .. } => "add_food_alias",
        }
    }
}

/// A per-ingredient failure recorded in a `BatchResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedUpdate {
    pub ingredient_ref: IngredientRef,
    pub error_kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFinalStatus {
    AllOk,
    Partial,
    Aborted,
}

/// The outcome of running one `BatchOperation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub pattern_id: String,
    pub op_kind: String,
    pub created_entity_id: Option<EntityId>,
    pub succeeded: Vec<IngredientRef>,
    pub failed: Vec<FailedUpdate>,
    pub duration_ms: u64,
    pub final_status: BatchFinalStatus,
}

impl BatchResult {
    #[must_use]
    pub fn classify(&self) -> BatchFinalStatus {
        self.final_status
    }
}

/// An alias attached to a food entity, as recorded in session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasAddition {
    pub food_id: EntityId,
    pub alias: String,
}

/// Aggregate counters persisted alongside `SessionState`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub units_created: u64,
    #[serde(default)]
    pub foods_created: u64,
    #[serde(default)]
    pub aliases_added: u64,
    #[serde(default)]
    pub ingredients_updated: u64,
    #[serde(default)]
    pub patterns_completed: u64,
    #[serde(default)]
    pub patterns_skipped: u64,
}

/// A single entry in the capped `recent_operations` audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentOperation {
    pub ts: chrono::DateTime<chrono::Utc>,
    pub op: String,
    pub pattern_id: String,
    pub count: usize,
    pub status: String,
}

/// Durable operator-progress record, serialized to a single JSON file (§4.4, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub schema_version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub completed_pattern_ids: Vec<String>,
    #[serde(default)]
    pub skipped_pattern_ids: Vec<String>,
    #[serde(default)]
    pub processed_recipe_ids: Vec<EntityId>,
    #[serde(default)]
    pub created_unit_ids: Vec<EntityId>,
    #[serde(default)]
    pub created_food_ids: Vec<EntityId>,
    #[serde(default)]
    pub alias_additions: Vec<AliasAddition>,
    #[serde(default)]
    pub stats: SessionStats,
    #[serde(default)]
    pub recent_operations: Vec<RecentOperation>,
}

impl SessionState {
    #[must_use]
    pub fn new(timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            schema_version: crate::constants::SESSION_SCHEMA_VERSION.to_string(),
            timestamp,
            completed_pattern_ids: Vec::new(),
            skipped_pattern_ids: Vec::new(),
            processed_recipe_ids: Vec::new(),
            created_unit_ids: Vec::new(),
            created_food_ids: Vec::new(),
            alias_additions: Vec::new(),
            stats: SessionStats::default(),
            recent_operations: Vec::new(),
        }
    }

    /// Checks the §3 disjointness invariant: a pattern is never both
    /// completed and skipped at the same time.
    #[must_use]
    pub fn is_disjoint(&self) -> bool {
        let completed: std::collections::HashSet<&str> =
            self.completed_pattern_ids.iter().map(String::as_str).collect();
        !self
            .skipped_pattern_ids
            .iter()
            .any(|id| completed.contains(id.as_str()))
    }

    /// Appends an entry to `recent_operations`, capping the list at
    /// `SESSION_RECENT_OPERATIONS_CAP` (oldest dropped first).
    pub fn push_recent_operation(&mut self, entry: RecentOperation) {
        self.recent_operations.push(entry);
        let cap = crate::constants::SESSION_RECENT_OPERATIONS_CAP;
        if self.recent_operations.len() > cap {
            let excess = self.recent_operations.len() - cap;
            self.recent_operations.drain(0..excess);
        }
    }
}

/// A snapshot of the recipe service's current catalogs, owned by the Orchestrator.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub recipes: Vec<Recipe>,
    pub units: Vec<Unit>,
    pub foods: Vec<Food>,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn units_by_name_lower(&self) -> HashMap<String, &Unit> {
        self.units
            .iter()
            .map(|u| (u.name.to_lowercase(), u))
            .collect()
    }

    #[must_use]
    pub fn food_by_id(&self, id: &str) -> Option<&Food> {
        self.foods.iter().find(|f| f.id == id)
    }

    /// True if `name` collides case-insensitively with an existing unit's
    /// name, abbreviation, or alias equivalents (units have no aliases, but
    /// the name/abbreviation pair is checked both ways).
    #[must_use]
    pub fn unit_name_or_abbreviation_taken(&self, name: &str, abbreviation: Option<&str>) -> bool {
        let name_lower = name.to_lowercase();
        let abbrev_lower = abbreviation.map(str::to_lowercase);
        self.units.iter().any(|u| {
            u.name.to_lowercase() == name_lower
                || abbrev_lower
                    .as_deref()
                    .is_some_and(|a| u.abbreviation.as_deref().map(str::to_lowercase).as_deref() == Some(a))
                || u.abbreviation.as_deref().map(str::to_lowercase).as_deref() == Some(name_lower.as_str())
        })
    }

    #[must_use]
    pub fn food_name_taken(&self, name: &str) -> bool {
        let name_lower = name.to_lowercase();
        self.foods.iter().any(|f| {
            f.name.to_lowercase() == name_lower
                || f.aliases.iter().any(|a| a.to_lowercase() == name_lower)
        })
    }
}
