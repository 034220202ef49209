//! Pattern Analyzer (§4.2): converts a recipe snapshot into `PatternGroup`s.
//!
//! Pure function, no I/O. Grouping is driven entirely by a canonicalized
//! pattern text hash so the same input always produces the same groups.

mod canonical;
mod fragment;

pub use canonical::canonicalize;
pub use fragment::{isolate_unit_fragment, UnitDictionary};

use crate::model::{Ingredient, IngredientRef, PatternGroup, PatternKind, PatternStatus, Recipe, Unit};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Builds a unit dictionary from the cached unit catalog, then groups every
/// unparsed ingredient across `recipes` into `PatternGroup`s.
#[must_use]
pub fn analyze(recipes: &[Recipe], units: &[Unit]) -> Vec<PatternGroup> {
    let dictionary = UnitDictionary::from_units(units);
    let mut groups: HashMap<String, PatternGroup> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for recipe in recipes {
        for ingredient in &recipe.ingredients {
            if !ingredient.is_unparsed() {
                continue;
            }
            let Some(text) = ingredient.source_text() else {
                continue;
            };

            if ingredient.unit_ref.is_none() {
                if let Some(group_key) = pattern_for_kind(PatternKind::Unit, text, &dictionary, ingredient, recipe) {
                    merge_group(&mut groups, &mut order, group_key);
                }
            }
            if ingredient.food_ref.is_none() {
                if let Some(group_key) = pattern_for_kind(PatternKind::Food, text, &dictionary, ingredient, recipe) {
                    merge_group(&mut groups, &mut order, group_key);
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .collect()
}

/// One ingredient's contribution to a `PatternGroup`, before merging.
struct PatternContribution {
    pattern_id: String,
    kind: PatternKind,
    canonical_text: String,
    display_text: String,
    ingredient_ref: IngredientRef,
    recipe_id: String,
}

fn pattern_for_kind(
    kind: PatternKind,
    text: &str,
    dictionary: &UnitDictionary,
    ingredient: &Ingredient,
    recipe: &Recipe,
) -> Option<PatternContribution> {
    let (unit_fragment, food_fragment) = isolate_unit_fragment(text, dictionary);
    let fragment = match kind {
        PatternKind::Unit if !unit_fragment.is_empty() => unit_fragment,
        PatternKind::Unit => text.to_string(),
        PatternKind::Food if !food_fragment.trim().is_empty() => food_fragment,
        PatternKind::Food => text.to_string(),
    };

    let canonical_text = canonicalize(&fragment);
    if canonical_text.is_empty() || is_purely_numeric(&canonical_text) || is_purely_punctuation(&canonical_text) {
        return None;
    }

    let pattern_id = compute_pattern_id(kind, &canonical_text);
    Some(PatternContribution {
        pattern_id,
        kind,
        canonical_text,
        display_text: fragment.trim().to_string(),
        ingredient_ref: IngredientRef {
            recipe_id: recipe.id.clone(),
            ingredient_id: ingredient.id.clone(),
        },
        recipe_id: recipe.id.clone(),
    })
}

fn merge_group(groups: &mut HashMap<String, PatternGroup>, order: &mut Vec<String>, c: PatternContribution) {
    groups
        .entry(c.pattern_id.clone())
        .and_modify(|group| {
            group.ingredient_refs.push(c.ingredient_ref.clone());
            if !group.recipe_ids.contains(&c.recipe_id) {
                group.recipe_ids.push(c.recipe_id.clone());
            }
        })
        .or_insert_with(|| {
            order.push(c.pattern_id.clone());
            PatternGroup {
                id: c.pattern_id,
                kind: c.kind,
                canonical_text: c.canonical_text,
                display_text: c.display_text,
                ingredient_refs: vec![c.ingredient_ref],
                recipe_ids: vec![c.recipe_id],
                similar_group_ids: Vec::new(),
                status: PatternStatus::Pending,
            }
        });
}

/// `pattern_id = hash(kind || '\x1f' || canonical_text)`.
#[must_use]
pub fn compute_pattern_id(kind: PatternKind, canonical_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(canonical_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_purely_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit() || c == '.' || c.is_whitespace())
}

/// True when `text` carries no alphanumeric content at all, Unicode or
/// ASCII — stray punctuation left over after fragment isolation, not a
/// pattern in its own right.
fn is_purely_punctuation(text: &str) -> bool {
    !text.is_empty() && !text.chars().any(char::is_alphanumeric)
}
