//! Rendering layer for pattern lists and batch summaries.
//!
//! Owns the `println!` calls for the interactive run loop's tabular output.

use crate::model::{BatchFinalStatus, BatchResult, PatternGroup, PatternStatus};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct PatternRow {
    #[tabled(rename = "pattern")]
    id_prefix: String,
    kind: &'static str,
    text: String,
    ingredients: usize,
    recipes: usize,
    status: &'static str,
}

impl From<&PatternGroup> for PatternRow {
    fn from(group: &PatternGroup) -> Self {
        Self {
            id_prefix: group.id.chars().take(8).collect(),
            kind: group.kind.as_str(),
            text: group.display_text.clone(),
            ingredients: group.ingredient_count(),
            recipes: group.recipe_ids.len(),
            status: status_label(group.status),
        }
    }
}

const fn status_label(status: PatternStatus) -> &'static str {
    match status {
        PatternStatus::Pending => "pending",
        PatternStatus::Processing => "processing",
        PatternStatus::Completed => "completed",
        PatternStatus::Skipped => "skipped",
    }
}

/// Renders a table of pending patterns for the operator to pick from.
#[must_use]
pub fn render_pattern_table(groups: &[&PatternGroup]) -> String {
    let rows: Vec<PatternRow> = groups.iter().map(|g| PatternRow::from(*g)).collect();
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct BatchResultRow {
    field: &'static str,
    value: String,
}

/// Renders a one-batch summary: outcome, counts, and duration.
#[must_use]
pub fn render_batch_result(result: &BatchResult) -> String {
    let rows = vec![
        BatchResultRow { field: "pattern", value: result.pattern_id.chars().take(8).collect() },
        BatchResultRow { field: "operation", value: result.op_kind.clone() },
        BatchResultRow { field: "status", value: final_status_label(result.final_status).to_string() },
        BatchResultRow { field: "succeeded", value: result.succeeded.len().to_string() },
        BatchResultRow { field: "failed", value: result.failed.len().to_string() },
        BatchResultRow { field: "duration_ms", value: result.duration_ms.to_string() },
    ];
    Table::new(rows).to_string()
}

const fn final_status_label(status: BatchFinalStatus) -> &'static str {
    match status {
        BatchFinalStatus::AllOk => "all_ok",
        BatchFinalStatus::Partial => "partial",
        BatchFinalStatus::Aborted => "aborted",
    }
}

/// Prints an informational message. Centralized so quiet/json-errors modes
/// can suppress it in one place later.
pub fn info(msg: impl std::fmt::Display) {
    // ast-grep-ignore: no-println
    println!("{msg}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatternKind;

    fn group(id: &str, status: PatternStatus) -> PatternGroup {
        PatternGroup {
            id: id.to_string(),
            kind: PatternKind::Food,
            canonical_text: "butter".to_string(),
            display_text: "a knob of butter".to_string(),
            ingredient_refs: Vec::new(),
            recipe_ids: vec!["r1".to_string()],
            similar_group_ids: Vec::new(),
            status,
        }
    }

    #[test]
    fn test_render_pattern_table_includes_display_text() {
        let g = group("abcdef1234", PatternStatus::Pending);
        let rendered = render_pattern_table(&[&g]);
        assert!(rendered.contains("a knob of butter"));
        assert!(rendered.contains("pending"));
    }

    #[test]
    fn test_render_batch_result_includes_counts() {
        let result = BatchResult {
            pattern_id: "abcdef1234".to_string(),
            op_kind: "create_food".to_string(),
            created_entity_id: Some("f1".to_string()),
            succeeded: vec![],
            failed: vec![],
            duration_ms: 42,
            final_status: BatchFinalStatus::AllOk,
        };
        let rendered = render_batch_result(&result);
        assert!(rendered.contains("all_ok"));
        assert!(rendered.contains("42"));
    }
}
