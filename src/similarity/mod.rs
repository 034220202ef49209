//! Similarity Index (§4.3): advisory "looks related" suggestions between
//! patterns of the same kind. Never merges automatically.

use crate::constants::SIMILARITY_MAX_CANDIDATES;
use crate::model::{PatternGroup, PatternKind};
use std::collections::HashMap;
use strsim::normalized_levenshtein;

/// Computes, for every pattern in `groups`, up to `SIMILARITY_MAX_CANDIDATES`
/// same-kind candidate pattern ids whose canonical text is similar enough to
/// suggest to the operator, and writes the result into each group's
/// `similar_group_ids`.
///
/// Blocking: only patterns sharing the first two characters of their
/// canonical text, or sharing a simple plural/trailing-s stem, are compared,
/// keeping the cost tractable for large pattern sets.
pub fn index(groups: &mut [PatternGroup], threshold: f64) {
    let buckets = build_blocking_buckets(groups);

    let candidates_by_id: HashMap<String, Vec<String>> = groups
        .iter()
        .map(|group| {
            let candidates = candidates_for(group, groups, &buckets, threshold);
            (group.id.clone(), candidates)
        })
        .collect();

    for group in groups.iter_mut() {
        if let Some(candidates) = candidates_by_id.get(&group.id) {
            group.similar_group_ids = candidates.clone();
        }
    }
}

/// Maps a blocking key to the indices of patterns in `groups` sharing it.
fn build_blocking_buckets(groups: &[PatternGroup]) -> HashMap<String, Vec<usize>> {
    let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, group) in groups.iter().enumerate() {
        for key in blocking_keys(&group.canonical_text) {
            buckets.entry(key).or_default().push(idx);
        }
    }
    buckets
}

fn blocking_keys(canonical_text: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let prefix: String = canonical_text.chars().take(2).collect();
    if !prefix.is_empty() {
        keys.push(prefix);
    }
    let stem = canonical_text.strip_suffix('s').unwrap_or(canonical_text);
    keys.push(format!("stem:{stem}"));
    keys
}

fn candidates_for(
    group: &PatternGroup,
    all: &[PatternGroup],
    buckets: &HashMap<String, Vec<usize>>,
    threshold: f64,
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut scored: Vec<(f64, &str)> = Vec::new();

    for key in blocking_keys(&group.canonical_text) {
        let Some(indices) = buckets.get(&key) else {
            continue;
        };
        for &idx in indices {
            let candidate = &all[idx];
            if candidate.id == group.id || candidate.kind != group.kind {
                continue;
            }
            if !seen.insert(candidate.id.clone()) {
                continue;
            }
            let ratio = normalized_levenshtein(&group.canonical_text, &candidate.canonical_text);
            if ratio >= threshold || shares_stem(&group.canonical_text, &candidate.canonical_text) {
                scored.push((ratio, &candidate.id));
            }
        }
    }

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(SIMILARITY_MAX_CANDIDATES)
        .map(|(_, id)| id.to_string())
        .collect()
}

fn shares_stem(a: &str, b: &str) -> bool {
    let stem_a = a.strip_suffix('s').unwrap_or(a);
    let stem_b = b.strip_suffix('s').unwrap_or(b);
    !stem_a.is_empty() && stem_a == stem_b
}
