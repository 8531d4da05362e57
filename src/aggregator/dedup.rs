//! Result deduplication by exact URL, first occurrence wins.
//!
//! Unlike fuzzy URL canonicalisation, the fact-check pipeline compares
//! result URLs verbatim: the accumulated batches come from one provider,
//! so equal pages arrive with byte-identical URLs. Insertion order is
//! preserved, so earlier stages outrank later ones by position.

use std::collections::HashSet;

use crate::types::SearchResult;

/// Remove later entries whose `url` exactly matches an earlier entry's,
/// then truncate to `cap`.
///
/// Idempotent: deduping an already-deduped, capped sequence returns the
/// same sequence.
pub fn dedupe(results: Vec<SearchResult>, cap: usize) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    let mut unique: Vec<SearchResult> = Vec::with_capacity(results.len().min(cap));

    for result in results {
        if unique.len() >= cap {
            break;
        }
        if seen.insert(result.url.clone()) {
            unique.push(result);
        }
    }

    unique
}
