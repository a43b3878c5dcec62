use tracing::{debug, info, warn};

use super::variants::{char_len, generate};
use super::TitleAccumulator;
use crate::error::{CatalogError, SearchError};
use crate::models::{CandidateItem, CatalogHit};
use crate::tmdb::CatalogApi;

const MIN_QUERY_CHARS: usize = 2;
// Variant generation is quadratic in word length.
const MAX_QUERY_CHARS: usize = 100;
const MIN_VARIANT_CHARS: usize = 3;
const EXACT_TIER: u8 = 100;
const SAME_LENGTH_TIER: u8 = 80;
const VARIANT_TIER: u8 = 60;

/// Variant searches issued after the exact one, at most.
pub const MAX_VARIANT_CALLS: usize = 12;
/// Variant searches stop once this many titles are collected. Checked between
/// batches, so the final count can go past it.
pub const SOFT_RESULT_CAP: usize = 30;

#[derive(Debug)]
struct Scored {
    tier: u8,
    item: CandidateItem,
}

pub fn validate_query(raw: &str) -> Result<&str, SearchError> {
    let trimmed = raw.trim();
    let len = char_len(trimmed);
    if !(MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&len) {
        return Err(SearchError::InvalidQuery {
            min: MIN_QUERY_CHARS,
            max: MAX_QUERY_CHARS,
        });
    }
    Ok(trimmed)
}

/// Search the catalog for `raw_query` and its typo variants, merged and ranked.
///
/// Queries shorter than two or longer than a hundred characters yield no results
/// and no catalog calls.
/// Individual catalog failures are logged and skipped; an error is returned only
/// when every call made for this query failed.
pub async fn rank(
    catalog: &dyn CatalogApi,
    raw_query: &str,
) -> Result<Vec<CandidateItem>, SearchError> {
    let query = match validate_query(raw_query) {
        Ok(q) => q,
        Err(e) => {
            debug!(query = raw_query, "Skipping search: {}", e);
            return Ok(Vec::new());
        }
    };
    let query_len = char_len(query);
    let lowered = query.to_lowercase();

    let mut acc = TitleAccumulator::new();
    let mut calls = Calls::default();

    if let Some(hits) = calls.record(query, catalog.multi_search(query).await) {
        merge(&mut acc, hits, EXACT_TIER);
    }

    let variants = generate(raw_query);
    let candidates = variants
        .iter()
        .filter(|v| **v != lowered && char_len(v) >= MIN_VARIANT_CHARS)
        .take(MAX_VARIANT_CALLS);

    for variant in candidates {
        if acc.len() >= SOFT_RESULT_CAP {
            debug!(query, collected = acc.len(), "Result cap reached");
            break;
        }
        let tier = if char_len(variant) == query_len {
            SAME_LENGTH_TIER
        } else {
            VARIANT_TIER
        };
        if let Some(hits) = calls.record(variant, catalog.multi_search(variant).await) {
            let added = merge(&mut acc, hits, tier);
            debug!(query, variant = %variant, tier, added, "Variant merged");
        }
    }

    if calls.succeeded == 0 {
        if let Some(last) = calls.last_error {
            return Err(SearchError::Unavailable {
                attempts: calls.attempts,
                last,
            });
        }
    }

    let mut scored = acc.into_vec();
    scored.sort_by(|a, b| {
        b.tier
            .cmp(&a.tier)
            .then_with(|| b.item.popularity.total_cmp(&a.item.popularity))
    });

    info!(
        query,
        results = scored.len(),
        calls = calls.attempts,
        failed = calls.attempts - calls.succeeded,
        "Search ranked"
    );

    Ok(scored.into_iter().map(|s| s.item).collect())
}

fn merge(acc: &mut TitleAccumulator<Scored>, hits: Vec<CatalogHit>, tier: u8) -> usize {
    let mut added = 0;
    for item in hits.into_iter().filter_map(CatalogHit::into_title) {
        if acc.insert(item.key(), Scored { tier, item }) {
            added += 1;
        }
    }
    added
}

#[derive(Default)]
struct Calls {
    attempts: usize,
    succeeded: usize,
    last_error: Option<CatalogError>,
}

impl Calls {
    fn record(
        &mut self,
        query: &str,
        result: Result<Vec<CatalogHit>, CatalogError>,
    ) -> Option<Vec<CatalogHit>> {
        self.attempts += 1;
        match result {
            Ok(hits) => {
                self.succeeded += 1;
                Some(hits)
            }
            Err(e) => {
                warn!(query, "Catalog search failed, skipping: {}", e);
                self.last_error = Some(e);
                None
            }
        }
    }
}
