use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::models::{CandidateItem, SeasonRecord, TitleKey};
use crate::search::TitleAccumulator;
use crate::seasons::parse_timestamp;
use crate::tmdb::CatalogApi;

const MAX_SEEDS: usize = 20;
const PER_SEED: usize = 5;
const MAX_RECOMMENDATIONS: usize = 40;

/// Titles related to what the user watched most recently, most popular first.
///
/// Each of the latest watched titles contributes its top related titles; a failed
/// lookup contributes nothing. Already-watched titles are never suggested.
pub async fn recommend(
    catalog: Arc<dyn CatalogApi>,
    watched: &[SeasonRecord],
) -> Vec<CandidateItem> {
    let watched_keys: HashSet<TitleKey> = watched.iter().map(SeasonRecord::key).collect();
    let seeds = recent_seeds(watched);
    if seeds.is_empty() {
        return Vec::new();
    }

    let mut tasks = JoinSet::new();
    for (slot, seed) in seeds.iter().copied().enumerate() {
        let catalog = catalog.clone();
        tasks.spawn(async move {
            let related = catalog.related_titles(seed.kind, seed.id).await;
            (slot, seed, related)
        });
    }

    let mut batches: Vec<Vec<CandidateItem>> = vec![Vec::new(); seeds.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, _, Ok(items))) => {
                batches[slot] = items.into_iter().take(PER_SEED).collect();
            }
            Ok((_, seed, Err(e))) => {
                let kind = seed.kind.as_str();
                warn!(kind, id = seed.id, "Related titles failed: {}", e);
            }
            Err(e) => warn!("Related titles task failed: {}", e),
        }
    }

    let mut acc = TitleAccumulator::new();
    for item in batches.into_iter().flatten() {
        let key = item.key();
        if !watched_keys.contains(&key) {
            acc.insert(key, item);
        }
    }

    let mut items = acc.into_vec();
    items.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
    items.truncate(MAX_RECOMMENDATIONS);

    info!(seeds = seeds.len(), results = items.len(), "Recommendations built");
    items
}

fn recent_seeds(watched: &[SeasonRecord]) -> Vec<TitleKey> {
    let mut ordered: Vec<&SeasonRecord> = watched.iter().collect();
    ordered.sort_by_key(|record| std::cmp::Reverse(parse_timestamp(&record.timestamp)));

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .map(SeasonRecord::key)
        .filter(|key| seen.insert(*key))
        .take(MAX_SEEDS)
        .collect()
}
