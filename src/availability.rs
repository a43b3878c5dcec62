use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::models::{Availability, CandidateItem, SearchResult};
use crate::tmdb::CatalogApi;

/// Results that get a watch-provider lookup; the rest are dropped.
pub const ENRICHED_RESULTS: usize = 10;
pub const DEFAULT_COUNTRY: &str = "IN";
const NOT_IN_COUNTRY: &str = "Not available in selected country";

/// Attach `country`'s watch offers to the top ranked titles.
///
/// With `provider`, offers are narrowed to that provider and titles it does not
/// carry are removed. A failed lookup leaves the title without availability.
pub async fn attach(
    catalog: Arc<dyn CatalogApi>,
    items: Vec<CandidateItem>,
    country: &str,
    provider: Option<i64>,
) -> Vec<SearchResult> {
    let items: Vec<CandidateItem> = items.into_iter().take(ENRICHED_RESULTS).collect();

    let mut tasks = JoinSet::new();
    for (slot, item) in items.iter().enumerate() {
        let catalog = catalog.clone();
        let (kind, id) = (item.kind, item.id);
        tasks.spawn(async move { (slot, catalog.watch_providers(kind, id).await) });
    }

    let mut found: Vec<Option<Availability>> = vec![None; items.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, Ok(mut regions))) => {
                found[slot] = Some(match regions.remove(country) {
                    Some(offers) => Availability::Offers(offers),
                    None => Availability::Missing {
                        note: NOT_IN_COUNTRY,
                    },
                });
            }
            Ok((slot, Err(e))) => {
                warn!(id = items[slot].id, "Watch provider lookup failed: {}", e);
            }
            Err(e) => warn!("Watch provider task failed: {}", e),
        }
    }

    let results: Vec<SearchResult> = items
        .into_iter()
        .zip(found)
        .filter_map(|(item, availability)| match provider {
            None => Some(SearchResult { item, availability }),
            Some(provider_id) => match availability {
                Some(Availability::Offers(mut offers)) => {
                    offers.retain_provider(provider_id).then(|| SearchResult {
                        item,
                        availability: Some(Availability::Offers(offers)),
                    })
                }
                _ => None,
            },
        })
        .collect();

    debug!(country, ?provider, kept = results.len(), "Availability attached");
    results
}
