//! Typo-tolerant title search: query variants, catalog fan-out and ranking.

use std::collections::HashSet;

use crate::models::TitleKey;

mod filter;
mod rank;
mod variants;

pub use filter::SearchFilter;
pub use rank::{rank, validate_query, MAX_VARIANT_CALLS, SOFT_RESULT_CAP};
pub use variants::{generate, normalize};

/// Insertion-ordered collection keyed by title identity. The first value stored
/// for a key wins; later ones are dropped.
#[derive(Debug)]
pub(crate) struct TitleAccumulator<T> {
    keys: HashSet<TitleKey>,
    items: Vec<T>,
}

impl<T> TitleAccumulator<T> {
    pub(crate) fn new() -> Self {
        Self {
            keys: HashSet::new(),
            items: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: TitleKey, value: T) -> bool {
        if !self.keys.insert(key) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn into_vec(self) -> Vec<T> {
        self.items
    }
}
