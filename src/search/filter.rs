use crate::models::{CandidateItem, MediaKind};

/// Optional narrowing of ranked results. Ranked order is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub kind: Option<MediaKind>,
    pub genre: Option<i64>,
    pub min_rating: Option<f64>,
}

impl SearchFilter {
    pub fn matches(&self, item: &CandidateItem) -> bool {
        self.kind.map_or(true, |kind| item.kind == kind)
            && self.genre.map_or(true, |genre| item.genre_ids.contains(&genre))
            && self.min_rating.map_or(true, |min| item.vote_average >= min)
    }

    pub fn apply(&self, items: Vec<CandidateItem>) -> Vec<CandidateItem> {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}
