use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv", alias = "series")]
    Series,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

/// A movie or show returned by the catalog, ready to hand back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    pub id: i64,
    pub title: String,
    #[serde(rename = "mediaType")]
    pub kind: MediaKind,
    pub poster_path: Option<String>,
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

impl CandidateItem {
    pub fn key(&self) -> TitleKey {
        TitleKey {
            kind: self.kind,
            id: self.id,
        }
    }
}

/// Identity of a title across searches and library records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TitleKey {
    pub kind: MediaKind,
    pub id: i64,
}

/// One entry of a catalog search, resolved at the adapter boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogHit {
    Title(CandidateItem),
    /// People, collections and anything else the catalog may add.
    Other,
}

impl CatalogHit {
    pub fn into_title(self) -> Option<CandidateItem> {
        match self {
            CatalogHit::Title(item) => Some(item),
            CatalogHit::Other => None,
        }
    }
}

/// Where a title can be watched in one country.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionOffers {
    pub link: Option<String>,
    pub flatrate: Vec<WatchProvider>,
    pub buy: Vec<WatchProvider>,
    pub rent: Vec<WatchProvider>,
}

impl RegionOffers {
    /// Keep only offers from `provider_id`. Returns false when nothing is left.
    pub fn retain_provider(&mut self, provider_id: i64) -> bool {
        for offers in [&mut self.flatrate, &mut self.buy, &mut self.rent] {
            offers.retain(|p| p.provider_id == provider_id);
        }
        !(self.flatrate.is_empty() && self.buy.is_empty() && self.rent.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProvider {
    pub provider_id: i64,
    pub provider_name: String,
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Availability {
    Offers(RegionOffers),
    Missing { note: &'static str },
}

/// A ranked title, with availability when the caller asked for a country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub item: CandidateItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
}

impl From<CandidateItem> for SearchResult {
    fn from(item: CandidateItem) -> Self {
        Self {
            item,
            availability: None,
        }
    }
}

/// A watchlist or watched row as stored by the library layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    pub content_id: i64,
    pub media_type: MediaKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub season_number: Option<u32>,
    /// `addedAt` for watchlist rows, `watchedAt` for watched rows.
    #[serde(alias = "addedAt", alias = "watchedAt")]
    pub timestamp: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl SeasonRecord {
    pub fn key(&self) -> TitleKey {
        TitleKey {
            kind: self.media_type,
            id: self.content_id,
        }
    }

    /// Season number, with `0` treated the same as absent.
    pub fn season(&self) -> Option<u32> {
        self.season_number.filter(|s| *s > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedDisplayRecord {
    pub content_id: i64,
    pub media_type: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    pub season_info: Option<String>,
    pub seasons: Vec<u32>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
