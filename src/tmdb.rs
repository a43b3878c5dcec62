use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::CatalogError;
use crate::models::{CandidateItem, CatalogHit, MediaKind, RegionOffers, WatchProvider};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const POSTER_BASE: &str = "https://image.tmdb.org/t/p/original";

/// Catalog capability consumed by search and recommendations.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Free-text search over movies, shows and people, first page only.
    async fn multi_search(&self, query: &str) -> Result<Vec<CatalogHit>, CatalogError>;

    /// Titles related to a movie (recommendations) or a show (similar shows).
    async fn related_titles(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> Result<Vec<CandidateItem>, CatalogError>;

    /// Streaming, purchase and rental offers, keyed by ISO 3166-1 country code.
    async fn watch_providers(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> Result<HashMap<String, RegionOffers>, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tmdb_api_key.clone(), config.tmdb_language.clone())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let mut url = format!(
            "{TMDB_BASE}{path}?api_key={}&language={}&page=1",
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.language)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        let res = self.client.get(&url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                // The key is part of the query string, keep it out of errors and logs.
                url: path.to_string(),
                body: text,
            });
        }
        debug!(path, bytes = text.len(), "TMDB response received");
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn multi_search(&self, query: &str) -> Result<Vec<CatalogHit>, CatalogError> {
        let data: MultiSearchResponse = self
            .get_json("/search/multi", &[("query", query), ("include_adult", "false")])
            .await?;
        Ok(data.results.into_iter().map(CatalogHit::from).collect())
    }

    async fn related_titles(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> Result<Vec<CandidateItem>, CatalogError> {
        let path = match kind {
            MediaKind::Movie => format!("/movie/{id}/recommendations"),
            MediaKind::Series => format!("/tv/{id}/similar"),
        };
        let data: RelatedResponse = self.get_json(&path, &[]).await?;
        Ok(data
            .results
            .into_iter()
            .map(|entry| entry.into_candidate(kind))
            .collect())
    }

    async fn watch_providers(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> Result<HashMap<String, RegionOffers>, CatalogError> {
        let path = format!("/{}/{id}/watch/providers", kind.as_str());
        let data: ProvidersResponse = self.get_json(&path, &[]).await?;
        Ok(data
            .results
            .into_iter()
            .map(|(country, region)| (country, region.into()))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct MultiSearchResponse {
    #[serde(default)]
    results: Vec<MultiSearchEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "media_type")]
enum MultiSearchEntry {
    #[serde(rename = "movie")]
    Movie(MovieEntry),
    #[serde(rename = "tv")]
    Tv(ShowEntry),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MovieEntry {
    id: i64,
    #[serde(default)]
    title: String,
    poster_path: Option<String>,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    genre_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct ShowEntry {
    id: i64,
    #[serde(default)]
    name: String,
    poster_path: Option<String>,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    genre_ids: Vec<i64>,
}

impl From<MultiSearchEntry> for CatalogHit {
    fn from(entry: MultiSearchEntry) -> Self {
        match entry {
            MultiSearchEntry::Movie(m) => CatalogHit::Title(CandidateItem {
                id: m.id,
                title: m.title,
                kind: MediaKind::Movie,
                poster_path: m.poster_path,
                popularity: m.popularity,
                vote_average: m.vote_average,
                genre_ids: m.genre_ids,
            }),
            MultiSearchEntry::Tv(s) => CatalogHit::Title(CandidateItem {
                id: s.id,
                title: s.name,
                kind: MediaKind::Series,
                poster_path: s.poster_path,
                popularity: s.popularity,
                vote_average: s.vote_average,
                genre_ids: s.genre_ids,
            }),
            MultiSearchEntry::Other => CatalogHit::Other,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RelatedResponse {
    #[serde(default)]
    results: Vec<RelatedEntry>,
}

// `/tv/{id}/similar` omits `media_type`, so related entries carry the seed's kind.
#[derive(Debug, Deserialize)]
struct RelatedEntry {
    id: i64,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    genre_ids: Vec<i64>,
}

impl RelatedEntry {
    fn into_candidate(self, kind: MediaKind) -> CandidateItem {
        CandidateItem {
            id: self.id,
            title: self.title.or(self.name).unwrap_or_default(),
            kind,
            poster_path: self.poster_path,
            popularity: self.popularity,
            vote_average: self.vote_average,
            genre_ids: self.genre_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProvidersResponse {
    #[serde(default)]
    results: HashMap<String, RegionEntry>,
}

#[derive(Debug, Deserialize)]
struct RegionEntry {
    link: Option<String>,
    #[serde(default)]
    flatrate: Vec<ProviderEntry>,
    #[serde(default)]
    buy: Vec<ProviderEntry>,
    #[serde(default)]
    rent: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    provider_id: i64,
    #[serde(default)]
    provider_name: String,
    logo_path: Option<String>,
}

impl From<RegionEntry> for RegionOffers {
    fn from(region: RegionEntry) -> Self {
        let convert = |entries: Vec<ProviderEntry>| -> Vec<WatchProvider> {
            entries
                .into_iter()
                .map(|p| WatchProvider {
                    provider_id: p.provider_id,
                    provider_name: p.provider_name,
                    logo_path: p.logo_path,
                })
                .collect()
        };
        RegionOffers {
            link: region.link,
            flatrate: convert(region.flatrate),
            buy: convert(region.buy),
            rent: convert(region.rent),
        }
    }
}

pub fn poster_url(path: &str) -> String {
    format!("{POSTER_BASE}{path}")
}
