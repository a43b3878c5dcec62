use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use cineseek::app::{build_router, AppState};
use cineseek::error::CatalogError;
use cineseek::models::{CandidateItem, CatalogHit, MediaKind, RegionOffers, WatchProvider};
use cineseek::tmdb::CatalogApi;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;

#[derive(Default)]
struct FakeTmdb {
    search: HashMap<String, Vec<CatalogHit>>,
    related: HashMap<(MediaKind, i64), Vec<CandidateItem>>,
    providers: HashMap<(MediaKind, i64), HashMap<String, RegionOffers>>,
    fail_search: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl CatalogApi for FakeTmdb {
    async fn multi_search(&self, query: &str) -> Result<Vec<CatalogHit>, CatalogError> {
        self.calls.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_search {
            return Err(CatalogError::Status {
                status: 500,
                url: "/search/multi".to_string(),
                body: "boom".to_string(),
            });
        }
        Ok(self.search.get(query).cloned().unwrap_or_default())
    }

    async fn related_titles(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> Result<Vec<CandidateItem>, CatalogError> {
        self.calls.lock().unwrap().push(format!("related:{}:{}", kind.as_str(), id));
        Ok(self.related.get(&(kind, id)).cloned().unwrap_or_default())
    }

    async fn watch_providers(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> Result<HashMap<String, RegionOffers>, CatalogError> {
        self.calls.lock().unwrap().push(format!("providers:{}:{}", kind.as_str(), id));
        Ok(self.providers.get(&(kind, id)).cloned().unwrap_or_default())
    }
}

fn title(id: i64, name: &str, kind: MediaKind, popularity: f64) -> CandidateItem {
    CandidateItem {
        id,
        title: name.to_string(),
        kind,
        poster_path: Some(format!("/{id}.jpg")),
        popularity,
        vote_average: 7.0,
        genre_ids: vec![18],
    }
}

fn rated(mut item: CandidateItem, vote_average: f64, genre_ids: &[i64]) -> CandidateItem {
    item.vote_average = vote_average;
    item.genre_ids = genre_ids.to_vec();
    item
}

fn streaming(provider_id: i64, name: &str) -> RegionOffers {
    RegionOffers {
        link: None,
        flatrate: vec![WatchProvider {
            provider_id,
            provider_name: name.to_string(),
            logo_path: None,
        }],
        buy: Vec::new(),
        rent: Vec::new(),
    }
}

fn heat_catalog() -> FakeTmdb {
    let mut search = HashMap::new();
    search.insert(
        "Heat".to_string(),
        vec![
            CatalogHit::Title(rated(title(949, "Heat", MediaKind::Movie, 40.0), 7.9, &[80, 18])),
            CatalogHit::Title(rated(title(1, "Heat", MediaKind::Series, 60.0), 8.4, &[80])),
            CatalogHit::Title(rated(title(2, "Heat Wave", MediaKind::Movie, 5.0), 4.1, &[80])),
        ],
    );
    FakeTmdb {
        search,
        ..Default::default()
    }
}

fn app_with(tmdb: FakeTmdb) -> (Router, Arc<FakeTmdb>) {
    let tmdb = Arc::new(tmdb);
    let state = AppState::new(tmdb.clone(), Duration::from_secs(2));
    (build_router(state), tmdb)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header("x-real-ip", "192.0.2.10")
        .body(Body::empty())
        .expect("failed to build request")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = app_with(FakeTmdb::default());
    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_ranks_exact_hits_above_typo_hits() {
    let mut search = HashMap::new();
    search.insert(
        "Inecption".to_string(),
        vec![
            CatalogHit::Title(title(1, "Inecption", MediaKind::Movie, 1.5)),
            CatalogHit::Other,
        ],
    );
    // Swapping the transposed letters back gives the intended title.
    search.insert(
        "inception".to_string(),
        vec![
            CatalogHit::Title(title(27205, "Inception", MediaKind::Movie, 80.0)),
            CatalogHit::Title(title(1, "Inecption", MediaKind::Movie, 1.5)),
            CatalogHit::Title(title(5000, "Inception: The Cobol Job", MediaKind::Series, 95.0)),
        ],
    );
    let (app, tmdb) = app_with(FakeTmdb {
        search,
        ..Default::default()
    });

    let res = app.oneshot(get("/search?query=Inecption")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let results = body["results"].as_array().unwrap();

    let ids: Vec<i64> = results.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 5000, 27205]);
    assert_eq!(results[1]["mediaType"], "tv");
    assert_eq!(results[1]["posterPath"], "/5000.jpg");
    assert!(results[0].get("tier").is_none());

    let calls = tmdb.calls.lock().unwrap();
    assert_eq!(calls[0], "Inecption");
    assert!(calls.contains(&"inception".to_string()));
    assert_eq!(calls.len(), 13);
}

#[tokio::test]
async fn search_requires_a_query() {
    let (app, _) = app_with(FakeTmdb::default());
    let res = app.clone().oneshot(get("/search")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "query required");

    let res = app.oneshot(get("/search?query=%20%20")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn short_query_returns_empty_without_calls() {
    let (app, tmdb) = app_with(FakeTmdb::default());
    let res = app.oneshot(get("/search?query=a")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!({ "results": [] }));
    assert!(tmdb.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn search_unavailable_when_every_call_fails() {
    let (app, tmdb) = app_with(FakeTmdb {
        fail_search: true,
        ..Default::default()
    });
    let res = app.oneshot(get("/search?query=Inception")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(res).await["error"], "search unavailable");
    assert_eq!(tmdb.calls.lock().unwrap().len(), 13);
}

#[tokio::test]
async fn search_times_out() {
    let tmdb = Arc::new(FakeTmdb {
        delay: Some(Duration::from_millis(200)),
        ..Default::default()
    });
    let app = build_router(AppState::new(tmdb.clone(), Duration::from_millis(50)));

    let res = app.oneshot(get("/search?query=Inception")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(res).await["error"], "search timed out");
    assert_eq!(tmdb.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn over_long_query_returns_empty_without_calls() {
    let (app, tmdb) = app_with(FakeTmdb::default());
    let uri = format!("/search?query={}", "abcdefghij".repeat(11));
    let res = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!({ "results": [] }));
    assert!(tmdb.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn search_filters_by_type_genre_and_rating() {
    let (app, _) = app_with(heat_catalog());

    let res = app
        .clone()
        .oneshot(get("/search?query=Heat&type=movie&genre=80&minRating=7"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["id"], 949);
    assert_eq!(body["results"][0]["voteAverage"], 7.9);

    let res = app.oneshot(get("/search?query=Heat&type=tv")).await.unwrap();
    let body = json_body(res).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["mediaType"], "tv");
}

#[tokio::test]
async fn malformed_filters_are_rejected() {
    let (app, tmdb) = app_with(heat_catalog());
    let res = app
        .oneshot(get("/search?query=Heat&minRating=high"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "invalid search parameters");
    assert!(tmdb.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn search_attaches_country_availability() {
    let mut tmdb = heat_catalog();
    let mut heat = HashMap::new();
    heat.insert("US".to_string(), streaming(8, "Netflix"));
    tmdb.providers.insert((MediaKind::Movie, 949), heat);
    let mut show = HashMap::new();
    show.insert("US".to_string(), streaming(9, "Prime Video"));
    tmdb.providers.insert((MediaKind::Series, 1), show);
    let (app, _) = app_with(tmdb);

    let res = app
        .clone()
        .oneshot(get("/search?query=Heat&country=us"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["country"], "US");
    let results = body["results"].as_array().unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 949, 2]);
    assert_eq!(
        results[1]["availability"]["flatrate"][0]["providerName"],
        "Netflix"
    );
    assert_eq!(
        results[2]["availability"]["note"],
        "Not available in selected country"
    );

    let res = app
        .oneshot(get("/search?query=Heat&country=US&provider=8"))
        .await
        .unwrap();
    let body = json_body(res).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], 949);
}

#[tokio::test]
async fn search_is_rate_limited_per_ip() {
    let (app, _) = app_with(FakeTmdb::default());
    for _ in 0..70 {
        let res = app.clone().oneshot(get("/search?query=x")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = app.oneshot(get("/search?query=x")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn groups_library_rows() {
    let (app, _) = app_with(FakeTmdb::default());
    let rows = json!([
        { "contentId": 603, "mediaType": "movie", "title": "The Matrix",
          "seasonNumber": 0, "addedAt": "2024-01-05T00:00:00Z", "posterPath": "/m.jpg" },
        { "contentId": 1399, "mediaType": "tv", "title": "Game of Thrones - Season 2",
          "seasonNumber": 2, "addedAt": "2024-02-01T00:00:00Z", "posterPath": "/s2.jpg" },
        { "contentId": 1399, "mediaType": "tv", "title": "Game of Thrones - Season 1",
          "seasonNumber": 1, "addedAt": "2024-01-01T00:00:00Z", "posterPath": "/s1.jpg" },
        { "contentId": 1399, "mediaType": "tv", "title": "Game of Thrones - Season 4",
          "seasonNumber": 4, "addedAt": "2023-12-01T00:00:00Z", "posterPath": null }
    ]);

    let res = app.oneshot(post_json("/library/grouped", rows)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let groups = body.as_array().unwrap();
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0]["title"], "Game of Thrones");
    assert_eq!(groups[0]["seasonInfo"], "Seasons 1-2, 4");
    assert_eq!(groups[0]["posterPath"], "/s1.jpg");
    assert_eq!(groups[0]["seasons"], json!([1, 2, 4]));

    assert_eq!(groups[1]["title"], "The Matrix");
    assert!(groups[1]["seasonInfo"].is_null());
}

#[tokio::test]
async fn recommends_from_watched_titles() {
    let mut related = HashMap::new();
    related.insert(
        (MediaKind::Movie, 603),
        vec![
            title(604, "The Matrix Reloaded", MediaKind::Movie, 40.0),
            title(27205, "Inception", MediaKind::Movie, 90.0),
        ],
    );
    related.insert(
        (MediaKind::Series, 1399),
        vec![title(94997, "House of the Dragon", MediaKind::Series, 120.0)],
    );
    let (app, tmdb) = app_with(FakeTmdb {
        related,
        ..Default::default()
    });

    let body = json!({
        "watched": [
            { "contentId": 603, "mediaType": "movie", "title": "The Matrix",
              "watchedAt": "2024-03-01T00:00:00Z" },
            { "contentId": 27205, "mediaType": "movie", "title": "Inception",
              "watchedAt": "2024-02-01T00:00:00Z" },
            { "contentId": 1399, "mediaType": "tv", "title": "Game of Thrones - Season 1",
              "seasonNumber": 1, "watchedAt": "2024-01-01T00:00:00Z" }
        ]
    });
    let res = app
        .oneshot(post_json("/recommendations", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let recs = json_body(res).await;
    let ids: Vec<i64> = recs
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![94997, 604]);
    assert_eq!(tmdb.calls.lock().unwrap().len(), 3);
}
