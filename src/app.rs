use crate::availability::{self, DEFAULT_COUNTRY};
use crate::config::Config;
use crate::limits::{client_addr, RequestLimiter};
use crate::models::{CandidateItem, GroupedDisplayRecord, MediaKind, SearchResult, SeasonRecord};
use crate::recommend;
use crate::search::{self, SearchFilter};
use crate::seasons;
use crate::tmdb::{CatalogApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub search_timeout: Duration,
    pub limiter: Arc<Mutex<RequestLimiter>>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogApi>, search_timeout: Duration) -> Self {
        Self {
            catalog,
            search_timeout,
            limiter: Arc::new(Mutex::new(RequestLimiter::default())),
        }
    }

    async fn admit(&self, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        let client = client_addr(headers);
        let minute = Utc::now().timestamp() / 60;
        let admitted = self.limiter.lock().await.admit(&client, minute);
        admitted.map_err(|rejected| {
            warn!(client = %client, ?rejected, "Rate limit exceeded");
            error_body(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded")
        })
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::from_config(&config));
    info!(
        "Searching TMDB in {} with a {}s deadline",
        config.tmdb_language,
        config.search_timeout.as_secs()
    );

    let app = build_router(AppState::new(catalog, config.search_timeout));

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", get(search_titles))
        .route("/library/grouped", post(group_library))
        .route("/recommendations", post(recommendations))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    query: Option<String>,
    #[serde(rename = "type")]
    kind: Option<MediaKind>,
    genre: Option<i64>,
    min_rating: Option<f64>,
    country: Option<String>,
    provider: Option<i64>,
}

async fn search_titles(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    if let Err(limited) = state.admit(&headers).await {
        return limited.into_response();
    }

    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!("Rejected search parameters: {}", rejection);
            return error_body(StatusCode::BAD_REQUEST, "invalid search parameters")
                .into_response();
        }
    };
    let Some(query) = params.query.filter(|q| !q.trim().is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "query required").into_response();
    };
    let filter = SearchFilter {
        kind: params.kind,
        genre: params.genre,
        min_rating: params.min_rating,
    };

    // Dropping the search future on timeout abandons the remaining variant calls.
    let ranked = tokio::time::timeout(
        state.search_timeout,
        search::rank(state.catalog.as_ref(), &query),
    )
    .await;

    let items = match ranked {
        Ok(Ok(items)) => filter.apply(items),
        Ok(Err(e)) => {
            error!("Search for '{}' failed: {}", query, e);
            return error_body(StatusCode::SERVICE_UNAVAILABLE, "search unavailable")
                .into_response();
        }
        Err(_) => {
            warn!(
                "Search for '{}' exceeded {}ms",
                query,
                state.search_timeout.as_millis()
            );
            return error_body(StatusCode::SERVICE_UNAVAILABLE, "search timed out")
                .into_response();
        }
    };

    if params.country.is_none() && params.provider.is_none() {
        let results: Vec<SearchResult> = items.into_iter().map(SearchResult::from).collect();
        return Json(json!({ "results": results })).into_response();
    }

    let country = params
        .country
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());
    let results =
        availability::attach(state.catalog.clone(), items, &country, params.provider).await;
    Json(json!({ "results": results, "country": country })).into_response()
}

async fn group_library(
    Json(records): Json<Vec<SeasonRecord>>,
) -> Json<Vec<GroupedDisplayRecord>> {
    Json(seasons::group(&records))
}

#[derive(Debug, Deserialize)]
struct RecommendationRequest {
    #[serde(default)]
    watched: Vec<SeasonRecord>,
}

async fn recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<Vec<CandidateItem>>, (StatusCode, Json<Value>)> {
    state.admit(&headers).await?;
    let recommended = recommend::recommend(state.catalog.clone(), &request.watched).await;
    Ok(Json(recommended))
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
