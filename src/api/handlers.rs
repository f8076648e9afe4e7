use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Movie, MovieId, RecommendationRequest, RecommendationResponse},
    services,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub movies: usize,
    pub vocabulary_terms: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        movies: state.store.catalog().len(),
        vocabulary_terms: state.store.vectorizer().vocabulary_size(),
        loaded_at: state.store.loaded_at(),
    })
}

/// Blends content similarity with predicted rating for one user
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = request.user_id,
        favorites = request.favorite_movies.len(),
        "Processing recommendation request"
    );

    let store = state.store.clone();
    let settings = state.settings;
    let recommendations =
        run_blocking(move || services::recommend(&store, &request, settings)).await??;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Recommendations ready"
    );

    Ok(Json(RecommendationResponse { recommendations }))
}

/// Runs CPU-bound work on the blocking pool inside the caller's span, so
/// its events keep the request ID
async fn run_blocking<F, T>(work: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let span = Span::current();
    Ok(tokio::task::spawn_blocking(move || span.in_scope(work)).await?)
}

/// Title search over the catalog
pub async fn search_movies(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = services::search_titles(state.store.catalog(), &params.q, state.search_limit)?;
    Ok(Json(movies))
}

/// Single catalog entry by movie id
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Movie>> {
    movie_id
        .parse::<MovieId>()
        .ok()
        .and_then(|id| state.store.catalog().get(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
}
