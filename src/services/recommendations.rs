use crate::{
    error::{AppError, AppResult},
    ml::ModelStore,
    models::{RecommendationRequest, ScoredMovie},
};

/// Knobs for one ranking pass
#[derive(Debug, Clone, Copy)]
pub struct RecommendSettings {
    /// Neighbours fetched from the index, the query movie included
    pub n_neighbors: usize,
    /// Length of the returned list
    pub top_n: usize,
}

/// Generates recommendations for one user
///
/// The first favourite found in the catalog seeds a content-similarity
/// lookup; its nearest TF-IDF neighbours are then scored with the rating
/// predictor for this user and the best `top_n` are returned, highest
/// predicted rating first.
pub fn recommend(
    store: &ModelStore,
    request: &RecommendationRequest,
    settings: RecommendSettings,
) -> AppResult<Vec<ScoredMovie>> {
    let catalog = store.catalog();

    let seed_row = catalog
        .first_match(&request.favorite_movies)
        .ok_or_else(|| AppError::NotFound("No valid movies found in the request.".to_string()))?;
    let seed = catalog
        .row(seed_row)
        .ok_or_else(|| AppError::Internal(format!("catalog row {} vanished", seed_row)))?;

    let idx = store.titles().get(&seed.title).ok_or_else(|| {
        AppError::NotFound(format!(
            "Movie title '{}' not found in database.",
            seed.title
        ))
    })?;

    let neighbors = store
        .neighbors()
        .kneighbors_of_row(idx, settings.n_neighbors)
        .ok_or_else(|| AppError::Internal(format!("no matrix row {}", idx)))?;

    let user = request.user_id.to_string();
    let predictor = store.predictor();
    let mut scored: Vec<ScoredMovie> = neighbors
        .iter()
        .filter(|n| n.index != idx)
        .take(settings.n_neighbors.saturating_sub(1))
        .filter_map(|n| catalog.row(n.index))
        .map(|movie| {
            let prediction = predictor.predict(&user, &movie.movie_id.to_string());
            ScoredMovie::new(movie, prediction.estimate)
        })
        .collect();

    let candidates = scored.len();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(settings.top_n);

    tracing::info!(
        user_id = request.user_id,
        seed_movie = seed.movie_id,
        seed_title = %seed.title,
        candidates,
        returned = scored.len(),
        "Ranked recommendations"
    );

    Ok(scored)
}
