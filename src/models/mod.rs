use serde::{Deserialize, Serialize};

pub mod movie;

pub use movie::{Movie, MovieId};

/// Request body for `POST /recommendations`
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: i64,
    /// Movie ids as decimal strings
    pub favorite_movies: Vec<String>,
}

/// A recommended movie with its predicted rating
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredMovie {
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub title: String,
    pub genres: String,
    pub score: f64,
}

impl ScoredMovie {
    pub fn new(movie: &Movie, score: f64) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            genres: movie.genres.clone(),
            score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<ScoredMovie>,
}
