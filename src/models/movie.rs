use serde::{Deserialize, Serialize};

/// MovieLens movie identifier
pub type MovieId = u32;

/// One row of the movie catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub title: String,
    /// Pipe-separated genre list, e.g. `Adventure|Animation|Children`
    pub genres: String,
}

impl Movie {
    pub fn genre_list(&self) -> impl Iterator<Item = &str> {
        self.genres.split('|').filter(|g| !g.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_uses_catalog_field_names() {
        let movie = Movie {
            movie_id: 1,
            title: "Toy Story (1995)".to_string(),
            genres: "Adventure|Animation|Children".to_string(),
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["movieId"], 1);
        assert_eq!(json["title"], "Toy Story (1995)");
        assert_eq!(json["genres"], "Adventure|Animation|Children");
    }

    #[test]
    fn test_genre_list() {
        let movie = Movie {
            movie_id: 2,
            title: "Jumanji (1995)".to_string(),
            genres: "Adventure|Children|Fantasy".to_string(),
        };
        let genres: Vec<&str> = movie.genre_list().collect();
        assert_eq!(genres, vec!["Adventure", "Children", "Fantasy"]);
    }
}
