//! Movie catalog and the title -> row lookup table.
//!
//! Row positions are shared with the TF-IDF matrix: row `i` of the matrix
//! describes `Catalog::row(i)`.

use std::collections::HashMap;

use serde::Deserialize;

use super::error::{ArtifactError, ArtifactResult};
use crate::models::{Movie, MovieId};

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Vec<Movie>")]
pub struct Catalog {
    movies: Vec<Movie>,
    positions: HashMap<MovieId, usize>,
}

impl TryFrom<Vec<Movie>> for Catalog {
    type Error = ArtifactError;

    fn try_from(movies: Vec<Movie>) -> ArtifactResult<Self> {
        Catalog::new(movies)
    }
}

impl Catalog {
    pub fn new(movies: Vec<Movie>) -> ArtifactResult<Self> {
        let mut positions = HashMap::with_capacity(movies.len());
        for (row, movie) in movies.iter().enumerate() {
            if positions.insert(movie.movie_id, row).is_some() {
                return Err(ArtifactError::malformed(
                    "movies",
                    format!("movieId {} appears more than once", movie.movie_id),
                ));
            }
        }
        Ok(Self { movies, positions })
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn row(&self, row: usize) -> Option<&Movie> {
        self.movies.get(row)
    }

    pub fn get(&self, movie_id: MovieId) -> Option<&Movie> {
        self.positions.get(&movie_id).map(|&row| &self.movies[row])
    }

    /// Row of the first catalog movie whose id, written in decimal, is one
    /// of `ids`. Catalog order decides, not the order of `ids`.
    pub fn first_match<S: AsRef<str>>(&self, ids: &[S]) -> Option<usize> {
        ids.iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let parsed = id.parse::<MovieId>().ok()?;
                // "007" and "+7" never equal a rendered id
                (parsed.to_string() == id).then_some(parsed)
            })
            .filter_map(|movie_id| self.positions.get(&movie_id).copied())
            .min()
    }

    /// Case-insensitive substring search over titles, in catalog order
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Movie> {
        let needle = query.to_lowercase();
        self.movies
            .iter()
            .filter(|movie| movie.title.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

/// Maps a movie title to its catalog row
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TitleIndex(HashMap<String, usize>);

impl TitleIndex {
    /// Builds the index from the catalog. When a title repeats, the first
    /// row wins.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut rows = HashMap::with_capacity(catalog.len());
        for (row, movie) in catalog.movies().iter().enumerate() {
            rows.entry(movie.title.clone()).or_insert(row);
        }
        Self(rows)
    }

    pub fn get(&self, title: &str) -> Option<usize> {
        self.0.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn check_rows(&self, nrows: usize) -> ArtifactResult<()> {
        match self.0.iter().find(|(_, row)| **row >= nrows) {
            Some((title, row)) => Err(ArtifactError::Inconsistent(format!(
                "title '{}' points at row {} but the catalog has {} rows",
                title, row, nrows
            ))),
            None => Ok(()),
        }
    }
}
