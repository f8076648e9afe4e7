//! Pre-trained recommendation artifacts and the in-memory store serving them.
//!
//! Six JSON artifacts live in one directory:
//!
//! - `movies.json`: catalog rows (`movieId`, `title`, `genres`)
//! - `title_indices.json`: title -> catalog row
//! - `tfidf_vectorizer.json`: fitted vocabulary and idf weights
//! - `tfidf_matrix.json`: one TF-IDF row per catalog row, CSR layout
//! - `nn_model.json`: neighbour index parameters
//! - `svdpp_model.json`: fitted SVD++ parameters
//!
//! The matrix and the title index can be rebuilt from the catalog and the
//! vectorizer when their files are missing.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

pub mod catalog;
pub mod error;
pub mod neighbors;
pub mod sparse;
pub mod svdpp;
pub mod tfidf;

pub use catalog::{Catalog, TitleIndex};
pub use error::{ArtifactError, ArtifactResult};
pub use neighbors::{Metric, NearestNeighbors, Neighbor, NeighborsParams};
pub use sparse::{CsrMatrix, SparseRow};
pub use svdpp::{Prediction, RatingPredictor, SvdppModel};
pub use tfidf::TfidfVectorizer;

pub const MOVIES_FILE: &str = "movies.json";
pub const TITLE_INDICES_FILE: &str = "title_indices.json";
pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const MATRIX_FILE: &str = "tfidf_matrix.json";
pub const NEIGHBORS_FILE: &str = "nn_model.json";
pub const SVDPP_FILE: &str = "svdpp_model.json";

fn read_json<T: DeserializeOwned>(path: &Path) -> ArtifactResult<T> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional_json<T: DeserializeOwned>(path: &Path) -> ArtifactResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

/// Everything a recommendation request reads. Immutable once built.
pub struct ModelStore {
    catalog: Catalog,
    titles: TitleIndex,
    vectorizer: TfidfVectorizer,
    neighbors: NearestNeighbors,
    predictor: Arc<dyn RatingPredictor>,
    loaded_at: DateTime<Utc>,
}

impl ModelStore {
    /// Loads and cross-checks every artifact in `dir`
    pub fn load(dir: &Path) -> ArtifactResult<Self> {
        tracing::info!(dir = %dir.display(), "Loading model artifacts");

        let catalog: Catalog = read_json(&dir.join(MOVIES_FILE))?;
        tracing::info!(artifact = MOVIES_FILE, movies = catalog.len(), "Loaded artifact");

        let titles: Option<TitleIndex> = read_optional_json(&dir.join(TITLE_INDICES_FILE))?;
        if let Some(titles) = &titles {
            tracing::info!(artifact = TITLE_INDICES_FILE, titles = titles.len(), "Loaded artifact");
        }

        let vectorizer: TfidfVectorizer = read_json(&dir.join(VECTORIZER_FILE))?;
        tracing::info!(
            artifact = VECTORIZER_FILE,
            terms = vectorizer.vocabulary_size(),
            "Loaded artifact"
        );

        let matrix: Option<CsrMatrix> = read_optional_json(&dir.join(MATRIX_FILE))?;
        if let Some(matrix) = &matrix {
            tracing::info!(
                artifact = MATRIX_FILE,
                rows = matrix.nrows(),
                cols = matrix.ncols(),
                nnz = matrix.nnz(),
                "Loaded artifact"
            );
        }

        let params: NeighborsParams = read_json(&dir.join(NEIGHBORS_FILE))?;
        tracing::info!(
            artifact = NEIGHBORS_FILE,
            metric = ?params.metric,
            n_samples = params.n_samples,
            "Loaded artifact"
        );

        let svdpp: SvdppModel = read_json(&dir.join(SVDPP_FILE))?;
        tracing::info!(
            artifact = SVDPP_FILE,
            users = svdpp.n_users(),
            items = svdpp.n_items(),
            rating_scale = ?svdpp.rating_scale(),
            "Loaded artifact"
        );

        Self::from_parts(catalog, titles, vectorizer, matrix, params, Arc::new(svdpp))
    }

    /// Assembles a store from already-parsed artifacts. A missing matrix is
    /// rebuilt from catalog genres, a missing title index from catalog titles.
    pub fn from_parts(
        catalog: Catalog,
        titles: Option<TitleIndex>,
        vectorizer: TfidfVectorizer,
        matrix: Option<CsrMatrix>,
        params: NeighborsParams,
        predictor: Arc<dyn RatingPredictor>,
    ) -> ArtifactResult<Self> {
        let matrix = match matrix {
            Some(matrix) => matrix,
            None => {
                tracing::warn!(
                    artifact = MATRIX_FILE,
                    "Matrix missing, rebuilding from catalog genres"
                );
                let docs: Vec<String> = catalog
                    .movies()
                    .iter()
                    .map(|movie| movie.genre_list().collect::<Vec<_>>().join(" "))
                    .collect();
                vectorizer.transform(&docs)?
            }
        };

        if matrix.nrows() != catalog.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "matrix has {} rows but the catalog has {} movies",
                matrix.nrows(),
                catalog.len()
            )));
        }
        if matrix.ncols() != vectorizer.vocabulary_size() {
            return Err(ArtifactError::Inconsistent(format!(
                "matrix has {} columns but the vocabulary has {} terms",
                matrix.ncols(),
                vectorizer.vocabulary_size()
            )));
        }

        let titles = titles.unwrap_or_else(|| {
            tracing::warn!(
                artifact = TITLE_INDICES_FILE,
                "Title index missing, rebuilding from catalog"
            );
            TitleIndex::from_catalog(&catalog)
        });
        titles.check_rows(catalog.len())?;

        let neighbors = NearestNeighbors::fit(&params, matrix)?;

        Ok(Self {
            catalog,
            titles,
            vectorizer,
            neighbors,
            predictor,
            loaded_at: Utc::now(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn titles(&self) -> &TitleIndex {
        &self.titles
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn neighbors(&self) -> &NearestNeighbors {
        &self.neighbors
    }

    pub fn predictor(&self) -> &dyn RatingPredictor {
        self.predictor.as_ref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::Movie;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Movie {
                movie_id: 1,
                title: "Toy Story (1995)".to_string(),
                genres: "Animation|Comedy".to_string(),
            },
            Movie {
                movie_id: 6,
                title: "Heat (1995)".to_string(),
                genres: "Action|Crime".to_string(),
            },
        ])
        .unwrap()
    }

    fn vectorizer() -> TfidfVectorizer {
        let vocabulary = HashMap::from([
            ("action".to_string(), 0),
            ("animation".to_string(), 1),
            ("comedy".to_string(), 2),
            ("crime".to_string(), 3),
        ]);
        TfidfVectorizer::new(vocabulary, vec![1.0; 4]).unwrap()
    }

    fn params(n_samples: usize) -> NeighborsParams {
        NeighborsParams {
            metric: Metric::Cosine,
            n_samples,
        }
    }

    fn predictor() -> Arc<dyn RatingPredictor> {
        let mut mock = svdpp::MockRatingPredictor::new();
        mock.expect_predict().never();
        Arc::new(mock)
    }

    #[test]
    fn test_missing_matrix_and_titles_are_rebuilt() {
        let store =
            ModelStore::from_parts(catalog(), None, vectorizer(), None, params(2), predictor())
                .unwrap();
        assert_eq!(store.titles().get("Heat (1995)"), Some(1));
        let row = store.neighbors().matrix().row(1).unwrap();
        assert_eq!(row.indices, &[0, 3]);
        assert_eq!(store.catalog().len(), 2);
        assert_eq!(store.vectorizer().vocabulary_size(), 4);
    }

    #[test]
    fn test_matrix_row_count_must_match_catalog() {
        let matrix = CsrMatrix::from_rows(4, vec![vec![(0, 1.0)]]).unwrap();
        let result = ModelStore::from_parts(
            catalog(),
            None,
            vectorizer(),
            Some(matrix),
            params(1),
            predictor(),
        );
        assert!(matches!(result, Err(ArtifactError::Inconsistent(_))));
    }

    #[test]
    fn test_matrix_width_must_match_vocabulary() {
        let matrix = CsrMatrix::from_rows(9, vec![vec![], vec![]]).unwrap();
        let result = ModelStore::from_parts(
            catalog(),
            None,
            vectorizer(),
            Some(matrix),
            params(2),
            predictor(),
        );
        assert!(matches!(result, Err(ArtifactError::Inconsistent(_))));
    }

    #[test]
    fn test_title_rows_must_exist() {
        let titles: TitleIndex = serde_json::from_str(r#"{"Heat (1995)": 5}"#).unwrap();
        let result = ModelStore::from_parts(
            catalog(),
            Some(titles),
            vectorizer(),
            None,
            params(2),
            predictor(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = match ModelStore::load(dir.path()) {
            Err(err) => err,
            Ok(_) => panic!("empty directory should not load"),
        };
        assert!(matches!(err, ArtifactError::Io { .. }));
        assert!(err.to_string().contains(MOVIES_FILE));
    }
}
