//! TF-IDF vectorizer restored from its fitted vocabulary and idf weights.
//!
//! Tokenization keeps maximal runs of word characters (alphanumeric or `_`)
//! that are at least two characters long, matching the vectorizer the
//! artifacts were fitted with.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{ArtifactError, ArtifactResult};
use super::sparse::CsrMatrix;

const ARTIFACT: &str = "tfidf_vectorizer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
struct RawVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    norm: Norm,
}

fn default_lowercase() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawVectorizer")]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    lowercase: bool,
    sublinear_tf: bool,
    norm: Norm,
}

impl TryFrom<RawVectorizer> for TfidfVectorizer {
    type Error = ArtifactError;

    fn try_from(raw: RawVectorizer) -> ArtifactResult<Self> {
        let vectorizer = Self {
            vocabulary: raw.vocabulary,
            idf: raw.idf,
            lowercase: raw.lowercase,
            sublinear_tf: raw.sublinear_tf,
            norm: raw.norm,
        };
        vectorizer.validate()?;
        Ok(vectorizer)
    }
}

impl TfidfVectorizer {
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f64>) -> ArtifactResult<Self> {
        Self::try_from(RawVectorizer {
            vocabulary,
            idf,
            lowercase: true,
            sublinear_tf: false,
            norm: Norm::L2,
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Splits a document into vocabulary candidates
    pub fn tokenize<'a>(&self, doc: &'a str) -> Vec<std::borrow::Cow<'a, str>> {
        doc.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .map(|token| {
                if self.lowercase {
                    std::borrow::Cow::Owned(token.to_lowercase())
                } else {
                    std::borrow::Cow::Borrowed(token)
                }
            })
            .collect()
    }

    /// Turns one document into sorted `(column, weight)` entries
    pub fn transform_one(&self, doc: &str) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in self.tokenize(doc) {
            if let Some(&col) = self.vocabulary.get(token.as_ref()) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (col, tf * self.idf[col])
            })
            .collect();
        entries.sort_by_key(|&(col, _)| col);

        if self.norm == Norm::L2 {
            let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, v) in &mut entries {
                    *v /= norm;
                }
            }
        }
        entries
    }

    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> ArtifactResult<CsrMatrix> {
        let rows = docs
            .iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect();
        CsrMatrix::from_rows(self.vocabulary_size(), rows)
    }

    fn validate(&self) -> ArtifactResult<()> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(ArtifactError::malformed(
                ARTIFACT,
                format!(
                    "{} vocabulary terms but {} idf weights",
                    self.vocabulary.len(),
                    self.idf.len()
                ),
            ));
        }
        let out_of_range = self
            .vocabulary
            .iter()
            .find(|(_, col)| **col >= self.idf.len());
        if let Some((term, &col)) = out_of_range {
            return Err(ArtifactError::malformed(
                ARTIFACT,
                format!("term '{}' maps to column {} out of range", term, col),
            ));
        }
        let mut seen = vec![false; self.idf.len()];
        for &col in self.vocabulary.values() {
            if std::mem::replace(&mut seen[col], true) {
                return Err(ArtifactError::malformed(
                    ARTIFACT,
                    format!("column {} assigned to more than one term", col),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre_vectorizer() -> TfidfVectorizer {
        let vocabulary = HashMap::from([
            ("action".to_string(), 0),
            ("comedy".to_string(), 1),
            ("sci".to_string(), 2),
            ("fi".to_string(), 3),
        ]);
        TfidfVectorizer::new(vocabulary, vec![1.0, 2.0, 1.5, 1.5]).unwrap()
    }

    #[test]
    fn test_tokenize_splits_genre_strings() {
        let v = genre_vectorizer();
        let tokens = v.tokenize("Action|Sci-Fi|A");
        assert_eq!(tokens, vec!["action", "sci", "fi"]);
    }

    #[test]
    fn test_transform_one_is_l2_normalized() {
        let v = genre_vectorizer();
        let entries = v.transform_one("Action|Comedy");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 0);
        assert_eq!(entries[1].0, 1);
        let norm: f64 = entries.iter().map(|(_, w)| w * w).sum();
        assert!((norm - 1.0).abs() < 1e-12);
        // comedy carries twice the idf of action
        assert!((entries[1].1 / entries[0].1 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_terms_yield_empty_row() {
        let v = genre_vectorizer();
        assert!(v.transform_one("(no genres listed)").is_empty());
    }

    #[test]
    fn test_transform_builds_matrix() {
        let v = genre_vectorizer();
        let m = v.transform(&["Action", "Comedy|Comedy", "Western"]).unwrap();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 4);
        assert_eq!(m.row(2).unwrap().nnz(), 0);
    }

    #[test]
    fn test_sublinear_tf_without_norm() {
        let json = r#"{
            "vocabulary": {"comedy": 0, "drama": 1},
            "idf": [2.0, 1.0],
            "sublinear_tf": true,
            "norm": "none"
        }"#;
        let v: TfidfVectorizer = serde_json::from_str(json).unwrap();
        let entries = v.transform_one("Comedy|Comedy|Drama");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 0);
        assert!((entries[0].1 - (1.0 + 2f64.ln()) * 2.0).abs() < 1e-12);
        assert!((entries[1].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_raw_counts_without_norm() {
        let json = r#"{"vocabulary": {"comedy": 0}, "idf": [1.5], "norm": "none"}"#;
        let v: TfidfVectorizer = serde_json::from_str(json).unwrap();
        assert_eq!(v.transform_one("comedy comedy comedy"), vec![(0, 4.5)]);
    }

    #[test]
    fn test_case_preserved_when_not_lowercasing() {
        let json = r#"{"vocabulary": {"Drama": 0}, "idf": [1.0], "lowercase": false}"#;
        let v: TfidfVectorizer = serde_json::from_str(json).unwrap();
        assert_eq!(v.tokenize("Drama|drama"), vec!["Drama", "drama"]);
        assert_eq!(v.transform_one("Drama"), vec![(0, 1.0)]);
        assert!(v.transform_one("drama").is_empty());
    }

    #[test]
    fn test_rejects_mismatched_idf() {
        let vocabulary = HashMap::from([("drama".to_string(), 0)]);
        assert!(TfidfVectorizer::new(vocabulary, vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"vocabulary":{"drama":0,"horror":1},"idf":[1.2,2.4]}"#;
        let v: TfidfVectorizer = serde_json::from_str(json).unwrap();
        assert_eq!(v.vocabulary_size(), 2);
        assert_eq!(v.tokenize("DRAMA"), vec!["drama"]);
    }
}
