use std::path::PathBuf;

/// Errors raised while loading or validating model artifacts
#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed {artifact}: {reason}")]
    Malformed {
        artifact: &'static str,
        reason: String,
    },

    #[error("Artifacts disagree: {0}")]
    Inconsistent(String),
}

impl ArtifactError {
    pub(crate) fn malformed(artifact: &'static str, reason: impl Into<String>) -> Self {
        ArtifactError::Malformed {
            artifact,
            reason: reason.into(),
        }
    }
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;
