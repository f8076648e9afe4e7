use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the model artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Neighbours fetched per request, the query movie included
    #[serde(default = "default_n_neighbors")]
    pub n_neighbors: usize,

    /// Number of recommendations returned
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Maximum number of title search hits
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_n_neighbors() -> usize {
    25
}

fn default_top_n() -> usize {
    10
}

fn default_search_limit() -> usize {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            artifacts_dir: default_artifacts_dir(),
            n_neighbors: default_n_neighbors(),
            top_n: default_top_n(),
            search_limit: default_search_limit(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.n_neighbors < 2 {
            anyhow::bail!(
                "N_NEIGHBORS must be at least 2 (the query movie is one of them), got {}",
                self.n_neighbors
            );
        }
        if self.top_n == 0 {
            anyhow::bail!("TOP_N must be positive");
        }
        if self.search_limit == 0 {
            anyhow::bail!("SEARCH_LIMIT must be positive");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
