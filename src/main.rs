use tracing_subscriber::EnvFilter;

use movie_recommender::api::{create_router, AppState};
use movie_recommender::config::Config;
use movie_recommender::ml::ModelStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_recommender=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = ModelStore::load(&config.artifacts_dir)?;
    tracing::info!(
        movies = store.catalog().len(),
        n_neighbors = config.n_neighbors,
        top_n = config.top_n,
        "Model store ready"
    );

    let app = create_router(AppState::new(store, &config));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
