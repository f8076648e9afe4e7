use crate::{
    error::{AppError, AppResult},
    ml::Catalog,
    models::Movie,
};

/// Finds catalog movies whose title contains `query`, ignoring case. The
/// query is matched as given, surrounding whitespace included.
pub fn search_titles(catalog: &Catalog, query: &str, limit: usize) -> AppResult<Vec<Movie>> {
    if query.is_empty() {
        return Err(AppError::InvalidInput("Search query is required".to_string()));
    }
    Ok(catalog.search(query, limit).into_iter().cloned().collect())
}
