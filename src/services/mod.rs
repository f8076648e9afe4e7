pub mod recommendations;
pub mod title_search;

pub use recommendations::{recommend, RecommendSettings};
pub use title_search::search_titles;
