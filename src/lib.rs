//! # movie-recommender
//!
//! HTTP service that blends content similarity with predicted ratings.
//!
//! At startup the [`ml::ModelStore`] loads a movie catalog, a fitted TF-IDF
//! vectorizer and matrix, a nearest-neighbour index over that matrix and an
//! SVD++ rating model. Each `POST /recommendations` picks the user's first
//! known favourite, fetches its nearest neighbours by genre profile, scores
//! them with the predicted rating for that user and returns the best ten.
//!
//! - [`config`]: environment configuration
//! - [`ml`]: artifact loading, TF-IDF, neighbour search, SVD++
//! - [`services`]: ranking and title search
//! - [`api`]: axum router, handlers and shared state

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod ml;
pub mod models;
pub mod services;
