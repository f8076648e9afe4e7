//! SVD++ rating predictor restored from its fitted parameters.
//!
//! The estimate for user `u` and item `i` is
//! `mu + b_u + b_i + q_i . (p_u + |N(u)|^-1/2 * sum(y_j for j in N(u)))`,
//! where each term only contributes when its side is known, clipped to the
//! rating scale the model was trained on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{ArtifactError, ArtifactResult};

const ARTIFACT: &str = "svdpp_model";

/// Anything that can estimate how a user would rate an item
#[cfg_attr(test, mockall::automock)]
pub trait RatingPredictor: Send + Sync {
    fn predict(&self, user: &str, item: &str) -> Prediction;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub user: String,
    pub item: String,
    pub estimate: f64,
    /// Set when the user or the item was not seen during training
    pub was_impossible: bool,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    bias: f64,
    factors: Vec<f64>,
    /// Positions into `items` of everything the user rated
    #[serde(default)]
    rated_items: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    bias: f64,
    factors: Vec<f64>,
    implicit_factors: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RawSvdpp {
    global_mean: f64,
    rating_scale: (f64, f64),
    n_factors: usize,
    users: Vec<RawUser>,
    items: Vec<RawItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawSvdpp")]
pub struct SvdppModel {
    global_mean: f64,
    rating_scale: (f64, f64),
    user_index: HashMap<String, usize>,
    item_index: HashMap<String, usize>,
    user_bias: Vec<f64>,
    item_bias: Vec<f64>,
    /// `p_u` with the implicit feedback term already folded in
    user_profile: Vec<Vec<f64>>,
    item_factors: Vec<Vec<f64>>,
}

fn check_len(what: &str, id: &str, got: usize, n_factors: usize) -> ArtifactResult<()> {
    if got != n_factors {
        return Err(ArtifactError::malformed(
            ARTIFACT,
            format!("{} of '{}' has {} entries, expected {}", what, id, got, n_factors),
        ));
    }
    Ok(())
}

impl TryFrom<RawSvdpp> for SvdppModel {
    type Error = ArtifactError;

    fn try_from(raw: RawSvdpp) -> ArtifactResult<Self> {
        let (low, high) = raw.rating_scale;
        if !(low <= high) {
            return Err(ArtifactError::malformed(
                ARTIFACT,
                format!("rating scale ({}, {}) is empty", low, high),
            ));
        }

        let mut item_index = HashMap::with_capacity(raw.items.len());
        let mut item_bias = Vec::with_capacity(raw.items.len());
        let mut item_factors = Vec::with_capacity(raw.items.len());
        let mut implicit = Vec::with_capacity(raw.items.len());
        for (inner, item) in raw.items.into_iter().enumerate() {
            check_len("item factors", &item.id, item.factors.len(), raw.n_factors)?;
            check_len(
                "implicit factors",
                &item.id,
                item.implicit_factors.len(),
                raw.n_factors,
            )?;
            if item_index.insert(item.id.clone(), inner).is_some() {
                return Err(ArtifactError::malformed(
                    ARTIFACT,
                    format!("item '{}' listed twice", item.id),
                ));
            }
            item_bias.push(item.bias);
            item_factors.push(item.factors);
            implicit.push(item.implicit_factors);
        }

        let mut user_index = HashMap::with_capacity(raw.users.len());
        let mut user_bias = Vec::with_capacity(raw.users.len());
        let mut user_profile = Vec::with_capacity(raw.users.len());
        for (inner, user) in raw.users.into_iter().enumerate() {
            check_len("user factors", &user.id, user.factors.len(), raw.n_factors)?;
            if let Some(&j) = user.rated_items.iter().find(|&&j| j >= implicit.len()) {
                return Err(ArtifactError::malformed(
                    ARTIFACT,
                    format!("user '{}' rated unknown item position {}", user.id, j),
                ));
            }

            let mut profile = user.factors;
            if !user.rated_items.is_empty() {
                let scale = (user.rated_items.len() as f64).sqrt().recip();
                for &j in &user.rated_items {
                    for (p, y) in profile.iter_mut().zip(&implicit[j]) {
                        *p += scale * y;
                    }
                }
            }

            if user_index.insert(user.id.clone(), inner).is_some() {
                return Err(ArtifactError::malformed(
                    ARTIFACT,
                    format!("user '{}' listed twice", user.id),
                ));
            }
            user_bias.push(user.bias);
            user_profile.push(profile);
        }

        Ok(Self {
            global_mean: raw.global_mean,
            rating_scale: raw.rating_scale,
            user_index,
            item_index,
            user_bias,
            item_bias,
            user_profile,
            item_factors,
        })
    }
}

impl SvdppModel {
    pub fn n_users(&self) -> usize {
        self.user_bias.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_bias.len()
    }

    pub fn rating_scale(&self) -> (f64, f64) {
        self.rating_scale
    }

    fn estimate(&self, user: Option<usize>, item: Option<usize>) -> f64 {
        let mut est = self.global_mean;
        if let Some(u) = user {
            est += self.user_bias[u];
        }
        if let Some(i) = item {
            est += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (user, item) {
            est += self.item_factors[i]
                .iter()
                .zip(&self.user_profile[u])
                .map(|(q, p)| q * p)
                .sum::<f64>();
        }
        est
    }
}

impl RatingPredictor for SvdppModel {
    fn predict(&self, user: &str, item: &str) -> Prediction {
        let u = self.user_index.get(user).copied();
        let i = self.item_index.get(item).copied();
        let (low, high) = self.rating_scale;

        Prediction {
            user: user.to_string(),
            item: item.to_string(),
            estimate: self.estimate(u, i).clamp(low, high),
            was_impossible: u.is_none() || i.is_none(),
        }
    }
}
