//! # Menu feedback
//! Star ratings (1 to 5) with an optional comment, left by students on a dish.
//!
//! Per-dish aggregates are recomputed from the individual entries; the
//! average is the plain mean of every rating for that dish. Dishes are
//! grouped by name, case-insensitively and ignoring surrounding whitespace.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CommunityError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub dish_name: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(
        dish_name: &str,
        rating: u8,
        comment: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CommunityError> {
        let dish_name = dish_name.trim();
        if dish_name.is_empty() {
            return Err(CommunityError::Validation("dish_name must not be empty".to_string()));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(CommunityError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            dish_name: dish_name.to_string(),
            rating,
            comment: comment.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string),
            created_at,
        })
    }
}

/// Student input for a rating.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    pub dish_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Aggregate rating of one dish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishRating {
    pub dish_name: String,
    pub average_rating: f64,
    pub total_ratings: usize,
}

/// One entry per dish, best average first, ties by name.
///
/// The display name is the spelling of the first entry seen for that dish.
pub fn dish_ratings(entries: &[Feedback]) -> Vec<DishRating> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut acc: Vec<(String, u32, usize)> = Vec::new();

    for f in entries {
        let key = f.dish_name.trim().to_lowercase();
        let i = *index.entry(key).or_insert_with(|| {
            acc.push((f.dish_name.clone(), 0, 0));
            acc.len() - 1
        });
        acc[i].1 += u32::from(f.rating);
        acc[i].2 += 1;
    }

    let mut out: Vec<DishRating> = acc
        .into_iter()
        .map(|(dish_name, sum, count)| DishRating {
            dish_name,
            average_rating: f64::from(sum) / count as f64,
            total_ratings: count,
        })
        .collect();
    out.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| a.dish_name.cmp(&b.dish_name))
    });
    out
}
