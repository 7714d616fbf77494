// src/models/review.rs
use serde::{Deserialize, Serialize};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,      // Unique ID of the review, used for deletion
    pub user: String,    // ID of the user who submitted the review
    pub name: String,    // Display name of the author at submission time
    pub rating: u8,      // 1..=5
    pub comment: String,
}

/// Body of `PUT /api/v1/review`.
#[derive(Deserialize, Debug, Clone)]
pub struct ReviewRequest {
    pub rating: u8,
    pub comment: String,
    pub product_id: String,
}

impl ReviewRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            ));
        }
        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err("Please enter a comment".into());
        }
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(format!(
                "Comment cannot exceed {} characters",
                MAX_COMMENT_LEN
            ));
        }
        if self.product_id.trim().is_empty() {
            return Err("Please enter a product id".into());
        }
        Ok(())
    }
}

/// Query of `DELETE /api/v1/reviews`.
#[derive(Deserialize, Debug)]
pub struct DeleteReviewQuery {
    pub product_id: String,
    pub id: String,
}

/// Query of `GET /api/v1/reviews`.
#[derive(Deserialize, Debug)]
pub struct ProductReviewsQuery {
    pub id: String,
}
