//! Review reconciliation for a single product.
//!
//! Both operations take a snapshot of the product's reviews and return the
//! replacement triple (reviews, count, mean rating). Persisting that triple
//! atomically is the job of [`crate::db::Database`].
use crate::models::review::Review;
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReviewAggregate {
    pub reviews: Vec<Review>,
    pub num_of_reviews: u32,
    pub ratings: f64,
}

impl ReviewAggregate {
    fn from_reviews(reviews: Vec<Review>) -> Self {
        let ratings = mean_rating(&reviews);
        ReviewAggregate {
            num_of_reviews: reviews.len() as u32,
            ratings,
            reviews,
        }
    }
}

/// Mean of all ratings, or 0.0 for an empty list.
pub fn mean_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u64 = reviews.iter().map(|r| u64::from(r.rating)).sum();
    total as f64 / reviews.len() as f64
}

/// Inserts a review for `author_id`, or rewrites the author's existing one in place.
pub fn upsert_review(
    existing: &[Review],
    author_id: &str,
    author_name: &str,
    rating: u8,
    comment: &str,
) -> ReviewAggregate {
    let mut reviews = existing.to_vec();

    match reviews.iter_mut().find(|r| r.user == author_id) {
        Some(review) => {
            review.rating = rating;
            review.comment = comment.to_string();
        }
        None => reviews.push(Review {
            id: Uuid::new_v4().to_string(),
            user: author_id.to_string(),
            name: author_name.to_string(),
            rating,
            comment: comment.to_string(),
        }),
    }

    ReviewAggregate::from_reviews(reviews)
}

/// Drops the review with `review_id`. An unknown id leaves the list as it was.
pub fn remove_review(existing: &[Review], review_id: &str) -> ReviewAggregate {
    let reviews = existing
        .iter()
        .filter(|r| r.id != review_id)
        .cloned()
        .collect();

    ReviewAggregate::from_reviews(reviews)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, user: &str, rating: u8) -> Review {
        Review {
            id: id.into(),
            user: user.into(),
            name: format!("name-{}", user),
            rating,
            comment: "fine".into(),
        }
    }

    fn sample() -> Vec<Review> {
        vec![review("r1", "u1", 4), review("r2", "u2", 2)]
    }

    #[test]
    fn resubmission_updates_in_place() {
        let agg = upsert_review(&sample(), "u1", "Alice", 5, "great");

        assert_eq!(agg.num_of_reviews, 2);
        assert_eq!(agg.ratings, 3.5);
        assert_eq!(agg.reviews[0].id, "r1");
        assert_eq!(agg.reviews[0].rating, 5);
        assert_eq!(agg.reviews[0].comment, "great");
        // the stored display name is not rewritten
        assert_eq!(agg.reviews[0].name, "name-u1");
        assert_eq!(agg.reviews[1], review("r2", "u2", 2));
    }

    #[test]
    fn new_author_is_appended() {
        let agg = upsert_review(&sample(), "u3", "Carol", 3, "ok");

        assert_eq!(agg.reviews.len(), 3);
        assert_eq!(agg.num_of_reviews, 3);
        assert_eq!(agg.ratings, 3.0);
        let added = &agg.reviews[2];
        assert_eq!(added.user, "u3");
        assert_eq!(added.name, "Carol");
        assert_eq!(added.comment, "ok");
        assert!(!added.id.is_empty());
        assert_ne!(added.id, "r1");
        assert_ne!(added.id, "r2");
    }

    #[test]
    fn first_review_on_empty_product() {
        let agg = upsert_review(&[], "u1", "Alice", 4, "nice");
        assert_eq!(agg.num_of_reviews, 1);
        assert_eq!(agg.ratings, 4.0);
    }

    #[test]
    fn upsert_is_idempotent() {
        let once = upsert_review(&sample(), "u3", "Carol", 1, "bad");
        let twice = upsert_review(&once.reviews, "u3", "Carol", 1, "bad");
        assert_eq!(once, twice);
    }

    #[test]
    fn remove_present_review_keeps_order() {
        let mut reviews = sample();
        reviews.push(review("r3", "u3", 3));

        let agg = remove_review(&reviews, "r2");

        let ids: Vec<&str> = agg.reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r3"]);
        assert_eq!(agg.num_of_reviews, 2);
        assert_eq!(agg.ratings, 3.5);
    }

    #[test]
    fn remove_recomputes_over_remaining() {
        let agg = remove_review(&sample(), "r2");
        assert_eq!(agg.reviews, vec![review("r1", "u1", 4)]);
        assert_eq!(agg.num_of_reviews, 1);
        assert_eq!(agg.ratings, 4.0);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let agg = remove_review(&sample(), "missing");
        assert_eq!(agg.reviews, sample());
        assert_eq!(agg.num_of_reviews, 2);
        assert_eq!(agg.ratings, 3.0);
    }

    #[test]
    fn removing_last_review_zeroes_rating() {
        let agg = remove_review(&[review("r1", "u1", 5)], "r1");
        assert!(agg.reviews.is_empty());
        assert_eq!(agg.num_of_reviews, 0);
        assert_eq!(agg.ratings, 0.0);
        assert!(!agg.ratings.is_nan());
    }

    #[test]
    fn mean_is_exact_sum_over_len() {
        let reviews = vec![
            review("a", "u1", 5),
            review("b", "u2", 4),
            review("c", "u3", 4),
        ];
        assert_eq!(mean_rating(&reviews), 13.0 / 3.0);
    }
}
