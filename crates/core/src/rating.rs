//! Average-rating recomputation.
//!
//! Always a full pass over the current review set, never an incremental
//! delta, so a partially failed mutation can never leave the aggregate
//! drifted from the reviews actually stored.

use crate::clinic::Clinic;
use crate::geo::round1;
use crate::review::Review;

/// Average of all ratings rounded to one decimal; `0.0` for no reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating.value())).sum();
    round1(f64::from(sum) / reviews.len() as f64)
}

/// Recomputes and stores the clinic's average from its current review set.
pub fn recompute(clinic: &mut Clinic) {
    clinic.average_rating = average_rating(&clinic.reviews);
}
