//! Per-clinic review ledger.
//!
//! Reviews live inside the clinic document, so every mutation here is a
//! read-validate-mutate-save cycle on the parent clinic. The aggregator runs
//! inside the same cycle; `averageRating` can never drift from the review
//! set. Version conflicts rerun the whole cycle against a fresh read, up to
//! the configured attempt budget.

use std::sync::Arc;

use clindex_types::UserId;

use crate::clinic::{Clinic, ClinicId};
use crate::config::CoreConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::rating;
use crate::review::{Review, ReviewId, ReviewPatch, ReviewSubmission};
use crate::store::{ClinicStore, StoreError, Versioned};

pub struct ReviewLedger {
    config: Arc<CoreConfig>,
    store: Arc<dyn ClinicStore>,
}

impl ReviewLedger {
    pub fn new(config: Arc<CoreConfig>, store: Arc<dyn ClinicStore>) -> Self {
        Self { config, store }
    }

    /// Lists a clinic's reviews in creation order.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` when the clinic does not exist.
    pub fn list_reviews(&self, clinic_id: ClinicId) -> DirectoryResult<Vec<Review>> {
        let stored = self.fetch_clinic(clinic_id)?;
        Ok(stored.value.reviews)
    }

    /// Adds a review, recomputes the average and persists, all in one
    /// version-checked save.
    ///
    /// # Arguments
    ///
    /// * `clinic_id` - The clinic under review.
    /// * `user` - The authenticated author; one review per user per clinic.
    /// * `submission` - Rating (required, 1 to 5) and optional comment.
    ///
    /// # Returns
    ///
    /// The created review and the clinic's new average rating.
    ///
    /// # Errors
    ///
    /// `NotFound` if the clinic is absent, `Conflict` if the user already
    /// reviewed it, `InvalidArgument` for a bad rating or comment.
    pub fn add_review(
        &self,
        clinic_id: ClinicId,
        user: &UserId,
        submission: ReviewSubmission,
    ) -> DirectoryResult<(Review, f64)> {
        for _ in 0..self.config.write_retry_attempts() {
            let stored = self.fetch_clinic(clinic_id)?;
            let mut clinic = stored.value;
            if clinic.review_by_user(user).is_some() {
                return Err(DirectoryError::Conflict(
                    "You have already reviewed this clinic".into(),
                ));
            }
            let review = Review::create(user.clone(), submission.clone())?;
            clinic.reviews.push(review.clone());
            rating::recompute(&mut clinic);
            clinic.touch();
            let average = clinic.average_rating;
            match self.store.save(clinic, stored.version) {
                Ok(_) => {
                    tracing::info!("user {} reviewed clinic {}", user, clinic_id);
                    return Ok((review, average));
                }
                Err(StoreError::VersionConflict) => {
                    tracing::warn!("clinic {} changed while adding a review, retrying", clinic_id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Edits an existing review. Only the author may edit; provided fields
    /// are revalidated, the review's `updatedAt` is bumped and the average
    /// recomputed. An empty patch changes nothing and skips the save.
    pub fn update_review(
        &self,
        clinic_id: ClinicId,
        review_id: ReviewId,
        user: &UserId,
        patch: ReviewPatch,
    ) -> DirectoryResult<(Review, f64)> {
        for _ in 0..self.config.write_retry_attempts() {
            let stored = self.fetch_clinic(clinic_id)?;
            let mut clinic = stored.value;
            let review = owned_review(&mut clinic, review_id, user, "edit")?;
            if !review.apply(patch.clone())? {
                let unchanged = review.clone();
                return Ok((unchanged, clinic.average_rating));
            }
            let review = review.clone();
            rating::recompute(&mut clinic);
            clinic.touch();
            let average = clinic.average_rating;
            match self.store.save(clinic, stored.version) {
                Ok(_) => return Ok((review, average)),
                Err(StoreError::VersionConflict) => {
                    tracing::warn!("clinic {} changed while editing a review, retrying", clinic_id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Removes a review. Only the author may delete. Returns the clinic's
    /// new average rating (0.0 once the last review is gone).
    pub fn delete_review(
        &self,
        clinic_id: ClinicId,
        review_id: ReviewId,
        user: &UserId,
    ) -> DirectoryResult<f64> {
        for _ in 0..self.config.write_retry_attempts() {
            let stored = self.fetch_clinic(clinic_id)?;
            let mut clinic = stored.value;
            owned_review(&mut clinic, review_id, user, "delete")?;
            clinic.reviews.retain(|r| r.id != review_id);
            rating::recompute(&mut clinic);
            clinic.touch();
            let average = clinic.average_rating;
            match self.store.save(clinic, stored.version) {
                Ok(_) => {
                    tracing::info!(
                        "user {} removed review {} from clinic {}",
                        user,
                        review_id,
                        clinic_id
                    );
                    return Ok(average);
                }
                Err(StoreError::VersionConflict) => {
                    tracing::warn!(
                        "clinic {} changed while removing a review, retrying",
                        clinic_id
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    fn fetch_clinic(&self, clinic_id: ClinicId) -> DirectoryResult<Versioned<Clinic>> {
        self.store
            .fetch(clinic_id)?
            .ok_or(DirectoryError::NotFound("Clinic"))
    }
}

/// Resolves a review and enforces ownership.
fn owned_review<'a>(
    clinic: &'a mut Clinic,
    review_id: ReviewId,
    user: &UserId,
    action: &str,
) -> DirectoryResult<&'a mut Review> {
    let review = clinic
        .reviews
        .iter_mut()
        .find(|r| r.id == review_id)
        .ok_or(DirectoryError::NotFound("Review"))?;
    if &review.user != user {
        return Err(DirectoryError::Forbidden(format!(
            "You can only {action} your own reviews"
        )));
    }
    Ok(review)
}
