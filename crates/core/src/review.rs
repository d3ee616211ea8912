//! Review documents embedded in a clinic record.

use chrono::{DateTime, Utc};
use clindex_types::{Rating, UserId};
use std::fmt;
use uuid::Uuid;

use crate::constants::MAX_COMMENT_CHARS;
use crate::{DirectoryError, DirectoryResult};

/// Opaque review identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ReviewId(Uuid);

impl ReviewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(input: &str) -> Option<Self> {
        Uuid::parse_str(input.trim()).ok().map(Self)
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single user's review of a clinic.
///
/// Owned by exactly one clinic; at most one review per (clinic, user) pair,
/// enforced by the review ledger on add.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[schema(value_type = String)]
    pub id: ReviewId,
    #[schema(value_type = String)]
    pub user: UserId,
    #[schema(value_type = u8, minimum = 1, maximum = 5)]
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client payload for adding a review.
///
/// `rating` is optional here only so that a missing field produces the
/// taxonomy's `InvalidArgument` instead of a deserialization failure.
#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewSubmission {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

/// Client payload for editing a review. Absent fields are left untouched;
/// a provided empty-string comment replaces the prior value.
#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewPatch {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl ReviewPatch {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.comment.is_none()
    }
}

impl Review {
    /// Validates a submission and builds the review.
    ///
    /// # Errors
    /// `InvalidArgument` if the rating is missing or outside 1..=5, or the
    /// comment exceeds the length limit.
    pub fn create(user: UserId, submission: ReviewSubmission) -> DirectoryResult<Self> {
        let rating_value = submission
            .rating
            .ok_or_else(|| DirectoryError::InvalidArgument("Rating is required".into()))?;
        let rating = Rating::new(rating_value)
            .map_err(|e| DirectoryError::InvalidArgument(e.to_string()))?;
        let comment = normalize_comment(submission.comment.as_deref().unwrap_or(""))?;

        let now = Utc::now();
        Ok(Self {
            id: ReviewId::new(),
            user,
            rating,
            comment,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a patch, revalidating every provided field.
    ///
    /// Returns `true` if any field was provided (the ledger skips the save
    /// otherwise). A provided field counts as a change even when the value
    /// is identical, and bumps `updated_at`.
    ///
    /// # Errors
    /// `InvalidArgument` under the same rules as [`Review::create`].
    pub fn apply(&mut self, patch: ReviewPatch) -> DirectoryResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        if let Some(value) = patch.rating {
            self.rating = Rating::new(value)
                .map_err(|e| DirectoryError::InvalidArgument(e.to_string()))?;
        }
        if let Some(comment) = patch.comment.as_deref() {
            self.comment = normalize_comment(comment)?;
        }
        self.updated_at = Utc::now();
        Ok(true)
    }
}

fn normalize_comment(raw: &str) -> DirectoryResult<String> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(DirectoryError::InvalidArgument(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).expect("test user id should be valid")
    }

    #[test]
    fn create_requires_a_rating() {
        let err = Review::create(user("u1"), ReviewSubmission::default())
            .expect_err("missing rating should fail");
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "Rating is required");
    }

    #[test]
    fn create_rejects_out_of_range_rating() {
        let submission = ReviewSubmission {
            rating: Some(6),
            comment: None,
        };
        let err = Review::create(user("u1"), submission).expect_err("rating 6 should fail");
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
    }

    #[test]
    fn create_defaults_comment_to_empty() {
        let submission = ReviewSubmission {
            rating: Some(4),
            comment: None,
        };
        let review = Review::create(user("u1"), submission).expect("valid submission");
        assert_eq!(review.comment, "");
        assert_eq!(review.rating.value(), 4);
    }

    #[test]
    fn create_rejects_overlong_comment() {
        let submission = ReviewSubmission {
            rating: Some(3),
            comment: Some("x".repeat(501)),
        };
        assert!(Review::create(user("u1"), submission).is_err());
    }

    #[test]
    fn apply_replaces_comment_with_empty_string() {
        let review = Review::create(
            user("u1"),
            ReviewSubmission {
                rating: Some(5),
                comment: Some("great".into()),
            },
        )
        .expect("valid submission");

        let mut edited = review.clone();
        let changed = edited
            .apply(ReviewPatch {
                rating: None,
                comment: Some(String::new()),
            })
            .expect("empty comment is a valid replacement");
        assert!(changed);
        assert_eq!(edited.comment, "");
        assert_eq!(edited.rating.value(), 5);
    }

    #[test]
    fn apply_revalidates_rating() {
        let mut review = Review::create(
            user("u1"),
            ReviewSubmission {
                rating: Some(5),
                comment: None,
            },
        )
        .expect("valid submission");

        let err = review
            .apply(ReviewPatch {
                rating: Some(0),
                comment: None,
            })
            .expect_err("rating 0 should fail");
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
        assert_eq!(review.rating.value(), 5);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut review = Review::create(
            user("u1"),
            ReviewSubmission {
                rating: Some(2),
                comment: None,
            },
        )
        .expect("valid submission");
        let before = review.updated_at;
        let changed = review.apply(ReviewPatch::default()).expect("no-op patch");
        assert!(!changed);
        assert_eq!(review.updated_at, before);
    }
}
