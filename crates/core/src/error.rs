//! The error taxonomy shared by every directory operation.
//!
//! `Display` on [`DirectoryError`] is the user-visible message; the machine
//! readable kind comes from [`DirectoryError::kind`]. Internal failure
//! detail (query shapes, collaborator payloads) never appears in either.

use crate::geocode::GeocodeError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Missing or out-of-range input; the message names the offending field.
    #[error("{0}")]
    InvalidArgument(String),
    /// The clinic or review id did not resolve.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Authenticated, but not the owner of the resource.
    #[error("{0}")]
    Forbidden(String),
    /// The mutation collides with existing state (duplicate review).
    #[error("{0}")]
    Conflict(String),
    /// Geocoding or storage failed transiently, including timeouts.
    #[error("{0}")]
    UpstreamUnavailable(String),
    /// Mutation attempted without a valid identity.
    #[error("{0}")]
    Unauthenticated(String),
}

impl DirectoryError {
    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DirectoryError::InvalidArgument(_) => "invalid_argument",
            DirectoryError::NotFound(_) => "not_found",
            DirectoryError::Forbidden(_) => "forbidden",
            DirectoryError::Conflict(_) => "conflict",
            DirectoryError::UpstreamUnavailable(_) => "upstream_unavailable",
            DirectoryError::Unauthenticated(_) => "unauthenticated",
        }
    }
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            // Retry loops intercept conflicts before this conversion; one
            // arriving here means the retry budget is spent.
            StoreError::VersionConflict => DirectoryError::UpstreamUnavailable(
                "The record was modified concurrently, please retry".into(),
            ),
            StoreError::Unavailable(reason) => DirectoryError::UpstreamUnavailable(reason),
        }
    }
}

impl From<GeocodeError> for DirectoryError {
    fn from(err: GeocodeError) -> Self {
        DirectoryError::UpstreamUnavailable(err.to_string())
    }
}

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;
