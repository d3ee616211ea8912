//! The storage collaborator seam.
//!
//! Everything above this module speaks [`ClinicStore`]; the trait captures
//! exactly what the directory needs from a document collection: versioned
//! single-document reads and writes, predicate filtering, and the two
//! geospatial query modes with results projected down to summaries.

pub mod memory;

pub use memory::MemoryStore;

use clindex_types::Coordinates;

use crate::clinic::{Clinic, ClinicId, ClinicSummary};
use crate::filter::ClinicFilter;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The stored version moved since the caller read the document, or the
    /// document vanished entirely. Callers re-read and retry.
    #[error("stored document version does not match the expected version")]
    VersionConflict,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A stored document together with its optimistic-concurrency version.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// A document collection holding clinic records.
///
/// Geo queries evaluate the compiled filter as well, so callers get the
/// intersection in one pass. Query methods return [`ClinicSummary`]:
/// reviews never leave the store on a search path.
pub trait ClinicStore: Send + Sync {
    /// Stores a new document at version 1.
    ///
    /// Inserting an id that already exists is a `VersionConflict`.
    fn insert(&self, clinic: Clinic) -> StoreResult<()>;

    /// The full document and its current version, if the id resolves.
    fn fetch(&self, id: ClinicId) -> StoreResult<Option<Versioned<Clinic>>>;

    /// Version-checked whole-document save.
    ///
    /// Persists only if the stored version still equals `expected_version`,
    /// and returns the new version. A missing document is a
    /// `VersionConflict` as well (it was removed concurrently).
    fn save(&self, clinic: Clinic, expected_version: u64) -> StoreResult<u64>;

    /// Removes a document. Returns whether it existed.
    fn remove(&self, id: ClinicId) -> StoreResult<bool>;

    /// Total number of stored clinics.
    fn count(&self) -> StoreResult<usize>;

    /// A stable offset/limit page in insertion order.
    fn page(&self, offset: usize, limit: usize) -> StoreResult<Vec<ClinicSummary>>;

    /// All clinics matching the filter, capped at `limit`, insertion order.
    fn find(&self, filter: &ClinicFilter, limit: usize) -> StoreResult<Vec<ClinicSummary>>;

    /// Clinics whose central angle from `center` is at most
    /// `angular_radius`, intersected with the filter, capped at `limit`.
    /// Unordered by distance.
    fn find_within_radius(
        &self,
        center: Coordinates,
        angular_radius: f64,
        filter: &ClinicFilter,
        limit: usize,
    ) -> StoreResult<Vec<ClinicSummary>>;

    /// Clinics within `max_distance_m` metres of `center`, intersected with
    /// the filter, sorted by ascending great-circle distance, capped at
    /// `limit`.
    fn find_nearest(
        &self,
        center: Coordinates,
        max_distance_m: f64,
        filter: &ClinicFilter,
        limit: usize,
    ) -> StoreResult<Vec<ClinicSummary>>;
}
