//! # Clindex Core
//!
//! Core business logic for the clindex community clinic directory.
//!
//! This crate contains the pure domain operations:
//! - Clinic documents with validated drafts and field-by-field updates
//! - Geospatial search: radius containment and nearest-first with distances
//! - Per-clinic reviews with a derived, always-recomputed average rating
//! - Forward geocoding against a Nominatim-compatible endpoint
//! - Version-checked persistence through the [`store::ClinicStore`] trait
//!
//! **No API concerns**: authentication and the HTTP surface belong in
//! `api-rest` and `api-shared`.

pub mod clinic;
pub mod clinics;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod geo;
pub mod geocode;
pub mod rating;
pub mod review;
pub mod reviews;
pub mod search;
pub mod store;

pub use clinic::{
    Clinic, ClinicDraft, ClinicId, ClinicPatch, ClinicSummary, LocationDraft, WeeklyHours,
};
pub use clinics::{ClinicPage, ClinicService};
pub use config::{geocode_config_from_env_values, CoreConfig, GeocodeConfig};
pub use error::{DirectoryError, DirectoryResult};
pub use filter::{ClinicFilter, SearchCriteria};
pub use geocode::{GeocodeAdapter, GeocodeError, GeocodedPlace, Geocoder, NominatimClient};
pub use review::{Review, ReviewId, ReviewPatch, ReviewSubmission};
pub use reviews::ReviewLedger;
pub use search::{SearchCenter, SearchEngine, SearchRequest};
pub use store::{ClinicStore, MemoryStore, StoreError, StoreResult, Versioned};
