//! Clinic directory CRUD.
//!
//! Reads are a straight pass-through to the store. Writes go through a
//! fetch-mutate-save cycle guarded by the document version; a concurrent
//! writer triggers a bounded retry before the conflict is surfaced.

use std::sync::Arc;

use crate::clinic::{Clinic, ClinicDraft, ClinicId, ClinicPatch, ClinicSummary};
use crate::config::CoreConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::store::{ClinicStore, StoreError};

/// One page of the paginated clinic listing.
#[derive(Debug)]
pub struct ClinicPage {
    pub clinics: Vec<ClinicSummary>,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

pub struct ClinicService {
    config: Arc<CoreConfig>,
    store: Arc<dyn ClinicStore>,
}

impl ClinicService {
    pub fn new(config: Arc<CoreConfig>, store: Arc<dyn ClinicStore>) -> Self {
        Self { config, store }
    }

    /// Lists clinics in insertion order, one page at a time.
    ///
    /// # Arguments
    ///
    /// * `page` - 1-based page number; absent or zero means the first page.
    /// * `limit` - Page size, clamped to the configured maximum.
    pub fn list(&self, page: Option<usize>, limit: Option<usize>) -> DirectoryResult<ClinicPage> {
        let page = page.unwrap_or(1).max(1);
        let limit = self.config.effective_limit(limit);
        let total = self.store.count()?;
        // Page numbers beyond the directory read as an empty page.
        let clinics = self.store.page((page - 1).saturating_mul(limit), limit)?;
        Ok(ClinicPage {
            clinics,
            total,
            page,
            pages: total.div_ceil(limit),
        })
    }

    /// Fetches one clinic with its full review history.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` when the id does not resolve.
    pub fn get(&self, id: ClinicId) -> DirectoryResult<Clinic> {
        let stored = self
            .store
            .fetch(id)?
            .ok_or(DirectoryError::NotFound("Clinic"))?;
        Ok(stored.value)
    }

    /// Validates a draft and persists the new clinic.
    pub fn create(&self, draft: ClinicDraft) -> DirectoryResult<Clinic> {
        let clinic = Clinic::create(draft)?;
        self.store.insert(clinic.clone())?;
        tracing::info!("created clinic {} ({})", clinic.id, clinic.name);
        Ok(clinic)
    }

    /// Applies a partial update under optimistic concurrency control.
    ///
    /// The patch is revalidated and reapplied against a fresh read on every
    /// attempt, so a concurrent writer can never be silently overwritten.
    pub fn update(&self, id: ClinicId, patch: ClinicPatch) -> DirectoryResult<Clinic> {
        for attempt in 1..=self.config.write_retry_attempts() {
            let Some(stored) = self.store.fetch(id)? else {
                return Err(DirectoryError::NotFound("Clinic"));
            };
            let mut clinic = stored.value;
            clinic.apply(patch.clone())?;
            match self.store.save(clinic.clone(), stored.version) {
                Ok(_) => return Ok(clinic),
                Err(StoreError::VersionConflict) => {
                    tracing::warn!("clinic {} changed under us, attempt {}", id, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Removes a clinic and its embedded reviews.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` when the id does not resolve.
    pub fn delete(&self, id: ClinicId) -> DirectoryResult<()> {
        if !self.store.remove(id)? {
            return Err(DirectoryError::NotFound("Clinic"));
        }
        tracing::info!("deleted clinic {}", id);
        Ok(())
    }
}
