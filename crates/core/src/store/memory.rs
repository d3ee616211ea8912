//! In-process clinic storage.
//!
//! Backs the service in tests and single-node deployments. Documents live
//! in a `RwLock`ed map with a separate insertion-order index so pagination
//! stays stable while ids stay hashable. Geo queries are linear scans over
//! central angles, which is plenty for a directory-sized collection.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use clindex_types::Coordinates;

use crate::clinic::{Clinic, ClinicId, ClinicSummary};
use crate::constants::EARTH_RADIUS_KM;
use crate::filter::ClinicFilter;
use crate::geo::central_angle;
use crate::store::{ClinicStore, StoreError, StoreResult, Versioned};

#[derive(Default)]
struct Inner {
    clinics: HashMap<ClinicId, Versioned<Clinic>>,
    insertion_order: Vec<ClinicId>,
}

/// Thread-safe in-memory implementation of [`ClinicStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("storage lock poisoned".into()))
    }

    fn write_guard(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("storage lock poisoned".into()))
    }
}

impl Inner {
    /// Clinics in insertion order, filtered; the walk stops once `limit`
    /// matches are collected.
    fn scan<'a>(&'a self, filter: &'a ClinicFilter, limit: usize) -> Vec<&'a Clinic> {
        let mut out = Vec::new();
        for id in &self.insertion_order {
            if out.len() >= limit {
                break;
            }
            if let Some(stored) = self.clinics.get(id) {
                if filter.matches(&stored.value) {
                    out.push(&stored.value);
                }
            }
        }
        out
    }
}

impl ClinicStore for MemoryStore {
    fn insert(&self, clinic: Clinic) -> StoreResult<()> {
        let mut inner = self.write_guard()?;
        if inner.clinics.contains_key(&clinic.id) {
            return Err(StoreError::VersionConflict);
        }
        let id = clinic.id;
        inner.clinics.insert(
            id,
            Versioned {
                value: clinic,
                version: 1,
            },
        );
        inner.insertion_order.push(id);
        Ok(())
    }

    fn fetch(&self, id: ClinicId) -> StoreResult<Option<Versioned<Clinic>>> {
        let inner = self.read_guard()?;
        Ok(inner.clinics.get(&id).cloned())
    }

    fn save(&self, clinic: Clinic, expected_version: u64) -> StoreResult<u64> {
        let mut inner = self.write_guard()?;
        let Some(stored) = inner.clinics.get_mut(&clinic.id) else {
            return Err(StoreError::VersionConflict);
        };
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        stored.value = clinic;
        stored.version += 1;
        Ok(stored.version)
    }

    fn remove(&self, id: ClinicId) -> StoreResult<bool> {
        let mut inner = self.write_guard()?;
        let existed = inner.clinics.remove(&id).is_some();
        if existed {
            inner.insertion_order.retain(|entry| *entry != id);
        }
        Ok(existed)
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.read_guard()?.clinics.len())
    }

    fn page(&self, offset: usize, limit: usize) -> StoreResult<Vec<ClinicSummary>> {
        let inner = self.read_guard()?;
        Ok(inner
            .insertion_order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| inner.clinics.get(id))
            .map(|stored| stored.value.summary())
            .collect())
    }

    fn find(&self, filter: &ClinicFilter, limit: usize) -> StoreResult<Vec<ClinicSummary>> {
        let inner = self.read_guard()?;
        Ok(inner
            .scan(filter, limit)
            .into_iter()
            .map(Clinic::summary)
            .collect())
    }

    fn find_within_radius(
        &self,
        center: Coordinates,
        angular_radius: f64,
        filter: &ClinicFilter,
        limit: usize,
    ) -> StoreResult<Vec<ClinicSummary>> {
        let inner = self.read_guard()?;
        let mut out = Vec::new();
        for id in &inner.insertion_order {
            if out.len() >= limit {
                break;
            }
            let Some(stored) = inner.clinics.get(id) else {
                continue;
            };
            let clinic = &stored.value;
            if central_angle(center, clinic.location) <= angular_radius && filter.matches(clinic) {
                out.push(clinic.summary());
            }
        }
        Ok(out)
    }

    fn find_nearest(
        &self,
        center: Coordinates,
        max_distance_m: f64,
        filter: &ClinicFilter,
        limit: usize,
    ) -> StoreResult<Vec<ClinicSummary>> {
        let inner = self.read_guard()?;
        let mut candidates: Vec<(f64, &Clinic)> = Vec::new();
        for id in &inner.insertion_order {
            let Some(stored) = inner.clinics.get(id) else {
                continue;
            };
            let clinic = &stored.value;
            let distance_m = central_angle(center, clinic.location) * EARTH_RADIUS_KM * 1000.0;
            if distance_m <= max_distance_m && filter.matches(clinic) {
                candidates.push((distance_m, clinic));
            }
        }
        // Stable sort keeps insertion order between equidistant clinics.
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(candidates
            .into_iter()
            .take(limit)
            .map(|(_, clinic)| clinic.summary())
            .collect())
    }
}
