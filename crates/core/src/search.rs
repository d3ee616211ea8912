//! Geospatial clinic search.
//!
//! Two query shapes share one pipeline: radius search keeps every clinic
//! whose central angle from the centre falls inside the angular radius,
//! proximity search ranks clinics by distance under a metre ceiling and
//! annotates each hit with the kilometre distance.

use std::sync::Arc;

use clindex_types::Coordinates;

use crate::clinic::ClinicSummary;
use crate::config::CoreConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::filter::{ClinicFilter, SearchCriteria};
use crate::geo::{angular_radius, haversine_km, round2};
use crate::store::ClinicStore;

/// One search invocation: textual criteria plus an optional centre.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub criteria: SearchCriteria,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

/// Resolved geometry for a request that carries a centre.
#[derive(Debug, Clone, Copy)]
pub struct SearchCenter {
    pub center: Coordinates,
    pub radius_km: f64,
}

pub struct SearchEngine {
    config: Arc<CoreConfig>,
    store: Arc<dyn ClinicStore>,
}

impl SearchEngine {
    pub fn new(config: Arc<CoreConfig>, store: Arc<dyn ClinicStore>) -> Self {
        Self { config, store }
    }

    /// Searches clinics by criteria, with radius containment when the
    /// request carries a centre.
    ///
    /// # Arguments
    ///
    /// * `request` - Criteria, optional centre and radius, optional limit.
    ///
    /// # Returns
    ///
    /// Matching clinic summaries. When only one of longitude and latitude
    /// is present the geo part is ignored and the criteria alone decide.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::InvalidArgument` when a provided
    /// coordinate is out of range, and `DirectoryError::UpstreamUnavailable`
    /// when the store cannot be read.
    pub fn search(&self, request: &SearchRequest) -> DirectoryResult<Vec<ClinicSummary>> {
        let filter = ClinicFilter::compile(&request.criteria);
        let limit = self.config.effective_limit(request.limit);
        match self.resolve_center(request)? {
            Some(geo) => {
                let results = self.store.find_within_radius(
                    geo.center,
                    angular_radius(geo.radius_km),
                    &filter,
                    limit,
                )?;
                tracing::debug!(
                    "radius search around ({}, {}) r={}km matched {} clinics",
                    geo.center.longitude(),
                    geo.center.latitude(),
                    geo.radius_km,
                    results.len()
                );
                Ok(results)
            }
            None => Ok(self.store.find(&filter, limit)?),
        }
    }

    /// Finds the clinics nearest to a required centre, closest first, and
    /// annotates each with its distance in kilometres.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::InvalidArgument` when the centre is
    /// missing or out of range.
    pub fn search_nearby(
        &self,
        request: &SearchRequest,
    ) -> DirectoryResult<(SearchCenter, Vec<ClinicSummary>)> {
        let Some(geo) = self.resolve_center(request)? else {
            return Err(DirectoryError::InvalidArgument(
                "Longitude and latitude are required".into(),
            ));
        };
        let filter = ClinicFilter::compile(&request.criteria);
        let limit = self.config.effective_limit(request.limit);
        let max_distance_m = geo.radius_km * 1000.0;
        let results = self
            .store
            .find_nearest(geo.center, max_distance_m, &filter, limit)?
            .into_iter()
            .map(|summary| {
                let km = haversine_km(geo.center, summary.location);
                summary.with_distance(round2(km))
            })
            .collect();
        Ok((geo, results))
    }

    /// A centre exists only when both coordinates were supplied; a lone
    /// coordinate is treated as absent rather than rejected.
    fn resolve_center(&self, request: &SearchRequest) -> DirectoryResult<Option<SearchCenter>> {
        let (Some(longitude), Some(latitude)) = (request.longitude, request.latitude) else {
            return Ok(None);
        };
        let center = Coordinates::new(longitude, latitude)
            .map_err(|e| DirectoryError::InvalidArgument(e.to_string()))?;
        let radius_km = match request.radius_km {
            Some(r) if r.is_finite() && r > 0.0 => r,
            // A zero radius is treated as absent, not rejected.
            Some(r) if r == 0.0 => self.config.default_radius_km(),
            Some(_) => {
                return Err(DirectoryError::InvalidArgument(
                    "Radius must be a positive number of kilometres".into(),
                ));
            }
            None => self.config.default_radius_km(),
        };
        Ok(Some(SearchCenter { center, radius_km }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinic::{Clinic, ClinicDraft, LocationDraft};
    use crate::config::GeocodeConfig;
    use crate::store::MemoryStore;

    fn engine_with(clinics: Vec<Clinic>) -> SearchEngine {
        let config =
            Arc::new(CoreConfig::new(GeocodeConfig::default()).expect("default config is valid"));
        let store = Arc::new(MemoryStore::new());
        for clinic in clinics {
            store.insert(clinic).expect("insert should succeed");
        }
        SearchEngine::new(config, store)
    }

    fn clinic_at(name: &str, city: &str, lng: f64, lat: f64) -> Clinic {
        Clinic::create(ClinicDraft {
            name: name.into(),
            address: "1 Test Way".into(),
            city: city.into(),
            state: "CA".into(),
            zip_code: "94110".into(),
            location: Some(LocationDraft {
                kind: Some("Point".into()),
                coordinates: vec![lng, lat],
            }),
            languages: vec!["en".into(), "es".into()],
            ..ClinicDraft::default()
        })
        .expect("test clinic should validate")
    }

    fn bay_area() -> Vec<Clinic> {
        vec![
            clinic_at("SF Clinic", "San Francisco", -122.4194, 37.7749),
            clinic_at("Oakland Clinic", "Oakland", -122.2712, 37.8044),
        ]
    }

    #[test]
    fn criteria_only_search_ignores_missing_center() {
        let engine = engine_with(bay_area());
        let request = SearchRequest {
            criteria: SearchCriteria {
                city: Some("oak".into()),
                ..SearchCriteria::default()
            },
            // A lone latitude must not turn this into a geo query.
            latitude: Some(37.7749),
            ..SearchRequest::default()
        };
        let results = engine.search(&request).expect("search should succeed");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].city.as_str(), "Oakland");
    }

    #[test]
    fn radius_search_excludes_then_includes_oakland() {
        let engine = engine_with(bay_area());
        let mut request = SearchRequest {
            longitude: Some(-122.4194),
            latitude: Some(37.7749),
            radius_km: Some(10.0),
            ..SearchRequest::default()
        };
        let within_10 = engine.search(&request).expect("search should succeed");
        assert_eq!(within_10.len(), 1);
        assert_eq!(within_10[0].city.as_str(), "San Francisco");

        request.radius_km = Some(15.0);
        let within_15 = engine.search(&request).expect("search should succeed");
        assert_eq!(within_15.len(), 2);
    }

    #[test]
    fn out_of_range_center_is_rejected() {
        let engine = engine_with(bay_area());
        let request = SearchRequest {
            longitude: Some(-190.0),
            latitude: Some(37.7749),
            ..SearchRequest::default()
        };
        assert!(matches!(
            engine.search(&request),
            Err(DirectoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn negative_radius_is_rejected() {
        let engine = engine_with(bay_area());
        let request = SearchRequest {
            longitude: Some(-122.4194),
            latitude: Some(37.7749),
            radius_km: Some(-5.0),
            ..SearchRequest::default()
        };
        assert!(matches!(
            engine.search(&request),
            Err(DirectoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn zero_radius_takes_the_default() {
        let engine = engine_with(bay_area());
        let request = SearchRequest {
            longitude: Some(-122.4194),
            latitude: Some(37.7749),
            radius_km: Some(0.0),
            ..SearchRequest::default()
        };
        let (geo, results) = engine
            .search_nearby(&request)
            .expect("nearby should succeed");
        assert_eq!(geo.radius_km, 25.0);
        // Oakland sits 13 km out, inside the default but not a zero circle.
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn nearby_requires_a_center() {
        let engine = engine_with(bay_area());
        let request = SearchRequest {
            longitude: Some(-122.4194),
            ..SearchRequest::default()
        };
        let err = engine
            .search_nearby(&request)
            .expect_err("missing latitude should fail");
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
    }

    #[test]
    fn nearby_sorts_and_annotates_distances() {
        let mut clinics = bay_area();
        clinics.push(clinic_at("Daly City Clinic", "Daly City", -122.4702, 37.6879));
        let engine = engine_with(clinics);
        let request = SearchRequest {
            longitude: Some(-122.4194),
            latitude: Some(37.7749),
            radius_km: Some(50.0),
            ..SearchRequest::default()
        };
        let (geo, results) = engine
            .search_nearby(&request)
            .expect("nearby should succeed");
        assert_eq!(geo.radius_km, 50.0);
        assert_eq!(results.len(), 3);

        let cities: Vec<&str> = results.iter().map(|c| c.city.as_str()).collect();
        assert_eq!(cities, vec!["San Francisco", "Daly City", "Oakland"]);

        let distances: Vec<f64> = results
            .iter()
            .map(|c| c.distance.expect("nearby results carry distances"))
            .collect();
        assert_eq!(distances[0], 0.0);
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        // SF to Oakland along the great circle.
        assert!((distances[2] - 13.43).abs() < 0.05);
    }

    #[test]
    fn nearby_uses_default_radius_when_absent() {
        let engine = engine_with(bay_area());
        let request = SearchRequest {
            longitude: Some(-122.4194),
            latitude: Some(37.7749),
            ..SearchRequest::default()
        };
        let (geo, results) = engine
            .search_nearby(&request)
            .expect("nearby should succeed");
        assert_eq!(geo.radius_km, 25.0);
        // Both clinics sit well inside the default 25 km.
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn search_results_project_out_reviews() {
        let engine = engine_with(bay_area());
        let results = engine
            .search(&SearchRequest::default())
            .expect("search should succeed");
        let value = serde_json::to_value(&results[0]).expect("summary serializes");
        assert!(value.get("reviews").is_none());
        assert!(value.get("averageRating").is_some());
        // Distance only appears on nearby results.
        assert!(value.get("distance").is_none());
    }
}
