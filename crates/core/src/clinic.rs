//! Clinic documents and their write-time validation.
//!
//! This module provides the clinic record at the heart of the directory,
//! together with the payload types clients use to create and patch one:
//!
//! - [`Clinic`]: the full stored document, reviews included
//! - [`ClinicDraft`]: loosely-typed creation payload, validated by
//!   [`Clinic::create`]
//! - [`ClinicPatch`]: partial update, every provided field revalidated by
//!   [`Clinic::apply`]
//! - [`ClinicSummary`]: the projection without reviews that list and search
//!   operations return
//!
//! Payloads carry plain strings and numbers so that every rejection flows
//! through the error taxonomy with a message naming the field, instead of a
//! deserialization failure. The stored document itself uses the validated
//! types from `clindex-types`, so anything read back from a store has the
//! same guarantees as something freshly validated.
//!
//! `reviews` and `averageRating` have no counterpart in the payload types;
//! clients cannot set them, only the review ledger mutates them.

use chrono::{DateTime, Utc};
use clindex_types::{
    Coordinates, Language, NonEmptyText, PaymentMethod, Specialty, StateCode, UnknownCode, UserId,
};
use std::fmt;
use uuid::Uuid;

use crate::constants::{CLOSED, MAX_NAME_CHARS};
use crate::review::Review;
use crate::{DirectoryError, DirectoryResult};

/// Opaque clinic identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ClinicId(Uuid);

impl ClinicId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an id from its string form. `None` means the id cannot refer
    /// to any clinic, which callers report as not found.
    pub fn parse(input: &str) -> Option<Self> {
        Uuid::parse_str(input.trim()).ok().map(Self)
    }
}

impl Default for ClinicId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClinicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opening hours, one line per weekday.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct WeeklyHours {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

impl Default for WeeklyHours {
    fn default() -> Self {
        Self {
            monday: CLOSED.into(),
            tuesday: CLOSED.into(),
            wednesday: CLOSED.into(),
            thursday: CLOSED.into(),
            friday: CLOSED.into(),
            saturday: CLOSED.into(),
            sunday: CLOSED.into(),
        }
    }
}

/// A clinic record as stored and served.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    #[schema(value_type = String)]
    pub id: ClinicId,
    #[schema(value_type = String)]
    pub name: NonEmptyText,
    #[schema(value_type = String)]
    pub address: NonEmptyText,
    #[schema(value_type = String)]
    pub city: NonEmptyText,
    #[schema(value_type = String, example = "CA")]
    pub state: StateCode,
    #[schema(value_type = String)]
    pub zip_code: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
    #[schema(value_type = Object)]
    pub location: Coordinates,
    #[schema(value_type = Vec<String>)]
    pub languages: Vec<Language>,
    #[schema(value_type = Vec<String>)]
    pub specialties: Vec<Specialty>,
    pub services: Vec<String>,
    pub accepts_uninsured: bool,
    pub accepts_medicaid: bool,
    pub accepts_medicare: bool,
    #[schema(value_type = Vec<String>)]
    pub payment_methods: Vec<PaymentMethod>,
    pub has_sliding_scale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<String>,
    pub hours: WeeklyHours,
    pub reviews: Vec<Review>,
    pub average_rating: f64,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A clinic's location as submitted by clients: a GeoJSON-shaped point.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct LocationDraft {
    #[serde(rename = "type", default)]
    #[schema(value_type = Option<String>, example = "Point")]
    pub kind: Option<String>,
    pub coordinates: Vec<f64>,
}

impl LocationDraft {
    fn validate(&self) -> DirectoryResult<Coordinates> {
        if let Some(kind) = self.kind.as_deref() {
            if kind != "Point" {
                return Err(DirectoryError::InvalidArgument(
                    "Location must be a GeoJSON Point".into(),
                ));
            }
        }
        if self.coordinates.len() != 2 {
            return Err(DirectoryError::InvalidArgument(
                "Location coordinates must be [longitude, latitude]".into(),
            ));
        }
        Coordinates::new(self.coordinates[0], self.coordinates[1])
            .map_err(|e| DirectoryError::InvalidArgument(e.to_string()))
    }
}

/// Creation payload. Field names mirror the stored document; everything is
/// loosely typed and validated in [`Clinic::create`].
#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicDraft {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub map_url: Option<String>,
    pub location: Option<LocationDraft>,
    pub languages: Vec<String>,
    pub specialties: Vec<String>,
    pub services: Vec<String>,
    /// Defaults to `true` when absent.
    pub accepts_uninsured: Option<bool>,
    pub accepts_medicaid: bool,
    pub accepts_medicare: bool,
    pub payment_methods: Vec<String>,
    pub has_sliding_scale: bool,
    pub costs: Option<String>,
    pub hours: Option<WeeklyHours>,
    pub is_verified: bool,
}

/// Partial update payload. Absent fields are left untouched.
#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub map_url: Option<String>,
    pub location: Option<LocationDraft>,
    pub languages: Option<Vec<String>>,
    pub specialties: Option<Vec<String>>,
    pub services: Option<Vec<String>>,
    pub accepts_uninsured: Option<bool>,
    pub accepts_medicaid: Option<bool>,
    pub accepts_medicare: Option<bool>,
    pub payment_methods: Option<Vec<String>>,
    pub has_sliding_scale: Option<bool>,
    pub costs: Option<String>,
    pub hours: Option<WeeklyHours>,
    pub is_verified: Option<bool>,
}

impl Clinic {
    /// Validates a draft and builds the clinic.
    ///
    /// All invariants are checked before anything is constructed, so a
    /// failed create leaves no partial state anywhere.
    ///
    /// # Errors
    /// `InvalidArgument` naming the first offending field.
    pub fn create(draft: ClinicDraft) -> DirectoryResult<Self> {
        let name = parse_name(&draft.name)?;
        let address = parse_required(&draft.address, "Address")?;
        let city = parse_required(&draft.city, "City")?;
        let state = parse_state(&draft.state)?;
        let zip_code = parse_required(&draft.zip_code, "Zip code")?;
        let email = parse_email(draft.email.as_deref())?;
        let location = draft
            .location
            .as_ref()
            .ok_or_else(|| {
                DirectoryError::InvalidArgument("Location coordinates are required".into())
            })?
            .validate()?;
        let languages = parse_languages(&draft.languages)?;
        let specialties = parse_specialties(&draft.specialties)?;
        let payment_methods = parse_payment_methods(&draft.payment_methods)?;

        let now = Utc::now();
        Ok(Self {
            id: ClinicId::new(),
            name,
            address,
            city,
            state,
            zip_code,
            phone: normalize_optional(draft.phone),
            email,
            website: normalize_optional(draft.website),
            map_url: normalize_optional(draft.map_url),
            location,
            languages,
            specialties,
            services: normalize_services(&draft.services),
            accepts_uninsured: draft.accepts_uninsured.unwrap_or(true),
            accepts_medicaid: draft.accepts_medicaid,
            accepts_medicare: draft.accepts_medicare,
            payment_methods,
            has_sliding_scale: draft.has_sliding_scale,
            costs: normalize_optional(draft.costs),
            hours: draft.hours.unwrap_or_default(),
            reviews: Vec::new(),
            average_rating: 0.0,
            is_verified: draft.is_verified,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update, revalidating every provided field exactly
    /// as on create, then bumps `updated_at`.
    ///
    /// # Errors
    /// `InvalidArgument` naming the first offending field; the clinic is
    /// untouched on error.
    pub fn apply(&mut self, patch: ClinicPatch) -> DirectoryResult<()> {
        // Validate everything up front so a failure changes nothing.
        let name = patch.name.as_deref().map(parse_name).transpose()?;
        let address = patch
            .address
            .as_deref()
            .map(|v| parse_required(v, "Address"))
            .transpose()?;
        let city = patch
            .city
            .as_deref()
            .map(|v| parse_required(v, "City"))
            .transpose()?;
        let state = patch.state.as_deref().map(parse_state).transpose()?;
        let zip_code = patch
            .zip_code
            .as_deref()
            .map(|v| parse_required(v, "Zip code"))
            .transpose()?;
        let email = match patch.email {
            Some(ref raw) => Some(parse_email(Some(raw))?),
            None => None,
        };
        let location = patch.location.as_ref().map(|l| l.validate()).transpose()?;
        let languages = patch
            .languages
            .as_deref()
            .map(parse_languages)
            .transpose()?;
        let specialties = patch
            .specialties
            .as_deref()
            .map(parse_specialties)
            .transpose()?;
        let payment_methods = patch
            .payment_methods
            .as_deref()
            .map(parse_payment_methods)
            .transpose()?;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = address {
            self.address = v;
        }
        if let Some(v) = city {
            self.city = v;
        }
        if let Some(v) = state {
            self.state = v;
        }
        if let Some(v) = zip_code {
            self.zip_code = v;
        }
        if let Some(v) = patch.phone {
            self.phone = normalize_optional(Some(v));
        }
        if let Some(v) = email {
            self.email = v;
        }
        if let Some(v) = patch.website {
            self.website = normalize_optional(Some(v));
        }
        if let Some(v) = patch.map_url {
            self.map_url = normalize_optional(Some(v));
        }
        if let Some(v) = location {
            self.location = v;
        }
        if let Some(v) = languages {
            self.languages = v;
        }
        if let Some(v) = specialties {
            self.specialties = v;
        }
        if let Some(v) = patch.services {
            self.services = normalize_services(&v);
        }
        if let Some(v) = patch.accepts_uninsured {
            self.accepts_uninsured = v;
        }
        if let Some(v) = patch.accepts_medicaid {
            self.accepts_medicaid = v;
        }
        if let Some(v) = patch.accepts_medicare {
            self.accepts_medicare = v;
        }
        if let Some(v) = payment_methods {
            self.payment_methods = v;
        }
        if let Some(v) = patch.has_sliding_scale {
            self.has_sliding_scale = v;
        }
        if let Some(v) = patch.costs {
            self.costs = normalize_optional(Some(v));
        }
        if let Some(v) = patch.hours {
            self.hours = v;
        }
        if let Some(v) = patch.is_verified {
            self.is_verified = v;
        }

        self.touch();
        Ok(())
    }

    /// Refreshes `updated_at`. Called by anything that mutates the record.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The review a given user left on this clinic, if any.
    pub fn review_by_user(&self, user: &UserId) -> Option<&Review> {
        self.reviews.iter().find(|r| &r.user == user)
    }

    /// The projection returned by list and search operations.
    pub fn summary(&self) -> ClinicSummary {
        ClinicSummary {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state,
            zip_code: self.zip_code.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            website: self.website.clone(),
            map_url: self.map_url.clone(),
            location: self.location,
            languages: self.languages.clone(),
            specialties: self.specialties.clone(),
            services: self.services.clone(),
            accepts_uninsured: self.accepts_uninsured,
            accepts_medicaid: self.accepts_medicaid,
            accepts_medicare: self.accepts_medicare,
            payment_methods: self.payment_methods.clone(),
            has_sliding_scale: self.has_sliding_scale,
            costs: self.costs.clone(),
            hours: self.hours.clone(),
            average_rating: self.average_rating,
            is_verified: self.is_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
            distance: None,
        }
    }
}

/// A clinic with its reviews projected out, as returned by list and search
/// operations. `distance` is only present on nearest-first search results.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicSummary {
    #[schema(value_type = String)]
    pub id: ClinicId,
    #[schema(value_type = String)]
    pub name: NonEmptyText,
    #[schema(value_type = String)]
    pub address: NonEmptyText,
    #[schema(value_type = String)]
    pub city: NonEmptyText,
    #[schema(value_type = String)]
    pub state: StateCode,
    #[schema(value_type = String)]
    pub zip_code: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
    #[schema(value_type = Object)]
    pub location: Coordinates,
    #[schema(value_type = Vec<String>)]
    pub languages: Vec<Language>,
    #[schema(value_type = Vec<String>)]
    pub specialties: Vec<Specialty>,
    pub services: Vec<String>,
    pub accepts_uninsured: bool,
    pub accepts_medicaid: bool,
    pub accepts_medicare: bool,
    #[schema(value_type = Vec<String>)]
    pub payment_methods: Vec<PaymentMethod>,
    pub has_sliding_scale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<String>,
    pub hours: WeeklyHours,
    pub average_rating: f64,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Kilometres from the search center, 2 decimals, nearest-first only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl ClinicSummary {
    pub fn with_distance(mut self, km: f64) -> Self {
        self.distance = Some(km);
        self
    }
}

// ============================================================================
// FIELD VALIDATION
// ============================================================================

fn parse_name(raw: &str) -> DirectoryResult<NonEmptyText> {
    let name = NonEmptyText::new(raw)
        .map_err(|_| DirectoryError::InvalidArgument("Name is required".into()))?;
    if name.char_count() > MAX_NAME_CHARS {
        return Err(DirectoryError::InvalidArgument(format!(
            "Name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}

fn parse_required(raw: &str, field: &str) -> DirectoryResult<NonEmptyText> {
    NonEmptyText::new(raw)
        .map_err(|_| DirectoryError::InvalidArgument(format!("{field} is required")))
}

fn parse_state(raw: &str) -> DirectoryResult<StateCode> {
    StateCode::new(raw).map_err(|e| DirectoryError::InvalidArgument(e.to_string()))
}

/// `None` stays `None`; a provided value must look like an email address.
fn parse_email(raw: Option<&str>) -> DirectoryResult<Option<String>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(DirectoryError::InvalidArgument(
            "Email address is not valid".into(),
        ));
    };
    let domain_ok = domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.');
    if local.is_empty() || !domain_ok || trimmed.contains(char::is_whitespace) {
        return Err(DirectoryError::InvalidArgument(
            "Email address is not valid".into(),
        ));
    }
    Ok(Some(trimmed.to_owned()))
}

fn parse_languages(raw: &[String]) -> DirectoryResult<Vec<Language>> {
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        let language: Language = value
            .parse()
            .map_err(|e: UnknownCode| DirectoryError::InvalidArgument(e.to_string()))?;
        if !out.contains(&language) {
            out.push(language);
        }
    }
    Ok(out)
}

fn parse_specialties(raw: &[String]) -> DirectoryResult<Vec<Specialty>> {
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        let specialty: Specialty = value
            .parse()
            .map_err(|e: UnknownCode| DirectoryError::InvalidArgument(e.to_string()))?;
        if !out.contains(&specialty) {
            out.push(specialty);
        }
    }
    Ok(out)
}

fn parse_payment_methods(raw: &[String]) -> DirectoryResult<Vec<PaymentMethod>> {
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        let method: PaymentMethod = value
            .parse()
            .map_err(|e: UnknownCode| DirectoryError::InvalidArgument(e.to_string()))?;
        if !out.contains(&method) {
            out.push(method);
        }
    }
    Ok(out)
}

fn normalize_services(raw: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        let tag = value.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn normalize_optional(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> ClinicDraft {
        ClinicDraft {
            name: "Mission Community Clinic".into(),
            address: "123 Valencia St".into(),
            city: "San Francisco".into(),
            state: "ca".into(),
            zip_code: "94110".into(),
            email: Some("info@mission-clinic.org".into()),
            location: Some(LocationDraft {
                kind: Some("Point".into()),
                coordinates: vec![-122.4194, 37.7749],
            }),
            languages: vec!["en".into(), "es".into(), "EN".into()],
            specialties: vec!["primary_care".into(), "dental".into()],
            services: vec!["  Vaccinations ".into(), "vaccinations".into(), "".into()],
            payment_methods: vec!["cash".into(), "medicaid".into()],
            ..ClinicDraft::default()
        }
    }

    #[test]
    fn create_applies_defaults_and_normalization() {
        let clinic = Clinic::create(sample_draft()).expect("draft should validate");
        assert_eq!(clinic.state.as_str(), "CA");
        assert!(clinic.accepts_uninsured, "uninsured acceptance defaults on");
        assert!(!clinic.accepts_medicaid);
        assert_eq!(clinic.languages, vec![Language::En, Language::Es]);
        assert_eq!(clinic.services, vec!["vaccinations".to_owned()]);
        assert_eq!(clinic.hours.monday, "Closed");
        assert_eq!(clinic.average_rating, 0.0);
        assert!(clinic.reviews.is_empty());
    }

    #[test]
    fn create_requires_location() {
        let draft = ClinicDraft {
            location: None,
            ..sample_draft()
        };
        let err = Clinic::create(draft).expect_err("missing location should fail");
        assert_eq!(err.to_string(), "Location coordinates are required");
    }

    #[test]
    fn create_rejects_out_of_range_coordinates() {
        let draft = ClinicDraft {
            location: Some(LocationDraft {
                kind: None,
                coordinates: vec![-200.0, 37.0],
            }),
            ..sample_draft()
        };
        assert!(Clinic::create(draft).is_err());
    }

    #[test]
    fn create_rejects_unknown_language() {
        let draft = ClinicDraft {
            languages: vec!["en".into(), "xx".into()],
            ..sample_draft()
        };
        let err = Clinic::create(draft).expect_err("unknown language should fail");
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn create_rejects_bad_state_and_email() {
        let draft = ClinicDraft {
            state: "Cal".into(),
            ..sample_draft()
        };
        assert!(Clinic::create(draft).is_err());

        let draft = ClinicDraft {
            email: Some("not-an-email".into()),
            ..sample_draft()
        };
        assert!(Clinic::create(draft).is_err());
    }

    #[test]
    fn create_rejects_overlong_name() {
        let draft = ClinicDraft {
            name: "x".repeat(201),
            ..sample_draft()
        };
        assert!(Clinic::create(draft).is_err());
    }

    #[test]
    fn apply_updates_only_provided_fields() {
        let mut clinic = Clinic::create(sample_draft()).expect("draft should validate");
        let before_created = clinic.created_at;

        clinic
            .apply(ClinicPatch {
                city: Some("Oakland".into()),
                accepts_medicare: Some(true),
                ..ClinicPatch::default()
            })
            .expect("patch should validate");

        assert_eq!(clinic.city.as_str(), "Oakland");
        assert!(clinic.accepts_medicare);
        assert_eq!(clinic.name.as_str(), "Mission Community Clinic");
        assert_eq!(clinic.created_at, before_created);
    }

    #[test]
    fn apply_rejects_invalid_field_without_mutating() {
        let mut clinic = Clinic::create(sample_draft()).expect("draft should validate");
        let err = clinic
            .apply(ClinicPatch {
                city: Some("Oakland".into()),
                state: Some("California".into()),
                ..ClinicPatch::default()
            })
            .expect_err("bad state should fail");
        assert!(matches!(err, DirectoryError::InvalidArgument(_)));
        assert_eq!(clinic.city.as_str(), "San Francisco");
    }

    #[test]
    fn serialized_document_is_camel_case_geojson() {
        let clinic = Clinic::create(sample_draft()).expect("draft should validate");
        let json = serde_json::to_value(&clinic).expect("should serialize");
        assert_eq!(json["zipCode"], "94110");
        assert_eq!(json["location"]["type"], "Point");
        assert_eq!(json["location"]["coordinates"][0], -122.4194);
        assert_eq!(json["averageRating"], 0.0);
        assert!(json.get("phone").is_none(), "absent optionals are omitted");
    }

    #[test]
    fn summary_drops_reviews_and_round_trips_fields() {
        let clinic = Clinic::create(sample_draft()).expect("draft should validate");
        let summary = clinic.summary();
        let json = serde_json::to_value(&summary).expect("should serialize");
        assert!(json.get("reviews").is_none());
        assert!(json.get("distance").is_none());
        assert_eq!(json["name"], "Mission Community Clinic");

        let annotated = clinic.summary().with_distance(13.43);
        let json = serde_json::to_value(&annotated).expect("should serialize");
        assert_eq!(json["distance"], 13.43);
    }
}
