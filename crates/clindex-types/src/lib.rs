//! Validated primitive types for the clinic directory.
//!
//! Everything here enforces its invariant at construction time and again on
//! deserialization, so the rest of the workspace can take these values at
//! face value. Closed enumerations (`Language`, `Specialty`,
//! `PaymentMethod`) replace the free-form string sets of the source data.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Input is trimmed of leading and trailing whitespace during
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    ///
    /// # Errors
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the text.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Error for two-letter state code validation.
#[derive(Debug, thiserror::Error)]
#[error("State must be a two-letter code")]
pub struct StateCodeError;

/// A US state code: exactly two ASCII letters, stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCode([u8; 2]);

impl StateCode {
    /// Parses a state code, accepting either case.
    ///
    /// # Errors
    /// Returns `StateCodeError` unless the trimmed input is exactly two
    /// ASCII letters.
    pub fn new(input: impl AsRef<str>) -> Result<Self, StateCodeError> {
        let trimmed = input.as_ref().trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return Err(StateCodeError);
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Validated as ASCII letters on construction.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for StateCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for StateCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StateCode::new(&s).map_err(serde::de::Error::custom)
    }
}

/// An opaque, verified user identity supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// # Errors
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UserId::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Error returned when a review rating falls outside 1..=5.
#[derive(Debug, thiserror::Error)]
#[error("Rating must be an integer between 1 and 5")]
pub struct RatingError;

/// A review rating: an integer in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    /// Returns `RatingError` if the value is outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        if !(i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            return Err(RatingError);
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Rating {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Rating::new(value).map_err(serde::de::Error::custom)
    }
}

/// Errors for geographic coordinate validation.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatesError {
    #[error("Longitude must be a finite number between -180 and 180")]
    Longitude,
    #[error("Latitude must be a finite number between -90 and 90")]
    Latitude,
    /// The serialized form was not a GeoJSON point
    #[error("Location must be a GeoJSON Point")]
    NotAPoint,
}

/// A geographic point with range-checked coordinates.
///
/// Serializes as a GeoJSON point, longitude first:
/// `{"type": "Point", "coordinates": [lng, lat]}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    longitude: f64,
    latitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    ///
    /// # Arguments
    /// * `longitude` - degrees east, `-180..=180`
    /// * `latitude` - degrees north, `-90..=90`
    ///
    /// # Errors
    /// Returns `CoordinatesError` if either value is out of range or not
    /// finite.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, CoordinatesError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesError::Longitude);
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesError::Latitude);
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct GeoPoint {
    #[serde(rename = "type")]
    kind: String,
    coordinates: [f64; 2],
}

impl serde::Serialize for Coordinates {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        GeoPoint {
            kind: "Point".to_owned(),
            coordinates: [self.longitude, self.latitude],
        }
        .serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Coordinates {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let point = GeoPoint::deserialize(deserializer)?;
        if point.kind != "Point" {
            return Err(serde::de::Error::custom(CoordinatesError::NotAPoint));
        }
        Coordinates::new(point.coordinates[0], point.coordinates[1])
            .map_err(serde::de::Error::custom)
    }
}

/// Error returned when parsing a value that is not a member of one of the
/// closed enumerations.
#[derive(Debug, thiserror::Error)]
#[error("Unrecognised {kind} code: {code}")]
pub struct UnknownCode {
    kind: &'static str,
    code: String,
}

impl UnknownCode {
    fn new(kind: &'static str, code: &str) -> Self {
        Self {
            kind,
            code: code.to_owned(),
        }
    }
}

/// Languages a clinic can offer services in (ISO 639-1 codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Ht,
    Zh,
    Ar,
    Vi,
    Ko,
    Ru,
    Tl,
    Fr,
    Pt,
    Hi,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::En,
        Language::Es,
        Language::Ht,
        Language::Zh,
        Language::Ar,
        Language::Vi,
        Language::Ko,
        Language::Ru,
        Language::Tl,
        Language::Fr,
        Language::Pt,
        Language::Hi,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Ht => "ht",
            Language::Zh => "zh",
            Language::Ar => "ar",
            Language::Vi => "vi",
            Language::Ko => "ko",
            Language::Ru => "ru",
            Language::Tl => "tl",
            Language::Fr => "fr",
            Language::Pt => "pt",
            Language::Hi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .find(|l| l.code() == code)
            .copied()
            .ok_or_else(|| UnknownCode::new("language", s))
    }
}

/// Clinic specialty areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    PrimaryCare,
    Dental,
    MentalHealth,
    WomensHealth,
    Pediatrics,
    Geriatrics,
    UrgentCare,
    Vision,
    SubstanceAbuse,
    ChronicDisease,
}

impl Specialty {
    pub const ALL: [Specialty; 10] = [
        Specialty::PrimaryCare,
        Specialty::Dental,
        Specialty::MentalHealth,
        Specialty::WomensHealth,
        Specialty::Pediatrics,
        Specialty::Geriatrics,
        Specialty::UrgentCare,
        Specialty::Vision,
        Specialty::SubstanceAbuse,
        Specialty::ChronicDisease,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Specialty::PrimaryCare => "primary_care",
            Specialty::Dental => "dental",
            Specialty::MentalHealth => "mental_health",
            Specialty::WomensHealth => "womens_health",
            Specialty::Pediatrics => "pediatrics",
            Specialty::Geriatrics => "geriatrics",
            Specialty::UrgentCare => "urgent_care",
            Specialty::Vision => "vision",
            Specialty::SubstanceAbuse => "substance_abuse",
            Specialty::ChronicDisease => "chronic_disease",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Specialty {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .find(|sp| sp.code() == code)
            .copied()
            .ok_or_else(|| UnknownCode::new("specialty", s))
    }
}

/// Payment methods a clinic accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Debit,
    Check,
    PaymentPlan,
    Medicaid,
    Medicare,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 7] = [
        PaymentMethod::Cash,
        PaymentMethod::Credit,
        PaymentMethod::Debit,
        PaymentMethod::Check,
        PaymentMethod::PaymentPlan,
        PaymentMethod::Medicaid,
        PaymentMethod::Medicare,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Check => "check",
            PaymentMethod::PaymentPlan => "payment_plan",
            PaymentMethod::Medicaid => "medicaid",
            PaymentMethod::Medicare => "medicare",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .find(|m| m.code() == code)
            .copied()
            .ok_or_else(|| UnknownCode::new("payment method", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_whitespace() {
        let text = NonEmptyText::new("  hello  ").expect("should accept non-empty input");
        assert_eq!(text.as_str(), "hello");
        assert!(NonEmptyText::new("   ").is_err());
        assert!(NonEmptyText::new("").is_err());
    }

    #[test]
    fn state_code_uppercases_and_validates_length() {
        let state = StateCode::new("ca").expect("should accept two letters");
        assert_eq!(state.as_str(), "CA");
        assert!(StateCode::new("C").is_err());
        assert!(StateCode::new("CAL").is_err());
        assert!(StateCode::new("C4").is_err());
    }

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(1).expect("1 is valid").value(), 1);
        assert_eq!(Rating::new(5).expect("5 is valid").value(), 5);
    }

    #[test]
    fn rating_deserialize_rejects_out_of_range() {
        let ok: Rating = serde_json::from_str("4").expect("4 should deserialize");
        assert_eq!(ok.value(), 4);
        assert!(serde_json::from_str::<Rating>("0").is_err());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn coordinates_range_checks() {
        assert!(Coordinates::new(-122.4194, 37.7749).is_ok());
        assert!(Coordinates::new(-181.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, 91.0).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn coordinates_serialize_as_geojson_point() {
        let point = Coordinates::new(-122.4194, 37.7749).expect("valid coordinates");
        let json = serde_json::to_value(point).expect("should serialize");
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], -122.4194);
        assert_eq!(json["coordinates"][1], 37.7749);

        let back: Coordinates = serde_json::from_value(json).expect("should deserialize");
        assert_eq!(back, point);
    }

    #[test]
    fn coordinates_deserialize_rejects_non_point() {
        let json = r#"{"type": "Polygon", "coordinates": [0.0, 0.0]}"#;
        assert!(serde_json::from_str::<Coordinates>(json).is_err());
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("ES".parse::<Language>().expect("known code"), Language::Es);
        assert_eq!(" ht ".parse::<Language>().expect("known code"), Language::Ht);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn specialty_codes_round_trip() {
        for sp in Specialty::ALL {
            assert_eq!(
                sp.code().parse::<Specialty>().expect("code should parse"),
                sp
            );
        }
        assert!("surgery".parse::<Specialty>().is_err());
    }

    #[test]
    fn payment_method_serde_uses_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::PaymentPlan).expect("should serialize");
        assert_eq!(json, "\"payment_plan\"");
        let back: PaymentMethod =
            serde_json::from_str("\"medicaid\"").expect("should deserialize");
        assert_eq!(back, PaymentMethod::Medicaid);
    }

    #[test]
    fn user_id_rejects_empty() {
        assert!(UserId::new("  ").is_err());
        let user = UserId::new("user-1").expect("non-empty id");
        assert_eq!(user.as_str(), "user-1");
    }
}
