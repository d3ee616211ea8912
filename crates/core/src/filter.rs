//! Compilation of search criteria into storage predicates.
//!
//! The compiler normalizes the caller's optional criteria once, up front;
//! the resulting [`ClinicFilter`] is what the storage layer evaluates per
//! clinic. There are no error conditions here: an unrecognized language or
//! specialty value compiles into a predicate that matches nothing, it is
//! never rejected.

use clindex_types::{Language, Specialty};

use crate::clinic::Clinic;

/// Optional search criteria as supplied by the caller.
///
/// Absent fields impose no constraint. `accepts_uninsured` is a string flag
/// and only the exact value `"true"` (after trimming) switches the
/// constraint on.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub language: Option<String>,
    pub specialty: Option<String>,
    pub accepts_uninsured: Option<String>,
}

/// One compiled membership constraint over a closed enumeration.
#[derive(Debug, Clone, PartialEq)]
enum TagConstraint<T> {
    /// No constraint.
    Open,
    /// The supplied value is not a member of the enumeration; nothing
    /// matches.
    Impossible,
    /// The clinic's set must contain this member.
    Member(T),
}

impl<T: PartialEq> TagConstraint<T> {
    fn compile(raw: Option<&str>) -> Self
    where
        T: std::str::FromStr,
    {
        match raw.map(str::trim).filter(|v| !v.is_empty()) {
            None => TagConstraint::Open,
            Some(value) => match value.parse::<T>() {
                Ok(member) => TagConstraint::Member(member),
                Err(_) => TagConstraint::Impossible,
            },
        }
    }

    fn accepts(&self, set: &[T]) -> bool {
        match self {
            TagConstraint::Open => true,
            TagConstraint::Impossible => false,
            TagConstraint::Member(member) => set.contains(member),
        }
    }
}

/// The normalized predicate description produced by compilation.
///
/// Storage backends either translate this into their native query form or
/// evaluate it directly via [`ClinicFilter::matches`].
#[derive(Debug, Clone)]
pub struct ClinicFilter {
    city_substring: Option<String>,
    zip_code: Option<String>,
    language: TagConstraint<Language>,
    specialty: TagConstraint<Specialty>,
    must_accept_uninsured: bool,
}

impl ClinicFilter {
    /// Compiles criteria into a filter. Never fails.
    pub fn compile(criteria: &SearchCriteria) -> Self {
        let city_substring = criteria
            .city
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_lowercase);
        let zip_code = criteria
            .zip_code
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        let must_accept_uninsured =
            criteria.accepts_uninsured.as_deref().map(str::trim) == Some("true");

        Self {
            city_substring,
            zip_code,
            language: TagConstraint::compile(criteria.language.as_deref()),
            specialty: TagConstraint::compile(criteria.specialty.as_deref()),
            must_accept_uninsured,
        }
    }

    /// A filter with no constraints at all.
    pub fn open() -> Self {
        Self::compile(&SearchCriteria::default())
    }

    /// Evaluates the predicate against one clinic.
    pub fn matches(&self, clinic: &Clinic) -> bool {
        if let Some(needle) = &self.city_substring {
            if !clinic.city.as_str().to_lowercase().contains(needle) {
                return false;
            }
        }
        if let Some(zip) = &self.zip_code {
            if clinic.zip_code.as_str() != zip {
                return false;
            }
        }
        if !self.language.accepts(&clinic.languages) {
            return false;
        }
        if !self.specialty.accepts(&clinic.specialties) {
            return false;
        }
        if self.must_accept_uninsured && !clinic.accepts_uninsured {
            return false;
        }
        true
    }
}
