//! Address areas and the coverage areas that match them.

use super::ReferenceDomainError;
use serde::{Deserialize, Serialize};

/// Administrative area of a delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryArea {
    province: String,
    district: String,
    subdistrict: String,
}

impl DeliveryArea {
    /// Creates a validated delivery area.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::EmptyAreaField`] when any part is
    /// empty after trimming.
    pub fn new(
        province: impl Into<String>,
        district: impl Into<String>,
        subdistrict: impl Into<String>,
    ) -> Result<Self, ReferenceDomainError> {
        Ok(Self {
            province: required(province.into(), "province")?,
            district: required(district.into(), "district")?,
            subdistrict: required(subdistrict.into(), "subdistrict")?,
        })
    }

    /// Returns the province.
    #[must_use]
    pub fn province(&self) -> &str {
        &self.province
    }

    /// Returns the district.
    #[must_use]
    pub fn district(&self) -> &str {
        &self.district
    }

    /// Returns the subdistrict.
    #[must_use]
    pub fn subdistrict(&self) -> &str {
        &self.subdistrict
    }
}

/// How precisely a coverage area matched an address.
///
/// Ordering follows precision: a subdistrict match outranks a district
/// match, which outranks a province match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CoverageSpecificity {
    /// Only the province matched.
    Province,
    /// Province and district matched.
    District,
    /// Province, district, and subdistrict matched.
    Subdistrict,
}

/// Area served by a route: a province, optionally narrowed to a district and
/// subdistrict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageArea {
    province: String,
    district: Option<String>,
    subdistrict: Option<String>,
}

impl CoverageArea {
    /// Creates a validated coverage area.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::EmptyAreaField`] for blank parts and
    /// [`ReferenceDomainError::SubdistrictWithoutDistrict`] when a
    /// subdistrict is given without its district.
    pub fn new(
        province: impl Into<String>,
        district: Option<String>,
        subdistrict: Option<String>,
    ) -> Result<Self, ReferenceDomainError> {
        let province_name = required(province.into(), "province")?;
        let district_name = district
            .map(|value| required(value, "district"))
            .transpose()?;
        let subdistrict_name = subdistrict
            .map(|value| required(value, "subdistrict"))
            .transpose()?;
        if let (None, Some(name)) = (&district_name, &subdistrict_name) {
            return Err(ReferenceDomainError::SubdistrictWithoutDistrict(
                name.clone(),
            ));
        }
        Ok(Self {
            province: province_name,
            district: district_name,
            subdistrict: subdistrict_name,
        })
    }

    /// Creates coverage for a whole province.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::EmptyAreaField`] when the province is
    /// blank.
    pub fn province(province: impl Into<String>) -> Result<Self, ReferenceDomainError> {
        Self::new(province, None, None)
    }

    /// Returns the covered province.
    #[must_use]
    pub fn province_name(&self) -> &str {
        &self.province
    }

    /// Returns how specifically this coverage matches `area`, or `None` when
    /// the area lies outside it.
    #[must_use]
    pub fn specificity_for(&self, area: &DeliveryArea) -> Option<CoverageSpecificity> {
        if !same_place(&self.province, area.province()) {
            return None;
        }
        let Some(district) = &self.district else {
            return Some(CoverageSpecificity::Province);
        };
        if !same_place(district, area.district()) {
            return None;
        }
        match &self.subdistrict {
            None => Some(CoverageSpecificity::District),
            Some(subdistrict) if same_place(subdistrict, area.subdistrict()) => {
                Some(CoverageSpecificity::Subdistrict)
            }
            Some(_) => None,
        }
    }
}

/// Compares two place names ignoring case and surrounding whitespace.
pub(crate) fn same_place(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

fn required(value: String, field: &'static str) -> Result<String, ReferenceDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReferenceDomainError::EmptyAreaField { field });
    }
    Ok(trimmed.to_owned())
}
