//! Identifier types for routes and carriers.

use super::ReferenceDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Code identifying a self-delivery route, for example `BKK-A`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteCode(String);

impl RouteCode {
    /// Longest route code accepted by the task store.
    const MAX_LENGTH: usize = 32;

    /// Creates a validated route code, normalized to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::InvalidRouteCode`] when the value is
    /// empty, too long, or contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ReferenceDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_uppercase();
        let is_valid = !normalized.is_empty()
            && normalized.len() <= Self::MAX_LENGTH
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !is_valid {
            return Err(ReferenceDomainError::InvalidRouteCode(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the route code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RouteCode {
    type Error = ReferenceDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RouteCode> for String {
    fn from(value: RouteCode) -> Self {
        value.0
    }
}

impl fmt::Display for RouteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a third-party carrier, for example `kerry`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CarrierId(String);

impl CarrierId {
    /// Longest carrier identifier accepted by the task store.
    const MAX_LENGTH: usize = 48;

    /// Creates a validated carrier identifier, normalized to lower case.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::InvalidCarrierId`] when the value is
    /// empty, too long, or contains characters outside `[a-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ReferenceDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        let is_valid = !normalized.is_empty()
            && normalized.len() <= Self::MAX_LENGTH
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !is_valid {
            return Err(ReferenceDomainError::InvalidCarrierId(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the carrier identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CarrierId {
    type Error = ReferenceDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CarrierId> for String {
    fn from(value: CarrierId) -> Self {
        value.0
    }
}

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
