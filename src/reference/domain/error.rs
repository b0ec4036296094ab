//! Error types for reference data validation.

use thiserror::Error;

/// Errors returned while constructing route and carrier reference values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferenceDomainError {
    /// The route code is empty or contains unsupported characters.
    #[error("invalid route code '{0}', expected letters, digits, '-' or '_'")]
    InvalidRouteCode(String),

    /// The carrier identifier is empty or contains unsupported characters.
    #[error("invalid carrier identifier '{0}', expected lowercase letters, digits, '-' or '_'")]
    InvalidCarrierId(String),

    /// A coverage area or address field is empty after trimming.
    #[error("{field} must not be empty")]
    EmptyAreaField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A coverage area names a subdistrict without its district.
    #[error("coverage for subdistrict '{0}' must also name its district")]
    SubdistrictWithoutDistrict(String),

    /// A route declares no coverage areas.
    #[error("route {0} must cover at least one area")]
    EmptyRouteCoverage(String),

    /// A carrier declares province coverage without any province.
    #[error("carrier {0} must cover at least one province")]
    EmptyCarrierCoverage(String),

    /// A delivery schedule contains no weekdays.
    #[error("delivery schedule must contain at least one weekday")]
    EmptySchedule,

    /// A weekday name could not be parsed.
    #[error("unknown weekday '{0}'")]
    InvalidWeekday(String),

    /// A basis-point value exceeds 100%.
    #[error("{field} of {value} basis points exceeds 10000")]
    BasisPointsOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: u32,
    },

    /// A zoned pricing rule has neither zones nor a default fee.
    #[error("province-zoned pricing must define zones or a default fee")]
    EmptyPricingZones,

    /// COD surcharge tiers are not strictly ascending or start at zero.
    #[error("COD surcharge tiers must have strictly ascending positive thresholds")]
    UnorderedSurchargeTiers,

    /// A tracking-URL template failed to compile.
    #[error("invalid tracking URL template for carrier {carrier}: {reason}")]
    InvalidTrackingTemplate {
        /// Carrier identifier.
        carrier: String,
        /// Template engine diagnostic.
        reason: String,
    },

    /// A tracking URL could not be rendered.
    #[error("failed to render tracking URL for carrier {carrier}: {reason}")]
    TrackingRender {
        /// Carrier identifier.
        carrier: String,
        /// Template engine diagnostic.
        reason: String,
    },

    /// Two routes share a code.
    #[error("duplicate route code: {0}")]
    DuplicateRoute(String),

    /// Two carriers share an identifier.
    #[error("duplicate carrier identifier: {0}")]
    DuplicateCarrier(String),
}
