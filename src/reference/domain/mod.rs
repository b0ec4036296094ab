//! Domain model for delivery reference data.
//!
//! The reference domain models route coverage and schedules, carrier
//! coverage and pricing, and the COD surcharge policy shared by every
//! delivery method. Values are validated on construction so that planning
//! code never evaluates an unchecked rule.

mod area;
mod carrier;
mod error;
mod ids;
mod money;
mod pricing;
mod route;
mod schedule;
mod snapshot;
mod surcharge;

pub use area::{CoverageArea, CoverageSpecificity, DeliveryArea};
pub use carrier::{CarrierCoverage, CarrierSpec, DeliveryCarrier, TrackingUrlTemplate};
pub use error::ReferenceDomainError;
pub use ids::{CarrierId, RouteCode};
pub use money::Money;
pub use pricing::PricingRule;
pub use route::{DeliveryRoute, RouteSpec};
pub use schedule::DeliverySchedule;
pub use snapshot::{CarrierRegistrySnapshot, RouteCatalogSnapshot};
pub use surcharge::{CodSurchargePolicy, CodSurchargeTier, Surcharge};
