//! Dispatch configuration.
//!
//! Settings and reference data are plain TOML documents. Both are validated
//! when loaded so that services never start with an unordered COD tier
//! list, an uncompilable tracking template, or an unusable fleet entry.

mod error;
mod loader;
mod reference;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigDirectory;
pub use reference::{CarrierDocument, CoverageDocument, ReferenceDataDocument, RouteDocument};
pub use settings::{
    DeliverySettings, DispatchSettings, FleetCrewSettings, OperationsSettings, OutboxSettings,
    PickupSettings, PlanningSettings,
};
