//! Port contracts for reference data.
//!
//! Each port hands out an immutable snapshot per call; callers keep the
//! snapshot for the duration of one planning operation.

pub mod catalog;

pub use catalog::{CarrierRegistry, ReferenceDataError, ReferenceDataResult, RouteCatalog};
