//! Read-mostly delivery reference data for Haulier.
//!
//! Routes describe self-managed delivery coverage and weekly schedules;
//! carriers describe third-party providers with typed pricing rules and
//! cutoff times. Both are consumed as immutable snapshots so that a planning
//! operation never observes a half-replaced catalog. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
