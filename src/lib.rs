//! Haulier: shipping dispatch for order fulfilment.
//!
//! This crate decides, for each order, which delivery method and provider to
//! use, computes fees and delivery dates, tracks the resulting delivery task
//! through its lifecycle, and batches same-route tasks into daily vehicle
//! manifests.
//!
//! # Architecture
//!
//! Haulier follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//!
//! # Modules
//!
//! - [`reference`]: Route catalog and carrier registry reference data
//! - [`dispatch`]: Delivery options, task lifecycle, route planning and
//!   carrier pickup scheduling
//! - [`config`]: Typed settings and reference-data documents loaded from TOML

pub mod config;
pub mod dispatch;
pub mod reference;
