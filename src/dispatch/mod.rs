//! Delivery dispatch for Haulier.
//!
//! This module turns confirmed orders into delivery tasks: it ranks viable
//! delivery options for an address, persists a task per order, drives the
//! task through its status lifecycle, schedules carrier pickups with
//! persisted backoff, and packs self-delivery tasks into daily route
//! manifests. Every state change writes its events to a transactional outbox
//! that a relay publishes afterwards. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
