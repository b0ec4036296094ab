//! Adapter implementations for reference data ports.

pub mod memory;

pub use memory::{InMemoryCarrierRegistry, InMemoryRouteCatalog};
