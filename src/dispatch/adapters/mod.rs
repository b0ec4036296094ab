//! Adapter implementations for delivery dispatch ports.

pub mod memory;
pub mod postgres;
