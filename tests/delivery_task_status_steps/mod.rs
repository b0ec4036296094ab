//! Step definitions for delivery task status scenarios.

mod given;
mod then;
mod when;
pub mod world;
