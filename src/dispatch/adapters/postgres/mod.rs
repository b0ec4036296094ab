//! `PostgreSQL` adapters for delivery dispatch persistence.

mod lease;
mod models;
mod repository;
mod schema;

pub use lease::PostgresPlanningLease;
pub use repository::{DispatchPgPool, PostgresDeliveryTaskRepository};
