//! Error types for dispatch domain validation and parsing.

use super::{DeliveryTaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating dispatch domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryDomainError {
    /// An identifier is blank, too long, or contains whitespace.
    #[error("invalid {kind} identifier '{value}'")]
    InvalidIdentifier {
        /// Identifier kind.
        kind: &'static str,
        /// Rejected raw value.
        value: String,
    },

    /// A COD amount was requested on a method that cannot collect it.
    #[error("delivery method {method} does not support cash on delivery")]
    CodNotSupported {
        /// Storage form of the delivery method.
        method: String,
    },

    /// The requested status change is not allowed.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Task identifier.
        task_id: DeliveryTaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// A failed task has no delivery retries left.
    #[error("task {0} has exhausted its delivery retries")]
    RetriesExhausted(DeliveryTaskId),

    /// A self-delivery task is missing its route code.
    #[error("self-delivery task {0} has no route code")]
    MissingRoute(DeliveryTaskId),

    /// An assignment does not match the task's delivery method.
    #[error("task {task_id} assignment conflicts with method {method}")]
    AssignmentMismatch {
        /// Task identifier.
        task_id: DeliveryTaskId,
        /// Storage form of the delivery method.
        method: String,
    },

    /// A stored record carries both a crew and a tracking number.
    #[error("a task cannot carry both a crew and a tracking number")]
    ConflictingAssignment,

    /// A self-delivery task carries a route code for a carrier method or
    /// the other way round.
    #[error("task {0} carries a route code that does not match its method")]
    RouteMismatch(DeliveryTaskId),
}

/// Error returned while parsing task statuses from persistence or callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing delivery methods.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown delivery method: {0}")]
pub struct ParseDeliveryMethodError(pub String);
