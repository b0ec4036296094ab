//! Service-level errors and their API classification.

use crate::dispatch::{
    domain::{AddressId, DeliveryDomainError, DeliveryTaskId, OrderId},
    ports::{
        AddressDirectoryError, CarrierGatewayError, DeliveryTaskRepositoryError, FleetRosterError,
        OutboxError, PlanningLeaseError, PublishError,
    },
};
use crate::reference::{
    domain::{CarrierId, ReferenceDomainError, RouteCode},
    ports::ReferenceDataError,
};
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Stable error classes exposed at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced task, order, or address does not exist.
    NotFound,
    /// The request races or collides with existing state.
    Conflict,
    /// No delivery method serves the address.
    NoCoverage,
    /// A COD amount was requested on a method that cannot collect it.
    InvalidCod,
    /// The status change is stale or outside the lifecycle.
    InvalidTransition,
    /// A collaborating service failed.
    ExternalService,
    /// Storage or reference data failed.
    Internal,
}

impl ErrorKind {
    /// Returns the stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::NoCoverage => "no_coverage",
            Self::InvalidCod => "invalid_cod",
            Self::InvalidTransition => "invalid_transition",
            Self::ExternalService => "external_service_error",
            Self::Internal => "internal",
        }
    }

    /// Returns the HTTP status an API layer should answer with.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::NoCoverage => 422,
            Self::InvalidCod => 400,
            Self::InvalidTransition => 412,
            Self::ExternalService => 502,
            Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors returned by dispatch services.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The address does not exist.
    #[error("address not found: {0}")]
    AddressNotFound(AddressId),

    /// The task does not exist.
    #[error("delivery task not found: {0}")]
    TaskNotFound(DeliveryTaskId),

    /// The order has no delivery task.
    #[error("no delivery task for order {0}")]
    OrderNotFound(OrderId),

    /// The order already has an active task.
    #[error("order {0} already has an active delivery task")]
    ActiveTaskExists(OrderId),

    /// No route or carrier serves the address.
    #[error("no delivery option covers address {0}")]
    NoCoverage(AddressId),

    /// The requested method is not among the viable options.
    #[error("delivery method {method} is not available for address {address_id}")]
    MethodNotViable {
        /// Address the task was requested for.
        address_id: AddressId,
        /// Requested method in storage form.
        method: String,
    },

    /// The task's route is no longer in the catalog.
    #[error("route {0} is not in the catalog")]
    RouteUnavailable(RouteCode),

    /// The task's carrier is no longer registered.
    #[error("carrier {0} is not registered")]
    CarrierUnavailable(CarrierId),

    /// The task has no carrier consignment to track.
    #[error("delivery task {0} has no carrier tracking number")]
    TrackingUnavailable(DeliveryTaskId),

    /// Another planning run holds the lease for the date.
    #[error("route planning for {0} is already running")]
    PlanningInProgress(NaiveDate),

    /// The task kept changing underneath the update.
    #[error("delivery task {0} changed concurrently, giving up")]
    ConcurrentUpdate(DeliveryTaskId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] DeliveryDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] DeliveryTaskRepositoryError),

    /// Reference data could not be read.
    #[error(transparent)]
    ReferenceData(#[from] ReferenceDataError),

    /// Reference data rejected an operation.
    #[error(transparent)]
    Reference(#[from] ReferenceDomainError),

    /// Address lookup failed.
    #[error(transparent)]
    AddressDirectory(#[from] AddressDirectoryError),

    /// Carrier call failed.
    #[error(transparent)]
    Carrier(#[from] CarrierGatewayError),

    /// Fleet roster lookup failed.
    #[error(transparent)]
    Fleet(#[from] FleetRosterError),

    /// Planning lease operation failed.
    #[error(transparent)]
    Lease(#[from] PlanningLeaseError),

    /// Outbox read or write failed.
    #[error(transparent)]
    Outbox(#[from] OutboxError),

    /// Event bus rejected an event.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl DispatchError {
    /// Classifies the error for the API boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AddressNotFound(_)
            | Self::TaskNotFound(_)
            | Self::OrderNotFound(_)
            | Self::CarrierUnavailable(_)
            | Self::TrackingUnavailable(_)
            | Self::Repository(DeliveryTaskRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::ActiveTaskExists(_)
            | Self::PlanningInProgress(_)
            | Self::ConcurrentUpdate(_)
            | Self::Repository(
                DeliveryTaskRepositoryError::ActiveTaskExists(_)
                | DeliveryTaskRepositoryError::DuplicateTask(_)
                | DeliveryTaskRepositoryError::VersionConflict { .. },
            ) => ErrorKind::Conflict,
            Self::NoCoverage(_) | Self::MethodNotViable { .. } | Self::RouteUnavailable(_) => {
                ErrorKind::NoCoverage
            }
            Self::Domain(DeliveryDomainError::CodNotSupported { .. }) => ErrorKind::InvalidCod,
            Self::Domain(
                DeliveryDomainError::InvalidTransition { .. }
                | DeliveryDomainError::RetriesExhausted(_),
            ) => ErrorKind::InvalidTransition,
            Self::AddressDirectory(_) | Self::Carrier(_) | Self::Fleet(_) | Self::Publish(_) => {
                ErrorKind::ExternalService
            }
            Self::Domain(_)
            | Self::Repository(_)
            | Self::ReferenceData(_)
            | Self::Reference(_)
            | Self::Lease(_)
            | Self::Outbox(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for dispatch service operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
