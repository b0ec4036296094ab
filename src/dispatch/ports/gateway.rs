//! Carrier integration port.

use crate::dispatch::domain::{DeliveryTask, DeliveryTaskId, OrderId, TrackingNumber};
use crate::reference::domain::{CarrierId, DeliveryArea, Money};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for carrier calls.
pub type CarrierGatewayResult<T> = Result<T, CarrierGatewayError>;

/// Parcel handed to a carrier for pickup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupRequest {
    /// Task being shipped.
    pub task_id: DeliveryTaskId,
    /// Order reference printed on the label.
    pub order_id: OrderId,
    /// Destination area.
    pub area: DeliveryArea,
    /// Cash the carrier collects.
    pub cod_amount: Money,
}

impl From<&DeliveryTask> for PickupRequest {
    fn from(task: &DeliveryTask) -> Self {
        Self {
            task_id: task.id(),
            order_id: task.order_id().clone(),
            area: task.area().clone(),
            cod_amount: task.cod_amount(),
        }
    }
}

/// Carrier acknowledgement of a booked pickup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupConfirmation {
    /// Task the booking belongs to.
    pub task_id: DeliveryTaskId,
    /// Tracking number issued by the carrier.
    pub tracking_number: TrackingNumber,
}

/// Tracking status reported by a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingInfo {
    /// Carrier's own status text.
    pub status: String,
    /// Last reported location, if any.
    pub location: Option<String>,
    /// When the carrier last updated the consignment.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Carrier API contract. Wire protocols live behind implementations.
#[async_trait]
pub trait CarrierGateway: Send + Sync {
    /// Books pickups for a batch of parcels. Parcels missing from the
    /// returned confirmations were not booked.
    async fn schedule_pickup(
        &self,
        carrier_id: &CarrierId,
        requests: &[PickupRequest],
    ) -> CarrierGatewayResult<Vec<PickupConfirmation>>;

    /// Returns the carrier's tracking status for a consignment.
    async fn tracking_info(
        &self,
        carrier_id: &CarrierId,
        tracking_number: &TrackingNumber,
    ) -> CarrierGatewayResult<TrackingInfo>;
}

/// Errors returned by carrier adapters.
#[derive(Debug, Clone, Error)]
pub enum CarrierGatewayError {
    /// The carrier refused the request.
    #[error("carrier {carrier_id} rejected the request: {reason}")]
    Rejected {
        /// Carrier identifier.
        carrier_id: CarrierId,
        /// Carrier-supplied reason.
        reason: String,
    },

    /// The carrier API could not be reached.
    #[error("carrier API unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl CarrierGatewayError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
