//! Scriptable in-memory carrier gateway.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::dispatch::{
    domain::TrackingNumber,
    ports::{
        CarrierGateway, CarrierGatewayError, CarrierGatewayResult, PickupConfirmation,
        PickupRequest, TrackingInfo,
    },
};
use crate::reference::domain::CarrierId;

/// Carrier gateway that books every pickup unless told to fail.
///
/// Tracking numbers are `<CARRIER>-<sequence>`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCarrierGateway {
    state: Arc<Mutex<GatewayState>>,
}

#[derive(Debug, Default)]
struct GatewayState {
    failures_remaining: u32,
    sequence: u64,
    calls: Vec<(CarrierId, usize)>,
    booked: HashMap<TrackingNumber, CarrierId>,
}

impl InMemoryCarrierGateway {
    /// Creates a gateway that accepts every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` pickup calls fail as unavailable.
    pub fn fail_next(&self, count: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.failures_remaining = count;
        }
    }

    /// Returns `(carrier, batch size)` for every pickup call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(CarrierId, usize)> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> CarrierGatewayError {
    CarrierGatewayError::unavailable(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl CarrierGateway for InMemoryCarrierGateway {
    async fn schedule_pickup(
        &self,
        carrier_id: &CarrierId,
        requests: &[PickupRequest],
    ) -> CarrierGatewayResult<Vec<PickupConfirmation>> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.calls.push((carrier_id.clone(), requests.len()));
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(CarrierGatewayError::unavailable(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "carrier API timed out",
            )));
        }

        let mut confirmations = Vec::with_capacity(requests.len());
        for request in requests {
            state.sequence = state.sequence.saturating_add(1);
            let raw = format!(
                "{}-{:06}",
                carrier_id.as_str().to_ascii_uppercase(),
                state.sequence
            );
            let tracking_number = TrackingNumber::new(raw).map_err(|err| {
                CarrierGatewayError::Rejected {
                    carrier_id: carrier_id.clone(),
                    reason: err.to_string(),
                }
            })?;
            state
                .booked
                .insert(tracking_number.clone(), carrier_id.clone());
            confirmations.push(PickupConfirmation {
                task_id: request.task_id,
                tracking_number,
            });
        }
        Ok(confirmations)
    }

    async fn tracking_info(
        &self,
        carrier_id: &CarrierId,
        tracking_number: &TrackingNumber,
    ) -> CarrierGatewayResult<TrackingInfo> {
        let state = self.state.lock().map_err(poisoned)?;
        match state.booked.get(tracking_number) {
            Some(owner) if owner == carrier_id => Ok(TrackingInfo {
                status: "pickup booked".to_owned(),
                location: None,
                updated_at: None,
            }),
            _ => Err(CarrierGatewayError::Rejected {
                carrier_id: carrier_id.clone(),
                reason: format!("unknown tracking number {tracking_number}"),
            }),
        }
    }
}
