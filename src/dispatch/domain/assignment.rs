//! Fulfilment assignment for a delivery task.

use super::{DeliveryDomainError, DriverId, TrackingNumber, VehicleId};
use serde::{Deserialize, Serialize};

/// Vehicle and driver pair running a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Crew {
    vehicle_id: VehicleId,
    driver_id: DriverId,
}

impl Crew {
    /// Creates a crew.
    #[must_use]
    pub const fn new(vehicle_id: VehicleId, driver_id: DriverId) -> Self {
        Self {
            vehicle_id,
            driver_id,
        }
    }

    /// Returns the vehicle identifier.
    #[must_use]
    pub const fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    /// Returns the driver identifier.
    #[must_use]
    pub const fn driver_id(&self) -> &DriverId {
        &self.driver_id
    }
}

/// Who carries the parcel. A task has at most one fulfilment path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assignment {
    /// Nobody has been assigned yet.
    #[default]
    Unassigned,
    /// In-house crew, only valid for self-delivery.
    Crew {
        /// Assigned crew.
        crew: Crew,
    },
    /// Carrier consignment, only valid for carrier methods.
    Carrier {
        /// Carrier tracking number.
        tracking_number: TrackingNumber,
    },
}

impl Assignment {
    /// Builds an assignment from separately stored fields.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::ConflictingAssignment`] when both a
    /// crew and a tracking number are present.
    pub fn from_parts(
        crew: Option<Crew>,
        tracking_number: Option<TrackingNumber>,
    ) -> Result<Self, DeliveryDomainError> {
        match (crew, tracking_number) {
            (None, None) => Ok(Self::Unassigned),
            (Some(assigned), None) => Ok(Self::Crew { crew: assigned }),
            (None, Some(number)) => Ok(Self::Carrier {
                tracking_number: number,
            }),
            (Some(_), Some(_)) => Err(DeliveryDomainError::ConflictingAssignment),
        }
    }

    /// Returns the crew for crew assignments.
    #[must_use]
    pub const fn crew(&self) -> Option<&Crew> {
        match self {
            Self::Crew { crew } => Some(crew),
            Self::Unassigned | Self::Carrier { .. } => None,
        }
    }

    /// Returns the tracking number for carrier assignments.
    #[must_use]
    pub const fn tracking_number(&self) -> Option<&TrackingNumber> {
        match self {
            Self::Carrier { tracking_number } => Some(tracking_number),
            Self::Unassigned | Self::Crew { .. } => None,
        }
    }
}
