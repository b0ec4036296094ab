//! Delivery task status lifecycle.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting to be planned onto a route or picked up.
    Pending,
    /// Task is on a manifest or a carrier pickup is booked.
    Planned,
    /// Driver or carrier has taken the parcel.
    Dispatched,
    /// Parcel is on its way to the customer.
    InTransit,
    /// Parcel reached the customer.
    Delivered,
    /// Delivery attempt failed.
    Failed,
    /// Task was cancelled.
    Cancelled,
}

impl TaskStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Planned,
        Self::Dispatched,
        Self::InTransit,
        Self::Delivered,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Planned => "planned",
            Self::Dispatched => "dispatched",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether the status change follows the lifecycle table.
    ///
    /// `Failed -> Pending` is the retry edge; callers still check the
    /// task's remaining retries.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Planned)
                | (Self::Planned, Self::Dispatched)
                | (Self::Dispatched, Self::InTransit)
                | (Self::InTransit, Self::Delivered | Self::Failed)
                | (Self::Failed, Self::Pending)
                | (
                    Self::Pending | Self::Planned | Self::Dispatched | Self::InTransit,
                    Self::Cancelled
                )
        )
    }

    /// Returns whether no further progress is possible without a retry.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseTaskStatusError(value.to_owned()))
    }
}
