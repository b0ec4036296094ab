//! Delivery methods.

use super::ParseDeliveryMethodError;
use crate::reference::domain::CarrierId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage prefix for carrier methods.
const CARRIER_PREFIX: &str = "carrier:";

/// How a task is delivered: by the in-house fleet or by a named carrier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "carrier_id", rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// In-house delivery along a scheduled route.
    SelfDelivery,
    /// Third-party carrier delivery.
    Carrier(CarrierId),
}

impl DeliveryMethod {
    /// Returns whether this is in-house delivery.
    #[must_use]
    pub const fn is_self_delivery(&self) -> bool {
        matches!(self, Self::SelfDelivery)
    }

    /// Returns the carrier for carrier methods.
    #[must_use]
    pub const fn carrier_id(&self) -> Option<&CarrierId> {
        match self {
            Self::SelfDelivery => None,
            Self::Carrier(carrier_id) => Some(carrier_id),
        }
    }

    /// Returns the canonical storage representation, `self_delivery` or
    /// `carrier:<id>`.
    #[must_use]
    pub fn to_storage(&self) -> String {
        match self {
            Self::SelfDelivery => "self_delivery".to_owned(),
            Self::Carrier(carrier_id) => format!("{CARRIER_PREFIX}{carrier_id}"),
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage())
    }
}

impl TryFrom<&str> for DeliveryMethod {
    type Error = ParseDeliveryMethodError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim();
        if normalized.eq_ignore_ascii_case("self_delivery") {
            return Ok(Self::SelfDelivery);
        }
        normalized
            .strip_prefix(CARRIER_PREFIX)
            .and_then(|carrier| CarrierId::new(carrier).ok())
            .map(Self::Carrier)
            .ok_or_else(|| ParseDeliveryMethodError(value.to_owned()))
    }
}
