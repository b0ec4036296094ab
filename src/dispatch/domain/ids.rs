//! Identifier types for the dispatch domain.

use super::DeliveryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a delivery task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryTaskId(Uuid);

impl DeliveryTaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for DeliveryTaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for DeliveryTaskId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeliveryTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a validated, trimmed, non-empty text identifier.
macro_rules! text_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal, $max:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`DeliveryDomainError::InvalidIdentifier`] when the
            /// value is blank, too long, or contains whitespace.
            pub fn new(value: impl Into<String>) -> Result<Self, DeliveryDomainError> {
                let raw = value.into();
                let trimmed = raw.trim();
                let is_valid = !trimmed.is_empty()
                    && trimmed.len() <= $max
                    && !trimmed.chars().any(char::is_whitespace);
                if !is_valid {
                    return Err(DeliveryDomainError::InvalidIdentifier {
                        kind: $label,
                        value: raw,
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the identifier as `str`.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = DeliveryDomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_identifier!(
    /// Reference to an order owned by the order service.
    OrderId,
    "order",
    64
);
text_identifier!(
    /// Reference to a customer address owned by the address service.
    AddressId,
    "address",
    64
);
text_identifier!(
    /// Identifier of a delivery vehicle.
    VehicleId,
    "vehicle",
    32
);
text_identifier!(
    /// Identifier of a driver.
    DriverId,
    "driver",
    32
);
text_identifier!(
    /// Tracking number issued by a carrier.
    TrackingNumber,
    "tracking number",
    64
);
