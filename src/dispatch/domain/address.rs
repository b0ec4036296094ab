//! Delivery address view consumed from the address service.

use super::AddressId;
use crate::reference::domain::{DeliveryArea, RouteCode};

/// Address fields the dispatcher needs to plan a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAddress {
    id: AddressId,
    area: DeliveryArea,
    route_hint: Option<RouteCode>,
}

impl DeliveryAddress {
    /// Creates an address view.
    #[must_use]
    pub const fn new(id: AddressId, area: DeliveryArea) -> Self {
        Self {
            id,
            area,
            route_hint: None,
        }
    }

    /// Sets the route suggested by the address service.
    #[must_use]
    pub fn with_route_hint(mut self, route_hint: RouteCode) -> Self {
        self.route_hint = Some(route_hint);
        self
    }

    /// Returns the address identifier.
    #[must_use]
    pub const fn id(&self) -> &AddressId {
        &self.id
    }

    /// Returns the administrative area.
    #[must_use]
    pub const fn area(&self) -> &DeliveryArea {
        &self.area
    }

    /// Returns the suggested route, if any.
    #[must_use]
    pub const fn route_hint(&self) -> Option<&RouteCode> {
        self.route_hint.as_ref()
    }
}
