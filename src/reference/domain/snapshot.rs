//! Immutable reference-data snapshots consumed by planning operations.

use super::{
    CarrierId, DeliveryArea, DeliveryCarrier, DeliveryRoute,
    ReferenceDomainError, RouteCode,
};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// Point-in-time view of the route catalog.
///
/// Routes are kept in route-code order so that every lookup is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCatalogSnapshot {
    routes: Vec<DeliveryRoute>,
    loaded_at: DateTime<Utc>,
}

impl RouteCatalogSnapshot {
    /// Creates a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::DuplicateRoute`] when two routes share
    /// a code.
    pub fn new(
        mut routes: Vec<DeliveryRoute>,
        loaded_at: DateTime<Utc>,
    ) -> Result<Self, ReferenceDomainError> {
        routes.sort_by(|left, right| left.code().cmp(right.code()));
        if let Some(pair) = routes
            .windows(2)
            .find(|pair| matches!(pair, [left, right] if left.code() == right.code()))
        {
            let code = pair
                .first()
                .map(|route| route.code().as_str().to_owned())
                .unwrap_or_default();
            return Err(ReferenceDomainError::DuplicateRoute(code));
        }
        Ok(Self { routes, loaded_at })
    }

    /// Returns an empty catalog.
    #[must_use]
    pub const fn empty(loaded_at: DateTime<Utc>) -> Self {
        Self {
            routes: Vec::new(),
            loaded_at,
        }
    }

    /// Returns all routes in code order.
    #[must_use]
    pub fn routes(&self) -> &[DeliveryRoute] {
        &self.routes
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Finds a route by code regardless of its active flag.
    #[must_use]
    pub fn find(&self, code: &RouteCode) -> Option<&DeliveryRoute> {
        self.routes
            .binary_search_by(|route| route.code().cmp(code))
            .ok()
            .and_then(|index| self.routes.get(index))
    }

    /// Selects the active route serving `area`.
    ///
    /// The most specific coverage wins; among equally specific matches the
    /// route named by `hint` wins, then the lowest route code.
    #[must_use]
    pub fn best_match(
        &self,
        area: &DeliveryArea,
        hint: Option<&RouteCode>,
    ) -> Option<&DeliveryRoute> {
        self.routes
            .iter()
            .filter(|route| route.is_active())
            .filter_map(|route| route.coverage_match(area).map(|matched| (route, matched)))
            .min_by_key(|(route, matched)| {
                let hinted = hint.is_some_and(|code| code == route.code());
                (Reverse(*matched), !hinted, route.code().clone())
            })
            .map(|(route, _)| route)
    }
}

/// Point-in-time view of the carrier registry, in identifier order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierRegistrySnapshot {
    carriers: Vec<DeliveryCarrier>,
    loaded_at: DateTime<Utc>,
}

impl CarrierRegistrySnapshot {
    /// Creates a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::DuplicateCarrier`] when two carriers
    /// share an identifier.
    pub fn new(
        mut carriers: Vec<DeliveryCarrier>,
        loaded_at: DateTime<Utc>,
    ) -> Result<Self, ReferenceDomainError> {
        carriers.sort_by(|left, right| left.id().cmp(right.id()));
        if let Some(pair) = carriers
            .windows(2)
            .find(|pair| matches!(pair, [left, right] if left.id() == right.id()))
        {
            let id = pair
                .first()
                .map(|carrier| carrier.id().as_str().to_owned())
                .unwrap_or_default();
            return Err(ReferenceDomainError::DuplicateCarrier(id));
        }
        Ok(Self {
            carriers,
            loaded_at,
        })
    }

    /// Returns an empty registry.
    #[must_use]
    pub const fn empty(loaded_at: DateTime<Utc>) -> Self {
        Self {
            carriers: Vec::new(),
            loaded_at,
        }
    }

    /// Returns all carriers in identifier order.
    #[must_use]
    pub fn carriers(&self) -> &[DeliveryCarrier] {
        &self.carriers
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Finds a carrier by identifier regardless of its active flag.
    #[must_use]
    pub fn find(&self, id: &CarrierId) -> Option<&DeliveryCarrier> {
        self.carriers
            .binary_search_by(|carrier| carrier.id().cmp(id))
            .ok()
            .and_then(|index| self.carriers.get(index))
    }

    /// Returns the active carriers serving `area`, in identifier order.
    pub fn covering<'a>(
        &'a self,
        area: &'a DeliveryArea,
    ) -> impl Iterator<Item = &'a DeliveryCarrier> + 'a {
        self.carriers
            .iter()
            .filter(move |carrier| carrier.is_active() && carrier.covers(area))
    }
}
