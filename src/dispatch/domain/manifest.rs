//! Route manifests and planning outcomes.

use super::{Crew, DeliveryTaskId};
use crate::reference::domain::RouteCode;
use chrono::NaiveDate;
use serde::Serialize;

/// Tasks assigned to one crew on one route for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteManifest {
    route_code: RouteCode,
    date: NaiveDate,
    crew: Crew,
    task_ids: Vec<DeliveryTaskId>,
}

impl RouteManifest {
    /// Creates an empty manifest for a crew.
    #[must_use]
    pub const fn new(route_code: RouteCode, date: NaiveDate, crew: Crew) -> Self {
        Self {
            route_code,
            date,
            crew,
            task_ids: Vec::new(),
        }
    }

    /// Returns the route code.
    #[must_use]
    pub const fn route_code(&self) -> &RouteCode {
        &self.route_code
    }

    /// Returns the delivery date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the crew running the manifest.
    #[must_use]
    pub const fn crew(&self) -> &Crew {
        &self.crew
    }

    /// Returns the tasks in stop order.
    #[must_use]
    pub fn task_ids(&self) -> &[DeliveryTaskId] {
        &self.task_ids
    }

    /// Returns the number of stops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.task_ids.len()
    }

    /// Returns whether the manifest has no stops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }

    pub(crate) fn push(&mut self, task_id: DeliveryTaskId) {
        self.task_ids.push(task_id);
    }
}

/// Rollover notice for tasks that did not fit a route's capacity.
///
/// This is reported in the planning outcome and is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityExceeded {
    /// Route that ran out of capacity.
    pub route_code: RouteCode,
    /// Date that was being planned.
    pub date: NaiveDate,
    /// Next scheduled day the tasks moved to.
    pub rolled_over_to: NaiveDate,
    /// Tasks that moved.
    pub task_ids: Vec<DeliveryTaskId>,
}

/// Result of planning one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// The route was planned.
    Planned {
        /// Route code.
        route_code: RouteCode,
        /// Manifests for the date, including ones rebuilt from earlier runs.
        manifests: Vec<RouteManifest>,
        /// Tasks newly assigned in this run.
        newly_assigned: usize,
        /// Rollover notice, when capacity ran out.
        rollover: Option<CapacityExceeded>,
    },
    /// Planning the route failed; other routes were unaffected.
    Failed {
        /// Route code.
        route_code: RouteCode,
        /// Failure description.
        error: String,
    },
}

impl RouteOutcome {
    /// Returns the route code.
    #[must_use]
    pub const fn route_code(&self) -> &RouteCode {
        match self {
            Self::Planned { route_code, .. } | Self::Failed { route_code, .. } => route_code,
        }
    }
}

/// Outcome of a daily planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutePlanSummary {
    /// Planned date.
    pub date: NaiveDate,
    /// Per-route outcomes in route code order.
    pub outcomes: Vec<RouteOutcome>,
}

impl RoutePlanSummary {
    /// Returns every manifest across planned routes.
    pub fn manifests(&self) -> impl Iterator<Item = &RouteManifest> {
        self.outcomes.iter().flat_map(|outcome| match outcome {
            RouteOutcome::Planned { manifests, .. } => manifests.as_slice(),
            RouteOutcome::Failed { .. } => &[],
        })
    }

    /// Returns every rollover notice.
    pub fn rollovers(&self) -> impl Iterator<Item = &CapacityExceeded> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RouteOutcome::Planned { rollover, .. } => rollover.as_ref(),
            RouteOutcome::Failed { .. } => None,
        })
    }

    /// Returns whether any route failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome, RouteOutcome::Failed { .. }))
    }
}
