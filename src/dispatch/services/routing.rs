//! Daily route planning for self-delivery tasks.

use super::{DispatchError, DispatchResult};
use crate::dispatch::{
    domain::{
        Assignment, CapacityExceeded, Crew, DeliveryEvent, DeliveryTask, RouteManifest,
        RouteOutcome, RoutePlanSummary, TaskStatus,
    },
    ports::{DeliveryTaskRepository, FleetRoster, PlanningLease},
};
use crate::reference::{
    domain::{RouteCatalogSnapshot, RouteCode},
    ports::RouteCatalog,
};
use chrono::{Datelike, Duration, NaiveDate};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Settings for daily route planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlanningSettings {
    /// Stops one vehicle can take per day.
    pub vehicle_capacity: usize,
    /// How long a planning lease stays valid without release.
    pub lease_ttl: Duration,
    /// Name recorded as the lease holder.
    pub holder: String,
}

impl Default for RoutePlanningSettings {
    fn default() -> Self {
        Self {
            vehicle_capacity: 20,
            lease_ttl: Duration::minutes(10),
            holder: "route-planner".to_owned(),
        }
    }
}

/// Groups pending self-delivery tasks into per-crew manifests.
pub struct RoutePlanner<R, C>
where
    R: DeliveryTaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    routes: Arc<dyn RouteCatalog>,
    fleet: Arc<dyn FleetRoster>,
    lease: Arc<dyn PlanningLease>,
    clock: Arc<C>,
    settings: RoutePlanningSettings,
}

/// Changes produced for one route before they are saved.
struct RoutePlan {
    manifests: Vec<RouteManifest>,
    changed: Vec<DeliveryTask>,
    events: Vec<DeliveryEvent>,
    newly_assigned: usize,
    rollover: Option<CapacityExceeded>,
}

impl<R, C> RoutePlanner<R, C>
where
    R: DeliveryTaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a route planner.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        routes: Arc<dyn RouteCatalog>,
        fleet: Arc<dyn FleetRoster>,
        lease: Arc<dyn PlanningLease>,
        clock: Arc<C>,
        settings: RoutePlanningSettings,
    ) -> Self {
        Self {
            repository,
            routes,
            fleet,
            lease,
            clock,
            settings,
        }
    }

    /// Plans every route for `date`.
    ///
    /// Re-running for the same date rebuilds the same manifests and makes
    /// no new assignments. A failing route is reported in its outcome and
    /// does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PlanningInProgress`] when another run holds
    /// the lease for `date`, or an error when the catalog or pending tasks
    /// cannot be read.
    #[instrument(skip(self))]
    pub async fn plan_daily_routes(&self, date: NaiveDate) -> DispatchResult<RoutePlanSummary> {
        let token = self
            .lease
            .try_acquire(date, &self.settings.holder, self.settings.lease_ttl)
            .await?
            .ok_or(DispatchError::PlanningInProgress(date))?;

        let result = self.plan_under_lease(date).await;
        if let Err(err) = self.lease.release(&token).await {
            warn!(%date, error = %err, "failed to release planning lease");
        }
        result
    }

    async fn plan_under_lease(&self, date: NaiveDate) -> DispatchResult<RoutePlanSummary> {
        let catalog = self.routes.snapshot().await?;
        let pending = self.repository.find_pending_for_date(date).await?;

        let mut route_codes: BTreeSet<RouteCode> = catalog
            .routes()
            .iter()
            .filter(|route| route.is_active() && route.schedule().runs_on(date.weekday()))
            .map(|route| route.code().clone())
            .collect();
        route_codes.extend(pending.iter().filter_map(|task| task.route_code().cloned()));

        let mut outcomes = Vec::new();
        for route_code in route_codes {
            match self.plan_route(&catalog, &route_code, date).await {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(err) => {
                    warn!(route_code = %route_code, %date, error = %err, "route planning failed");
                    outcomes.push(RouteOutcome::Failed {
                        route_code,
                        error: err.to_string(),
                    });
                }
            }
        }

        let summary = RoutePlanSummary { date, outcomes };
        info!(
            %date,
            manifests = summary.manifests().count(),
            rollovers = summary.rollovers().count(),
            "planned daily routes"
        );
        Ok(summary)
    }

    async fn plan_route(
        &self,
        catalog: &RouteCatalogSnapshot,
        route_code: &RouteCode,
        date: NaiveDate,
    ) -> DispatchResult<Option<RouteOutcome>> {
        let tasks = self.repository.find_by_route(route_code, date).await?;
        if tasks.is_empty() {
            return Ok(None);
        }
        let route = catalog
            .find(route_code)
            .ok_or_else(|| DispatchError::RouteUnavailable(route_code.clone()))?;
        let crews = self.fleet.crews_for(route_code, date).await?;
        let next_date = route.schedule().next_after(date);

        let plan = self.build_plan(route_code, date, crews, tasks, next_date)?;
        if !plan.changed.is_empty() {
            self.repository
                .save_batch(&plan.changed, &plan.events)
                .await?;
        }
        if let Some(rollover) = &plan.rollover {
            warn!(
                route_code = %route_code,
                %date,
                rolled_over = rollover.task_ids.len(),
                next_date = %rollover.rolled_over_to,
                "route capacity exceeded"
            );
        }

        Ok(Some(RouteOutcome::Planned {
            route_code: route_code.clone(),
            manifests: plan
                .manifests
                .into_iter()
                .filter(|manifest| !manifest.is_empty())
                .collect(),
            newly_assigned: plan.newly_assigned,
            rollover: plan.rollover,
        }))
    }

    fn build_plan(
        &self,
        route_code: &RouteCode,
        date: NaiveDate,
        crews: Vec<Crew>,
        tasks: Vec<DeliveryTask>,
        next_date: NaiveDate,
    ) -> DispatchResult<RoutePlan> {
        let capacity = self.settings.vehicle_capacity;
        let mut manifests: Vec<RouteManifest> = crews
            .into_iter()
            .map(|crew| RouteManifest::new(route_code.clone(), date, crew))
            .collect();

        let (mut pending, mut placed): (Vec<DeliveryTask>, Vec<DeliveryTask>) = tasks
            .into_iter()
            .filter(|task| task.status() != TaskStatus::Cancelled)
            .partition(|task| task.status() == TaskStatus::Pending);
        pending.sort_by(stop_order);
        placed.sort_by(stop_order);

        for task in &placed {
            let Assignment::Crew { crew } = task.assignment() else {
                continue;
            };
            let index = manifests
                .iter()
                .position(|manifest| manifest.crew() == crew)
                .unwrap_or_else(|| {
                    manifests.push(RouteManifest::new(route_code.clone(), date, crew.clone()));
                    manifests.len().saturating_sub(1)
                });
            if let Some(manifest) = manifests.get_mut(index) {
                manifest.push(task.id());
            }
        }

        let mut gained = vec![false; manifests.len()];
        let mut changed = Vec::new();
        let mut events = Vec::new();
        let mut queue = pending.into_iter().peekable();
        for (manifest, gained_tasks) in manifests.iter_mut().zip(gained.iter_mut()) {
            while manifest.len() < capacity {
                let Some(mut task) = queue.next() else {
                    break;
                };
                let version = task.version();
                task.assign_crew(manifest.crew().clone(), &*self.clock)?;
                task.transition_to(TaskStatus::Planned, &*self.clock)?;
                events.push(DeliveryEvent::status_changed(
                    &task,
                    TaskStatus::Pending,
                    version,
                ));
                manifest.push(task.id());
                *gained_tasks = true;
                changed.push(task);
            }
            if queue.peek().is_none() {
                break;
            }
        }
        let newly_assigned = changed.len();

        let mut rolled = Vec::new();
        for mut task in queue {
            task.reschedule(next_date, &*self.clock);
            rolled.push(task.id());
            changed.push(task);
        }
        let rollover = (!rolled.is_empty()).then(|| CapacityExceeded {
            route_code: route_code.clone(),
            date,
            rolled_over_to: next_date,
            task_ids: rolled,
        });

        let occurred_at = self.clock.utc();
        events.extend(
            manifests
                .iter()
                .zip(&gained)
                .filter(|(_, gained_tasks)| **gained_tasks)
                .map(|(manifest, _)| DeliveryEvent::route_planned(manifest, occurred_at)),
        );

        Ok(RoutePlan {
            manifests,
            changed,
            events,
            newly_assigned,
            rollover,
        })
    }
}

/// Proximity ordering: district, then subdistrict, then creation order.
fn stop_order(left: &DeliveryTask, right: &DeliveryTask) -> std::cmp::Ordering {
    let key = |task: &DeliveryTask| {
        (
            task.area().district().to_lowercase(),
            task.area().subdistrict().to_lowercase(),
            task.created_at(),
            task.id(),
        )
    };
    key(left).cmp(&key(right))
}
