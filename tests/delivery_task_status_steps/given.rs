//! Given steps for delivery task status scenarios.

use super::world::{DeliveryStatusWorld, run_async};
use crate::test_helpers::{DispatchStack, address, order};
use eyre::WrapErr;
use haulier::dispatch::{domain::TaskStatus, services::CreateDeliveryTaskRequest};
use rstest_bdd_macros::given;

#[given(r#"a pending delivery task for order "{order_id}" at "{address_id}""#)]
fn pending_delivery_task(
    world: &mut DeliveryStatusWorld,
    order_id: String,
    address_id: String,
) -> Result<(), eyre::Report> {
    let stack = DispatchStack::from_fixtures().wrap_err("wire dispatch stack from fixtures")?;
    let task = run_async(stack.service.create_delivery_task(CreateDeliveryTaskRequest::new(
        order(&order_id)?,
        address(&address_id)?,
    )))
    .wrap_err("create delivery task for scenario")?;
    eyre::ensure!(
        task.status() == TaskStatus::Pending,
        "new task should be pending, found {}",
        task.status()
    );

    world.stack = Some(stack);
    world.task = Some(task);
    Ok(())
}

#[given(r#"the task has been moved through "{statuses}""#)]
fn task_moved_through(
    world: &mut DeliveryStatusWorld,
    statuses: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let stack = world.stack()?;
    let mut latest = None;
    for raw in statuses.split(',') {
        let status = TaskStatus::try_from(raw)?;
        let updated = run_async(stack.service.update_task_status(task_id, status))
            .wrap_err_with(|| format!("move task to {status} in scenario setup"))?;
        latest = Some(updated);
    }

    if let Some(task) = latest {
        world.task = Some(task);
    }
    Ok(())
}

#[given("the delivery route has been planned")]
fn delivery_route_planned(world: &mut DeliveryStatusWorld) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let (task_id, planned_date) = (task.id(), task.planned_date());
    let stack = world.stack()?;

    let summary = run_async(stack.route_planner()?.plan_daily_routes(planned_date))
        .wrap_err("plan delivery routes in scenario setup")?;
    eyre::ensure!(
        !summary.has_failures(),
        "route planning failed: {:?}",
        summary.outcomes
    );
    let planned = run_async(stack.service.get_task(task_id)).wrap_err("reload planned task")?;
    eyre::ensure!(
        planned.status() == TaskStatus::Planned,
        "task should be planned, found {}",
        planned.status()
    );

    world.task = Some(planned);
    Ok(())
}
