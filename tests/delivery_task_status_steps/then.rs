//! Then steps for delivery task status scenarios.

use super::world::{DeliveryStatusWorld, run_async};
use crate::test_helpers::address;
use eyre::WrapErr;
use haulier::dispatch::{
    domain::{DeliveryDomainError, TaskStatus},
    services::{CreateDeliveryTaskRequest, DispatchError, ErrorKind},
};
use rstest_bdd_macros::then;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &DeliveryStatusWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;

    let stored = run_async(world.stack()?.service.get_task(world.task()?.id()))
        .wrap_err("reload task")?;

    eyre::ensure!(
        stored.status() == expected,
        "expected status {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then("the task has a crew assigned")]
fn task_has_crew(world: &DeliveryStatusWorld) -> Result<(), eyre::Report> {
    let stored = run_async(world.stack()?.service.get_task(world.task()?.id()))
        .wrap_err("reload task")?;

    eyre::ensure!(
        stored.assignment().crew().is_some(),
        "expected a crew, found {:?}",
        stored.assignment()
    );
    Ok(())
}

#[then("the update fails with an invalid transition error")]
fn update_fails_with_invalid_transition(world: &DeliveryStatusWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_update
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing update result"))?;

    match result {
        Err(err) if err.kind() == ErrorKind::InvalidTransition => Ok(()),
        other => Err(eyre::eyre!("expected an invalid transition error, got {other:?}")),
    }
}

#[then("the update fails with a retries exhausted error")]
fn update_fails_with_retries_exhausted(world: &DeliveryStatusWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_update
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing update result"))?;

    if !matches!(
        result,
        Err(DispatchError::Domain(DeliveryDomainError::RetriesExhausted(_)))
    ) {
        return Err(eyre::eyre!("expected RetriesExhausted error, got {result:?}"));
    }
    Ok(())
}

#[then("the task has used {count:u32} retries")]
fn task_used_retries(world: &DeliveryStatusWorld, count: u32) -> Result<(), eyre::Report> {
    let task = world.task()?;

    eyre::ensure!(
        task.retry_count() == count,
        "expected {count} retries, found {}",
        task.retry_count()
    );
    Ok(())
}

#[then(r#"a new delivery task can be created for the order at "{address_id}""#)]
fn new_task_for_same_order(
    world: &DeliveryStatusWorld,
    address_id: String,
) -> Result<(), eyre::Report> {
    let stack = world.stack()?;
    let previous = world.task()?;
    let order_id = previous.order_id().clone();

    let created = run_async(stack.service.create_delivery_task(CreateDeliveryTaskRequest::new(
        order_id.clone(),
        address(&address_id)?,
    )))
    .wrap_err("create replacement task")?;
    let current = run_async(stack.service.get_task_by_order_id(&order_id))
        .wrap_err("look up replacement task by order")?;

    eyre::ensure!(created.id() != previous.id(), "replacement must be a new task");
    eyre::ensure!(current.id() == created.id(), "order should resolve to the new task");
    Ok(())
}
