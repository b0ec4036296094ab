//! When steps for delivery task status scenarios.

use super::world::{DeliveryStatusWorld, run_async};
use eyre::WrapErr;
use haulier::dispatch::domain::TaskStatus;
use rstest_bdd_macros::when;

#[when(r#"the task status is updated to "{status}""#)]
fn update_task_status(world: &mut DeliveryStatusWorld, status: String) -> Result<(), eyre::Report> {
    let target = TaskStatus::try_from(status.as_str())?;
    let task_id = world.task()?.id();

    let result = run_async(world.stack()?.service.update_task_status(task_id, target));
    if let Ok(ref updated) = result {
        world.task = Some(updated.clone());
    }
    world.last_update = Some(result);
    Ok(())
}

#[when(r#"the task is cancelled because "{reason}""#)]
fn cancel_task(world: &mut DeliveryStatusWorld, reason: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();

    let cancelled = run_async(world.stack()?.service.cancel_task(task_id, &reason))
        .wrap_err("cancel task in scenario")?;
    world.task = Some(cancelled);
    Ok(())
}
