//! End-to-end dispatch day: options, task creation, pickups, route
//! planning, delivery, and event relay.

use std::sync::Arc;

use chrono::Duration;
use haulier::dispatch::{
    adapters::memory::RecordingEventPublisher,
    domain::{DeliveryEventKind, DeliveryMethod, DeliveryOption, TaskStatus},
    ports::EventOutbox,
    services::{CreateDeliveryTaskRequest, ErrorKind, PickupRunSummary},
};
use haulier::reference::domain::Money;
use mockable::Clock;
use rstest::{fixture, rstest};

use crate::test_helpers::{DispatchStack, address, date, order};

#[fixture]
fn stack() -> DispatchStack {
    DispatchStack::from_fixtures().expect("fixtures wire a dispatch stack")
}

fn summary(options: &[DeliveryOption]) -> Vec<(String, u64, String)> {
    options
        .iter()
        .map(|option| {
            (
                option.method().to_string(),
                option.fee().minor_units(),
                option.estimated_delivery().to_string(),
            )
        })
        .collect()
}

fn owned(rows: &[(&str, u64, &str)]) -> Vec<(String, u64, String)> {
    rows.iter()
        .map(|(method, fee, date)| ((*method).to_owned(), *fee, (*date).to_owned()))
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn route_area_ranks_self_delivery_before_carriers(
    stack: DispatchStack,
) -> Result<(), eyre::Report> {
    let options = stack
        .service
        .get_delivery_options(&address("addr-bangkapi")?)
        .await?;

    assert_eq!(
        summary(&options),
        owned(&[
            ("self_delivery", 4_000, "2026-10-16"),
            ("carrier:scg", 5_000, "2026-10-16"),
            ("carrier:kerry", 5_500, "2026-10-15"),
        ])
    );
    assert!(options.first().is_some_and(DeliveryOption::is_recommended));
    assert_eq!(options.iter().filter(|option| option.is_recommended()).count(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inactive_route_leaves_only_carriers(stack: DispatchStack) -> Result<(), eyre::Report> {
    let options = stack
        .service
        .get_delivery_options(&address("addr-lat-phrao")?)
        .await?;

    assert_eq!(
        summary(&options),
        owned(&[
            ("carrier:scg", 5_000, "2026-10-16"),
            ("carrier:kerry", 5_500, "2026-10-15"),
        ])
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cod_surcharge_is_part_of_the_self_delivery_fee(
    stack: DispatchStack,
) -> Result<(), eyre::Report> {
    let task = stack
        .service
        .create_delivery_task(
            CreateDeliveryTaskRequest::new(order("ORD-20001")?, address("addr-bangkapi")?)
                .with_cod_amount(Money::from_minor(20_000)),
        )
        .await?;

    assert_eq!(task.method(), &DeliveryMethod::SelfDelivery);
    assert_eq!(task.delivery_fee(), Money::from_minor(5_000));
    assert_eq!(task.cod_amount(), Money::from_minor(20_000));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_address_is_not_found(stack: DispatchStack) -> Result<(), eyre::Report> {
    let err = stack
        .service
        .get_delivery_options(&address("addr-nowhere")?)
        .await
        .expect_err("address is not registered");

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.kind().http_status(), 404);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dispatch_day_runs_from_order_to_published_events(
    stack: DispatchStack,
) -> Result<(), eyre::Report> {
    for (order_id, address_id) in [
        ("ORD-10001", "addr-bangkapi"),
        ("ORD-10002", "addr-buengkum"),
        ("ORD-10003", "addr-bangkapi"),
    ] {
        let task = stack
            .service
            .create_delivery_task(CreateDeliveryTaskRequest::new(
                order(order_id)?,
                address(address_id)?,
            ))
            .await?;
        assert_eq!(task.planned_date(), date(2026, 10, 16)?);
    }
    let parcel = stack
        .service
        .create_delivery_task(
            CreateDeliveryTaskRequest::new(order("ORD-10004")?, address("addr-phuket")?)
                .with_cod_amount(Money::from_minor(20_000)),
        )
        .await?;
    assert_eq!(parcel.method().to_string(), "carrier:scg");
    assert_eq!(parcel.delivery_fee(), Money::from_minor(7_000));

    let pickups = stack.pickups.process_due().await?;
    assert_eq!(
        pickups,
        PickupRunSummary {
            booked: 1,
            ..PickupRunSummary::default()
        }
    );
    let tracking = stack.service.get_tracking_info(parcel.id()).await?;
    assert_eq!(tracking.tracking_number.as_str(), "SCG-000001");
    assert_eq!(
        tracking.tracking_url,
        "https://scg.example.com/parcel/SCG-000001"
    );

    let plan = stack
        .route_planner()?
        .plan_daily_routes(date(2026, 10, 16)?)
        .await?;
    let loads: Vec<(String, usize)> = plan
        .manifests()
        .map(|manifest| (manifest.crew().vehicle_id().as_str().to_owned(), manifest.len()))
        .collect();
    assert_eq!(
        loads,
        vec![("VAN-1".to_owned(), 2), ("VAN-2".to_owned(), 1)]
    );
    assert_eq!(plan.rollovers().count(), 0);

    stack.clock.advance(Duration::days(1));
    for status in [TaskStatus::Dispatched, TaskStatus::InTransit] {
        stack.service.update_task_status(parcel.id(), status).await?;
    }
    let delivered = stack
        .service
        .update_task_status(parcel.id(), TaskStatus::Delivered)
        .await?;
    assert_eq!(delivered.delivered_at(), Some(stack.clock.utc()));

    let publisher = Arc::new(RecordingEventPublisher::new());
    let relay = stack.outbox_relay(&publisher);
    let sent = relay.drain().await?;

    let recorded = stack.repository.all_events()?;
    assert_eq!(sent, recorded.len());
    assert_eq!(publisher.published(), recorded);
    let count = |kind: DeliveryEventKind| {
        recorded
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    };
    assert_eq!(count(DeliveryEventKind::TaskCreated), 4);
    assert_eq!(count(DeliveryEventKind::RoutePlanned), 2);
    assert_eq!(count(DeliveryEventKind::CodCollected), 1);
    assert!(stack.repository.pending_events(100).await?.is_empty());
    Ok(())
}
