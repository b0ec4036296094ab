//! Outbox relay delivery tests.

use std::sync::Arc;

use rstest::{fixture, rstest};
use tokio::sync::broadcast;

use super::support::Harness;
use crate::dispatch::{
    adapters::memory::RecordingEventPublisher,
    domain::{DeliveryEventKind, TaskStatus},
    ports::{EventOutbox, EventPublisher},
    services::{DispatchError, ErrorKind, OutboxRelay},
};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn relay(harness: &Harness, publisher: &Arc<RecordingEventPublisher>, batch: usize) -> OutboxRelay {
    let outbox: Arc<dyn EventOutbox> = Arc::clone(&harness.repository) as Arc<dyn EventOutbox>;
    let bus: Arc<dyn EventPublisher> = Arc::clone(publisher) as Arc<dyn EventPublisher>;
    OutboxRelay::new(outbox, bus, batch)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn drain_publishes_in_write_order_once(harness: Harness) {
    let task = harness.create("ORD-8001", "addr-bangkapi-1").await;
    harness
        .service
        .cancel_task(task.id(), "duplicate order")
        .await
        .expect("pending -> cancelled");
    let publisher = Arc::new(RecordingEventPublisher::new());
    let relay = relay(&harness, &publisher, 10);

    let sent = relay.drain().await.expect("drain succeeds");
    let resent = relay.drain().await.expect("second drain succeeds");

    assert_eq!(sent, 2);
    assert_eq!(resent, 0);
    let kinds: Vec<DeliveryEventKind> = publisher
        .published()
        .iter()
        .map(|event| event.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![DeliveryEventKind::TaskCreated, DeliveryEventKind::StatusChanged]
    );
    let status_event = publisher.published().pop().expect("status event");
    assert_eq!(status_event.task_id(), Some(task.id()));
    assert_eq!(status_event.old_status(), Some(TaskStatus::Pending));
    assert_eq!(status_event.new_status(), Some(TaskStatus::Cancelled));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_publish_keeps_events_for_the_next_pass(harness: Harness) {
    harness.create("ORD-8101", "addr-bangkapi-1").await;
    harness.create("ORD-8102", "addr-bangkapi-2").await;
    let publisher = Arc::new(RecordingEventPublisher::new());
    let relay = relay(&harness, &publisher, 10);
    publisher.fail_next(1);

    let err = relay.drain().await.expect_err("bus is down");
    assert!(matches!(err, DispatchError::Publish(_)));
    assert_eq!(err.kind(), ErrorKind::ExternalService);
    assert!(publisher.published().is_empty());

    let sent = relay.drain().await.expect("bus is back");
    assert_eq!(sent, 2);
    let pending = harness
        .repository
        .pending_events(10)
        .await
        .expect("outbox readable");
    assert!(pending.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_size_limits_each_pass(harness: Harness) {
    harness.create("ORD-8201", "addr-bangkapi-1").await;
    harness.create("ORD-8202", "addr-bangkapi-2").await;
    harness.create("ORD-8203", "addr-bangkapi-3").await;
    let publisher = Arc::new(RecordingEventPublisher::new());
    let relay = relay(&harness, &publisher, 2);

    assert_eq!(relay.drain().await.expect("first pass"), 2);
    assert_eq!(relay.drain().await.expect("second pass"), 1);
    assert_eq!(relay.drain().await.expect("third pass"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relay_loop_drains_until_shutdown(harness: Harness) {
    harness.create("ORD-8301", "addr-bangkapi-1").await;
    let publisher = Arc::new(RecordingEventPublisher::new());
    let relay = Arc::new(relay(&harness, &publisher, 10));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let looping = Arc::clone(&relay);
    let handle = tokio::spawn(async move {
        looping
            .run(std::time::Duration::from_millis(5), shutdown_rx)
            .await;
    });

    for _ in 0..50 {
        if !publisher.published().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    shutdown_tx.send(()).expect("loop still listening");
    handle.await.expect("loop exits cleanly");

    assert_eq!(publisher.published().len(), 1);
}
