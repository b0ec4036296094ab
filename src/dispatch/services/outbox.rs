//! Relay from the transactional outbox to the event bus.

use super::{DispatchError, DispatchResult};
use crate::dispatch::ports::{EventOutbox, EventPublisher};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Publishes outbox events in order and marks them once the bus accepts
/// them.
///
/// Delivery is at-least-once: an event published just before a crash is
/// sent again on the next pass.
pub struct OutboxRelay {
    outbox: Arc<dyn EventOutbox>,
    publisher: Arc<dyn EventPublisher>,
    batch_size: usize,
}

impl OutboxRelay {
    /// Creates a relay reading up to `batch_size` events per pass.
    #[must_use]
    pub fn new(
        outbox: Arc<dyn EventOutbox>,
        publisher: Arc<dyn EventPublisher>,
        batch_size: usize,
    ) -> Self {
        Self {
            outbox,
            publisher,
            batch_size: batch_size.max(1),
        }
    }

    /// Publishes one batch of pending events and returns how many went out.
    ///
    /// Stops at the first publish failure so later events never overtake
    /// an earlier one. Events published before the failure are marked.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Outbox`] when the outbox cannot be read or
    /// updated and [`DispatchError::Publish`] when the bus rejects an event.
    #[instrument(skip(self))]
    pub async fn drain(&self) -> DispatchResult<usize> {
        let events = self.outbox.pending_events(self.batch_size).await?;
        let mut published = Vec::with_capacity(events.len());
        let mut failure = None;
        for event in &events {
            match self.publisher.publish(event).await {
                Ok(()) => published.push(event.id()),
                Err(err) => {
                    warn!(
                        event_id = %event.id(),
                        kind = %event.kind(),
                        error = %err,
                        "event publish failed"
                    );
                    failure = Some(err);
                    break;
                }
            }
        }

        if !published.is_empty() {
            self.outbox.mark_published(&published).await?;
            debug!(count = published.len(), "published outbox events");
        }
        failure.map_or(Ok(published.len()), |err| Err(DispatchError::Publish(err)))
    }

    /// Drains the outbox every `interval` until a shutdown signal arrives
    /// or its sender is dropped.
    pub async fn run(
        &self,
        interval: std::time::Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.drain().await {
                        warn!(error = %err, "outbox pass failed");
                    }
                }
                _ = shutdown.recv() => {
                    info!("outbox relay stopping");
                    break;
                }
            }
        }
    }
}
