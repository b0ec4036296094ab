//! Event publisher that records what it publishes.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::dispatch::{
    domain::DeliveryEvent,
    ports::{EventPublisher, PublishError},
};

/// Publisher that keeps every delivered event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventPublisher {
    state: Arc<Mutex<PublisherState>>,
}

#[derive(Debug, Default)]
struct PublisherState {
    published: Vec<DeliveryEvent>,
    failures_remaining: u32,
}

impl RecordingEventPublisher {
    /// Creates an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` publish calls fail.
    pub fn fail_next(&self, count: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.failures_remaining = count;
        }
    }

    /// Returns the events published so far.
    #[must_use]
    pub fn published(&self) -> Vec<DeliveryEvent> {
        self.state
            .lock()
            .map(|state| state.published.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: &DeliveryEvent) -> Result<(), PublishError> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| PublishError::unavailable(std::io::Error::other(err.to_string())))?;
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(PublishError::unavailable(std::io::Error::other(
                "event bus refused connection",
            )));
        }
        state.published.push(event.clone());
        Ok(())
    }
}
