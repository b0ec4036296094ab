//! Outbox and event bus ports.

use crate::dispatch::domain::DeliveryEvent;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for outbox operations.
pub type OutboxResult<T> = Result<T, OutboxError>;

/// Read side of the transactional outbox.
#[async_trait]
pub trait EventOutbox: Send + Sync {
    /// Returns up to `limit` unpublished events, oldest first.
    async fn pending_events(&self, limit: usize) -> OutboxResult<Vec<DeliveryEvent>>;

    /// Marks events as published. Unknown identifiers are ignored.
    async fn mark_published(&self, event_ids: &[Uuid]) -> OutboxResult<()>;
}

/// Errors returned by outbox implementations.
#[derive(Debug, Clone, Error)]
pub enum OutboxError {
    /// Persistence-layer failure.
    #[error("outbox persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl OutboxError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Event bus the outbox relay publishes to.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event. Consumers deduplicate by
    /// [`DeliveryEvent::dedup_key`].
    async fn publish(&self, event: &DeliveryEvent) -> Result<(), PublishError>;
}

/// Error returned when the event bus rejects or cannot take an event.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The bus is unreachable or refused the event.
    #[error("event bus unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl PublishError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
