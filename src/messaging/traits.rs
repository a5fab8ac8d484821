//! Messaging trait abstractions

use crate::messaging::error::MessagingResult;
use async_trait::async_trait;

/// A message as received from a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,

    /// Position in the topic when the backend exposes one
    pub offset: Option<u64>,

    pub payload: Vec<u8>,
}

/// Message producer trait
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish a payload to a topic
    ///
    /// Backends that partition by key keep messages sharing a `key` in order.
    async fn publish(&self, topic: &str, key: Option<&str>, payload: &[u8]) -> MessagingResult<()>;

    /// Check if the producer is connected
    async fn is_connected(&self) -> bool;
}

/// Message consumer trait
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Subscribe to a topic and receive messages
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>>;
}

/// Message stream with explicit acknowledgement of the last received message
#[async_trait]
pub trait MessageStream: Send {
    /// Wait for the next message; `None` once the subscription has ended
    async fn next(&mut self) -> MessagingResult<Option<RawMessage>>;

    /// Acknowledge message processing
    async fn ack(&mut self) -> MessagingResult<()>;

    /// Negative acknowledge, the message will be delivered again
    async fn nack(&mut self) -> MessagingResult<()>;
}
