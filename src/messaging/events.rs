//! Sync event envelope and its producer

use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::MessageProducer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Topic carrying index change events
pub const SYNC_TOPIC: &str = "search_sync_event";

/// Change event asking for `data` to be written as document `doc_id` of `index`
///
/// Producers send `data` as a JSON string holding the document. An inline
/// object is accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub index: String,
    pub doc_id: String,
    pub data: Value,
}

impl SyncEvent {
    /// Event in the producers' wire form, with `data` as a JSON string
    pub fn new<T: Serialize>(
        index: impl Into<String>,
        doc_id: impl Into<String>,
        document: &T,
    ) -> MessagingResult<Self> {
        Ok(Self {
            index: index.into(),
            doc_id: doc_id.into(),
            data: Value::String(serde_json::to_string(document)?),
        })
    }

    /// Decode and check an envelope received from the bus
    pub fn decode(payload: &[u8]) -> MessagingResult<Self> {
        let event: SyncEvent = serde_json::from_slice(payload)
            .map_err(|e| MessagingError::SerializationError(format!("malformed envelope: {}", e)))?;

        if event.index.trim().is_empty() {
            return Err(MessagingError::SerializationError(
                "envelope has an empty index".to_string(),
            ));
        }
        if event.doc_id.is_empty() {
            return Err(MessagingError::SerializationError(
                "envelope has an empty doc_id".to_string(),
            ));
        }
        if !matches!(event.data, Value::String(_) | Value::Object(_)) {
            return Err(MessagingError::SerializationError(
                "envelope data must be a JSON string or object".to_string(),
            ));
        }

        Ok(event)
    }

    /// The document as raw JSON text
    pub fn document(&self) -> String {
        match &self.data {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}

/// Publishes [`SyncEvent`]s for the producing domains
#[derive(Clone)]
pub struct SyncEventProducer {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl SyncEventProducer {
    pub fn new(producer: Arc<dyn MessageProducer>) -> Self {
        Self::with_topic(producer, SYNC_TOPIC)
    }

    pub fn with_topic(producer: Arc<dyn MessageProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish an event, keyed by document id
    pub async fn produce(&self, event: &SyncEvent) -> MessagingResult<()> {
        let payload = serde_json::to_vec(event)?;
        self.producer
            .publish(&self.topic, Some(&event.doc_id), &payload)
            .await?;

        debug!(topic = %self.topic, index = %event.index, doc_id = %event.doc_id, "Sync event published");
        Ok(())
    }

    /// Serialize `document` and publish it as an upsert of `index`/`doc_id`
    pub async fn produce_document<T: Serialize>(
        &self,
        index: &str,
        doc_id: &str,
        document: &T,
    ) -> MessagingResult<()> {
        let event = SyncEvent::new(index, doc_id, document)?;
        self.produce(&event).await
    }
}
