//! Message bus access for index synchronization
//!
//! Producing domains publish [`SyncEvent`]s on the `search_sync_event` topic;
//! the search sync consumer reads them back with explicit acknowledgement.
//!
//! ```text
//! ┌──────────────────┐   publish    ┌─────────────────────┐
//! │ SyncEventProducer│ ───────────▶ │  MessagingService   │
//! └──────────────────┘              │  (metrics wrapper)  │
//!                                   └─────────────────────┘
//!                                     │        │        │
//!                                     ▼        ▼        ▼
//!                              JetStream    Kafka    InMemory
//! ```
//!
//! Every backend gives at-least-once delivery: a message that is not acked
//! is delivered again. JetStream uses a durable pull consumer with explicit
//! acks, Kafka commits offsets only on ack and seeks back on nack, and the
//! in-memory broker puts nacked messages back at the head of the queue.

mod config;
mod error;
mod events;
mod kafka;
mod memory;
mod metrics;
mod nats;
mod service;
mod traits;

pub use config::{KafkaConfig, MessagingBackend, MessagingConfig, NatsConfig};
pub use error::{MessagingError, MessagingResult};
pub use events::{SyncEvent, SyncEventProducer, SYNC_TOPIC};
pub use kafka::{KafkaConsumer, KafkaProducer};
pub use memory::InMemoryBroker;
pub use metrics::{init_messaging_metrics, MESSAGING_METRICS};
pub use nats::{NatsConsumer, NatsProducer};
pub use service::MessagingService;
pub use traits::{MessageConsumer, MessageProducer, MessageStream, RawMessage};
