//! Main messaging service

use crate::messaging::config::{MessagingBackend, MessagingConfig};
use crate::messaging::error::MessagingResult;
use crate::messaging::kafka::{KafkaConsumer, KafkaProducer};
use crate::messaging::memory::InMemoryBroker;
use crate::messaging::metrics::MESSAGING_METRICS;
use crate::messaging::nats::{NatsConsumer, NatsProducer};
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream, RawMessage};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Unified access to the configured bus, with metrics on every operation
pub struct MessagingService {
    config: MessagingConfig,
    producer: Arc<dyn MessageProducer>,
    consumer: Arc<dyn MessageConsumer>,
}

impl MessagingService {
    /// Connect to the configured backend
    pub async fn new(config: MessagingConfig) -> MessagingResult<Self> {
        let (producer, consumer) = match config.backend {
            MessagingBackend::Nats => {
                let producer: Arc<dyn MessageProducer> =
                    Arc::new(NatsProducer::new(config.nats.clone()).await?);
                let consumer: Arc<dyn MessageConsumer> =
                    Arc::new(NatsConsumer::new(config.nats.clone()).await?);
                (producer, consumer)
            }
            MessagingBackend::Kafka => {
                let producer: Arc<dyn MessageProducer> =
                    Arc::new(KafkaProducer::new(config.kafka.clone()).await?);
                let consumer: Arc<dyn MessageConsumer> =
                    Arc::new(KafkaConsumer::new(config.kafka.clone()).await?);
                (producer, consumer)
            }
            MessagingBackend::InMemory => {
                let broker = Arc::new(InMemoryBroker::new());
                let producer: Arc<dyn MessageProducer> = broker.clone();
                let consumer: Arc<dyn MessageConsumer> = broker;
                (producer, consumer)
            }
        };

        // Initialize metrics
        if config.enable_metrics {
            crate::messaging::metrics::init_messaging_metrics();
        }

        info!(backend = config.backend.as_str(), "Messaging connected");
        Ok(Self {
            config,
            producer,
            consumer,
        })
    }

    /// Service over an existing in-memory broker
    pub fn in_memory(broker: Arc<InMemoryBroker>) -> Self {
        let producer: Arc<dyn MessageProducer> = broker.clone();
        Self {
            config: MessagingConfig::in_memory(),
            producer,
            consumer: broker,
        }
    }

    pub fn backend(&self) -> MessagingBackend {
        self.config.backend
    }

    fn backend_name(&self) -> &'static str {
        self.config.backend.as_str()
    }
}

#[async_trait]
impl MessageProducer for MessagingService {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: &[u8]) -> MessagingResult<()> {
        let start = Instant::now();
        let result = self.producer.publish(topic, key, payload).await;

        // Record metrics
        if self.config.enable_metrics {
            let backend = self.backend_name();
            if result.is_ok() {
                MESSAGING_METRICS
                    .messages_published
                    .with_label_values(&[topic, backend])
                    .inc();
                MESSAGING_METRICS
                    .publish_latency
                    .with_label_values(&[topic, backend])
                    .observe(start.elapsed().as_secs_f64());
            } else {
                MESSAGING_METRICS
                    .publish_failures
                    .with_label_values(&[topic, backend])
                    .inc();
            }
        }

        result
    }

    async fn is_connected(&self) -> bool {
        self.producer.is_connected().await
    }
}

#[async_trait]
impl MessageConsumer for MessagingService {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let result = self.consumer.subscribe(topic).await;

        match result {
            Ok(inner) if self.config.enable_metrics => Ok(Box::new(MeteredStream {
                inner,
                topic: topic.to_string(),
                backend: self.backend_name(),
            })),
            Ok(inner) => Ok(inner),
            Err(e) => {
                if self.config.enable_metrics {
                    MESSAGING_METRICS
                        .consume_failures
                        .with_label_values(&[topic, self.backend_name()])
                        .inc();
                }
                Err(e)
            }
        }
    }
}

/// Stream wrapper counting receives and acknowledgements
struct MeteredStream {
    inner: Box<dyn MessageStream>,
    topic: String,
    backend: &'static str,
}

#[async_trait]
impl MessageStream for MeteredStream {
    async fn next(&mut self) -> MessagingResult<Option<RawMessage>> {
        let result = self.inner.next().await;
        let counter = match &result {
            Ok(Some(_)) => Some(&MESSAGING_METRICS.messages_consumed),
            Ok(None) => None,
            Err(_) => Some(&MESSAGING_METRICS.consume_failures),
        };
        if let Some(counter) = counter {
            counter.with_label_values(&[&self.topic, self.backend]).inc();
        }
        result
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        MESSAGING_METRICS
            .acknowledgements
            .with_label_values(&[&self.topic, self.backend, "ack"])
            .inc();
        self.inner.ack().await
    }

    async fn nack(&mut self) -> MessagingResult<()> {
        MESSAGING_METRICS
            .acknowledgements
            .with_label_values(&[&self.topic, self.backend, "nack"])
            .inc();
        self.inner.nack().await
    }
}
