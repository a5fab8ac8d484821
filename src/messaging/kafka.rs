//! Kafka implementation

use crate::messaging::config::KafkaConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream, RawMessage};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{Message, Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

fn apply_sasl(client_config: &mut ClientConfig, config: &KafkaConfig) {
    if config.enable_sasl {
        if let (Some(mechanism), Some(username), Some(password)) = (
            &config.sasl_mechanism,
            &config.sasl_username,
            &config.sasl_password,
        ) {
            client_config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanism", mechanism)
                .set("sasl.username", username)
                .set("sasl.password", password);
        }
    }
}

/// Kafka producer
pub struct KafkaProducer {
    producer: FutureProducer,
}

impl KafkaProducer {
    /// Create a new Kafka producer
    pub async fn new(config: KafkaConfig) -> MessagingResult<Self> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("compression.type", &config.compression_type)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("retries", config.retries.to_string());
        apply_sasl(&mut client_config, &config);

        let producer: FutureProducer = client_config.create().map_err(|e| {
            MessagingError::ConnectionFailed(format!("Kafka producer creation failed: {}", e))
        })?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: &[u8]) -> MessagingResult<()> {
        let mut record: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| MessagingError::PublishFailed(format!("Kafka publish failed: {}", e)))?;

        Ok(())
    }

    async fn is_connected(&self) -> bool {
        // Kafka producer doesn't have an explicit connected state
        true
    }
}

/// Kafka consumer, offsets are committed only on ack
pub struct KafkaConsumer {
    config: KafkaConfig,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer
    pub async fn new(config: KafkaConfig) -> MessagingResult<Self> {
        if config.bootstrap_servers.trim().is_empty() {
            return Err(MessagingError::ConfigurationError(
                "no Kafka bootstrap servers configured".to_string(),
            ));
        }
        Ok(Self { config })
    }

    fn create_consumer(&self) -> MessagingResult<StreamConsumer> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.config.bootstrap_servers)
            .set("group.id", &self.config.group_id)
            .set("client.id", &self.config.client_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &self.config.auto_offset_reset)
            .set("session.timeout.ms", self.config.session_timeout_ms.to_string());
        apply_sasl(&mut client_config, &self.config);

        client_config.create().map_err(|e| {
            MessagingError::ConnectionFailed(format!("Kafka consumer creation failed: {}", e))
        })
    }
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let consumer = self.create_consumer()?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| MessagingError::SubscribeFailed(format!("Kafka subscribe failed: {}", e)))?;

        debug!(topic, group = %self.config.group_id, "Subscribed to Kafka");
        Ok(Box::new(KafkaMessageStream {
            consumer: Arc::new(consumer),
            current: None,
        }))
    }
}

/// Position of the message awaiting acknowledgement
struct Position {
    topic: String,
    partition: i32,
    offset: i64,
}

/// Kafka message stream
pub struct KafkaMessageStream {
    consumer: Arc<StreamConsumer>,
    current: Option<Position>,
}

#[async_trait]
impl MessageStream for KafkaMessageStream {
    async fn next(&mut self) -> MessagingResult<Option<RawMessage>> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| MessagingError::ConsumeFailed(format!("Kafka recv failed: {}", e)))?
            .detach();

        self.current = Some(Position {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
        });

        Ok(Some(RawMessage {
            topic: msg.topic().to_string(),
            offset: u64::try_from(msg.offset()).ok(),
            payload: msg.payload().unwrap_or_default().to_vec(),
        }))
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        if let Some(position) = self.current.take() {
            let mut partitions = TopicPartitionList::new();
            partitions
                .add_partition_offset(
                    &position.topic,
                    position.partition,
                    Offset::Offset(position.offset + 1),
                )
                .map_err(|e| MessagingError::AckFailed(format!("Kafka offset invalid: {}", e)))?;

            self.consumer
                .commit(&partitions, CommitMode::Async)
                .map_err(|e| MessagingError::AckFailed(format!("Kafka commit failed: {}", e)))?;
        }
        Ok(())
    }

    async fn nack(&mut self) -> MessagingResult<()> {
        // Rewind so the next receive returns the same message
        if let Some(position) = self.current.take() {
            self.consumer
                .seek(
                    &position.topic,
                    position.partition,
                    Offset::Offset(position.offset),
                    Duration::from_secs(5),
                )
                .map_err(|e| MessagingError::AckFailed(format!("Kafka seek failed: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kafka_config() {
        let config = KafkaConfig::default();
        assert_eq!(config.client_id, "webook-search");
        assert_eq!(config.auto_offset_reset, "earliest");
    }

    #[tokio::test]
    async fn test_blank_bootstrap_servers_are_rejected() {
        let config = KafkaConfig {
            bootstrap_servers: " ".to_string(),
            ..Default::default()
        };
        assert!(KafkaConsumer::new(config).await.is_err());
    }
}
