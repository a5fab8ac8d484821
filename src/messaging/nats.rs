//! NATS JetStream implementation

use crate::messaging::config::NatsConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream, RawMessage};
use async_nats::jetstream::{self, consumer::pull, consumer::AckPolicy, stream, AckKind};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tracing::debug;

async fn connect(config: &NatsConfig) -> MessagingResult<jetstream::Context> {
    if config.servers.is_empty() {
        return Err(MessagingError::ConfigurationError(
            "no NATS servers configured".to_string(),
        ));
    }

    let client = async_nats::ConnectOptions::new()
        .name(&config.connection_name)
        .request_timeout(Some(Duration::from_millis(config.request_timeout_ms)))
        .connect(config.servers.join(",").as_str())
        .await
        .map_err(|e| MessagingError::ConnectionFailed(format!("NATS connection failed: {}", e)))?;

    Ok(jetstream::new(client))
}

async fn ensure_stream(
    context: &jetstream::Context,
    config: &NatsConfig,
    topic: &str,
) -> MessagingResult<stream::Stream> {
    context
        .get_or_create_stream(stream::Config {
            name: config.stream_name(topic),
            subjects: vec![topic.to_string()],
            ..Default::default()
        })
        .await
        .map_err(|e| MessagingError::SubscribeFailed(format!("JetStream stream setup failed: {}", e)))
}

/// NATS producer
pub struct NatsProducer {
    context: jetstream::Context,
    config: NatsConfig,
}

impl NatsProducer {
    /// Create a new NATS producer
    pub async fn new(config: NatsConfig) -> MessagingResult<Self> {
        let context = connect(&config).await?;
        Ok(Self { context, config })
    }
}

#[async_trait]
impl MessageProducer for NatsProducer {
    async fn publish(&self, topic: &str, _key: Option<&str>, payload: &[u8]) -> MessagingResult<()> {
        ensure_stream(&self.context, &self.config, topic)
            .await
            .map_err(|e| MessagingError::PublishFailed(e.to_string()))?;

        let ack = self
            .context
            .publish(topic.to_string(), payload.to_vec().into())
            .await
            .map_err(|e| MessagingError::PublishFailed(format!("NATS publish failed: {}", e)))?;

        // Wait for the stream to persist the message
        ack.await
            .map_err(|e| MessagingError::PublishFailed(format!("NATS publish not acknowledged: {}", e)))?;

        Ok(())
    }

    async fn is_connected(&self) -> bool {
        // async_nats exposes no connection flag on the JetStream context
        true
    }
}

/// NATS consumer, one durable pull consumer per topic
pub struct NatsConsumer {
    context: jetstream::Context,
    config: NatsConfig,
}

impl NatsConsumer {
    /// Create a new NATS consumer
    pub async fn new(config: NatsConfig) -> MessagingResult<Self> {
        let context = connect(&config).await?;
        Ok(Self { context, config })
    }
}

#[async_trait]
impl MessageConsumer for NatsConsumer {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let stream = ensure_stream(&self.context, &self.config, topic).await?;

        let consumer = stream
            .get_or_create_consumer(
                &self.config.durable_name,
                pull::Config {
                    durable_name: Some(self.config.durable_name.clone()),
                    filter_subject: topic.to_string(),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(self.config.ack_wait_secs),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| MessagingError::SubscribeFailed(format!("JetStream consumer setup failed: {}", e)))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| MessagingError::SubscribeFailed(format!("JetStream pull failed: {}", e)))?;

        debug!(topic, durable = %self.config.durable_name, "Subscribed to JetStream");
        Ok(Box::new(NatsMessageStream {
            messages,
            current: None,
        }))
    }
}

/// NATS message stream
pub struct NatsMessageStream {
    messages: pull::Stream,
    current: Option<jetstream::Message>,
}

#[async_trait]
impl MessageStream for NatsMessageStream {
    async fn next(&mut self) -> MessagingResult<Option<RawMessage>> {
        match self.messages.next().await {
            Some(Ok(msg)) => {
                let raw = RawMessage {
                    topic: msg.subject.to_string(),
                    offset: msg.info().ok().map(|info| info.stream_sequence),
                    payload: msg.payload.to_vec(),
                };
                self.current = Some(msg);
                Ok(Some(raw))
            }
            Some(Err(e)) => Err(MessagingError::ConsumeFailed(format!(
                "JetStream receive failed: {}",
                e
            ))),
            None => Ok(None),
        }
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        if let Some(msg) = self.current.take() {
            msg.ack()
                .await
                .map_err(|e| MessagingError::AckFailed(format!("JetStream ack failed: {}", e)))?;
        }
        Ok(())
    }

    async fn nack(&mut self) -> MessagingResult<()> {
        if let Some(msg) = self.current.take() {
            msg.ack_with(AckKind::Nak(None))
                .await
                .map_err(|e| MessagingError::AckFailed(format!("JetStream nak failed: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nats_config() {
        let config = NatsConfig::default();
        assert!(!config.servers.is_empty());
        assert_eq!(config.durable_name, "webook-search");
    }

    #[tokio::test]
    async fn test_empty_server_list_is_rejected() {
        let config = NatsConfig {
            servers: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            NatsConsumer::new(config).await,
            Err(MessagingError::ConfigurationError(_))
        ));
    }
}
