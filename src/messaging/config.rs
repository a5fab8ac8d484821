//! Messaging configuration

use serde::{Deserialize, Serialize};

/// Messaging backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessagingBackend {
    /// NATS JetStream, durable pull consumer with explicit acks
    Nats,
    /// Kafka consumer group with manual offset commits
    Kafka,
    /// Process-local broker for development and tests
    InMemory,
}

impl MessagingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagingBackend::Nats => "nats",
            MessagingBackend::Kafka => "kafka",
            MessagingBackend::InMemory => "in_memory",
        }
    }
}

/// NATS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,

    /// Connection name
    pub connection_name: String,

    /// Prefix of the JetStream stream created per topic
    pub stream_prefix: String,

    /// Durable consumer name shared by every replica
    pub durable_name: String,

    /// Seconds before an unacknowledged message is redelivered
    pub ack_wait_secs: u64,

    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            connection_name: "webook-search".to_string(),
            stream_prefix: "WEBOOK".to_string(),
            durable_name: "webook-search".to_string(),
            ack_wait_secs: 30,
            request_timeout_ms: 5000,
        }
    }
}

impl NatsConfig {
    /// JetStream stream holding `topic`
    pub fn stream_name(&self, topic: &str) -> String {
        let topic: String = topic
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}_{}", self.stream_prefix, topic)
    }
}

/// Kafka configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Kafka bootstrap servers
    pub bootstrap_servers: String,

    /// Client ID
    pub client_id: String,

    /// Consumer group ID
    pub group_id: String,

    /// Where a new group starts reading (earliest, latest)
    pub auto_offset_reset: String,

    /// Session timeout in milliseconds
    pub session_timeout_ms: u64,

    /// Enable SASL authentication
    pub enable_sasl: bool,

    /// SASL mechanism (PLAIN, SCRAM-SHA-256, SCRAM-SHA-512)
    pub sasl_mechanism: Option<String>,

    /// SASL username
    pub sasl_username: Option<String>,

    /// SASL password
    pub sasl_password: Option<String>,

    /// Compression type (none, gzip, snappy, lz4, zstd)
    pub compression_type: String,

    /// Message timeout in milliseconds
    pub message_timeout_ms: u64,

    /// Number of retries
    pub retries: u32,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            client_id: "webook-search".to_string(),
            group_id: "search".to_string(),
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: 30000,
            enable_sasl: false,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
            compression_type: "zstd".to_string(),
            message_timeout_ms: 30000,
            retries: 3,
        }
    }
}

/// Main messaging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Backend to use
    pub backend: MessagingBackend,

    /// NATS configuration
    pub nats: NatsConfig,

    /// Kafka configuration
    pub kafka: KafkaConfig,

    /// Enable metrics
    pub enable_metrics: bool,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            backend: MessagingBackend::Kafka,
            nats: NatsConfig::default(),
            kafka: KafkaConfig::default(),
            enable_metrics: true,
        }
    }
}

impl MessagingConfig {
    /// Configuration for the process-local broker
    pub fn in_memory() -> Self {
        Self {
            backend: MessagingBackend::InMemory,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_name_is_sanitized() {
        let config = NatsConfig::default();
        assert_eq!(
            config.stream_name("search_sync_event"),
            "WEBOOK_SEARCH_SYNC_EVENT"
        );
        assert_eq!(config.stream_name("a.b-c"), "WEBOOK_A_B_C");
    }

    #[test]
    fn test_backend_names() {
        let backend: MessagingBackend = serde_json::from_str("\"in_memory\"").unwrap();
        assert_eq!(backend, MessagingBackend::InMemory);
        assert_eq!(MessagingBackend::Kafka.as_str(), "kafka");
    }
}
