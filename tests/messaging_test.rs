use serde_json::json;
use std::sync::Arc;
use webook_search::messaging::{
    InMemoryBroker, KafkaConfig, MessageConsumer, MessageProducer, MessageStream, MessagingBackend,
    MessagingConfig, MessagingService, NatsConfig, SyncEvent, SyncEventProducer, SYNC_TOPIC,
};

/// Test messaging config defaults
#[test]
fn test_messaging_config_defaults() {
    let config = MessagingConfig::default();
    assert_eq!(config.backend, MessagingBackend::Kafka);
    assert!(config.enable_metrics);
}

/// Test NATS config defaults
#[test]
fn test_nats_config_defaults() {
    let config = NatsConfig::default();
    assert_eq!(config.servers.len(), 1);
    assert_eq!(config.servers[0], "nats://localhost:4222");
    assert_eq!(config.durable_name, "webook-search");
    assert_eq!(config.stream_name(SYNC_TOPIC), "WEBOOK_SEARCH_SYNC_EVENT");
}

/// Test Kafka config defaults
#[test]
fn test_kafka_config_defaults() {
    let config = KafkaConfig::default();
    assert_eq!(config.bootstrap_servers, "localhost:9092");
    assert_eq!(config.group_id, "search");
    assert_eq!(config.auto_offset_reset, "earliest");
    assert!(!config.enable_sasl);
}

#[test]
fn test_backend_names() {
    let backend: MessagingBackend = serde_json::from_str("\"nats\"").unwrap();
    assert_eq!(backend, MessagingBackend::Nats);
    assert_eq!(MessagingBackend::InMemory.as_str(), "in_memory");
}

#[test]
fn test_sync_event_wire_format() {
    let event = SyncEvent::new("question", "42", &json!({"id": 42, "title": "go channels"}))
        .unwrap();
    let wire: serde_json::Value = serde_json::to_value(&event).unwrap();

    assert_eq!(wire["index"], "question");
    assert_eq!(wire["doc_id"], "42");
    assert!(wire["data"].is_string());

    let decoded = SyncEvent::decode(&serde_json::to_vec(&event).unwrap()).unwrap();
    let document: serde_json::Value = serde_json::from_str(&decoded.document()).unwrap();
    assert_eq!(document["title"], "go channels");
}

/// Events produced through the service can be consumed and acked
#[tokio::test]
async fn test_produce_and_consume_through_service() {
    let broker = Arc::new(InMemoryBroker::new());
    let service = Arc::new(MessagingService::in_memory(broker.clone()));
    assert!(service.is_connected().await);

    let producer = SyncEventProducer::new(service.clone());
    producer
        .produce_document("skill", "1", &json!({"id": 1, "name": "rust"}))
        .await
        .unwrap();
    producer
        .produce_document("skill", "2", &json!({"id": 2, "name": "go"}))
        .await
        .unwrap();

    let mut stream = service.subscribe(SYNC_TOPIC).await.unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(SyncEvent::decode(&first.payload).unwrap().doc_id, "1");
    stream.nack().await.unwrap();

    let again = stream.next().await.unwrap().unwrap();
    assert_eq!(again.payload, first.payload);
    stream.ack().await.unwrap();

    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(SyncEvent::decode(&second.payload).unwrap().doc_id, "2");
    stream.ack().await.unwrap();

    assert_eq!(broker.acked(SYNC_TOPIC), 2);
    assert_eq!(broker.nacked(SYNC_TOPIC), 1);
    assert_eq!(broker.pending(SYNC_TOPIC), 0);
}

/// A subscriber dropped mid-message leaves it for the next subscriber
#[tokio::test]
async fn test_unsettled_message_survives_resubscribe() {
    let broker = Arc::new(InMemoryBroker::new());
    broker.publish(SYNC_TOPIC, None, b"payload").await.unwrap();

    {
        let mut stream = broker.subscribe(SYNC_TOPIC).await.unwrap();
        stream.next().await.unwrap().unwrap();
    }

    let mut stream = broker.subscribe(SYNC_TOPIC).await.unwrap();
    let message = stream.next().await.unwrap().unwrap();
    assert_eq!(message.payload, b"payload");
}

#[tokio::test]
async fn test_in_memory_backend_from_config() {
    let service = MessagingService::new(MessagingConfig::in_memory())
        .await
        .unwrap();
    assert_eq!(service.backend(), MessagingBackend::InMemory);
}
