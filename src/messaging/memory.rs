//! Process-local broker
//!
//! Topics are FIFO queues shared by every subscriber of the topic. A
//! subscriber holds at most one unacknowledged message; a nack, or dropping
//! the stream without acking, puts that message back at the head of the
//! queue.

use crate::messaging::error::MessagingResult;
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream, RawMessage};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
struct Entry {
    offset: u64,
    payload: Vec<u8>,
}

#[derive(Default)]
struct TopicQueue {
    queue: Mutex<VecDeque<Entry>>,
    notify: Notify,
    next_offset: AtomicU64,
    acked: AtomicU64,
    nacked: AtomicU64,
    closed: AtomicBool,
}

impl TopicQueue {
    fn push_front(&self, entry: Entry) {
        self.queue.lock().push_front(entry);
        self.notify.notify_one();
    }
}

/// In-memory broker implementing both producer and consumer
#[derive(Default)]
pub struct InMemoryBroker {
    topics: DashMap<String, Arc<TopicQueue>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn topic(&self, topic: &str) -> Arc<TopicQueue> {
        Arc::clone(self.topics.entry(topic.to_string()).or_default().value())
    }

    /// Messages waiting to be received
    pub fn pending(&self, topic: &str) -> usize {
        self.topic(topic).queue.lock().len()
    }

    /// Messages acknowledged so far
    pub fn acked(&self, topic: &str) -> u64 {
        self.topic(topic).acked.load(Ordering::SeqCst)
    }

    /// Messages negatively acknowledged so far
    pub fn nacked(&self, topic: &str) -> u64 {
        self.topic(topic).nacked.load(Ordering::SeqCst)
    }

    /// Payloads waiting in `topic`, oldest first
    pub fn peek(&self, topic: &str) -> Vec<Vec<u8>> {
        self.topic(topic)
            .queue
            .lock()
            .iter()
            .map(|entry| entry.payload.clone())
            .collect()
    }

    /// End every subscription of `topic` once its queue is drained
    pub fn close(&self, topic: &str) {
        let queue = self.topic(topic);
        queue.closed.store(true, Ordering::SeqCst);
        queue.notify.notify_waiters();
    }

    /// Accept subscriptions to `topic` again after [`close`](Self::close)
    pub fn reopen(&self, topic: &str) {
        self.topic(topic).closed.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageProducer for InMemoryBroker {
    async fn publish(&self, topic: &str, _key: Option<&str>, payload: &[u8]) -> MessagingResult<()> {
        let queue = self.topic(topic);
        let offset = queue.next_offset.fetch_add(1, Ordering::SeqCst);
        queue.queue.lock().push_back(Entry {
            offset,
            payload: payload.to_vec(),
        });
        queue.notify.notify_one();
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        true
    }
}

#[async_trait]
impl MessageConsumer for InMemoryBroker {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        Ok(Box::new(InMemoryStream {
            name: topic.to_string(),
            topic: self.topic(topic),
            current: None,
        }))
    }
}

/// Subscription to one in-memory topic
pub struct InMemoryStream {
    name: String,
    topic: Arc<TopicQueue>,
    current: Option<Entry>,
}

#[async_trait]
impl MessageStream for InMemoryStream {
    async fn next(&mut self) -> MessagingResult<Option<RawMessage>> {
        // A message received but never settled counts as processed
        self.current = None;

        loop {
            let notified = self.topic.notify.notified();

            let popped = self.topic.queue.lock().pop_front();
            if let Some(entry) = popped {
                let message = RawMessage {
                    topic: self.name.clone(),
                    offset: Some(entry.offset),
                    payload: entry.payload.clone(),
                };
                self.current = Some(entry);
                return Ok(Some(message));
            }

            if self.topic.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }

            notified.await;
        }
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        if self.current.take().is_some() {
            self.topic.acked.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn nack(&mut self) -> MessagingResult<()> {
        if let Some(entry) = self.current.take() {
            self.topic.nacked.fetch_add(1, Ordering::SeqCst);
            self.topic.push_front(entry);
        }
        Ok(())
    }
}

impl Drop for InMemoryStream {
    fn drop(&mut self) {
        if let Some(entry) = self.current.take() {
            self.topic.push_front(entry);
        }
    }
}
