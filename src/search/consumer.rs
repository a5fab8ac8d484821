//! Long-running subscriber feeding change events into [`SyncService`]
//!
//! Messages are handled one at a time. A message is acked once it has been
//! applied, or when it can never be applied (malformed envelope, unknown
//! index). Engine failures nack the message and pause with exponential
//! backoff before the next receive, so the bus redelivers it without a hot
//! loop. When a dead-letter threshold is configured, a message that keeps
//! failing is moved to the dead-letter topic instead.

use crate::messaging::{MessageConsumer, MessageProducer, MessageStream, RawMessage, SyncEvent};
use crate::search::config::SyncConfig;
use crate::search::error::{ConsumerError, SyncError};
use crate::search::metrics::SEARCH_METRICS;
use crate::search::sync::SyncService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConsumerState {
    Stopped,
    Subscribing,
    Running,
    Failed,
}

impl ConsumerState {
    fn ordinal(self) -> i64 {
        match self {
            ConsumerState::Stopped => 0,
            ConsumerState::Subscribing => 1,
            ConsumerState::Running => 2,
            ConsumerState::Failed => 3,
        }
    }
}

/// Why a subscription stopped being consumed
enum StreamExit {
    Shutdown,
    Ended,
    ReceiveFailed(String),
}

enum Disposition {
    Ack,
    Nack,
}

/// Consecutive engine failures of the message currently at the head
#[derive(Default)]
struct FailureStreak {
    key: Option<(String, String)>,
    count: u32,
}

impl FailureStreak {
    fn record(&mut self, index: &str, doc_id: &str) -> u32 {
        let same = self
            .key
            .as_ref()
            .map(|(i, d)| i == index && d == doc_id)
            .unwrap_or(false);
        if same {
            self.count += 1;
        } else {
            self.key = Some((index.to_string(), doc_id.to_string()));
            self.count = 1;
        }
        self.count
    }

    fn reset(&mut self) {
        self.key = None;
        self.count = 0;
    }
}

/// At-least-once consumer of the sync topic
pub struct SyncConsumer {
    consumer: Arc<dyn MessageConsumer>,
    dead_letters: Option<Arc<dyn MessageProducer>>,
    sync: Arc<SyncService>,
    config: SyncConfig,
    state: watch::Sender<ConsumerState>,
}

impl SyncConsumer {
    pub fn new(consumer: Arc<dyn MessageConsumer>, sync: Arc<SyncService>, config: SyncConfig) -> Self {
        let (state, _) = watch::channel(ConsumerState::Stopped);
        Self {
            consumer,
            dead_letters: None,
            sync,
            config,
            state,
        }
    }

    /// Producer used to move messages to the dead-letter topic
    pub fn with_dead_letters(mut self, producer: Arc<dyn MessageProducer>) -> Self {
        self.dead_letters = Some(producer);
        self
    }

    /// Observe state transitions
    pub fn state(&self) -> watch::Receiver<ConsumerState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> ConsumerState {
        *self.state.borrow()
    }

    /// Run the supervisor on a background task until `shutdown` turns true
    pub fn start(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<Result<(), ConsumerError>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    fn set_state(&self, state: ConsumerState) {
        self.state.send_replace(state);
        SEARCH_METRICS.consumer_state.set(state.ordinal());
        debug!(state = %state, "Sync consumer state changed");
    }

    /// Subscribe, consume and resubscribe until shutdown or until the
    /// subscribe retry budget is spent
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), ConsumerError> {
        let topic = self.config.topic.clone();
        let mut failed_subscribes = 0u32;

        loop {
            if *shutdown.borrow() {
                break;
            }
            self.set_state(ConsumerState::Subscribing);

            let subscribed = tokio::select! {
                result = self.consumer.subscribe(&topic) => result,
                _ = shutdown.changed() => break,
            };

            let delay = match subscribed {
                Ok(stream) => {
                    failed_subscribes = 0;
                    self.set_state(ConsumerState::Running);
                    info!(topic = %topic, "Sync consumer running");

                    match self.consume(stream, &mut shutdown).await {
                        StreamExit::Shutdown => break,
                        StreamExit::Ended => {
                            warn!(topic = %topic, "Subscription ended, resubscribing");
                            self.config.backoff(1)
                        }
                        StreamExit::ReceiveFailed(reason) => {
                            warn!(topic = %topic, error = %reason, "Receive failed, resubscribing");
                            self.config.backoff(1)
                        }
                    }
                }
                Err(e) => {
                    failed_subscribes += 1;
                    if failed_subscribes >= self.config.max_subscribe_attempts {
                        self.set_state(ConsumerState::Failed);
                        error!(
                            topic = %topic,
                            attempts = failed_subscribes,
                            error = %e,
                            "Sync consumer giving up"
                        );
                        return Err(ConsumerError::SubscribeExhausted {
                            topic,
                            attempts: failed_subscribes,
                            source: e,
                        });
                    }

                    let delay = self.config.backoff(failed_subscribes);
                    warn!(
                        topic = %topic,
                        attempt = failed_subscribes,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Subscribe failed, retrying"
                    );
                    delay
                }
            };

            if !Self::pause(delay, &mut shutdown).await {
                break;
            }
        }

        self.set_state(ConsumerState::Stopped);
        info!(topic = %topic, "Sync consumer stopped");
        Ok(())
    }

    /// Sleep for `delay`; false when shutdown was requested meanwhile
    async fn pause(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = shutdown.changed() => false,
        }
    }

    async fn consume(
        &self,
        mut stream: Box<dyn MessageStream>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> StreamExit {
        let mut streak = FailureStreak::default();

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.changed() => return StreamExit::Shutdown,
                result = stream.next() => result,
            };

            let message = match received {
                Ok(Some(message)) => message,
                Ok(None) => return StreamExit::Ended,
                Err(e) => return StreamExit::ReceiveFailed(e.to_string()),
            };

            match self.handle(&message, &mut streak).await {
                Disposition::Ack => {
                    if let Err(e) = stream.ack().await {
                        warn!(topic = %message.topic, offset = ?message.offset, error = %e, "Ack failed");
                    }
                }
                Disposition::Nack => {
                    if let Err(e) = stream.nack().await {
                        warn!(topic = %message.topic, offset = ?message.offset, error = %e, "Nack failed");
                    }
                    if !Self::pause(self.config.backoff(streak.count), shutdown).await {
                        return StreamExit::Shutdown;
                    }
                }
            }
        }
    }

    async fn handle(&self, message: &RawMessage, streak: &mut FailureStreak) -> Disposition {
        let event = match SyncEvent::decode(&message.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    topic = %message.topic,
                    offset = ?message.offset,
                    reason = %e,
                    "Dropping malformed sync event"
                );
                SEARCH_METRICS.sync_messages.with_label_values(&["dropped"]).inc();
                return Disposition::Ack;
            }
        };

        let document = event.document();
        match self.sync.input(&event.index, &event.doc_id, &document).await {
            Ok(()) => {
                streak.reset();
                SEARCH_METRICS.sync_messages.with_label_values(&["applied"]).inc();
                Disposition::Ack
            }
            Err(SyncError::InvalidIndex(index)) => {
                streak.reset();
                error!(
                    index = %index,
                    doc_id = %event.doc_id,
                    "Sync event targets an unregistered index, dropping"
                );
                SEARCH_METRICS
                    .sync_messages
                    .with_label_values(&["invalid_index"])
                    .inc();
                Disposition::Ack
            }
            Err(SyncError::Engine(e)) => {
                let failures = streak.record(&event.index, &event.doc_id);

                if let Some(threshold) = self.config.dead_letter_after {
                    if failures >= threshold && self.dead_letter(message, &event).await {
                        streak.reset();
                        return Disposition::Ack;
                    }
                }

                warn!(
                    index = %event.index,
                    doc_id = %event.doc_id,
                    failures,
                    error = %e,
                    "Sync event failed, will be redelivered"
                );
                SEARCH_METRICS.sync_messages.with_label_values(&["retried"]).inc();
                Disposition::Nack
            }
        }
    }

    async fn dead_letter(&self, message: &RawMessage, event: &SyncEvent) -> bool {
        let Some(producer) = &self.dead_letters else {
            return false;
        };

        match producer
            .publish(&self.config.dead_letter_topic, Some(&event.doc_id), &message.payload)
            .await
        {
            Ok(()) => {
                error!(
                    index = %event.index,
                    doc_id = %event.doc_id,
                    topic = %self.config.dead_letter_topic,
                    "Sync event dead-lettered"
                );
                SEARCH_METRICS
                    .sync_messages
                    .with_label_values(&["dead_lettered"])
                    .inc();
                true
            }
            Err(e) => {
                warn!(
                    doc_id = %event.doc_id,
                    error = %e,
                    "Dead-letter publish failed"
                );
                false
            }
        }
    }
}
