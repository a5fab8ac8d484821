//! # webook-search
//!
//! Search subsystem of the webook learning platform: projects questions,
//! question sets, cases and skills into per-kind Tantivy indexes from change
//! events on the message bus, and serves federated keyword queries over them.
//!
//! - [`search`]: engine, mappings, DAOs, repositories, services, sync consumer
//! - [`messaging`]: bus abstraction with NATS JetStream, Kafka and in-memory backends
//! - [`api`]: HTTP surface (`POST /search/list`, `/health`, `/metrics`)

pub mod api;
pub mod config;
pub mod error;
pub mod messaging;
pub mod models;
pub mod search;

pub use error::{AppError, Result};
