//! Cross-kind full-text search and index synchronization
//!
//! Domain entities (questions, question sets, cases, skills) are projected
//! into one Tantivy index per kind. Writes arrive as change events on the
//! message bus; reads fan out over every kind in parallel.
//!
//! # Architecture
//!
//! ```text
//!   search_sync_event                          POST /search/list
//!          │                                          │
//!          ▼                                          ▼
//! ┌─────────────────┐                       ┌──────────────────┐
//! │  SyncConsumer   │                       │  SearchService   │
//! │ ack/nack/backoff│                       │  QueryParser     │
//! └─────────────────┘                       └──────────────────┘
//!          │                                   │   │   │   │
//!          ▼                                   ▼   ▼   ▼   ▼
//! ┌─────────────────┐                      one repository per kind
//! │   SyncService   │                                 │
//! │   AnyDao        │                         typed DocumentDao
//! └─────────────────┘                                 │
//!          │                                          │
//!          └──────────────┐          ┌────────────────┘
//!                         ▼          ▼
//!                 ┌──────────────────────────┐
//!                 │   SearchEngine (Tantivy) │
//!                 │   one index per mapping  │
//!                 └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use webook_search::messaging::InMemoryBroker;
//! use webook_search::search::{SearchConfig, SearchModule, SyncConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Arc::new(InMemoryBroker::new());
//!     let module = SearchModule::new(
//!         &SearchConfig::default(),
//!         SyncConfig::default(),
//!         broker.clone(),
//!         broker,
//!     )?;
//!     module.bootstrap().await?;
//!
//!     let result = module.search.search("rust case:cache", 0, 20).await?;
//!     println!("{} cases", result.cases.len());
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
mod config;
pub mod consumer;
pub mod dao;
pub mod engine;
mod error;
pub mod mapping;
pub mod metrics;
mod module;
pub mod query;
pub mod repository;
mod service;
mod sync;

pub use bootstrap::{BootstrapReport, IndexBootstrap};
pub use config::{IndexStorage, SearchConfig, SearchConfigBuilder, SyncConfig};
pub use consumer::{ConsumerState, SyncConsumer};
pub use engine::{EngineHit, EngineQuery, IndexStatus, SearchEngine, TantivyEngine, UpsertOutcome};
pub use error::{ConsumerError, EngineError, Result, SearchError, SyncError};
pub use mapping::{IndexMapping, MappingRegistry};
pub use metrics::{init_search_metrics, SEARCH_METRICS};
pub use module::{load_registry, SearchModule};
pub use query::{ParsedQuery, QueryField, QueryParser};
pub use service::{SearchResult, SearchService};
pub use sync::SyncService;
