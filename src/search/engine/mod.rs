//! Search engine seam
//!
//! DAOs talk to a [`SearchEngine`] rather than to Tantivy directly. The
//! production implementation is [`TantivyEngine`]; tests wrap it to inject
//! outages and latency.

mod tantivy_engine;

pub use tantivy_engine::TantivyEngine;

use crate::search::error::EngineError;
use crate::search::mapping::IndexMapping;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;

/// Keyword that matches every document of an index
pub const MATCH_ALL: &str = "*";

/// Outcome of [`SearchEngine::ensure_index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    Created,
    Existing,
}

/// Outcome of [`SearchEngine::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The document now holds the written state
    Applied,
    /// The stored document carries a newer version; nothing was written
    Stale,
}

/// Disjunctive full-text query against one index
#[derive(Debug, Clone, PartialEq)]
pub struct EngineQuery {
    /// Fields the keywords are matched against
    pub fields: Vec<String>,

    /// Raw keywords, analyzed per field by the engine
    pub keywords: BTreeSet<String>,

    /// Exact-term filters every hit must satisfy
    pub filters: Vec<(String, String)>,

    pub offset: usize,
    pub limit: usize,

    /// Long field ordering equal scores, newest first
    pub recency_field: Option<String>,

    /// Long field ordering the remaining ties, ascending
    pub id_field: Option<String>,
}

impl EngineQuery {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            keywords: BTreeSet::new(),
            filters: Vec::new(),
            offset: 0,
            limit: 20,
            recency_field: Some("utime".to_string()),
            id_field: Some("id".to_string()),
        }
    }

    pub fn keywords(mut self, keywords: BTreeSet<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// True when the only keyword is the match-all wildcard
    pub fn is_match_all(&self) -> bool {
        self.keywords.len() == 1 && self.keywords.contains(MATCH_ALL)
    }
}

/// A matched document
#[derive(Debug, Clone, PartialEq)]
pub struct EngineHit {
    pub id: String,
    pub score: f32,
    pub source: serde_json::Value,
}

/// Operations the search subsystem needs from an index engine
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Create the index described by `mapping` unless it already exists
    async fn ensure_index(&self, mapping: &IndexMapping) -> Result<IndexStatus, EngineError>;

    /// Whether the index has been opened or created by this engine
    async fn has_index(&self, index: &str) -> bool;

    /// Replace the document `doc_id` with the raw JSON `source`
    async fn upsert(
        &self,
        index: &str,
        doc_id: &str,
        source: &str,
    ) -> Result<UpsertOutcome, EngineError>;

    /// Fetch the stored source of one document
    async fn get(&self, index: &str, doc_id: &str)
        -> Result<Option<serde_json::Value>, EngineError>;

    async fn search(&self, index: &str, query: &EngineQuery) -> Result<Vec<EngineHit>, EngineError>;

    /// Number of live documents
    async fn count(&self, index: &str) -> Result<u64, EngineError>;
}
