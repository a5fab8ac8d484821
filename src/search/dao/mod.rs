//! Per-kind index access
//!
//! Each kind owns the shape of the documents in its index and the query used
//! to match them. The shape is a serde struct mirroring what producers put on
//! the wire; the query is the list of analyzed fields plus an optional
//! `status = published` filter.

mod any;
mod case;
mod question;
mod question_set;
mod skill;

pub use any::AnyDao;
pub use case::{CaseDao, CaseDoc, CASE_INDEX};
pub use question::{AnswerDoc, AnswerElementDoc, QuestionDao, QuestionDoc, QUESTION_INDEX};
pub use question_set::{QuestionSetDao, QuestionSetDoc, QUESTION_SET_INDEX};
pub use skill::{SkillDao, SkillDoc, SkillLevelDoc, SKILL_INDEX};

use crate::search::engine::{EngineQuery, SearchEngine, UpsertOutcome};
use crate::search::error::{EngineError, SearchError};
use crate::search::metrics::SEARCH_METRICS;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Status value visible to the public search
pub const PUBLISHED: &str = "published";

/// A document type stored in its own index
pub trait IndexedDocument: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the index holding this kind
    const INDEX: &'static str;

    /// Fields the keywords are matched against
    const SEARCH_FIELDS: &'static [&'static str];

    /// Restrict search hits to published documents
    const PUBLISHED_ONLY: bool = false;

    fn doc_id(&self) -> String;

    fn ctime(&self) -> i64;

    fn utime(&self) -> i64;
}

/// Drop blank keywords and surrounding whitespace
pub fn normalize_keywords(keywords: &BTreeSet<String>) -> BTreeSet<String> {
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Typed access to the index of one kind
pub struct DocumentDao<D> {
    engine: Arc<dyn SearchEngine>,
    _kind: PhantomData<fn() -> D>,
}

impl<D: IndexedDocument> DocumentDao<D> {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self {
            engine,
            _kind: PhantomData,
        }
    }

    pub fn index(&self) -> &'static str {
        D::INDEX
    }

    /// Replace the stored document with `doc`
    pub async fn upsert(&self, doc: &D) -> Result<UpsertOutcome, EngineError> {
        if doc.ctime() > doc.utime() {
            return Err(EngineError::MappingViolation {
                index: D::INDEX.to_string(),
                reason: format!("ctime {} is after utime {}", doc.ctime(), doc.utime()),
            });
        }

        let source = serde_json::to_string(doc).map_err(|e| EngineError::MappingViolation {
            index: D::INDEX.to_string(),
            reason: e.to_string(),
        })?;

        self.engine.upsert(D::INDEX, &doc.doc_id(), &source).await
    }

    /// Documents matching any of `keywords`, best first
    pub async fn search(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<D>, SearchError> {
        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = EngineQuery::new(D::SEARCH_FIELDS.iter().copied())
            .keywords(keywords)
            .page(offset, limit);
        if D::PUBLISHED_ONLY {
            query = query.filter("status", PUBLISHED);
        }

        let hits = self.engine.search(D::INDEX, &query).await?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| match serde_json::from_value(hit.source) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!(
                        index = D::INDEX,
                        doc_id = %hit.id,
                        error = %e,
                        "Skipping undecodable hit"
                    );
                    SEARCH_METRICS
                        .hits_skipped
                        .with_label_values(&[D::INDEX])
                        .inc();
                    None
                }
            })
            .collect())
    }
}

impl<D> Clone for DocumentDao<D> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            _kind: PhantomData,
        }
    }
}

/// In-memory engine with every embedded index created
#[cfg(test)]
pub(crate) async fn test_engine() -> Arc<dyn SearchEngine> {
    use crate::search::engine::TantivyEngine;
    use crate::search::mapping::MappingRegistry;

    let engine = TantivyEngine::in_memory();
    let registry = MappingRegistry::embedded().unwrap();
    for mapping in registry.mappings() {
        engine.ensure_index(mapping).await.unwrap();
    }
    Arc::new(engine)
}
