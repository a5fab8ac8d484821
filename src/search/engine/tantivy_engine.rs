//! Embedded Tantivy engine, one index per kind

use super::{EngineHit, EngineQuery, IndexStatus, SearchEngine, UpsertOutcome};
use crate::search::config::{IndexStorage, SearchConfig};
use crate::search::error::EngineError;
use crate::search::mapping::{
    schema_difference, values_at, FieldKind, IndexMapping, ID_FIELD, SOURCE_FIELD,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value as JsonValue;
use std::cmp::Reverse;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{
    DocId, Index, IndexReader, IndexWriter, ReloadPolicy, Score, Searcher, SegmentReader,
    TantivyDocument, Term,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// An opened index with its writer and reader
struct IndexHandle {
    mapping: Arc<IndexMapping>,
    index: Index,
    schema: Schema,
    id_field: Field,
    source_field: Field,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
}

impl IndexHandle {
    fn open(index: Index, mapping: IndexMapping, config: &SearchConfig) -> Result<Self, EngineError> {
        let schema = index.schema();
        let id_field = schema.get_field(ID_FIELD)?;
        let source_field = schema.get_field(SOURCE_FIELD)?;

        let writer =
            index.writer_with_num_threads(config.indexing_threads.max(1), config.writer_heap_size)?;

        // Reloaded explicitly after every commit
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            mapping: Arc::new(mapping),
            index,
            schema,
            id_field,
            source_field,
            reader,
            writer: Mutex::new(writer),
        })
    }

    fn violation(&self, reason: impl Into<String>) -> EngineError {
        EngineError::MappingViolation {
            index: self.mapping.index.clone(),
            reason: reason.into(),
        }
    }

    fn build_document(
        &self,
        doc_id: &str,
        raw: &str,
        source: &JsonValue,
    ) -> Result<TantivyDocument, EngineError> {
        let mut document = TantivyDocument::default();
        document.add_text(self.id_field, doc_id);
        document.add_text(self.source_field, raw);

        for mapped in &self.mapping.fields {
            let field = self.schema.get_field(&mapped.name)?;

            for value in values_at(source, mapped.path()) {
                match mapped.kind {
                    FieldKind::Text | FieldKind::Keyword => match value {
                        JsonValue::String(text) => document.add_text(field, text),
                        JsonValue::Number(n) => document.add_text(field, n.to_string()),
                        JsonValue::Bool(b) => document.add_text(field, b.to_string()),
                        _ => {
                            return Err(self.violation(format!(
                                "field '{}' expects text, got {}",
                                mapped.name, value
                            )))
                        }
                    },
                    FieldKind::Long => match value.as_i64() {
                        Some(n) => document.add_i64(field, n),
                        None => {
                            return Err(self.violation(format!(
                                "field '{}' expects an integer, got {}",
                                mapped.name, value
                            )))
                        }
                    },
                }
            }
        }

        Ok(document)
    }

    fn version_of(&self, source: &JsonValue) -> Option<i64> {
        let field = self.mapping.version_field.as_deref()?;
        let path = self.mapping.field(field)?.path();
        values_at(source, path).first().and_then(|v| v.as_i64())
    }

    fn decode_source(&self, doc: &TantivyDocument) -> Result<(String, JsonValue), EngineError> {
        let id = doc
            .get_first(self.id_field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let raw = doc
            .get_first(self.source_field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                EngineError::Tantivy(format!("document {} has no stored source", id))
            })?;

        let source = serde_json::from_str(raw).map_err(|e| {
            EngineError::Tantivy(format!("stored source of {} is corrupt: {}", id, e))
        })?;

        Ok((id, source))
    }

    fn stored_source(
        &self,
        searcher: &Searcher,
        doc_id: &str,
    ) -> Result<Option<JsonValue>, EngineError> {
        let term = Term::from_field_text(self.id_field, doc_id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;

        match top_docs.into_iter().next() {
            Some((_, address)) => {
                let doc: TantivyDocument = searcher.doc(address)?;
                let (_, source) = self.decode_source(&doc)?;
                Ok(Some(source))
            }
            None => Ok(None),
        }
    }

    /// Run every keyword through the analyzer of every queried field
    fn analyze(&self, query: &EngineQuery) -> Result<Vec<Term>, EngineError> {
        let mut terms: Vec<Term> = Vec::new();

        for name in &query.fields {
            let field = self.schema.get_field(name)?;
            let mut analyzer = self.index.tokenizer_for_field(field)?;

            for keyword in &query.keywords {
                let mut stream = analyzer.token_stream(keyword);
                stream.process(&mut |token| {
                    let term = Term::from_field_text(field, &token.text);
                    if !terms.contains(&term) {
                        terms.push(term);
                    }
                });
            }
        }

        Ok(terms)
    }

    fn build_query(&self, query: &EngineQuery) -> Result<Option<Box<dyn Query>>, EngineError> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if query.is_match_all() {
            clauses.push((Occur::Must, Box::new(AllQuery)));
        } else {
            let terms = self.analyze(query)?;
            if terms.is_empty() {
                return Ok(None);
            }

            let disjunction: Vec<(Occur, Box<dyn Query>)> = terms
                .into_iter()
                .map(|term| {
                    let clause: Box<dyn Query> =
                        Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                    (Occur::Should, clause)
                })
                .collect();
            clauses.push((Occur::Must, Box::new(BooleanQuery::new(disjunction))));
        }

        for (name, value) in &query.filters {
            let field = self.schema.get_field(name)?;
            let term = Term::from_field_text(field, value);
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
            ));
        }

        Ok(Some(Box::new(BooleanQuery::new(clauses))))
    }
}

/// [`SearchEngine`] backed by embedded Tantivy indexes
pub struct TantivyEngine {
    config: SearchConfig,
    handles: DashMap<String, Arc<IndexHandle>>,
    open_lock: Mutex<()>,
}

impl TantivyEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            handles: DashMap::new(),
            open_lock: Mutex::new(()),
        }
    }

    /// Engine keeping every index in RAM
    pub fn in_memory() -> Self {
        Self::new(SearchConfig {
            storage: IndexStorage::Memory,
            ..Default::default()
        })
    }

    fn handle(&self, index: &str) -> Result<Arc<IndexHandle>, EngineError> {
        self.handles
            .get(index)
            .map(|h| Arc::clone(h.value()))
            .ok_or_else(|| EngineError::IndexNotFound(index.to_string()))
    }

    fn open_or_create(&self, mapping: &IndexMapping) -> Result<(Index, IndexStatus), EngineError> {
        let declared = mapping.build_schema();

        match self.config.storage {
            IndexStorage::Memory => Ok((Index::create_in_ram(declared), IndexStatus::Created)),
            IndexStorage::Disk => {
                let dir = self.config.index_path.join(&mapping.index);
                std::fs::create_dir_all(&dir)?;

                if dir.join("meta.json").exists() {
                    let index = Index::open_in_dir(&dir)?;
                    if let Some(reason) = schema_difference(&index.schema(), &declared) {
                        return Err(EngineError::MappingConflict {
                            index: mapping.index.clone(),
                            reason,
                        });
                    }
                    Ok((index, IndexStatus::Existing))
                } else {
                    let index = Index::create_in_dir(&dir, declared)?;
                    Ok((index, IndexStatus::Created))
                }
            }
        }
    }
}

#[async_trait]
impl SearchEngine for TantivyEngine {
    async fn ensure_index(&self, mapping: &IndexMapping) -> Result<IndexStatus, EngineError> {
        let _guard = self.open_lock.lock().await;

        if let Ok(handle) = self.handle(&mapping.index) {
            if let Some(reason) = schema_difference(&handle.schema, &mapping.build_schema()) {
                return Err(EngineError::MappingConflict {
                    index: mapping.index.clone(),
                    reason,
                });
            }
            return Ok(IndexStatus::Existing);
        }

        let (index, status) = self.open_or_create(mapping)?;
        let handle = IndexHandle::open(index, mapping.clone(), &self.config)?;
        self.handles
            .insert(mapping.index.clone(), Arc::new(handle));

        info!(index = %mapping.index, status = ?status, "Index ready");
        Ok(status)
    }

    async fn has_index(&self, index: &str) -> bool {
        self.handles.contains_key(index)
    }

    async fn upsert(
        &self,
        index: &str,
        doc_id: &str,
        source: &str,
    ) -> Result<UpsertOutcome, EngineError> {
        let handle = self.handle(index)?;

        if doc_id.is_empty() {
            return Err(handle.violation("document id is empty"));
        }

        let parsed: JsonValue = serde_json::from_str(source)
            .map_err(|e| handle.violation(format!("source is not valid JSON: {}", e)))?;
        if !parsed.is_object() {
            return Err(handle.violation("source must be a JSON object"));
        }

        let document = handle.build_document(doc_id, source, &parsed)?;
        let incoming = handle.version_of(&parsed);

        let mut writer = handle.writer.lock().await;

        if let Some(incoming) = incoming {
            let searcher = handle.reader.searcher();
            let current = handle
                .stored_source(&searcher, doc_id)?
                .and_then(|stored| handle.version_of(&stored));

            if let Some(current) = current {
                if incoming < current {
                    debug!(index, doc_id, incoming, current, "Skipping stale upsert");
                    return Ok(UpsertOutcome::Stale);
                }
            }
        }

        replace_document(
            &mut writer,
            Term::from_field_text(handle.id_field, doc_id),
            document,
        )?;
        handle.reader.reload()?;

        debug!(index, doc_id, "Document upserted");
        Ok(UpsertOutcome::Applied)
    }

    async fn get(
        &self,
        index: &str,
        doc_id: &str,
    ) -> Result<Option<JsonValue>, EngineError> {
        let handle = self.handle(index)?;
        let searcher = handle.reader.searcher();
        handle.stored_source(&searcher, doc_id)
    }

    async fn search(
        &self,
        index: &str,
        query: &EngineQuery,
    ) -> Result<Vec<EngineHit>, EngineError> {
        let handle = self.handle(index)?;

        if query.limit == 0 {
            return Ok(Vec::new());
        }
        let Some(tantivy_query) = handle.build_query(query)? else {
            return Ok(Vec::new());
        };

        let recency_field = query.recency_field.clone();
        let id_field = query.id_field.clone();
        let collector = TopDocs::with_limit(query.limit)
            .and_offset(query.offset)
            .tweak_score(move |segment_reader: &SegmentReader| {
                let fast_fields = segment_reader.fast_fields();
                let recency = recency_field
                    .as_deref()
                    .and_then(|name| fast_fields.i64(name).ok());
                let id = id_field
                    .as_deref()
                    .and_then(|name| fast_fields.i64(name).ok());

                move |doc: DocId, score: Score| {
                    let recency = recency
                        .as_ref()
                        .and_then(|column| column.first(doc))
                        .unwrap_or(i64::MIN);
                    let id = id
                        .as_ref()
                        .and_then(|column| column.first(doc))
                        .unwrap_or(i64::MAX);
                    (score, recency, Reverse(id))
                }
            });

        let searcher = handle.reader.searcher();
        let top_docs = searcher.search(&*tantivy_query, &collector)?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for ((score, _, _), address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let (id, source) = handle.decode_source(&doc)?;
            hits.push(EngineHit { id, score, source });
        }

        Ok(hits)
    }

    async fn count(&self, index: &str) -> Result<u64, EngineError> {
        let handle = self.handle(index)?;
        Ok(handle.reader.searcher().num_docs())
    }
}

/// Delete then add under one commit; any failure discards both operations
fn replace_document(
    writer: &mut IndexWriter,
    id_term: Term,
    document: TantivyDocument,
) -> Result<(), EngineError> {
    writer.delete_term(id_term);
    let staged = match writer.add_document(document) {
        Ok(_) => writer.commit().map(|_| ()),
        Err(e) => Err(e),
    };
    if let Err(e) = staged {
        let _ = writer.rollback();
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::mapping::MappingRegistry;
    use serde_json::json;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn keywords(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    async fn engine_with(kind: &str) -> TantivyEngine {
        let engine = TantivyEngine::in_memory();
        let registry = MappingRegistry::embedded().unwrap();
        engine
            .ensure_index(&registry.get(kind).unwrap())
            .await
            .unwrap();
        engine
    }

    fn question(id: i64, title: &str, status: &str, utime: i64) -> String {
        json!({
            "id": id, "uid": 1, "title": title, "labels": ["go"],
            "content": "", "status": status,
            "answer": {"basic": {"content": "channels are typed conduits"}},
            "ctime": 1, "utime": utime
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_ensure_index_is_idempotent() {
        let engine = TantivyEngine::in_memory();
        let registry = MappingRegistry::embedded().unwrap();
        let mapping = registry.get("question").unwrap();

        assert_eq!(engine.ensure_index(&mapping).await.unwrap(), IndexStatus::Created);
        assert_eq!(engine.ensure_index(&mapping).await.unwrap(), IndexStatus::Existing);
        assert!(engine.has_index("question").await);
        assert!(!engine.has_index("case").await);
    }

    #[tokio::test]
    async fn test_upsert_then_search() {
        let engine = engine_with("question").await;
        engine
            .upsert("question", "1", &question(1, "Go channel basics", "published", 10))
            .await
            .unwrap();

        let query = EngineQuery::new(["title", "answer_basic"]).keywords(keywords(&["Go-Channel"]));
        let hits = engine.search("question", &query).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
        assert_eq!(hits[0].source["title"], "Go channel basics");
    }

    #[tokio::test]
    async fn test_upsert_replaces_document() {
        let engine = engine_with("question").await;
        engine
            .upsert("question", "1", &question(1, "old title", "published", 10))
            .await
            .unwrap();
        engine
            .upsert("question", "1", &question(1, "new title", "published", 20))
            .await
            .unwrap();

        assert_eq!(engine.count("question").await.unwrap(), 1);
        let stored = engine.get("question", "1").await.unwrap().unwrap();
        assert_eq!(stored["title"], "new title");
    }

    #[tokio::test]
    async fn test_rolled_back_delete_does_not_leak_into_next_commit() {
        let engine = engine_with("question").await;
        engine
            .upsert("question", "1", &question(1, "kept", "published", 10))
            .await
            .unwrap();

        let handle = engine.handle("question").unwrap();
        {
            let mut writer = handle.writer.lock().await;
            writer.delete_term(Term::from_field_text(handle.id_field, "1"));
            writer.rollback().unwrap();
        }

        engine
            .upsert("question", "2", &question(2, "other", "published", 10))
            .await
            .unwrap();

        assert_eq!(engine.count("question").await.unwrap(), 2);
        let stored = engine.get("question", "1").await.unwrap().unwrap();
        assert_eq!(stored["title"], "kept");
    }

    #[tokio::test]
    async fn test_stale_upsert_is_skipped() {
        let engine = engine_with("question").await;
        engine
            .upsert("question", "1", &question(1, "newer", "published", 20))
            .await
            .unwrap();

        let outcome = engine
            .upsert("question", "1", &question(1, "older", "published", 10))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Stale);
        let stored = engine.get("question", "1").await.unwrap().unwrap();
        assert_eq!(stored["title"], "newer");
    }

    #[tokio::test]
    async fn test_filter_and_match_all() {
        let engine = engine_with("question").await;
        engine
            .upsert("question", "1", &question(1, "alpha", "published", 1))
            .await
            .unwrap();
        engine
            .upsert("question", "2", &question(2, "beta", "draft", 1))
            .await
            .unwrap();

        let query = EngineQuery::new(["title"])
            .keywords(keywords(&["*"]))
            .filter("status", "published");
        let hits = engine.search("question", &query).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[tokio::test]
    async fn test_ties_order_by_recency_then_id() {
        let engine = engine_with("question").await;
        for (id, utime) in [(3, 200), (1, 100), (2, 200)] {
            engine
                .upsert("question", &id.to_string(), &question(id, "golang", "published", utime))
                .await
                .unwrap();
        }

        let query = EngineQuery::new(["title"]).keywords(keywords(&["golang"]));
        let ids: Vec<_> = engine
            .search("question", &query)
            .await
            .unwrap()
            .into_iter()
            .map(|hit| hit.id)
            .collect();

        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[tokio::test]
    async fn test_paging() {
        let engine = engine_with("question").await;
        for id in 1..=5 {
            engine
                .upsert("question", &id.to_string(), &question(id, "golang", "published", id))
                .await
                .unwrap();
        }

        let query = EngineQuery::new(["title"])
            .keywords(keywords(&["golang"]))
            .page(1, 2);
        let ids: Vec<_> = engine
            .search("question", &query)
            .await
            .unwrap()
            .into_iter()
            .map(|hit| hit.id)
            .collect();

        assert_eq!(ids, vec!["4", "3"]);
    }

    #[tokio::test]
    async fn test_keywords_without_tokens_match_nothing() {
        let engine = engine_with("question").await;
        engine
            .upsert("question", "1", &question(1, "golang", "published", 1))
            .await
            .unwrap();

        let query = EngineQuery::new(["title"]).keywords(keywords(&["!!!", "   "]));
        assert!(engine.search("question", &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mapping_violation() {
        let engine = engine_with("question").await;

        let err = engine
            .upsert("question", "1", r#"{"id": "not-a-number"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MappingViolation { .. }));

        let err = engine.upsert("question", "1", "[1, 2]").await.unwrap_err();
        assert!(matches!(err, EngineError::MappingViolation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_index() {
        let engine = TantivyEngine::in_memory();
        let err = engine.upsert("nope", "1", "{}").await.unwrap_err();
        assert!(matches!(err, EngineError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_disk_reopen_and_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let registry = MappingRegistry::embedded().unwrap();
        let mapping = registry.get("skill").unwrap();

        {
            let engine = TantivyEngine::new(config.clone());
            assert_eq!(engine.ensure_index(&mapping).await.unwrap(), IndexStatus::Created);
            engine
                .upsert("skill", "7", r#"{"id": 7, "name": "rust", "ctime": 1, "utime": 1}"#)
                .await
                .unwrap();
        }

        let engine = TantivyEngine::new(config.clone());
        assert_eq!(engine.ensure_index(&mapping).await.unwrap(), IndexStatus::Existing);
        assert_eq!(engine.count("skill").await.unwrap(), 1);

        let mut changed = mapping.as_ref().clone();
        changed.fields.retain(|f| f.name != "labels");
        let other = TantivyEngine::new(config);
        let err = other.ensure_index(&changed).await.unwrap_err();
        assert!(matches!(err, EngineError::MappingConflict { .. }));
    }
}
