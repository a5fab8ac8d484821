//! Write path from change events into the indexes

use crate::search::engine::UpsertOutcome;
use crate::search::error::SyncError;
use crate::search::mapping::MappingRegistry;
use crate::search::metrics::SEARCH_METRICS;
use crate::search::repository::AnyRepository;
use std::sync::Arc;
use tracing::{debug, error};

/// Writes raw documents into registered indexes
pub struct SyncService {
    repo: Arc<dyn AnyRepository>,
    registry: Arc<MappingRegistry>,
}

impl SyncService {
    pub fn new(repo: Arc<dyn AnyRepository>, registry: Arc<MappingRegistry>) -> Self {
        Self { repo, registry }
    }

    /// Upsert `payload` as document `doc_id` of `index`
    pub async fn input(&self, index: &str, doc_id: &str, payload: &str) -> Result<(), SyncError> {
        if !self.registry.contains(index) {
            SEARCH_METRICS
                .upserts
                .with_label_values(&["unknown", "invalid_index"])
                .inc();
            return Err(SyncError::InvalidIndex(index.to_string()));
        }

        match self.repo.input(index, doc_id, payload).await {
            Ok(outcome) => {
                let label = match outcome {
                    UpsertOutcome::Applied => "applied",
                    UpsertOutcome::Stale => "stale",
                };
                SEARCH_METRICS
                    .upserts
                    .with_label_values(&[index, label])
                    .inc();
                debug!(index, doc_id, outcome = label, "Sync input handled");
                Ok(())
            }
            Err(e) => {
                SEARCH_METRICS
                    .upserts
                    .with_label_values(&[index, "error"])
                    .inc();
                error!(index, doc_id, error = %e, "Sync input failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::dao::{test_engine, AnyDao};
    use crate::search::error::EngineError;
    use crate::search::repository::IndexAnyRepository;

    async fn service() -> (SyncService, Arc<dyn crate::search::engine::SearchEngine>) {
        let engine = test_engine().await;
        let repo = IndexAnyRepository::new(AnyDao::new(Arc::clone(&engine)));
        let registry = MappingRegistry::embedded().unwrap();
        (SyncService::new(Arc::new(repo), Arc::new(registry)), engine)
    }

    #[tokio::test]
    async fn test_input_writes_through() {
        let (service, engine) = service().await;
        service
            .input("case", "12", r#"{"id":12,"title":"LRU cache","status":"published","ctime":1,"utime":1}"#)
            .await
            .unwrap();

        let stored = engine.get("case", "12").await.unwrap().unwrap();
        assert_eq!(stored["title"], "LRU cache");
    }

    #[tokio::test]
    async fn test_unknown_index_is_rejected() {
        let (service, _) = service().await;
        let err = service.input("feedback", "1", "{}").await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidIndex(ref name) if name == "feedback"));
    }

    #[tokio::test]
    async fn test_engine_errors_surface() {
        let (service, _) = service().await;
        let err = service
            .input("skill", "1", r#"{"id":"seven"}"#)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Engine(EngineError::MappingViolation { .. })
        ));
    }
}
