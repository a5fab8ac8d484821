use crate::search::engine::{SearchEngine, UpsertOutcome};
use crate::search::error::EngineError;
use std::sync::Arc;

/// Write-through access to any index; the payload is stored verbatim
#[derive(Clone)]
pub struct AnyDao {
    engine: Arc<dyn SearchEngine>,
}

impl AnyDao {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    pub async fn input(
        &self,
        index: &str,
        doc_id: &str,
        raw: &str,
    ) -> Result<UpsertOutcome, EngineError> {
        self.engine.upsert(index, doc_id, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::dao::test_engine;

    #[tokio::test]
    async fn test_input_stores_payload_verbatim() {
        let engine = test_engine().await;
        let dao = AnyDao::new(Arc::clone(&engine));

        let raw = r#"{"id":8,"name":"kafka","extra":{"kept":true},"ctime":1,"utime":1}"#;
        dao.input("skill", "8", raw).await.unwrap();

        let stored = engine.get("skill", "8").await.unwrap().unwrap();
        assert_eq!(stored["extra"]["kept"], true);
    }

    #[tokio::test]
    async fn test_input_surfaces_engine_errors() {
        let dao = AnyDao::new(test_engine().await);

        let err = dao.input("question", "1", r#"{"utime":"soon"}"#).await.unwrap_err();
        assert!(matches!(err, EngineError::MappingViolation { .. }));

        let err = dao.input("missing", "1", "{}").await.unwrap_err();
        assert!(matches!(err, EngineError::IndexNotFound(_)));
    }
}
