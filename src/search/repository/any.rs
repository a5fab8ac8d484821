use crate::search::dao::AnyDao;
use crate::search::engine::UpsertOutcome;
use crate::search::error::EngineError;
use async_trait::async_trait;

/// Write-through repository used by the sync path
#[async_trait]
pub trait AnyRepository: Send + Sync {
    async fn input(
        &self,
        index: &str,
        doc_id: &str,
        raw: &str,
    ) -> Result<UpsertOutcome, EngineError>;
}

pub struct IndexAnyRepository {
    dao: AnyDao,
}

impl IndexAnyRepository {
    pub fn new(dao: AnyDao) -> Self {
        Self { dao }
    }
}

#[async_trait]
impl AnyRepository for IndexAnyRepository {
    async fn input(
        &self,
        index: &str,
        doc_id: &str,
        raw: &str,
    ) -> Result<UpsertOutcome, EngineError> {
        self.dao.input(index, doc_id, raw).await
    }
}
