//! One-shot index bootstrap

use crate::search::engine::{IndexStatus, SearchEngine};
use crate::search::error::EngineError;
use crate::search::mapping::MappingRegistry;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Which indexes a bootstrap run created and which were already present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

impl BootstrapReport {
    pub fn total(&self) -> usize {
        self.created.len() + self.existing.len()
    }
}

/// Ensures every registered index exists, at most once per process
///
/// Concurrent first callers wait on the same latch and exactly one of them
/// runs schema creation. A failed run leaves the latch unset so a later call
/// may retry.
pub struct IndexBootstrap {
    engine: Arc<dyn SearchEngine>,
    registry: Arc<MappingRegistry>,
    latch: OnceCell<BootstrapReport>,
}

impl IndexBootstrap {
    pub fn new(engine: Arc<dyn SearchEngine>, registry: Arc<MappingRegistry>) -> Self {
        Self {
            engine,
            registry,
            latch: OnceCell::new(),
        }
    }

    pub async fn ensure_all(&self) -> Result<&BootstrapReport, EngineError> {
        self.latch.get_or_try_init(|| self.run()).await
    }

    /// Whether a bootstrap run has completed successfully
    pub fn is_done(&self) -> bool {
        self.latch.initialized()
    }

    async fn run(&self) -> Result<BootstrapReport, EngineError> {
        let mut report = BootstrapReport::default();

        for mapping in self.registry.mappings() {
            match self.engine.ensure_index(mapping).await {
                Ok(IndexStatus::Created) => report.created.push(mapping.index.clone()),
                Ok(IndexStatus::Existing) => report.existing.push(mapping.index.clone()),
                Err(e) => {
                    error!(index = %mapping.index, error = %e, "Index bootstrap failed");
                    return Err(e);
                }
            }
        }

        info!(
            created = ?report.created,
            existing = ?report.existing,
            "Index bootstrap complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::engine::TantivyEngine;

    fn bootstrap() -> IndexBootstrap {
        IndexBootstrap::new(
            Arc::new(TantivyEngine::in_memory()),
            Arc::new(MappingRegistry::embedded().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_runs_once() {
        let bootstrap = bootstrap();
        assert!(!bootstrap.is_done());

        let first = bootstrap.ensure_all().await.unwrap().clone();
        assert_eq!(first.created.len(), 4);
        assert!(first.existing.is_empty());

        let second = bootstrap.ensure_all().await.unwrap();
        assert_eq!(&first, second);
        assert!(bootstrap.is_done());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let bootstrap = Arc::new(bootstrap());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let bootstrap = Arc::clone(&bootstrap);
            handles.push(tokio::spawn(async move {
                bootstrap.ensure_all().await.map(|r| r.total())
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 4);
        }
        assert_eq!(bootstrap.ensure_all().await.unwrap().created.len(), 4);
    }
}
