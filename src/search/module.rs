//! Composition root of the search subsystem
//!
//! Everything is built once, in dependency order: engine, mappings,
//! bootstrap, DAOs, repositories, services and finally the sync consumer.

use crate::messaging::{MessageConsumer, MessageProducer};
use crate::search::bootstrap::{BootstrapReport, IndexBootstrap};
use crate::search::config::{SearchConfig, SyncConfig};
use crate::search::consumer::SyncConsumer;
use crate::search::dao::{AnyDao, CaseDao, QuestionDao, QuestionSetDao, SkillDao};
use crate::search::engine::{SearchEngine, TantivyEngine};
use crate::search::error::EngineError;
use crate::search::mapping::MappingRegistry;
use crate::search::repository::{
    IndexAnyRepository, IndexCaseRepository, IndexQuestionRepository, IndexQuestionSetRepository,
    IndexSkillRepository,
};
use crate::search::service::SearchService;
use crate::search::sync::SyncService;
use std::sync::Arc;
use tracing::info;

/// Wired search subsystem
pub struct SearchModule {
    pub engine: Arc<dyn SearchEngine>,
    pub registry: Arc<MappingRegistry>,
    pub bootstrap: Arc<IndexBootstrap>,
    pub search: Arc<SearchService>,
    pub sync: Arc<SyncService>,
    pub consumer: Arc<SyncConsumer>,
}

/// Embedded mappings plus the ones found in `extra_mappings_dir`
pub fn load_registry(config: &SearchConfig) -> Result<MappingRegistry, EngineError> {
    let mut registry = MappingRegistry::embedded()?;
    if let Some(dir) = &config.extra_mappings_dir {
        let loaded = registry.load_dir(dir)?;
        info!(dir = %dir.display(), loaded, "Extra index mappings registered");
    }
    Ok(registry)
}

impl SearchModule {
    /// Build the module on a Tantivy engine configured by `search`
    pub fn new(
        search: &SearchConfig,
        sync: SyncConfig,
        consumer: Arc<dyn MessageConsumer>,
        dead_letters: Arc<dyn MessageProducer>,
    ) -> Result<Self, EngineError> {
        let registry = Arc::new(load_registry(search)?);
        let engine: Arc<dyn SearchEngine> = Arc::new(TantivyEngine::new(search.clone()));
        Ok(Self::with_engine(
            engine,
            registry,
            search,
            sync,
            consumer,
            dead_letters,
        ))
    }

    /// Build the module around an existing engine
    pub fn with_engine(
        engine: Arc<dyn SearchEngine>,
        registry: Arc<MappingRegistry>,
        search: &SearchConfig,
        sync: SyncConfig,
        consumer: Arc<dyn MessageConsumer>,
        dead_letters: Arc<dyn MessageProducer>,
    ) -> Self {
        let bootstrap = Arc::new(IndexBootstrap::new(engine.clone(), registry.clone()));

        let search_service = Arc::new(SearchService::new(
            Arc::new(IndexQuestionRepository::new(QuestionDao::new(engine.clone()))),
            Arc::new(IndexQuestionSetRepository::new(QuestionSetDao::new(engine.clone()))),
            Arc::new(IndexCaseRepository::new(CaseDao::new(engine.clone()))),
            Arc::new(IndexSkillRepository::new(SkillDao::new(engine.clone()))),
            search,
        ));

        let sync_service = Arc::new(SyncService::new(
            Arc::new(IndexAnyRepository::new(AnyDao::new(engine.clone()))),
            registry.clone(),
        ));

        let mut sync_consumer = SyncConsumer::new(consumer, sync_service.clone(), sync.clone());
        if sync.dead_letter_after.is_some() {
            sync_consumer = sync_consumer.with_dead_letters(dead_letters);
        }

        Self {
            engine,
            registry,
            bootstrap,
            search: search_service,
            sync: sync_service,
            consumer: Arc::new(sync_consumer),
        }
    }

    /// Create or verify every registered index
    pub async fn bootstrap(&self) -> Result<&BootstrapReport, EngineError> {
        self.bootstrap.ensure_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::InMemoryBroker;
    use crate::search::config::IndexStorage;

    fn memory_config() -> SearchConfig {
        SearchConfig {
            storage: IndexStorage::Memory,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_wires_and_bootstraps() {
        let broker = Arc::new(InMemoryBroker::new());
        let module = SearchModule::new(
            &memory_config(),
            SyncConfig::default(),
            broker.clone(),
            broker,
        )
        .unwrap();

        let report = module.bootstrap().await.unwrap();
        assert_eq!(report.total(), module.registry.len());
        assert!(module.engine.has_index("question").await);

        module
            .sync
            .input("skill", "1", r#"{"id":1,"name":"rust","utime":1}"#)
            .await
            .unwrap();
        let result = module.search.search("skill:rust", 0, 10).await.unwrap();
        assert_eq!(result.skills.len(), 1);
    }

    #[test]
    fn test_extra_mappings_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("feedback.json"),
            r#"{"index":"feedback","fields":[{"name":"content","type":"text"}]}"#,
        )
        .unwrap();

        let config = SearchConfig {
            extra_mappings_dir: Some(dir.path().to_path_buf()),
            ..memory_config()
        };
        let registry = load_registry(&config).unwrap();
        assert!(registry.contains("feedback"));
        assert!(registry.contains("question"));
    }
}
