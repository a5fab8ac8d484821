use crate::models::{from_millis, Case};
use crate::search::dao::{CaseDao, CaseDoc};
use crate::search::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn search_case(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<Case>>;
}

pub struct IndexCaseRepository {
    dao: CaseDao,
}

impl IndexCaseRepository {
    pub fn new(dao: CaseDao) -> Self {
        Self { dao }
    }
}

#[async_trait]
impl CaseRepository for IndexCaseRepository {
    async fn search_case(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<Case>> {
        let docs = self.dao.search(offset, limit, keywords).await?;
        Ok(docs.into_iter().map(Case::from).collect())
    }
}

impl From<CaseDoc> for Case {
    fn from(doc: CaseDoc) -> Self {
        Self {
            id: doc.id,
            uid: doc.uid,
            title: doc.title,
            labels: doc.labels,
            content: doc.content,
            code_content: doc.code_content,
            keywords: doc.keywords,
            shorthand: doc.shorthand,
            highlight: doc.highlight,
            guidance: doc.guidance,
            status: doc.status,
            ctime: from_millis(doc.ctime),
            utime: from_millis(doc.utime),
        }
    }
}
