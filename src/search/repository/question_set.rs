use crate::models::{from_millis, QuestionSet};
use crate::search::dao::{QuestionSetDao, QuestionSetDoc};
use crate::search::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

#[async_trait]
pub trait QuestionSetRepository: Send + Sync {
    async fn search_question_set(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<QuestionSet>>;
}

pub struct IndexQuestionSetRepository {
    dao: QuestionSetDao,
}

impl IndexQuestionSetRepository {
    pub fn new(dao: QuestionSetDao) -> Self {
        Self { dao }
    }
}

#[async_trait]
impl QuestionSetRepository for IndexQuestionSetRepository {
    async fn search_question_set(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<QuestionSet>> {
        let docs = self.dao.search(offset, limit, keywords).await?;
        Ok(docs.into_iter().map(QuestionSet::from).collect())
    }
}

impl From<QuestionSetDoc> for QuestionSet {
    fn from(doc: QuestionSetDoc) -> Self {
        Self {
            id: doc.id,
            uid: doc.uid,
            title: doc.title,
            description: doc.description,
            question_ids: doc.questions,
            ctime: from_millis(doc.ctime),
            utime: from_millis(doc.utime),
        }
    }
}
