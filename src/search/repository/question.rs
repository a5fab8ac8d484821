use crate::models::{from_millis, Answer, AnswerElement, Question};
use crate::search::dao::{AnswerElementDoc, QuestionDao, QuestionDoc};
use crate::search::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn search_question(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<Question>>;
}

/// [`QuestionRepository`] reading the `question` index
pub struct IndexQuestionRepository {
    dao: QuestionDao,
}

impl IndexQuestionRepository {
    pub fn new(dao: QuestionDao) -> Self {
        Self { dao }
    }
}

#[async_trait]
impl QuestionRepository for IndexQuestionRepository {
    async fn search_question(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<Question>> {
        let docs = self.dao.search(offset, limit, keywords).await?;
        Ok(docs.into_iter().map(Question::from).collect())
    }
}

impl From<AnswerElementDoc> for AnswerElement {
    fn from(doc: AnswerElementDoc) -> Self {
        Self {
            id: doc.id,
            content: doc.content,
            keywords: doc.keywords,
            shorthand: doc.shorthand,
            highlight: doc.highlight,
            guidance: doc.guidance,
        }
    }
}

impl From<QuestionDoc> for Question {
    fn from(doc: QuestionDoc) -> Self {
        Self {
            id: doc.id,
            uid: doc.uid,
            title: doc.title,
            labels: doc.labels,
            content: doc.content,
            status: doc.status,
            answer: Answer {
                analysis: doc.answer.analysis.into(),
                basic: doc.answer.basic.into(),
                intermediate: doc.answer.intermediate.into(),
                advanced: doc.answer.advanced.into(),
            },
            ctime: from_millis(doc.ctime),
            utime: from_millis(doc.utime),
        }
    }
}
