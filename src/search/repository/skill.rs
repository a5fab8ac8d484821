use crate::models::{from_millis, Skill, SkillLevel};
use crate::search::dao::{SkillDao, SkillDoc, SkillLevelDoc};
use crate::search::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

#[async_trait]
pub trait SkillRepository: Send + Sync {
    async fn search_skill(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<Skill>>;
}

pub struct IndexSkillRepository {
    dao: SkillDao,
}

impl IndexSkillRepository {
    pub fn new(dao: SkillDao) -> Self {
        Self { dao }
    }
}

#[async_trait]
impl SkillRepository for IndexSkillRepository {
    async fn search_skill(
        &self,
        offset: usize,
        limit: usize,
        keywords: &BTreeSet<String>,
    ) -> Result<Vec<Skill>> {
        let docs = self.dao.search(offset, limit, keywords).await?;
        Ok(docs.into_iter().map(Skill::from).collect())
    }
}

impl From<SkillLevelDoc> for SkillLevel {
    fn from(doc: SkillLevelDoc) -> Self {
        Self {
            description: doc.desc,
            question_ids: doc.questions,
            case_ids: doc.cases,
        }
    }
}

impl From<SkillDoc> for Skill {
    fn from(doc: SkillDoc) -> Self {
        Self {
            id: doc.id,
            labels: doc.labels,
            name: doc.name,
            description: doc.desc,
            basic: doc.basic.into(),
            intermediate: doc.intermediate.into(),
            advanced: doc.advanced.into(),
            ctime: from_millis(doc.ctime),
            utime: from_millis(doc.utime),
        }
    }
}
