use super::{DocumentDao, IndexedDocument};
use serde::{Deserialize, Serialize};

pub const SKILL_INDEX: &str = "skill";

/// Skill as stored in the `skill` index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillDoc {
    pub id: i64,
    pub labels: Vec<String>,
    pub name: String,
    pub desc: String,
    pub basic: SkillLevelDoc,
    pub intermediate: SkillLevelDoc,
    pub advanced: SkillLevelDoc,
    pub ctime: i64,
    pub utime: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillLevelDoc {
    pub desc: String,
    pub questions: Vec<i64>,
    pub cases: Vec<i64>,
}

impl IndexedDocument for SkillDoc {
    const INDEX: &'static str = SKILL_INDEX;
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "name",
        "labels",
        "description",
        "basic_desc",
        "intermediate_desc",
        "advanced_desc",
    ];

    fn doc_id(&self) -> String {
        self.id.to_string()
    }

    fn ctime(&self) -> i64 {
        self.ctime
    }

    fn utime(&self) -> i64 {
        self.utime
    }
}

pub type SkillDao = DocumentDao<SkillDoc>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::dao::test_engine;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_level_descriptions_are_searchable() {
        let dao = SkillDao::new(test_engine().await);
        let skill = SkillDoc {
            id: 1,
            name: "MySQL".to_string(),
            labels: vec!["database".to_string()],
            intermediate: SkillLevelDoc {
                desc: "covering indexes".to_string(),
                questions: vec![1, 2],
                cases: vec![3],
            },
            ctime: 1,
            utime: 2,
            ..Default::default()
        };
        dao.upsert(&skill).await.unwrap();

        let found = dao
            .search(0, 20, &BTreeSet::from(["covering".to_string()]))
            .await
            .unwrap();
        assert_eq!(found, vec![skill]);
    }
}
