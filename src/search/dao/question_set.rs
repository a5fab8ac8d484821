use super::{DocumentDao, IndexedDocument};
use serde::{Deserialize, Serialize};

pub const QUESTION_SET_INDEX: &str = "question_set";

/// Question set as stored in the `question_set` index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionSetDoc {
    pub id: i64,
    pub uid: i64,
    pub title: String,
    pub description: String,
    /// Ordered question ids
    pub questions: Vec<i64>,
    pub ctime: i64,
    pub utime: i64,
}

impl IndexedDocument for QuestionSetDoc {
    const INDEX: &'static str = QUESTION_SET_INDEX;
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "description"];

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

pub type QuestionSetDao = DocumentDao<QuestionSetDoc>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::dao::test_engine;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_question_order_survives_the_index() {
        let dao = QuestionSetDao::new(test_engine().await);
        let set = QuestionSetDoc {
            id: 9,
            uid: 1,
            title: "Concurrency drill".to_string(),
            description: "mutexes and channels".to_string(),
            questions: vec![30, 10, 20],
            ctime: 1,
            utime: 1,
        };
        dao.upsert(&set).await.unwrap();

        let keywords = BTreeSet::from(["MUTEXES".to_string()]);
        let found = dao.search(0, 20, &keywords).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].questions, vec![30, 10, 20]);
    }
}
