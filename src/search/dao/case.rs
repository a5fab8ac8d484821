use super::{DocumentDao, IndexedDocument};
use crate::models::Status;
use serde::{Deserialize, Serialize};

pub const CASE_INDEX: &str = "case";

/// Case as stored in the `case` index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseDoc {
    pub id: i64,
    pub uid: i64,
    pub title: String,
    pub labels: Vec<String>,
    pub content: String,
    pub code_content: String,
    pub keywords: String,
    pub shorthand: String,
    pub highlight: String,
    pub guidance: String,
    pub status: Status,
    pub ctime: i64,
    pub utime: i64,
}

impl IndexedDocument for CaseDoc {
    const INDEX: &'static str = CASE_INDEX;
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "title",
        "labels",
        "content",
        "code_content",
        "keywords",
        "shorthand",
        "highlight",
        "guidance",
    ];
    const PUBLISHED_ONLY: bool = true;

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

pub type CaseDao = DocumentDao<CaseDoc>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::dao::test_engine;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_code_content_is_searchable() {
        let dao = CaseDao::new(test_engine().await);
        let case = CaseDoc {
            id: 4,
            title: "Rate limiter".to_string(),
            code_content: "func allow(key string) bool".to_string(),
            status: Status::Published,
            ctime: 1,
            utime: 1,
            ..Default::default()
        };
        dao.upsert(&case).await.unwrap();

        let found = dao
            .search(0, 20, &BTreeSet::from(["allow".to_string()]))
            .await
            .unwrap();
        assert_eq!(found, vec![case]);
    }

    #[tokio::test]
    async fn test_draft_cases_are_hidden() {
        let dao = CaseDao::new(test_engine().await);
        let case = CaseDoc {
            id: 5,
            title: "Sharding".to_string(),
            status: Status::Draft,
            ..Default::default()
        };
        dao.upsert(&case).await.unwrap();

        let found = dao
            .search(0, 20, &BTreeSet::from(["sharding".to_string()]))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
