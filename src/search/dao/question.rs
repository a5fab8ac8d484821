use super::{DocumentDao, IndexedDocument};
use crate::models::Status;
use serde::{Deserialize, Serialize};

pub const QUESTION_INDEX: &str = "question";

/// Question as stored in the `question` index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionDoc {
    pub id: i64,
    pub uid: i64,
    pub title: String,
    pub labels: Vec<String>,
    pub content: String,
    pub status: Status,
    pub answer: AnswerDoc,
    pub ctime: i64,
    pub utime: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerDoc {
    pub analysis: AnswerElementDoc,
    pub basic: AnswerElementDoc,
    pub intermediate: AnswerElementDoc,
    pub advanced: AnswerElementDoc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerElementDoc {
    pub id: i64,
    pub content: String,
    pub keywords: String,
    pub shorthand: String,
    pub highlight: String,
    pub guidance: String,
}

impl IndexedDocument for QuestionDoc {
    const INDEX: &'static str = QUESTION_INDEX;
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "title",
        "labels",
        "content",
        "answer_analysis",
        "answer_basic",
        "answer_intermediate",
        "answer_advanced",
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

pub type QuestionDao = DocumentDao<QuestionDoc>;
