use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered collection of questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub id: i64,
    pub uid: i64,
    pub title: String,
    pub description: String,
    pub question_ids: Vec<i64>,
    pub ctime: DateTime<Utc>,
    pub utime: DateTime<Utc>,
}
