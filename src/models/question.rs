use super::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An interview question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub uid: i64,
    pub title: String,
    pub labels: Vec<String>,
    pub content: String,
    pub status: Status,
    pub answer: Answer,
    pub ctime: DateTime<Utc>,
    pub utime: DateTime<Utc>,
}

/// Layered answer of a question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub analysis: AnswerElement,
    pub basic: AnswerElement,
    pub intermediate: AnswerElement,
    pub advanced: AnswerElement,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerElement {
    pub id: i64,
    pub content: String,
    pub keywords: String,
    pub shorthand: String,
    pub highlight: String,
    pub guidance: String,
}
