use super::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A worked interview case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
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
    pub ctime: DateTime<Utc>,
    pub utime: DateTime<Utc>,
}
