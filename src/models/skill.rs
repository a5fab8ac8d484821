use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A skill in the catalog, split into three proficiency levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub labels: Vec<String>,
    pub name: String,
    pub description: String,
    pub basic: SkillLevel,
    pub intermediate: SkillLevel,
    pub advanced: SkillLevel,
    pub ctime: DateTime<Utc>,
    pub utime: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillLevel {
    pub description: String,
    pub question_ids: Vec<i64>,
    pub case_ids: Vec<i64>,
}
