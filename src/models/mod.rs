//! Domain objects returned by the search repositories.
//!
//! These are read models: the source of truth lives in the owning bounded
//! context (questions, cases, skills). Timestamps arrive from the index as
//! unix milliseconds and are exposed here as `DateTime<Utc>`.

pub mod case;
pub mod question;
pub mod question_set;
pub mod skill;

pub use case::*;
pub use question::*;
pub use question_set::*;
pub use skill::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Publication status carried by questions and cases
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Published,
}

impl Status {
    pub fn is_published(&self) -> bool {
        matches!(self, Status::Published)
    }
}

/// Convert unix milliseconds to a UTC timestamp, clamping garbage to the epoch
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
