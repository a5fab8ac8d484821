//! Repositories turning index documents into domain objects
//!
//! Upper layers depend on these traits only, never on the DAOs or the
//! engine behind them.

mod any;
mod case;
mod question;
mod question_set;
mod skill;

pub use any::{AnyRepository, IndexAnyRepository};
pub use case::{CaseRepository, IndexCaseRepository};
pub use question::{IndexQuestionRepository, QuestionRepository};
pub use question_set::{IndexQuestionSetRepository, QuestionSetRepository};
pub use skill::{IndexSkillRepository, SkillRepository};
