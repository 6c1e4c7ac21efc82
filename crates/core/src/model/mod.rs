mod ids;
mod ledger;
mod question;
mod topic;

pub use ids::QuestionId;
pub use ledger::AnswerLedger;
pub use question::{EXPECTED_QUESTION_COUNT, Question, QuestionError, QuestionSet, QuestionSetError};
pub use topic::{Topic, TopicError};
