mod quiz_vm;
mod results_vm;
mod time_fmt;
mod topic_vm;

pub use quiz_vm::{
    OptionVm, QuestionCardVm, QuestionDotVm, SELECT_ANSWER_HINT, StatusVm, map_question_card, map_status,
    option_letter, parse_option_letter,
};
pub use results_vm::{FeedbackVm, ResultsVm, map_results};
pub use time_fmt::format_datetime;
pub use topic_vm::{PRESET_TOPICS, TopicCardVm, resolve_topic, topic_catalog};
