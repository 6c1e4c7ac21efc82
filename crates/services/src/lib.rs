#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{GenerationErrorKind, GeneratorError};
pub use generator::{
    ChatConfig, ChatGenerator, FEEDBACK_FALLBACK, GeneratorBackend, GeneratorConfig,
    QuizGenerator, RetryPolicy, ServiceConfig, ServiceGenerator,
};
pub use sessions::{
    Feedback, FeedbackReply, FeedbackState, FeedbackTicket, GenerationReply, GenerationTicket,
    QuizSession, QuizSessionService, ReplyOutcome, RequestToken, SessionPhase,
};
