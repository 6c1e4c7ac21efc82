mod service;
mod state;
mod workflow;

// Public API of the session subsystem.
pub use service::QuizSession;
pub use state::{
    Feedback, FeedbackReply, FeedbackState, FeedbackTicket, GenerationReply, GenerationTicket,
    ReplyOutcome, RequestToken, SessionPhase,
};
pub use workflow::QuizSessionService;
