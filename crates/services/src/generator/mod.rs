//! Clients for the external question and feedback generator.

mod chat;
mod config;
mod retry;
mod service;
mod wire;

use async_trait::async_trait;

use quiz_core::model::{QuestionSet, Topic};

use crate::error::GeneratorError;

pub use chat::{ChatConfig, ChatGenerator};
pub use config::{GeneratorBackend, GeneratorConfig};
pub use retry::RetryPolicy;
pub use service::{ServiceConfig, ServiceGenerator};
pub use wire::{extract_json, parse_feedback, parse_question_set};

/// Shown in place of generated feedback when the generator cannot provide any.
pub const FEEDBACK_FALLBACK: &str = "Couldn't fetch feedback right now. Try again later.";

/// Contract for the question/feedback generator.
///
/// Implementations own their retry policy; callers only ever see the final outcome.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Produce a validated question set for `topic`.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` when the service fails after retries or its response
    /// does not describe a valid question set.
    async fn generate_question_set(&self, topic: &Topic) -> Result<QuestionSet, GeneratorError>;

    /// Produce narrative feedback for a finished quiz.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` on any failure. Callers substitute [`FEEDBACK_FALLBACK`].
    async fn generate_feedback(&self, topic: &Topic, score: u32) -> Result<String, GeneratorError>;
}
