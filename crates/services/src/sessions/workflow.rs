use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use quiz_core::model::Topic;

use crate::error::GeneratorError;
use crate::generator::QuizGenerator;
use super::service::QuizSession;
use super::state::{
    FeedbackReply, FeedbackTicket, GenerationReply, GenerationTicket, ReplyOutcome,
    SessionPhase,
};

const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(90);

/// Runs generator requests for a [`QuizSession`].
///
/// `fulfill_*` turn tickets into replies and can run on any task; the reply is applied
/// by whoever owns the session. The remaining methods do both steps in sequence for
/// callers that do not need to stay responsive while a request is in flight.
#[derive(Clone)]
pub struct QuizSessionService {
    generator: Arc<dyn QuizGenerator>,
    total_timeout: Duration,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(generator: Arc<dyn QuizGenerator>) -> Self {
        Self {
            generator,
            total_timeout: DEFAULT_TOTAL_TIMEOUT,
        }
    }

    /// Bound the wait for any single generator round-trip, retries included.
    #[must_use]
    pub fn with_total_timeout(mut self, total_timeout: Duration) -> Self {
        self.total_timeout = total_timeout;
        self
    }

    /// Request a question set for the ticket's topic.
    pub async fn fulfill_generation(&self, ticket: GenerationTicket) -> GenerationReply {
        let result = match timeout(
            self.total_timeout,
            self.generator.generate_question_set(&ticket.topic),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(topic = %ticket.topic, after = ?self.total_timeout, "quiz generation timed out");
                Err(GeneratorError::TimedOut {
                    after: self.total_timeout,
                })
            }
        };
        GenerationReply {
            token: ticket.token,
            result,
        }
    }

    /// Request feedback for the ticket's topic and score.
    pub async fn fulfill_feedback(&self, ticket: FeedbackTicket) -> FeedbackReply {
        let result = match timeout(
            self.total_timeout,
            self.generator
                .generate_feedback(&ticket.topic, ticket.score),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GeneratorError::TimedOut {
                after: self.total_timeout,
            }),
        };
        FeedbackReply {
            token: ticket.token,
            result,
        }
    }

    /// Select a topic and wait for its question set.
    pub async fn start(&self, session: &mut QuizSession, topic: Topic) -> SessionPhase {
        if let Some(ticket) = session.select_topic(topic) {
            let reply = self.fulfill_generation(ticket).await;
            session.apply_generation(reply);
        }
        session.phase()
    }

    /// Regenerate and wait for the new question set.
    pub async fn regenerate(&self, session: &mut QuizSession) -> SessionPhase {
        if let Some(ticket) = session.regenerate() {
            let reply = self.fulfill_generation(ticket).await;
            session.apply_generation(reply);
        }
        session.phase()
    }

    /// Request feedback and wait for it. Returns `Stale` if the session was not in a
    /// state that accepts feedback.
    pub async fn request_feedback(&self, session: &mut QuizSession) -> ReplyOutcome {
        let Some(ticket) = session.request_feedback() else {
            return ReplyOutcome::Stale;
        };
        let reply = self.fulfill_feedback(ticket).await;
        session.apply_feedback(reply)
    }
}
