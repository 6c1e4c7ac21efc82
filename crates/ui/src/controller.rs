use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use services::{
    FeedbackReply, FeedbackTicket, GenerationReply, GenerationTicket, QuizSession,
    QuizSessionService, ReplyOutcome,
};

use crate::event::QuizEvent;

/// A finished generator request on its way back to the session.
#[derive(Debug)]
pub enum ControllerReply {
    Generation(GenerationReply),
    Feedback(FeedbackReply),
}

/// Owns a [`QuizSession`] and turns user events into session operations.
///
/// Generator requests run on spawned tokio tasks, so `handle` must be called from
/// within a runtime. Their replies come back over a channel and are applied, in
/// arrival order, by whoever drives [`QuizController::next_reply`] and
/// [`QuizController::apply`]. The session discards replies that were superseded.
pub struct QuizController {
    session: QuizSession,
    service: Arc<QuizSessionService>,
    replies_tx: mpsc::UnboundedSender<ControllerReply>,
    replies_rx: mpsc::UnboundedReceiver<ControllerReply>,
    in_flight: usize,
}

impl QuizController {
    #[must_use]
    pub fn new(service: Arc<QuizSessionService>) -> Self {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            session: QuizSession::new(),
            service,
            replies_tx,
            replies_rx,
            in_flight: 0,
        }
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Requests spawned whose replies have not been applied yet, stale ones included.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn handle(&mut self, event: QuizEvent) {
        debug!(event = event.name(), phase = ?self.session.phase(), "quiz event");
        match event {
            QuizEvent::SelectTopic(topic) => {
                if let Some(ticket) = self.session.select_topic(topic) {
                    self.spawn_generation(ticket);
                }
            }
            QuizEvent::Answer { question, option } => {
                self.session.answer(&question, option);
            }
            QuizEvent::AnswerCurrent(option) => {
                self.session.answer_current(option);
            }
            QuizEvent::Next => self.session.next(),
            QuizEvent::Prev => self.session.prev(),
            QuizEvent::JumpTo(index) => self.session.jump_to(index),
            QuizEvent::NewQuestions => {
                if let Some(ticket) = self.session.regenerate() {
                    self.spawn_generation(ticket);
                }
            }
            QuizEvent::StartOver => self.session.reset(),
            QuizEvent::GetFeedback => {
                if let Some(ticket) = self.session.request_feedback() {
                    self.spawn_feedback(ticket);
                }
            }
        }
    }

    /// Wait for the next finished request. Pending forever when nothing is in flight.
    pub async fn next_reply(&mut self) -> Option<ControllerReply> {
        self.replies_rx.recv().await
    }

    pub fn apply(&mut self, reply: ControllerReply) -> ReplyOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        match reply {
            ControllerReply::Generation(reply) => self.session.apply_generation(reply),
            ControllerReply::Feedback(reply) => self.session.apply_feedback(reply),
        }
    }

    /// Apply replies until no request is in flight.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            let Some(reply) = self.next_reply().await else {
                break;
            };
            self.apply(reply);
        }
    }

    fn spawn_generation(&mut self, ticket: GenerationTicket) {
        let service = Arc::clone(&self.service);
        let replies = self.replies_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let reply = service.fulfill_generation(ticket).await;
            let _ = replies.send(ControllerReply::Generation(reply));
        });
    }

    fn spawn_feedback(&mut self, ticket: FeedbackTicket) {
        let service = Arc::clone(&self.service);
        let replies = self.replies_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let reply = service.fulfill_feedback(ticket).await;
            let _ = replies.send(ControllerReply::Feedback(reply));
        });
    }
}
