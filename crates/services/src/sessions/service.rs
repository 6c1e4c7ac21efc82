use std::fmt;

use tracing::{debug, info, warn};

use quiz_core::model::{AnswerLedger, Question, QuestionId, QuestionSet, Topic};
use quiz_core::scoring::{self, Evaluation, OptionMark, Progress};

use crate::error::GeneratorError;
use crate::generator::FEEDBACK_FALLBACK;
use super::state::{
    Feedback, FeedbackReply, FeedbackState, FeedbackTicket, GenerationReply, GenerationTicket,
    ReplyOutcome, RequestToken, SessionPhase,
};

//
// ─── STAGES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
enum Stage {
    Idle,
    Fetching { topic: Topic, token: RequestToken },
    Failed { topic: Topic, message: String },
    Loaded(LoadedQuiz),
}

#[derive(Debug)]
struct LoadedQuiz {
    set: QuestionSet,
    answers: AnswerLedger,
    current_index: usize,
    feedback: FeedbackState,
}

impl LoadedQuiz {
    fn new(set: QuestionSet) -> Self {
        Self {
            set,
            answers: AnswerLedger::new(),
            current_index: 0,
            feedback: FeedbackState::NotRequested,
        }
    }

    fn completed(&self) -> bool {
        scoring::is_completed(&self.set, &self.answers)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's quiz session.
///
/// The session owns all quiz state and is the only thing that mutates it. Operations
/// that need the generator return a ticket instead of doing I/O; the caller fulfills
/// the ticket and hands the reply back through `apply_generation` / `apply_feedback`.
/// Operations that do not apply in the current phase are silent no-ops.
pub struct QuizSession {
    stage: Stage,
    last_token: Option<RequestToken>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            last_token: None,
        }
    }

    fn issue_token(&mut self) -> RequestToken {
        let token = self
            .last_token
            .map_or_else(RequestToken::first, RequestToken::next);
        self.last_token = Some(token);
        token
    }

    fn loaded(&self) -> Option<&LoadedQuiz> {
        match &self.stage {
            Stage::Loaded(quiz) => Some(quiz),
            _ => None,
        }
    }

    fn loaded_mut(&mut self) -> Option<&mut LoadedQuiz> {
        match &mut self.stage {
            Stage::Loaded(quiz) => Some(quiz),
            _ => None,
        }
    }

    // ─── Derived views ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match &self.stage {
            Stage::Idle => SessionPhase::Idle,
            Stage::Fetching { .. } => SessionPhase::Fetching,
            Stage::Failed { .. } => SessionPhase::Failed,
            Stage::Loaded(quiz) if quiz.completed() => SessionPhase::Completed,
            Stage::Loaded(_) => SessionPhase::Ready,
        }
    }

    #[must_use]
    pub fn topic(&self) -> Option<&Topic> {
        match &self.stage {
            Stage::Idle => None,
            Stage::Fetching { topic, .. } | Stage::Failed { topic, .. } => Some(topic),
            Stage::Loaded(quiz) => Some(quiz.set.topic()),
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.stage, Stage::Fetching { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.stage {
            Stage::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn question_set(&self) -> Option<&QuestionSet> {
        self.loaded().map(|quiz| &quiz.set)
    }

    #[must_use]
    pub fn answers(&self) -> Option<&AnswerLedger> {
        self.loaded().map(|quiz| &quiz.answers)
    }

    /// Index of the question on screen; 0 when no set is loaded.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.loaded().map_or(0, |quiz| quiz.current_index)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.loaded()
            .and_then(|quiz| quiz.set.get(quiz.current_index))
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.loaded().is_some_and(LoadedQuiz::completed)
    }

    /// Final score; `None` until every question is answered.
    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.loaded()
            .and_then(|quiz| scoring::score(&quiz.set, &quiz.answers))
    }

    #[must_use]
    pub fn evaluation(&self) -> Option<Evaluation> {
        self.loaded()
            .map(|quiz| scoring::evaluate(&quiz.set, &quiz.answers))
    }

    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        self.loaded()
            .map(|quiz| Progress::new(&quiz.set, &quiz.answers, quiz.current_index))
    }

    /// Marks for the options of the current question.
    #[must_use]
    pub fn current_option_marks(&self) -> Vec<OptionMark> {
        let Some(quiz) = self.loaded() else {
            return Vec::new();
        };
        let completed = quiz.completed();
        quiz.set
            .get(quiz.current_index)
            .map(|question| scoring::option_marks(question, &quiz.answers, completed))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&FeedbackState> {
        self.loaded().map(|quiz| &quiz.feedback)
    }

    // ─── Generation ────────────────────────────────────────────────────────────

    /// Choose a topic and start fetching its questions. Only valid while idle.
    pub fn select_topic(&mut self, topic: Topic) -> Option<GenerationTicket> {
        if !matches!(self.stage, Stage::Idle) {
            debug!(%topic, phase = ?self.phase(), "topic selection ignored");
            return None;
        }
        let token = self.issue_token();
        info!(%topic, token = token.value(), "topic selected");
        self.stage = Stage::Fetching {
            topic: topic.clone(),
            token,
        };
        Some(GenerationTicket { token, topic })
    }

    /// Drop the current questions, answers and feedback and fetch a fresh set for the
    /// same topic. Any request still in flight is superseded.
    pub fn regenerate(&mut self) -> Option<GenerationTicket> {
        let topic = self.topic()?.clone();
        let token = self.issue_token();
        info!(%topic, token = token.value(), from = ?self.phase(), "regenerating quiz");
        self.stage = Stage::Fetching {
            topic: topic.clone(),
            token,
        };
        Some(GenerationTicket { token, topic })
    }

    /// Apply the outcome of a generation request.
    pub fn apply_generation(&mut self, reply: GenerationReply) -> ReplyOutcome {
        let topic = match &self.stage {
            Stage::Fetching { topic, token } if *token == reply.token => topic.clone(),
            _ => {
                debug!(token = reply.token.value(), "discarding stale quiz reply");
                return ReplyOutcome::Stale;
            }
        };

        self.stage = match reply.result {
            Ok(set) => {
                info!(%topic, questions = set.len(), "quiz ready");
                Stage::Loaded(LoadedQuiz::new(set))
            }
            Err(err) => {
                warn!(%topic, kind = ?err.kind(), error = %err, "quiz generation failed");
                Stage::Failed {
                    topic,
                    message: generation_message(&err),
                }
            }
        };
        ReplyOutcome::Applied
    }

    // ─── Answering & navigation ────────────────────────────────────────────────

    /// Record an answer. Ignored unless a set is loaded and not yet completed, and for
    /// unknown questions or out-of-range options. Returns whether the ledger changed.
    pub fn answer(&mut self, question_id: &QuestionId, option: usize) -> bool {
        let Some(quiz) = self.loaded_mut() else {
            return false;
        };
        if quiz.completed() {
            return false;
        }
        let recorded = quiz.answers.record(&quiz.set, question_id, option);
        if recorded && quiz.completed() {
            info!(topic = %quiz.set.topic(), "quiz completed");
        }
        recorded
    }

    /// Answer the question currently on screen.
    pub fn answer_current(&mut self, option: usize) -> bool {
        let Some(id) = self.current_question().map(|q| q.id().clone()) else {
            return false;
        };
        self.answer(&id, option)
    }

    pub fn next(&mut self) {
        if let Some(quiz) = self.loaded_mut() {
            quiz.current_index = (quiz.current_index + 1).min(quiz.set.last_index());
        }
    }

    pub fn prev(&mut self) {
        if let Some(quiz) = self.loaded_mut() {
            quiz.current_index = quiz.current_index.saturating_sub(1);
        }
    }

    /// Jump to a question, clamped to the set.
    pub fn jump_to(&mut self, index: usize) {
        if let Some(quiz) = self.loaded_mut() {
            quiz.current_index = index.min(quiz.set.last_index());
        }
    }

    /// Forget everything and return to topic selection.
    pub fn reset(&mut self) {
        if !matches!(self.stage, Stage::Idle) {
            info!(from = ?self.phase(), "session reset");
        }
        self.stage = Stage::Idle;
    }

    // ─── Feedback ──────────────────────────────────────────────────────────────

    /// Ask for narrative feedback on the final score. Only valid once completed and
    /// while no feedback request is pending.
    pub fn request_feedback(&mut self) -> Option<FeedbackTicket> {
        let quiz = self.loaded()?;
        if quiz.feedback.is_pending() {
            return None;
        }
        let score = scoring::score(&quiz.set, &quiz.answers)?;
        let topic = quiz.set.topic().clone();

        let token = self.issue_token();
        let quiz = self.loaded_mut()?;
        quiz.feedback = FeedbackState::Pending { token };
        debug!(%topic, score, token = token.value(), "feedback requested");
        Some(FeedbackTicket {
            token,
            topic,
            score,
        })
    }

    /// Apply a feedback reply. Failures show the fallback text and never touch the score.
    pub fn apply_feedback(&mut self, reply: FeedbackReply) -> ReplyOutcome {
        let Some(quiz) = self.loaded_mut() else {
            debug!(token = reply.token.value(), "discarding stale feedback reply");
            return ReplyOutcome::Stale;
        };
        if quiz.feedback != (FeedbackState::Pending { token: reply.token }) {
            debug!(token = reply.token.value(), "discarding stale feedback reply");
            return ReplyOutcome::Stale;
        }

        let feedback = match reply.result {
            Ok(message) if !message.trim().is_empty() => Feedback {
                message: message.trim().to_string(),
                is_fallback: false,
            },
            Ok(_) => {
                warn!("feedback was empty, showing fallback");
                fallback_feedback()
            }
            Err(err) => {
                warn!(error = %err, "feedback generation failed, showing fallback");
                fallback_feedback()
            }
        };
        quiz.feedback = FeedbackState::Shown(feedback);
        ReplyOutcome::Applied
    }
}

fn fallback_feedback() -> Feedback {
    Feedback {
        message: FEEDBACK_FALLBACK.to_string(),
        is_fallback: true,
    }
}

fn generation_message(err: &GeneratorError) -> String {
    format!("Failed to generate quiz: {err}")
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase())
            .field("topic", &self.topic())
            .field("current_index", &self.current_index())
            .field("answered", &self.answers().map_or(0, AnswerLedger::len))
            .field("last_token", &self.last_token)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn topic() -> Topic {
        Topic::new("Fitness").unwrap()
    }

    fn build_set(len: u64) -> QuestionSet {
        let questions = (1..=len)
            .map(|id| {
                Question::new(
                    QuestionId::from(id),
                    format!("Q{id}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    usize::try_from(id % 3).unwrap(),
                )
                .unwrap()
            })
            .collect();
        QuestionSet::new(topic(), questions, fixed_now()).unwrap()
    }

    fn ready_session(len: u64) -> QuizSession {
        let mut session = QuizSession::new();
        let ticket = session.select_topic(topic()).unwrap();
        let outcome = session.apply_generation(GenerationReply {
            token: ticket.token,
            result: Ok(build_set(len)),
        });
        assert_eq!(outcome, ReplyOutcome::Applied);
        session
    }

    fn answer_all_correct(session: &mut QuizSession) {
        let set = session.question_set().unwrap().clone();
        for q in set.questions() {
            assert!(session.answer(q.id(), q.correct_index()));
        }
    }

    #[test]
    fn select_topic_enters_fetching() {
        let mut session = QuizSession::new();
        assert_eq!(session.phase(), SessionPhase::Idle);

        let ticket = session.select_topic(topic()).unwrap();
        assert_eq!(ticket.topic, topic());
        assert_eq!(session.phase(), SessionPhase::Fetching);
        assert!(session.is_loading());
        assert!(session.select_topic(topic()).is_none());
    }

    #[test]
    fn navigation_and_answers_ignored_while_fetching() {
        let mut session = QuizSession::new();
        session.select_topic(topic()).unwrap();

        session.next();
        session.prev();
        session.jump_to(3);
        assert!(!session.answer(&QuestionId::from(1), 0));
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.phase(), SessionPhase::Fetching);
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut session = ready_session(3);
        session.prev();
        assert_eq!(session.current_index(), 0);

        session.next();
        session.next();
        session.next();
        assert_eq!(session.current_index(), 2);

        session.jump_to(99);
        assert_eq!(session.current_index(), 2);
        session.jump_to(1);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn answers_freeze_after_completion() {
        let mut session = ready_session(2);
        answer_all_correct(&mut session);
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert_eq!(session.score(), Some(2));

        let first = session.question_set().unwrap().get(0).unwrap().id().clone();
        assert!(!session.answer(&first, 0));
        assert_eq!(session.score(), Some(2));
    }

    #[test]
    fn failure_keeps_topic_and_regenerate_recovers() {
        let mut session = QuizSession::new();
        let ticket = session.select_topic(topic()).unwrap();
        session.apply_generation(GenerationReply {
            token: ticket.token,
            result: Err(GeneratorError::EmptyResponse),
        });

        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.topic(), Some(&topic()));
        assert!(!session.error().unwrap().is_empty());

        let retry = session.regenerate().unwrap();
        assert_eq!(session.phase(), SessionPhase::Fetching);
        assert!(session.error().is_none());
        session.apply_generation(GenerationReply {
            token: retry.token,
            result: Ok(build_set(5)),
        });
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn reply_after_reset_is_stale() {
        let mut session = QuizSession::new();
        let ticket = session.select_topic(topic()).unwrap();
        session.reset();

        let outcome = session.apply_generation(GenerationReply {
            token: ticket.token,
            result: Ok(build_set(5)),
        });
        assert_eq!(outcome, ReplyOutcome::Stale);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.topic().is_none());
    }

    #[test]
    fn feedback_only_after_completion() {
        let mut session = ready_session(2);
        assert!(session.request_feedback().is_none());

        answer_all_correct(&mut session);
        let ticket = session.request_feedback().unwrap();
        assert_eq!(ticket.score, 2);
        assert!(session.request_feedback().is_none());
        assert!(session.feedback().unwrap().is_pending());
    }

    #[test]
    fn feedback_failure_shows_fallback() {
        let mut session = ready_session(2);
        answer_all_correct(&mut session);
        let ticket = session.request_feedback().unwrap();

        session.apply_feedback(FeedbackReply {
            token: ticket.token,
            result: Err(GeneratorError::EmptyResponse),
        });

        let shown = session.feedback().unwrap().shown().unwrap();
        assert!(shown.is_fallback);
        assert_eq!(shown.message, FEEDBACK_FALLBACK);
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert_eq!(session.score(), Some(2));
    }

    #[test]
    fn feedback_reply_after_regenerate_is_stale() {
        let mut session = ready_session(1);
        answer_all_correct(&mut session);
        let ticket = session.request_feedback().unwrap();
        session.regenerate().unwrap();

        let outcome = session.apply_feedback(FeedbackReply {
            token: ticket.token,
            result: Ok("Well done".into()),
        });
        assert_eq!(outcome, ReplyOutcome::Stale);
        assert!(session.feedback().is_none());
    }

    #[test]
    fn option_marks_follow_completion() {
        let mut session = ready_session(1);
        assert!(session.answer_current(0));

        let marks = session.current_option_marks();
        // Question 1 has correct index 1, so choosing 0 is wrong once completed.
        assert_eq!(
            marks,
            vec![OptionMark::Wrong, OptionMark::Correct, OptionMark::Neutral]
        );
    }
}
