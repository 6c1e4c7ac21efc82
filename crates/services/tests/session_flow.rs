use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{Question, QuestionId, QuestionSet, Topic};
use quiz_core::time::fixed_now;
use services::{
    FEEDBACK_FALLBACK, GeneratorError, QuizGenerator, QuizSession, QuizSessionService,
    ReplyOutcome, SessionPhase,
};

/// Replays queued outcomes in call order.
#[derive(Default)]
struct ScriptedGenerator {
    quizzes: Mutex<VecDeque<Result<QuestionSet, GeneratorError>>>,
    feedback: Mutex<VecDeque<Result<String, GeneratorError>>>,
}

impl ScriptedGenerator {
    fn with_quizzes(quizzes: Vec<Result<QuestionSet, GeneratorError>>) -> Self {
        Self {
            quizzes: Mutex::new(quizzes.into()),
            feedback: Mutex::default(),
        }
    }

    fn push_feedback(&self, result: Result<String, GeneratorError>) {
        self.feedback.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl QuizGenerator for ScriptedGenerator {
    async fn generate_question_set(&self, _topic: &Topic) -> Result<QuestionSet, GeneratorError> {
        self.quizzes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GeneratorError::EmptyResponse))
    }

    async fn generate_feedback(&self, _topic: &Topic, _score: u32) -> Result<String, GeneratorError> {
        self.feedback
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GeneratorError::EmptyResponse))
    }
}

/// Never answers.
struct SilentGenerator;

#[async_trait]
impl QuizGenerator for SilentGenerator {
    async fn generate_question_set(&self, _topic: &Topic) -> Result<QuestionSet, GeneratorError> {
        std::future::pending().await
    }

    async fn generate_feedback(&self, _topic: &Topic, _score: u32) -> Result<String, GeneratorError> {
        std::future::pending().await
    }
}

fn fitness() -> Topic {
    Topic::new("Fitness").unwrap()
}

fn fitness_set(label: &str) -> QuestionSet {
    let correct = [0_usize, 1, 2, 3, 1];
    let questions = correct
        .iter()
        .enumerate()
        .map(|(i, &correct_index)| {
            Question::new(
                QuestionId::new(format!("{label}-{i}")),
                format!("{label} question {}", i + 1),
                vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_index,
            )
            .unwrap()
        })
        .collect();
    QuestionSet::new(fitness(), questions, fixed_now()).unwrap()
}

fn transport_failure() -> GeneratorError {
    GeneratorError::HttpStatus {
        status: reqwest::StatusCode::BAD_GATEWAY,
        body: "upstream down".into(),
    }
}

fn answer_all(session: &mut QuizSession, pick: impl Fn(&Question) -> usize) {
    let set = session.question_set().unwrap().clone();
    for question in set.questions() {
        session.answer(question.id(), pick(question));
    }
}

#[tokio::test]
async fn fitness_all_correct_scores_five() {
    let generator = Arc::new(ScriptedGenerator::with_quizzes(vec![Ok(fitness_set("a"))]));
    let svc = QuizSessionService::new(generator);
    let mut session = QuizSession::new();

    let phase = svc.start(&mut session, fitness()).await;
    assert_eq!(phase, SessionPhase::Ready);
    assert_eq!(session.current_index(), 0);
    assert!(session.answers().unwrap().is_empty());

    answer_all(&mut session, Question::correct_index);
    assert!(session.is_completed());
    assert_eq!(session.score(), Some(5));
}

#[tokio::test]
async fn fitness_all_wrong_scores_zero() {
    let generator = Arc::new(ScriptedGenerator::with_quizzes(vec![Ok(fitness_set("a"))]));
    let svc = QuizSessionService::new(generator);
    let mut session = QuizSession::new();
    svc.start(&mut session, fitness()).await;

    answer_all(&mut session, |q| (q.correct_index() + 1) % q.options().len());
    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(session.score(), Some(0));
}

#[tokio::test]
async fn transport_error_fails_then_regenerate_recovers() {
    let generator = Arc::new(ScriptedGenerator::with_quizzes(vec![
        Err(transport_failure()),
        Ok(fitness_set("b")),
    ]));
    let svc = QuizSessionService::new(generator);
    let mut session = QuizSession::new();

    let phase = svc.start(&mut session, fitness()).await;
    assert_eq!(phase, SessionPhase::Failed);
    assert!(!session.error().unwrap().is_empty());
    assert_eq!(session.topic(), Some(&fitness()));

    let phase = svc.regenerate(&mut session).await;
    assert_eq!(phase, SessionPhase::Ready);
    assert!(session.error().is_none());
}

#[tokio::test]
async fn regenerate_clears_progress() {
    let generator = Arc::new(ScriptedGenerator::with_quizzes(vec![
        Ok(fitness_set("first")),
        Ok(fitness_set("second")),
    ]));
    let svc = QuizSessionService::new(generator);
    let mut session = QuizSession::new();
    svc.start(&mut session, fitness()).await;

    session.answer_current(0);
    session.next();
    session.next();
    assert_eq!(session.current_index(), 2);

    svc.regenerate(&mut session).await;
    assert_eq!(session.current_index(), 0);
    assert!(session.answers().unwrap().is_empty());
    assert_eq!(
        session.current_question().unwrap().prompt(),
        "second question 1"
    );
}

#[tokio::test]
async fn second_regenerate_wins_in_either_arrival_order() {
    for second_arrives_first in [false, true] {
        let generator = Arc::new(ScriptedGenerator::with_quizzes(vec![
            Ok(fitness_set("initial")),
            Ok(fitness_set("older")),
            Ok(fitness_set("newer")),
        ]));
        let svc = QuizSessionService::new(generator);
        let mut session = QuizSession::new();
        svc.start(&mut session, fitness()).await;

        let older = session.regenerate().unwrap();
        let newer = session.regenerate().unwrap();
        let (older_reply, newer_reply) =
            tokio::join!(svc.fulfill_generation(older), svc.fulfill_generation(newer));

        if second_arrives_first {
            assert_eq!(session.apply_generation(newer_reply), ReplyOutcome::Applied);
            assert_eq!(session.apply_generation(older_reply), ReplyOutcome::Stale);
        } else {
            assert_eq!(session.apply_generation(older_reply), ReplyOutcome::Stale);
            assert_eq!(session.phase(), SessionPhase::Fetching);
            assert_eq!(session.apply_generation(newer_reply), ReplyOutcome::Applied);
        }

        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(
            session.current_question().unwrap().prompt(),
            "newer question 1"
        );
    }
}

#[tokio::test]
async fn feedback_failure_keeps_score_and_uses_fallback() {
    let generator = Arc::new(ScriptedGenerator::with_quizzes(vec![Ok(fitness_set("a"))]));
    generator.push_feedback(Err(transport_failure()));
    let svc = QuizSessionService::new(Arc::clone(&generator) as Arc<dyn QuizGenerator>);
    let mut session = QuizSession::new();
    svc.start(&mut session, fitness()).await;
    answer_all(&mut session, Question::correct_index);

    let outcome = svc.request_feedback(&mut session).await;
    assert_eq!(outcome, ReplyOutcome::Applied);
    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(session.score(), Some(5));

    let shown = session.feedback().unwrap().shown().unwrap();
    assert_eq!(shown.message, FEEDBACK_FALLBACK);
    assert!(shown.is_fallback);
}

#[tokio::test]
async fn feedback_success_is_shown() {
    let generator = Arc::new(ScriptedGenerator::with_quizzes(vec![Ok(fitness_set("a"))]));
    generator.push_feedback(Ok("Strong work on form and recovery.".into()));
    let svc = QuizSessionService::new(Arc::clone(&generator) as Arc<dyn QuizGenerator>);
    let mut session = QuizSession::new();
    svc.start(&mut session, fitness()).await;
    answer_all(&mut session, Question::correct_index);

    svc.request_feedback(&mut session).await;
    let shown = session.feedback().unwrap().shown().unwrap();
    assert_eq!(shown.message, "Strong work on form and recovery.");
    assert!(!shown.is_fallback);
}

#[tokio::test]
async fn hung_generator_times_out_into_failed() {
    let svc = QuizSessionService::new(Arc::new(SilentGenerator))
        .with_total_timeout(Duration::from_millis(20));
    let mut session = QuizSession::new();

    let phase = svc.start(&mut session, fitness()).await;
    assert_eq!(phase, SessionPhase::Failed);
    assert!(
        session
            .error()
            .unwrap()
            .ends_with("generator did not answer within 20ms")
    );
}
