use quiz_core::scoring::Verdict;
use services::{FeedbackState, QuizSession};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedbackVm {
    /// "Get AI Feedback" is enabled.
    Available,
    Loading,
    Shown { text: String, is_fallback: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsVm {
    pub topic: String,
    pub score: u32,
    pub total: usize,
    pub score_label: String,
    pub verdict: Verdict,
    pub title: &'static str,
    pub message: &'static str,
    pub passed: bool,
    pub feedback: FeedbackVm,
}

/// Results screen, available once every question is answered.
#[must_use]
pub fn map_results(session: &QuizSession) -> Option<ResultsVm> {
    let evaluation = session.evaluation()?;
    let score = evaluation.score?;
    let topic = session.topic()?.to_string();
    let verdict = Verdict::from_score(score, evaluation.total);

    let feedback = match session.feedback() {
        Some(FeedbackState::Pending { .. }) => FeedbackVm::Loading,
        Some(FeedbackState::Shown(feedback)) => FeedbackVm::Shown {
            text: feedback.message.clone(),
            is_fallback: feedback.is_fallback,
        },
        Some(FeedbackState::NotRequested) | None => FeedbackVm::Available,
    };

    Some(ResultsVm {
        topic,
        score,
        total: evaluation.total,
        score_label: format!("{score} / {}", evaluation.total),
        verdict,
        title: verdict.title(),
        message: verdict.message(),
        passed: verdict.passed(),
        feedback,
    })
}
