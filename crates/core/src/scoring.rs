//! Completion and score, derived from a question set and its answer ledger.
//!
//! Nothing here is cached; callers recompute after every ledger change so the derived
//! values can never drift from the answers they describe.

use crate::model::{AnswerLedger, Question, QuestionSet};

//
// ─── COMPLETION & SCORE ────────────────────────────────────────────────────────
//

/// Number of questions in `set` that have an answer in `ledger`.
#[must_use]
pub fn answered_count(set: &QuestionSet, ledger: &AnswerLedger) -> usize {
    set.questions()
        .iter()
        .filter(|q| ledger.is_answered(q.id()))
        .count()
}

/// True once every question in the set has an answer.
#[must_use]
pub fn is_completed(set: &QuestionSet, ledger: &AnswerLedger) -> bool {
    ledger.len() == set.len() && answered_count(set, ledger) == set.len()
}

/// Number of correctly answered questions, or `None` while the quiz is incomplete.
#[must_use]
pub fn score(set: &QuestionSet, ledger: &AnswerLedger) -> Option<u32> {
    if !is_completed(set, ledger) {
        return None;
    }
    let correct = set
        .questions()
        .iter()
        .filter(|q| ledger.get(q.id()) == Some(q.correct_index()))
        .count();
    Some(u32::try_from(correct).unwrap_or(u32::MAX))
}

/// Snapshot of the derived values for one ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub completed: bool,
    pub score: Option<u32>,
    pub total: usize,
}

#[must_use]
pub fn evaluate(set: &QuestionSet, ledger: &AnswerLedger) -> Evaluation {
    let score = score(set, ledger);
    Evaluation {
        completed: score.is_some(),
        score,
        total: set.len(),
    }
}

//
// ─── OPTION MARKS ──────────────────────────────────────────────────────────────
//

/// How an option should be shown.
///
/// Before completion only the user's choice is highlighted. After completion the
/// correct option and the user's wrong choice are revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Unselected,
    Selected,
    Correct,
    Wrong,
    Neutral,
}

#[must_use]
pub fn option_mark(
    question: &Question,
    ledger: &AnswerLedger,
    completed: bool,
    option: usize,
) -> OptionMark {
    let chosen = ledger.get(question.id()) == Some(option);
    match (completed, chosen) {
        (true, _) if question.is_correct(option) => OptionMark::Correct,
        (true, true) => OptionMark::Wrong,
        (true, false) => OptionMark::Neutral,
        (false, true) => OptionMark::Selected,
        (false, false) => OptionMark::Unselected,
    }
}

#[must_use]
pub fn option_marks(question: &Question, ledger: &AnswerLedger, completed: bool) -> Vec<OptionMark> {
    (0..question.options().len())
        .map(|option| option_mark(question, ledger, completed, option))
        .collect()
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    /// Position through the set, rounded to a whole percent.
    pub percent: u8,
}

impl Progress {
    #[must_use]
    pub fn new(set: &QuestionSet, ledger: &AnswerLedger, current_index: usize) -> Self {
        let total = set.len();
        let position = current_index.min(set.last_index()) + 1;
        let answered = answered_count(set, ledger);
        let percent = (position * 100 + total / 2) / total.max(1);
        Self {
            position,
            total,
            answered,
            remaining: total.saturating_sub(answered),
            percent: u8::try_from(percent.min(100)).unwrap_or(100),
        }
    }
}

//
// ─── VERDICT ───────────────────────────────────────────────────────────────────
//

/// Headline for a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Perfect,
    Excellent,
    Passed,
    KeepPracticing,
}

impl Verdict {
    /// Perfect needs every answer right; Excellent needs 80%; Passed needs 60%.
    #[must_use]
    pub fn from_score(score: u32, total: usize) -> Self {
        let score = u64::from(score);
        let total = u64::try_from(total).unwrap_or(u64::MAX);
        if total > 0 && score >= total {
            Self::Perfect
        } else if score * 5 >= total * 4 {
            Self::Excellent
        } else if score * 5 >= total * 3 {
            Self::Passed
        } else {
            Self::KeepPracticing
        }
    }

    #[must_use]
    pub fn passed(self) -> bool {
        !matches!(self, Self::KeepPracticing)
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect Score!",
            Self::Excellent => "Excellent Work!",
            Self::Passed => "Good Job!",
            Self::KeepPracticing => "Keep Practicing!",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Perfect => "Outstanding! You got every question right!",
            Self::Excellent => "Great performance! You really know your stuff.",
            Self::Passed => "Nice work! You passed the quiz.",
            Self::KeepPracticing => "Don't give up! Review and try again.",
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
