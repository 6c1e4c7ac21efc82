use quiz_core::scoring::OptionMark;
use services::{QuizSession, SessionPhase};

use crate::vm::time_fmt::format_datetime;

pub const SELECT_ANSWER_HINT: &str = "Please select an answer to continue";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub letter: char,
    pub text: String,
    pub mark: OptionMark,
}

/// One entry in the row of question markers; selecting it jumps to that question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuestionDotVm {
    /// 1-based.
    pub number: usize,
    pub answered: bool,
    pub current: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionCardVm {
    pub topic: String,
    pub position_label: String,
    pub answered_label: String,
    pub progress_percent: u8,
    pub generated_at_str: String,

    pub prompt: String,
    pub options: Vec<OptionVm>,
    pub hint: Option<&'static str>,
    /// Empty once the quiz is completed.
    pub dots: Vec<QuestionDotVm>,

    pub can_prev: bool,
    pub can_next: bool,
}

/// What the screen should show for the session as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusVm {
    ChooseTopic,
    Loading { message: String },
    Failed { message: String },
    Quiz,
    Results,
}

#[must_use]
pub fn map_status(session: &QuizSession) -> StatusVm {
    match session.phase() {
        SessionPhase::Idle => StatusVm::ChooseTopic,
        SessionPhase::Fetching => StatusVm::Loading {
            message: session.topic().map_or_else(
                || "Generating quiz...".to_string(),
                |topic| format!("Generating your {topic} quiz..."),
            ),
        },
        SessionPhase::Failed => StatusVm::Failed {
            message: session
                .error()
                .unwrap_or("Failed to generate quiz")
                .to_string(),
        },
        SessionPhase::Ready => StatusVm::Quiz,
        SessionPhase::Completed => StatusVm::Results,
    }
}

/// The current question, or `None` when no question set is loaded.
#[must_use]
pub fn map_question_card(session: &QuizSession) -> Option<QuestionCardVm> {
    let set = session.question_set()?;
    let question = session.current_question()?;
    let progress = session.progress()?;
    let answered = session
        .answers()
        .is_some_and(|answers| answers.is_answered(question.id()));

    let options = question
        .options()
        .iter()
        .zip(session.current_option_marks())
        .enumerate()
        .map(|(i, (text, mark))| OptionVm {
            letter: option_letter(i),
            text: text.clone(),
            mark,
        })
        .collect();

    let completed = session.is_completed();
    let dots = if completed {
        Vec::new()
    } else {
        set.questions()
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionDotVm {
                number: i + 1,
                answered: session
                    .answers()
                    .is_some_and(|answers| answers.is_answered(q.id())),
                current: i == session.current_index(),
            })
            .collect()
    };

    let hint = if answered || completed {
        None
    } else {
        Some(SELECT_ANSWER_HINT)
    };

    Some(QuestionCardVm {
        topic: set.topic().to_string(),
        position_label: format!("Question {} of {}", progress.position, progress.total),
        answered_label: format!("{} of {} answered", progress.answered, progress.total),
        progress_percent: progress.percent,
        generated_at_str: format_datetime(set.generated_at()),
        prompt: question.prompt().to_string(),
        options,
        hint,
        dots,
        can_prev: progress.position > 1,
        can_next: progress.position < progress.total,
    })
}

/// `0 -> 'A'`, `1 -> 'B'`, ...; `'?'` past `'Z'`.
#[must_use]
pub fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or('?', |i| char::from(b'A' + i))
}

/// Inverse of [`option_letter`], case-insensitive.
#[must_use]
pub fn parse_option_letter(input: &str) -> Option<usize> {
    let mut chars = input.trim().chars();
    let letter = chars.next()?;
    if chars.next().is_some() || !letter.is_ascii_alphabetic() {
        return None;
    }
    Some(usize::from(letter.to_ascii_lowercase() as u8 - b'a'))
}
