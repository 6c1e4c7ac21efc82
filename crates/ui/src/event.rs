use quiz_core::model::{QuestionId, Topic};

/// Something the user did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizEvent {
    SelectTopic(Topic),
    /// Option click on a specific question.
    Answer {
        question: QuestionId,
        option: usize,
    },
    /// Option click on the question currently shown.
    AnswerCurrent(usize),
    Next,
    Prev,
    JumpTo(usize),
    /// "New Questions": regenerate for the same topic.
    NewQuestions,
    /// "Change Topic" / "Start Over".
    StartOver,
    /// "Get AI Feedback", honored only once the quiz is completed.
    GetFeedback,
}

impl QuizEvent {
    /// Short name for log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectTopic(_) => "select_topic",
            Self::Answer { .. } => "answer",
            Self::AnswerCurrent(_) => "answer_current",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::JumpTo(_) => "jump_to",
            Self::NewQuestions => "new_questions",
            Self::StartOver => "start_over",
            Self::GetFeedback => "get_feedback",
        }
    }
}
