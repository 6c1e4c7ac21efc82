use std::collections::HashMap;

use crate::model::{QuestionId, QuestionSet};

/// The user's chosen option per question.
///
/// Entries are only written through [`AnswerLedger::record`], which checks the id and
/// option against the question set, so every stored index is valid for its question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    answers: HashMap<QuestionId, usize>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) the answer for a question.
    ///
    /// Returns `false` and leaves the ledger untouched when the question is not part of
    /// `set` or `option` is out of range for it.
    pub fn record(&mut self, set: &QuestionSet, question_id: &QuestionId, option: usize) -> bool {
        let Some(question) = set.find(question_id) else {
            return false;
        };
        if !question.has_option(option) {
            return false;
        }
        self.answers.insert(question_id.clone(), option);
        true
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<usize> {
        self.answers.get(question_id).copied()
    }

    #[must_use]
    pub fn is_answered(&self, question_id: &QuestionId) -> bool {
        self.answers.contains_key(question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, usize)> {
        self.answers.iter().map(|(id, option)| (id, *option))
    }
}
