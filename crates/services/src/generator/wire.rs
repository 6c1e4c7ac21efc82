use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use quiz_core::model::{
    EXPECTED_QUESTION_COUNT, Question, QuestionId, QuestionSet, QuestionSetError, Topic,
};

use crate::error::GeneratorError;

//
// ─── REQUESTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct QuizRequest<'a> {
    pub topic: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeedbackRequest<'a> {
    pub topic: &'a str,
    pub score: u32,
}

//
// ─── RESPONSES ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct QuizPayload {
    #[serde(default)]
    topic: Option<String>,
    questions: Vec<QuestionPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionPayload {
    #[serde(default)]
    id: Option<WireId>,
    #[serde(alias = "prompt")]
    question: String,
    options: Vec<String>,
    correct_index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    fn into_id(self) -> QuestionId {
        match self {
            Self::Number(n) => QuestionId::from(n),
            Self::Text(s) => QuestionId::new(s.trim()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedbackPayload {
    message: String,
}

/// Parse and validate a generator quiz response.
///
/// The returned set always carries `requested`, whatever topic the service echoed.
/// Questions without an id get their 1-based position. A count other than
/// [`EXPECTED_QUESTION_COUNT`] is logged and accepted.
///
/// # Errors
///
/// Returns `GeneratorError::Json` for undecodable bodies and
/// `GeneratorError::Invalid` when the questions break the model invariants.
pub fn parse_question_set(
    body: &str,
    requested: &Topic,
    generated_at: DateTime<Utc>,
) -> Result<QuestionSet, GeneratorError> {
    let payload: QuizPayload = serde_json::from_str(body)?;

    if let Some(echoed) = payload.topic.as_deref() {
        if !echoed.trim().eq_ignore_ascii_case(requested.as_str()) {
            debug!(requested = %requested, echoed, "generator echoed a different topic");
        }
    }

    let questions = payload
        .questions
        .into_iter()
        .enumerate()
        .map(|(index, q)| {
            let id = q
                .id
                .map_or_else(|| QuestionId::from(index as u64 + 1), WireId::into_id);
            Question::new(id, q.question, q.options, q.correct_index)
                .map_err(|source| QuestionSetError::InvalidQuestion { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let set = QuestionSet::new(requested.clone(), questions, generated_at)?;
    if !set.has_expected_count() {
        warn!(
            topic = %requested,
            expected = EXPECTED_QUESTION_COUNT,
            got = set.len(),
            "generator returned an unexpected number of questions"
        );
    }
    Ok(set)
}

/// Parse a feedback response into its trimmed message.
///
/// # Errors
///
/// Returns `GeneratorError::Json` for undecodable bodies and
/// `GeneratorError::EmptyResponse` for a blank message.
pub fn parse_feedback(body: &str) -> Result<String, GeneratorError> {
    let payload: FeedbackPayload = serde_json::from_str(body)?;
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }
    Ok(message.to_string())
}

/// Pull the JSON object out of model output that may be wrapped in a code fence
/// or surrounded by prose.
#[must_use]
pub fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn topic() -> Topic {
        Topic::new("Fitness").unwrap()
    }

    const FIVE: &str = r#"{
        "topic": "Fitness",
        "questions": [
            {"id": 1, "question": "Q1", "options": ["a","b","c","d"], "correctIndex": 0},
            {"id": 2, "question": "Q2", "options": ["a","b","c","d"], "correctIndex": 1},
            {"id": 3, "question": "Q3", "options": ["a","b","c","d"], "correctIndex": 2},
            {"id": 4, "question": "Q4", "options": ["a","b","c","d"], "correctIndex": 3},
            {"id": 5, "question": "Q5", "options": ["a","b","c","d"], "correctIndex": 0}
        ]
    }"#;

    #[test]
    fn parses_well_formed_quiz() {
        let set = parse_question_set(FIVE, &topic(), fixed_now()).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.topic(), &topic());
        assert_eq!(set.get(1).unwrap().correct_index(), 1);
        assert_eq!(set.generated_at(), fixed_now());
    }

    #[test]
    fn accepts_text_ids_missing_ids_and_other_counts() {
        let body = r#"{"questions": [
            {"id": "alpha", "question": "Q1", "options": ["a","b"], "correctIndex": 1},
            {"prompt": "Q2", "options": ["a","b"], "correctIndex": 0}
        ]}"#;
        let set = parse_question_set(body, &topic(), fixed_now()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().id(), &QuestionId::new("alpha"));
        assert_eq!(set.get(1).unwrap().id(), &QuestionId::from(2));
    }

    #[test]
    fn empty_question_list_is_invalid() {
        let err = parse_question_set(r#"{"questions": []}"#, &topic(), fixed_now()).unwrap_err();
        assert!(matches!(err, GeneratorError::Invalid(QuestionSetError::Empty)));
    }

    #[test]
    fn out_of_range_answer_is_invalid() {
        let body = r#"{"questions": [
            {"id": 1, "question": "Q1", "options": ["a","b"], "correctIndex": 2}
        ]}"#;
        let err = parse_question_set(body, &topic(), fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::Invalid(QuestionSetError::InvalidQuestion { index: 0, .. })
        ));
    }

    #[test]
    fn missing_fields_are_json_errors() {
        let err = parse_question_set(r#"{"topic": "x"}"#, &topic(), fixed_now()).unwrap_err();
        assert!(matches!(err, GeneratorError::Json(_)));
    }

    #[test]
    fn feedback_message_is_trimmed_and_required() {
        assert_eq!(parse_feedback(r#"{"message": " Nice! "}"#).unwrap(), "Nice!");
        assert!(matches!(
            parse_feedback(r#"{"message": "  "}"#),
            Err(GeneratorError::EmptyResponse)
        ));
    }

    #[test]
    fn extracts_json_from_fenced_output() {
        let content = "```json\n{\"message\": \"hi\"}\n```";
        assert_eq!(extract_json(content), "{\"message\": \"hi\"}");
        assert_eq!(extract_json("no json"), "no json");
    }
}
