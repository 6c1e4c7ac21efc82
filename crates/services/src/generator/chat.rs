use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quiz_core::Clock;
use quiz_core::model::{EXPECTED_QUESTION_COUNT, QuestionSet, Topic};

use super::retry::RetryPolicy;
use super::wire::{extract_json, parse_question_set};
use super::QuizGenerator;
use crate::error::GeneratorError;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";

const QUIZ_SYSTEM_PROMPT: &str = "You write multiple-choice quizzes. Reply with a single JSON \
object and nothing else, shaped as {\"topic\": string, \"questions\": [{\"id\": number, \
\"question\": string, \"options\": [string, string, string, string], \"correctIndex\": number}]}. \
correctIndex is the 0-based index of the right option.";

const FEEDBACK_SYSTEM_PROMPT: &str = "You are an encouraging tutor. Reply with two or three \
sentences of plain text and no markdown.";

#[derive(Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl ChatConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
        }
    }
}

/// Generator that prompts an OpenAI-compatible chat completions endpoint directly.
#[derive(Clone)]
pub struct ChatGenerator {
    client: Client,
    config: ChatConfig,
    retry: RetryPolicy,
    clock: Clock,
}

impl ChatGenerator {
    /// # Errors
    ///
    /// Returns `GeneratorError::Http` if the HTTP client cannot be built.
    pub fn new(config: ChatConfig, request_timeout: Duration) -> Result<Self, GeneratorError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            config,
            retry: RetryPolicy::default(),
            clock: Clock::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn complete(
        &self,
        label: &str,
        system: &str,
        user: String,
        json_mode: bool,
    ) -> Result<String, GeneratorError> {
        if self.config.api_key.trim().is_empty() {
            return Err(GeneratorError::Disabled);
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.7,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let body: ChatResponse = self
            .retry
            .run(label, || async {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.config.api_key)
                    .json(&payload)
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(GeneratorError::HttpStatus { status, body });
                }
                let text = response.text().await?;
                Ok(serde_json::from_str::<ChatResponse>(&text)?)
            })
            .await?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GeneratorError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl QuizGenerator for ChatGenerator {
    async fn generate_question_set(&self, topic: &Topic) -> Result<QuestionSet, GeneratorError> {
        debug!(%topic, model = %self.config.model, "prompting for quiz");
        let prompt = format!(
            "Create {EXPECTED_QUESTION_COUNT} multiple-choice questions about \"{topic}\", \
             each with four options and exactly one correct answer."
        );
        let content = self.complete("quiz", QUIZ_SYSTEM_PROMPT, prompt, true).await?;
        let set = parse_question_set(extract_json(&content), topic, self.clock.now())?;
        info!(%topic, questions = set.len(), "quiz generated");
        Ok(set)
    }

    async fn generate_feedback(&self, topic: &Topic, score: u32) -> Result<String, GeneratorError> {
        debug!(%topic, score, "prompting for feedback");
        let prompt = format!(
            "I just took a quiz about \"{topic}\" and answered {score} out of \
             {EXPECTED_QUESTION_COUNT} questions correctly. Give me feedback and one tip to improve."
        );
        self.complete("feedback", FEEDBACK_SYSTEM_PROMPT, prompt, false)
            .await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_api_key_is_disabled() {
        let generator = ChatGenerator::new(ChatConfig::new("  "), Duration::from_secs(1)).unwrap();
        let topic = Topic::new("Nutrition").unwrap();

        let err = generator.generate_feedback(&topic, 3).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Disabled));
    }

    #[test]
    fn json_mode_is_serialized_only_when_requested() {
        let request = ChatRequest {
            model: DEFAULT_MODEL.into(),
            messages: Vec::new(),
            temperature: 0.7,
            response_format: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let rendered = format!("{:?}", ChatConfig::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
