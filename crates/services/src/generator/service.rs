use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use quiz_core::Clock;
use quiz_core::model::{QuestionSet, Topic};

use super::retry::RetryPolicy;
use super::wire::{FeedbackRequest, QuizRequest, parse_feedback, parse_question_set};
use super::QuizGenerator;
use crate::error::GeneratorError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL of the quiz service; `/quiz` and `/feedback` are appended.
    pub base_url: String,
}

impl ServiceConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// Generator backed by a quiz service speaking the plain JSON contract:
/// `POST /quiz {topic}` and `POST /feedback {topic, score}`.
#[derive(Clone)]
pub struct ServiceGenerator {
    client: Client,
    config: ServiceConfig,
    retry: RetryPolicy,
    clock: Clock,
}

impl ServiceGenerator {
    /// # Errors
    ///
    /// Returns `GeneratorError::Http` if the HTTP client cannot be built.
    pub fn new(config: ServiceConfig, request_timeout: Duration) -> Result<Self, GeneratorError> {
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

    async fn post_json<B: serde::Serialize + Sync>(
        &self,
        label: &str,
        url: &str,
        body: &B,
    ) -> Result<String, GeneratorError> {
        self.retry
            .run(label, || async {
                let response = self.client.post(url).json(body).send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(GeneratorError::HttpStatus { status, body });
                }
                Ok(response.text().await?)
            })
            .await
    }
}

#[async_trait]
impl QuizGenerator for ServiceGenerator {
    async fn generate_question_set(&self, topic: &Topic) -> Result<QuestionSet, GeneratorError> {
        let url = self.config.endpoint("quiz");
        debug!(%topic, %url, "requesting quiz");
        let body = self
            .post_json("quiz", &url, &QuizRequest { topic: topic.as_str() })
            .await?;
        let set = parse_question_set(&body, topic, self.clock.now())?;
        info!(%topic, questions = set.len(), "quiz generated");
        Ok(set)
    }

    async fn generate_feedback(&self, topic: &Topic, score: u32) -> Result<String, GeneratorError> {
        let url = self.config.endpoint("feedback");
        debug!(%topic, score, %url, "requesting feedback");
        let body = self
            .post_json(
                "feedback",
                &url,
                &FeedbackRequest {
                    topic: topic.as_str(),
                    score,
                },
            )
            .await?;
        parse_feedback(&body)
    }
}
