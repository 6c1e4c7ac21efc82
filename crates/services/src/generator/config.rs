use std::sync::Arc;
use std::time::Duration;

use quiz_core::Clock;

use super::chat::{ChatConfig, ChatGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL};
use super::retry::RetryPolicy;
use super::service::{ServiceConfig, ServiceGenerator};
use super::QuizGenerator;
use crate::error::GeneratorError;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_TOTAL_TIMEOUT_MS: u64 = 90_000;

/// Which generator implementation to talk to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeneratorBackend {
    Service(ServiceConfig),
    Chat(ChatConfig),
}

/// Generator settings, usually read from `QUIZ_*` environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub backend: GeneratorBackend,
    pub retry: RetryPolicy,
    /// Per HTTP request.
    pub request_timeout: Duration,
    /// Upper bound on one generation or feedback round-trip, retries included.
    pub total_timeout: Duration,
}

impl GeneratorConfig {
    #[must_use]
    pub fn new(backend: GeneratorBackend) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            total_timeout: Duration::from_millis(DEFAULT_TOTAL_TIMEOUT_MS),
        }
    }

    /// Read the configuration through `lookup`, usually the process environment.
    ///
    /// Returns `None` when neither `QUIZ_SERVICE_URL` nor `QUIZ_AI_API_KEY` is set.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let millis = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());

        let backend = if let Some(base_url) = var("QUIZ_SERVICE_URL") {
            GeneratorBackend::Service(ServiceConfig::new(base_url.trim()))
        } else {
            let api_key = var("QUIZ_AI_API_KEY")?;
            GeneratorBackend::Chat(ChatConfig {
                base_url: var("QUIZ_AI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
                api_key,
                model: var("QUIZ_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            })
        };

        let mut config = Self::new(backend);
        if let Some(retries) = var("QUIZ_MAX_RETRIES").and_then(|v| v.trim().parse::<u32>().ok()) {
            config.retry = config.retry.with_max_retries(retries);
        }
        if let Some(ms) = millis("QUIZ_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = millis("QUIZ_TOTAL_TIMEOUT_MS") {
            config.total_timeout = Duration::from_millis(ms);
        }
        Some(config)
    }

    /// Build the configured generator.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::Http` if the HTTP client cannot be built.
    pub fn build(&self, clock: Clock) -> Result<Arc<dyn QuizGenerator>, GeneratorError> {
        let generator: Arc<dyn QuizGenerator> = match &self.backend {
            GeneratorBackend::Service(service) => Arc::new(
                ServiceGenerator::new(service.clone(), self.request_timeout)?
                    .with_retry(self.retry)
                    .with_clock(clock),
            ),
            GeneratorBackend::Chat(chat) => Arc::new(
                ChatGenerator::new(chat.clone(), self.request_timeout)?
                    .with_retry(self.retry)
                    .with_clock(clock),
            ),
        };
        Ok(generator)
    }
}
