use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use quiz_core::model::Topic;
use services::QuizSessionService;

use crate::controller::QuizController;

pub trait UiApp: Send + Sync {
    /// Topic to start on launch, if any.
    fn initial_topic(&self) -> Option<Topic>;

    fn quiz_service(&self) -> Arc<QuizSessionService>;
}

#[derive(Clone)]
pub struct AppContext {
    initial_topic: Option<Topic>,
    initial_topic_once: Arc<AtomicBool>,

    quiz_service: Arc<QuizSessionService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        let initial_topic = app.initial_topic();
        let quiz_service = app.quiz_service();

        Self {
            initial_topic_once: Arc::new(AtomicBool::new(initial_topic.is_some())),
            initial_topic,
            quiz_service,
        }
    }

    /// The launch topic, handed out at most once.
    #[must_use]
    pub fn take_initial_topic(&self) -> Option<Topic> {
        if self.initial_topic_once.swap(false, Ordering::AcqRel) {
            self.initial_topic.clone()
        } else {
            None
        }
    }

    #[must_use]
    pub fn quiz_service(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz_service)
    }

    /// A fresh controller over a new session.
    #[must_use]
    pub fn controller(&self) -> QuizController {
        QuizController::new(self.quiz_service())
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
