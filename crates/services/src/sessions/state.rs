use std::fmt;

use quiz_core::model::{QuestionSet, Topic};

use crate::error::GeneratorError;

/// Identifies one issued generator request.
///
/// Tokens grow monotonically within a session; a reply is applied only if its token is
/// still the one the session is waiting on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    pub(crate) fn first() -> Self {
        Self(1)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestToken({})", self.0)
    }
}

/// Coarse session state, derived from the session's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No topic selected.
    Idle,
    /// Waiting for a question set.
    Fetching,
    /// Question set loaded, not every question answered.
    Ready,
    /// Every question answered; answers are frozen.
    Completed,
    /// The last generation attempt failed.
    Failed,
}

/// Feedback shown after completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    /// True when the generator failed and the static fallback text is shown instead.
    pub is_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackState {
    NotRequested,
    Pending { token: RequestToken },
    Shown(Feedback),
}

impl FeedbackState {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    #[must_use]
    pub fn shown(&self) -> Option<&Feedback> {
        match self {
            Self::Shown(feedback) => Some(feedback),
            _ => None,
        }
    }
}

/// A question set request the caller must fulfill and hand back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub token: RequestToken,
    pub topic: Topic,
}

/// A feedback request the caller must fulfill and hand back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackTicket {
    pub token: RequestToken,
    pub topic: Topic,
    pub score: u32,
}

/// Result of fulfilling a [`GenerationTicket`].
#[derive(Debug)]
pub struct GenerationReply {
    pub token: RequestToken,
    pub result: Result<QuestionSet, GeneratorError>,
}

/// Result of fulfilling a [`FeedbackTicket`].
#[derive(Debug)]
pub struct FeedbackReply {
    pub token: RequestToken,
    pub result: Result<String, GeneratorError>,
}

/// Whether a reply changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Applied,
    /// A newer request was issued, or the session was reset, before this reply arrived.
    Stale,
}
