//! Contract for the collaborator that puts a question to a human.
//!
//! These types live in `colloquy-core` so that `colloquy-builtins` (which
//! implements the conversation tools and the terminal channel) and any
//! embedding application can share them. Implementations may block for an
//! arbitrary amount of wall-clock time; callers must never hold a session
//! store lock while awaiting one.

use crate::ColloquyResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A question to put to a human.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub question: String,
    #[serde(default)]
    pub context: String,
}

impl PromptRequest {
    pub fn new(question: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: context.into(),
        }
    }
}

/// What the human did with a [`PromptRequest`].
///
/// Serializes as `{"answered": true, "answer": "..."}` or
/// `{"answered": false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "OutcomeRepr", try_from = "OutcomeRepr")]
pub enum PromptOutcome {
    Answered(String),
    Cancelled,
}

impl PromptOutcome {
    pub fn answered(answer: impl Into<String>) -> Self {
        Self::Answered(answer.into())
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered(answer) => Some(answer),
            Self::Cancelled => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OutcomeRepr {
    answered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
}

impl From<PromptOutcome> for OutcomeRepr {
    fn from(outcome: PromptOutcome) -> Self {
        match outcome {
            PromptOutcome::Answered(answer) => Self {
                answered: true,
                answer: Some(answer),
            },
            PromptOutcome::Cancelled => Self {
                answered: false,
                answer: None,
            },
        }
    }
}

impl TryFrom<OutcomeRepr> for PromptOutcome {
    type Error = String;

    fn try_from(repr: OutcomeRepr) -> Result<Self, Self::Error> {
        match (repr.answered, repr.answer) {
            (true, Some(answer)) => Ok(Self::Answered(answer)),
            (true, None) => Err("answered outcome is missing `answer`".to_string()),
            (false, _) => Ok(Self::Cancelled),
        }
    }
}

/// Channel through which questions reach a human and answers come back.
/// Implementations can be terminal prompts, GUI popups, chat bridges, etc.
#[async_trait]
pub trait PromptChannel: Send + Sync {
    async fn prompt(&self, request: PromptRequest) -> ColloquyResult<PromptOutcome>;
}
