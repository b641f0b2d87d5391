use async_trait::async_trait;
use colloquy_core::{ColloquyResult, PromptChannel, PromptOutcome, PromptRequest};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use tracing::info;

/// Boxed future returned by a [`CallbackPromptChannel`] callback.
pub type PromptFuture = Pin<Box<dyn Future<Output = ColloquyResult<PromptOutcome>> + Send>>;

/// Replays a fixed queue of outcomes, one per prompt, then cancels.
/// For non-interactive runs and tests.
#[derive(Default)]
pub struct ScriptedPromptChannel {
    outcomes: Mutex<VecDeque<PromptOutcome>>,
    asked: Mutex<Vec<PromptRequest>>,
}

impl ScriptedPromptChannel {
    pub fn new(outcomes: impl IntoIterator<Item = PromptOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Answers every prompt with the given strings, in order.
    pub fn answering<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(answers.into_iter().map(PromptOutcome::answered))
    }

    /// Every request seen so far.
    pub fn asked(&self) -> Vec<PromptRequest> {
        self.asked.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.outcomes.lock().len()
    }
}

#[async_trait]
impl PromptChannel for ScriptedPromptChannel {
    async fn prompt(&self, request: PromptRequest) -> ColloquyResult<PromptOutcome> {
        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or(PromptOutcome::Cancelled);
        info!(
            question = %request.question,
            answered = outcome.is_answered(),
            "Scripted prompt"
        );
        self.asked.lock().push(request);
        Ok(outcome)
    }
}

/// Callback-based prompt channel. Delegates to a user-provided async function.
pub struct CallbackPromptChannel<F>
where
    F: Fn(PromptRequest) -> PromptFuture + Send + Sync,
{
    callback: F,
}

impl<F> CallbackPromptChannel<F>
where
    F: Fn(PromptRequest) -> PromptFuture + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F> PromptChannel for CallbackPromptChannel<F>
where
    F: Fn(PromptRequest) -> PromptFuture + Send + Sync,
{
    async fn prompt(&self, request: PromptRequest) -> ColloquyResult<PromptOutcome> {
        (self.callback)(request).await
    }
}
