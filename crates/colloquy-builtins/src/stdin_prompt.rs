use async_trait::async_trait;
use colloquy_core::{ColloquyError, ColloquyResult, PromptChannel, PromptOutcome, PromptRequest};
use std::io::{self, BufRead};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Typing this (or nothing) at the prompt declines to answer.
pub const CANCEL_COMMAND: &str = "/cancel";

type LineReceiver = mpsc::UnboundedReceiver<io::Result<String>>;

/// Terminal prompt channel: writes the question to stderr and reads a
/// single-line answer from stdin.
///
/// A blank line, `/cancel`, end of input or the timeout elapsing all count
/// as the human declining to answer.
///
/// Stdin is owned by one detached reader thread, started on the first prompt,
/// that forwards lines over a channel. A timed-out prompt therefore leaves no
/// read behind, and the process can exit while the thread is still blocked on
/// the terminal. Lines typed while no prompt was waiting are discarded before
/// the next question is shown. Concurrent prompts are asked one at a time.
pub struct StdinPromptChannel {
    timeout: Duration,
    lines: Mutex<Option<LineReceiver>>,
}

impl StdinPromptChannel {
    /// Create with a custom timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            lines: Mutex::new(None),
        }
    }

    /// Create with the default 5-minute timeout.
    pub fn default_timeout() -> Self {
        Self::new(Duration::from_secs(300))
    }

    /// Reads answers from `lines` instead of stdin.
    #[cfg(test)]
    fn with_lines(timeout: Duration, lines: LineReceiver) -> Self {
        Self {
            timeout,
            lines: Mutex::new(Some(lines)),
        }
    }
}

fn spawn_stdin_reader() -> io::Result<LineReceiver> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("colloquy-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Format the prompt for display on stderr, with ANSI colors.
pub fn format_prompt(request: &PromptRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str("\n\x1b[1;36m── QUESTION ──\x1b[0m\n");
    prompt.push_str(&format!("  {}\n", request.question));
    if !request.context.is_empty() {
        prompt.push_str(&format!("  \x1b[2m{}\x1b[0m\n", request.context));
    }
    prompt.push_str(&format!("  Answer (blank or {CANCEL_COMMAND} to skip): "));
    prompt
}

/// Parse one line of user input into an outcome.
pub fn parse_prompt_input(input: &str) -> PromptOutcome {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(CANCEL_COMMAND) {
        PromptOutcome::Cancelled
    } else {
        PromptOutcome::answered(trimmed)
    }
}

#[async_trait]
impl PromptChannel for StdinPromptChannel {
    async fn prompt(&self, request: PromptRequest) -> ColloquyResult<PromptOutcome> {
        let mut guard = self.lines.lock().await;
        let lines = match guard.take() {
            Some(lines) => guard.insert(lines),
            None => guard.insert(
                spawn_stdin_reader()
                    .map_err(|e| ColloquyError::Prompt(format!("stdin reader failed: {e}")))?,
            ),
        };
        while let Ok(stale) = lines.try_recv() {
            debug!(line = ?stale, "Discarding input typed before the prompt");
        }

        // stdout stays free for machine-readable output.
        eprint!("{}", format_prompt(&request));

        match tokio::time::timeout(self.timeout, lines.recv()).await {
            Ok(Some(Ok(input))) => Ok(parse_prompt_input(&input)),
            Ok(Some(Err(e))) => Err(ColloquyError::Prompt(format!("stdin read error: {e}"))),
            Ok(None) => {
                eprintln!();
                Ok(PromptOutcome::Cancelled)
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Prompt timed out");
                eprintln!("\n  (no answer after {}s)", self.timeout.as_secs());
                Ok(PromptOutcome::Cancelled)
            }
        }
    }
}
