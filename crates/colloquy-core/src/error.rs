use thiserror::Error;

/// A convenience `Result` alias using [`ColloquyError`].
pub type ColloquyResult<T> = Result<T, ColloquyError>;

/// Top-level error type for Colloquy.
///
/// `NotFound` and `InvalidState` are raised by the session store for caller
/// logic errors; `Format` and `Io` by the snapshot codec. The remaining
/// variants belong to the outer layers (prompting, skills, configuration).
#[derive(Error, Debug)]
pub enum ColloquyError {
    /// The operation targeted a session id the store does not hold.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// A mutation was requested on a session that has already ended.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A persisted snapshot could not be decoded or failed validation.
    #[error("Format error: {0}")]
    Format(String),

    /// The persistence medium could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON encoding error outside of snapshot decoding.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The prompt collaborator failed (as opposed to the human cancelling).
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A skill lookup or invocation failed.
    #[error("Skill error: {0}")]
    Skill(String),

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}
