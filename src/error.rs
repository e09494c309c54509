use thiserror::Error;

/// Errors raised by the bot's own components.
#[derive(Debug, Error)]
pub enum BotError {
    /// A command definition could not parse text it had already accepted.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A command pattern failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("config error: {0}")]
    Config(String),

    /// The messaging platform answered with an error envelope.
    #[error("platform error {code}: {message}")]
    Platform { code: i64, message: String },

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
