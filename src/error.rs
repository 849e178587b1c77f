/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum BandwagonError {
    /// No attempt produced a body before the race deadline.
    #[error("race timed out after {deadline_ms} ms{}", last_error_suffix(.last_error))]
    Timeout {
        /// Race-wide deadline that elapsed.
        deadline_ms: u64,
        /// Most recent attempt error observed before the deadline, if any.
        last_error: Option<String>,
    },
    /// Every attempt failed before the deadline (only with `fail_fast`).
    #[error("all {attempts} attempts failed{}", last_error_suffix(.last_error))]
    AllAttemptsFailed {
        /// Number of attempts launched.
        attempts: usize,
        /// Most recent attempt error.
        last_error: Option<String>,
    },
    /// HTTP client construction or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Base URL or endpoint URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Response body was not the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Upstream API reported a non-zero `error` code.
    #[error("api error {code}: {}", message_or_placeholder(.message))]
    Api {
        /// Value of the `error` field.
        code: i64,
        /// Value of the `message` field, when present.
        message: Option<String>,
    },
    /// Missing or empty configuration value.
    #[error("config error: {0}")]
    Config(String),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(err) => format!(" (last attempt error: {err})"),
        None => String::new(),
    }
}

fn message_or_placeholder(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("<no message>")
}
