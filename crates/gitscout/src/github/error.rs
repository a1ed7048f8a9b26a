//! GitHub API error types.

use thiserror::Error;

use crate::budget::BudgetExhausted;

/// Errors that terminate the current run.
///
/// Ordinary transport and HTTP failures never surface here: the client
/// translates them into [`FetchResult::Missing`](super::FetchResult::Missing)
/// so callers degrade the affected field instead of aborting.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error(transparent)]
    Budget(#[from] BudgetExhausted),

    #[error("invalid request url: {0}")]
    Url(String),

    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Why a fetch produced no data.
///
/// Carried on [`FetchResult::Missing`](super::FetchResult::Missing) so call
/// sites can log "fetch failed" distinctly from "legitimately zero" before
/// falling back to a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    /// Non-2xx HTTP status.
    Status(u16),
    /// 204 No Content.
    NoContent,
    /// Transport-level failure (DNS, TLS, timeout, ...).
    Transport(String),
    /// The body could not be decoded into the expected shape.
    Decode(String),
}

impl std::fmt::Display for MissingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingReason::Status(code) => write!(f, "http status {code}"),
            MissingReason::NoContent => write!(f, "no content"),
            MissingReason::Transport(msg) => write!(f, "transport error: {msg}"),
            MissingReason::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_their_failure_domain() {
        let url = GitHubError::Url("not a url".to_string());
        assert!(url.to_string().contains("invalid request url"));

        let client = GitHubError::Client("tls backend unavailable".to_string());
        assert!(client.to_string().contains("failed to build http client"));
    }
}
