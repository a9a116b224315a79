//! Error types for gateway, normalizer and study operations

use thiserror::Error;

/// Errors surfaced by the Wikipedia gateway and the study tools.
///
/// Gateway errors (`ArticleNotFound`, `Network`, `Status`, `UpstreamFormat`)
/// propagate to the requesting view, which degrades to a not-found or error
/// page. Study errors (`AiParse` and transport failures from the generative
/// endpoint) are caught at the component boundary and rendered as placeholder
/// text; nothing here is fatal to the process.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or whitespace-only query/title, rejected before any network call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The upstream API reports the requested page as missing
    #[error("article not found: {0}")]
    ArticleNotFound(String),

    /// Transport-level failure (DNS, connect, timeout, body read)
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream responded with a non-success HTTP status
    #[error("upstream responded with HTTP {0}")]
    Status(u16),

    /// Response JSON lacks the fields the normalizer expects
    #[error("unexpected upstream response shape: {0}")]
    UpstreamFormat(String),

    /// The generative model's completion was absent or not the requested JSON
    #[error("could not parse model completion: {0}")]
    AiParse(String),
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ArticleNotFound("Nonexistent Page".to_string());
        assert!(err.to_string().contains("Nonexistent Page"));

        let err = Error::Status(503);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = Error::InvalidArgument("title must not be empty".to_string());
        assert!(err.to_string().starts_with("invalid argument"));
    }
}
