//! Studypedia Config

use serde::{Deserialize, Serialize};

use crate::WikiLanguage;

/// Configuration for the Wikipedia gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Wikipedia edition to query
    pub language: String,
    /// Override the query API endpoint (tests, mirrors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// User-Agent sent with every upstream request
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum search results per query
    pub search_limit: usize,
    /// Featured articles fetched for the home view
    pub featured_limit: usize,
    /// Entries fetched for news / on-this-day listings
    pub listing_limit: usize,
    /// Revisions fetched for article history
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            api_url: None,
            user_agent: format!("studypedia/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            search_limit: 10,
            featured_limit: 10,
            listing_limit: 5,
            history_limit: 50,
        }
    }
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language
    pub fn with_language(mut self, lang: WikiLanguage) -> Self {
        self.language = lang.code().to_string();
        self
    }

    /// Override the API endpoint
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the search result limit
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Get the wiki language enum
    pub fn wiki_language(&self) -> WikiLanguage {
        WikiLanguage::from_code(&self.language).unwrap_or_default()
    }

    /// Get the effective API endpoint (override or per-edition default)
    pub fn endpoint(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| self.wiki_language().api_url())
    }
}

/// Configuration for the generative-language (study) client.
///
/// The API key is read from the server environment and stays there; it is
/// never embedded in anything delivered to a browser.
#[derive(Clone)]
pub struct StudyConfig {
    /// Gemini API key
    pub api_key: String,
    /// Model name, e.g. `gemini-2.0-flash`
    pub model: String,
    /// Base endpoint of the generative-language API
    pub endpoint: String,
    /// Request timeout in seconds (the upstream has no bound of its own)
    pub timeout_secs: u64,
}

impl std::fmt::Debug for StudyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl StudyConfig {
    /// Create a config for the given API key with default model/endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 30,
        }
    }

    /// Read the API key from `STUDYPEDIA_GEMINI_KEY` or `GEMINI_API_KEY`.
    ///
    /// Returns `None` when neither is set; callers disable the study
    /// endpoints rather than failing startup.
    pub fn from_env() -> Option<Self> {
        std::env::var("STUDYPEDIA_GEMINI_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_follows_language() {
        let config = Config::new().with_language(WikiLanguage::German);
        assert_eq!(config.endpoint(), "https://de.wikipedia.org/w/api.php");
    }

    #[test]
    fn test_endpoint_override_wins() {
        let config = Config::new().with_api_url("http://localhost:9999/w/api.php");
        assert_eq!(config.endpoint(), "http://localhost:9999/w/api.php");
    }

    #[test]
    fn test_study_config_debug_redacts_key() {
        let config = StudyConfig::new("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
