//! Wikipedia API gateway
//!
//! One typed operation per upstream capability. Every operation validates
//! its input, issues HTTP GET requests against the edition's `api.php`
//! endpoint with a fixed parameter configuration (`format=json`, `origin=*`),
//! and hands the payload to the normalizers in [`crate::normalize`]. No
//! caching, no upstream mutation.

use chrono::{Datelike, Utc};
use serde_json::Value;

use crate::article::{Article, ArticleSummary, CategoryEntry, Revision, SearchResult};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::normalize;

type Params = Vec<(&'static str, String)>;

/// Parameters shared by every upstream request
fn base_params(action: &str) -> Params {
    vec![
        ("format", "json".to_string()),
        ("origin", "*".to_string()),
        ("action", action.to_string()),
    ]
}

/// Parameters for a full-text search
fn search_params(query: &str, limit: usize) -> Params {
    let mut params = base_params("query");
    params.push(("list", "search".to_string()));
    params.push(("srsearch", query.to_string()));
    params.push(("srlimit", limit.to_string()));
    params
}

/// Parameters for the metadata half of an article fetch
fn meta_params(title: &str) -> Params {
    let mut params = base_params("query");
    params.push(("titles", title.to_string()));
    params.push(("prop", "info|pageimages|categories".to_string()));
    params.push(("inprop", "url".to_string()));
    params.push(("piprop", "original".to_string()));
    params.push(("cllimit", "max".to_string()));
    params
}

/// Parameters for the rendered-content half of an article fetch
fn parse_params(title: &str) -> Params {
    let mut params = base_params("parse");
    params.push(("page", title.to_string()));
    params.push(("prop", "text|sections".to_string()));
    params.push(("formatversion", "2".to_string()));
    params
}

/// Parameters for one random main-namespace title
fn random_params() -> Params {
    let mut params = base_params("query");
    params.push(("list", "random".to_string()));
    params.push(("rnnamespace", "0".to_string()));
    params.push(("rnlimit", "1".to_string()));
    params
}

/// Parameters for the featured-articles generator
fn featured_params(limit: usize) -> Params {
    let mut params = base_params("query");
    params.push(("generator", "categorymembers".to_string()));
    params.push(("gcmtitle", "Category:Featured_articles".to_string()));
    params.push(("gcmlimit", limit.to_string()));
    params.push(("prop", "extracts|pageimages".to_string()));
    params.push(("exintro", "true".to_string()));
    params.push(("explaintext", "true".to_string()));
    params.push(("piprop", "original".to_string()));
    params
}

/// Parameters for listing a category's members
fn members_params(category: &str, limit: usize) -> Params {
    let mut params = base_params("query");
    params.push(("list", "categorymembers".to_string()));
    params.push(("cmtitle", category.to_string()));
    params.push(("cmlimit", limit.to_string()));
    params
}

/// Parameters for an article's revision history
fn history_params(title: &str, limit: usize) -> Params {
    let mut params = base_params("query");
    params.push(("titles", title.to_string()));
    params.push(("prop", "revisions".to_string()));
    params.push(("rvlimit", limit.to_string()));
    params.push(("rvprop", "timestamp|user|comment".to_string()));
    params
}

/// Parameters for an article's category list
fn categories_params(title: &str) -> Params {
    let mut params = base_params("query");
    params.push(("titles", title.to_string()));
    params.push(("prop", "categories".to_string()));
    params.push(("cllimit", "50".to_string()));
    params
}

/// Reject empty or whitespace-only titles/queries before any network call
fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Gateway to one Wikipedia edition
pub struct WikiClient {
    http: reqwest::Client,
    config: Config,
}

impl WikiClient {
    /// Create a gateway with default config (English Wikipedia)
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a gateway with custom config
    pub fn with_config(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// Get the config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Issue one GET against the edition endpoint and decode the JSON body
    async fn get_json(&self, params: &Params) -> Result<Value> {
        let response = self
            .http
            .get(self.config.endpoint())
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }

    /// Search articles by full text, in upstream relevance order
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        require_non_empty(query, "search query")?;
        tracing::debug!("searching for {:?}", query);
        let raw = self
            .get_json(&search_params(query, self.config.search_limit))
            .await?;
        normalize::search_results(&raw)
    }

    /// Fetch one article by title.
    ///
    /// Two sequential calls: metadata first (existence check, categories,
    /// image, canonical URL), then rendered HTML plus the section outline.
    /// A missing page short-circuits after the first call.
    pub async fn get_article(&self, title: &str) -> Result<Article> {
        require_non_empty(title, "article title")?;
        tracing::debug!("fetching article {:?}", title);

        let raw_meta = self.get_json(&meta_params(title)).await?;
        let meta = normalize::page_meta(&raw_meta, title)?;

        let raw_parse = self.get_json(&parse_params(title)).await?;
        let (content, sections) = normalize::parsed_content(&raw_parse)?;

        Ok(Article {
            title: meta.title,
            content,
            sections,
            categories: meta.categories,
            image: meta.image,
            url: meta.url,
            last_modified: meta.last_modified,
        })
    }

    /// Fetch a random main-namespace article
    pub async fn get_random_article(&self) -> Result<Article> {
        let raw = self.get_json(&random_params()).await?;
        let title = normalize::random_title(&raw)?;
        self.get_article(&title).await
    }

    /// Fetch the featured-articles set for the home view
    pub async fn get_featured_articles(&self) -> Result<Vec<ArticleSummary>> {
        let raw = self
            .get_json(&featured_params(self.config.featured_limit))
            .await?;
        Ok(normalize::featured_summaries(&raw))
    }

    /// Fetch the current-events listing
    pub async fn get_news(&self) -> Result<Vec<CategoryEntry>> {
        let raw = self
            .get_json(&members_params(
                "Category:Current_events",
                self.config.listing_limit,
            ))
            .await?;
        Ok(normalize::category_entries(&raw))
    }

    /// Fetch the on-this-day listing for the current date
    pub async fn get_on_this_day(&self) -> Result<Vec<CategoryEntry>> {
        let today = Utc::now();
        let category = format!("Category:{}_{}", today.month(), today.day());
        let raw = self
            .get_json(&members_params(&category, self.config.listing_limit))
            .await?;
        Ok(normalize::category_entries(&raw))
    }

    /// Fetch an article's recent revision history
    pub async fn get_article_history(&self, title: &str) -> Result<Vec<Revision>> {
        require_non_empty(title, "article title")?;
        let raw = self
            .get_json(&history_params(title, self.config.history_limit))
            .await?;
        normalize::revisions(&raw)
    }

    /// Fetch an article's categories
    pub async fn get_categories(&self, title: &str) -> Result<Vec<String>> {
        require_non_empty(title, "article title")?;
        let raw = self.get_json(&categories_params(title)).await?;
        normalize::categories(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_base_params_fixed_configuration() {
        let params = base_params("query");
        assert_eq!(param(&params, "format"), Some("json"));
        assert_eq!(param(&params, "origin"), Some("*"));
    }

    #[test]
    fn test_search_params() {
        let params = search_params("cat", 10);
        assert_eq!(param(&params, "list"), Some("search"));
        assert_eq!(param(&params, "srsearch"), Some("cat"));
        assert_eq!(param(&params, "srlimit"), Some("10"));
    }

    #[test]
    fn test_meta_and_parse_params_cover_both_halves() {
        let meta = meta_params("Cat");
        assert_eq!(param(&meta, "prop"), Some("info|pageimages|categories"));
        assert_eq!(param(&meta, "inprop"), Some("url"));

        let parse = parse_params("Cat");
        assert_eq!(param(&parse, "action"), Some("parse"));
        assert_eq!(param(&parse, "prop"), Some("text|sections"));
        assert_eq!(param(&parse, "formatversion"), Some("2"));
    }

    #[test]
    fn test_random_params_main_namespace_only() {
        let params = random_params();
        assert_eq!(param(&params, "rnnamespace"), Some("0"));
        assert_eq!(param(&params, "rnlimit"), Some("1"));
    }

    #[test]
    fn test_featured_params_request_plain_intros() {
        let params = featured_params(10);
        assert_eq!(param(&params, "gcmtitle"), Some("Category:Featured_articles"));
        assert_eq!(param(&params, "exintro"), Some("true"));
        assert_eq!(param(&params, "explaintext"), Some("true"));
    }

    #[tokio::test]
    async fn test_empty_title_rejected_before_network() {
        // endpoint that would fail instantly if contacted
        let config = Config::new().with_api_url("http://127.0.0.1:1/w/api.php");
        let client = WikiClient::with_config(config).unwrap();

        for bad in ["", "   ", "\t\n"] {
            let err = client.get_article(bad).await.unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "title {:?}", bad);
            let err = client.search(bad).await.unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "query {:?}", bad);
        }
    }
}
