//! Normalizers turning raw Wikipedia API JSON into the crate's article shapes
//!
//! Every function here is pure: it takes a `serde_json::Value` as returned by
//! the upstream API and produces one of the entity types. Missing optional
//! fields (lead image, categories, edit comments) become absence; a payload
//! missing the structure an operation depends on yields
//! [`Error::UpstreamFormat`](crate::Error::UpstreamFormat) instead of a panic.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::article::{ArticleSummary, CategoryEntry, Revision, SearchResult, Section};
use crate::error::{Error, Result};

/// Metadata half of an article, from the `action=query` info call
#[derive(Debug, Clone)]
pub struct PageMeta {
    /// Canonical title
    pub title: String,
    /// Canonical URL on the upstream wiki
    pub url: String,
    /// Lead image URL, if any
    pub image: Option<String>,
    /// Categories with the `Category:` prefix stripped
    pub categories: Vec<String>,
    /// `touched` timestamp
    pub last_modified: Option<DateTime<Utc>>,
}

/// Parse an upstream timestamp, tolerating absence or junk
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Strip the `Category:` namespace prefix from a category title
fn strip_category_prefix(title: &str) -> String {
    title.strip_prefix("Category:").unwrap_or(title).to_string()
}

/// The first page object of a `query.pages` map.
///
/// The legacy format keys pages by page ID; every single-title query returns
/// exactly one entry.
fn first_page(raw: &Value) -> Result<&Value> {
    raw.get("query")
        .and_then(|q| q.get("pages"))
        .and_then(|p| p.as_object())
        .and_then(|pages| pages.values().next())
        .ok_or_else(|| Error::UpstreamFormat("missing query.pages".to_string()))
}

/// Normalize a `list=search` response into ordered search results
pub fn search_results(raw: &Value) -> Result<Vec<SearchResult>> {
    let hits = raw
        .get("query")
        .and_then(|q| q.get("search"))
        .and_then(|s| s.as_array())
        .ok_or_else(|| Error::UpstreamFormat("missing query.search".to_string()))?;

    Ok(hits
        .iter()
        .filter_map(|hit| {
            Some(SearchResult {
                page_id: hit.get("pageid")?.as_u64()?,
                title: hit.get("title")?.as_str()?.to_string(),
                snippet: hit
                    .get("snippet")
                    .and_then(|s| s.as_str())
                    .unwrap_or("")
                    .to_string(),
            })
        })
        .collect())
}

/// Normalize the metadata call for one article.
///
/// Detects the missing-page marker so the caller can short-circuit before
/// issuing the content call.
pub fn page_meta(raw: &Value, requested_title: &str) -> Result<PageMeta> {
    let page = first_page(raw)?;

    if page.get("missing").is_some() {
        return Err(Error::ArticleNotFound(requested_title.to_string()));
    }

    let title = page
        .get("title")
        .and_then(|t| t.as_str())
        .ok_or_else(|| Error::UpstreamFormat("page without title".to_string()))?
        .to_string();

    let categories = page
        .get("categories")
        .and_then(|c| c.as_array())
        .map(|cats| {
            cats.iter()
                .filter_map(|cat| cat.get("title").and_then(|t| t.as_str()))
                .map(strip_category_prefix)
                .collect()
        })
        .unwrap_or_default();

    Ok(PageMeta {
        title,
        url: page
            .get("fullurl")
            .and_then(|u| u.as_str())
            .unwrap_or("")
            .to_string(),
        image: page
            .get("original")
            .and_then(|o| o.get("source"))
            .and_then(|s| s.as_str())
            .map(String::from),
        categories,
        last_modified: page.get("touched").map(parse_timestamp).unwrap_or(None),
    })
}

/// Normalize an `action=parse` response into rendered HTML plus the section
/// outline, preserving document order and verbatim anchors.
pub fn parsed_content(raw: &Value) -> Result<(String, Vec<Section>)> {
    let parse = raw
        .get("parse")
        .ok_or_else(|| Error::UpstreamFormat("missing parse object".to_string()))?;

    // formatversion=2 returns text as a plain string
    let content = parse
        .get("text")
        .and_then(|t| t.as_str())
        .ok_or_else(|| Error::UpstreamFormat("missing parse.text".to_string()))?
        .to_string();

    let sections = parse
        .get("sections")
        .and_then(|s| s.as_array())
        .map(|sections| {
            sections
                .iter()
                .filter_map(|section| {
                    // the API reports `level` as a string
                    let level = match section.get("level") {
                        Some(Value::String(s)) => s.parse().unwrap_or(1),
                        Some(Value::Number(n)) => n.as_u64().unwrap_or(1) as u32,
                        _ => 1,
                    };
                    Some(Section {
                        id: section.get("anchor")?.as_str()?.to_string(),
                        level: level.max(1),
                        text: section
                            .get("line")
                            .and_then(|l| l.as_str())
                            .unwrap_or("")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok((content, sections))
}

/// Normalize a featured-articles generator response into summaries.
///
/// An absent pages map is an empty listing, not an error, matching how the
/// home view degrades.
pub fn featured_summaries(raw: &Value) -> Vec<ArticleSummary> {
    raw.get("query")
        .and_then(|q| q.get("pages"))
        .and_then(|p| p.as_object())
        .map(|pages| {
            pages
                .values()
                .filter_map(|page| {
                    Some(ArticleSummary {
                        title: page.get("title")?.as_str()?.to_string(),
                        extract: page
                            .get("extract")
                            .and_then(|e| e.as_str())
                            .unwrap_or("")
                            .to_string(),
                        image: page
                            .get("original")
                            .and_then(|o| o.get("source"))
                            .and_then(|s| s.as_str())
                            .map(String::from),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize a `list=categorymembers` response (news, on-this-day)
pub fn category_entries(raw: &Value) -> Vec<CategoryEntry> {
    raw.get("query")
        .and_then(|q| q.get("categorymembers"))
        .and_then(|m| m.as_array())
        .map(|members| {
            members
                .iter()
                .filter_map(|member| {
                    Some(CategoryEntry {
                        title: member.get("title")?.as_str()?.to_string(),
                        timestamp: member.get("timestamp").map(parse_timestamp).unwrap_or(None),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize a revisions response into an article's edit history
pub fn revisions(raw: &Value) -> Result<Vec<Revision>> {
    let page = first_page(raw)?;

    Ok(page
        .get("revisions")
        .and_then(|r| r.as_array())
        .map(|revs| {
            revs.iter()
                .filter_map(|rev| {
                    Some(Revision {
                        timestamp: rev.get("timestamp").map(parse_timestamp)??,
                        user: rev.get("user")?.as_str()?.to_string(),
                        comment: rev
                            .get("comment")
                            .and_then(|c| c.as_str())
                            .unwrap_or("")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default())
}

/// Normalize a categories query into bare category names
pub fn categories(raw: &Value) -> Result<Vec<String>> {
    let page = first_page(raw)?;

    Ok(page
        .get("categories")
        .and_then(|c| c.as_array())
        .map(|cats| {
            cats.iter()
                .filter_map(|cat| cat.get("title").and_then(|t| t.as_str()))
                .map(strip_category_prefix)
                .collect()
        })
        .unwrap_or_default())
}

/// The title of the single page returned by `list=random`
pub fn random_title(raw: &Value) -> Result<String> {
    raw.get("query")
        .and_then(|q| q.get("random"))
        .and_then(|r| r.as_array())
        .and_then(|random| random.first())
        .and_then(|page| page.get("title"))
        .and_then(|t| t.as_str())
        .map(String::from)
        .ok_or_else(|| Error::UpstreamFormat("missing query.random".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_results_preserve_order() {
        let raw = json!({
            "query": {
                "search": [
                    {"pageid": 1, "title": "Cat", "snippet": "a <span>cat</span>"},
                    {"pageid": 2, "title": "Cat (disambiguation)", "snippet": ""},
                ]
            }
        });
        let results = search_results(&raw).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].page_id, 1);
        assert_eq!(results[1].page_id, 2);
        assert_eq!(results[0].title, "Cat");
    }

    #[test]
    fn test_search_results_malformed_payload() {
        let raw = json!({"batchcomplete": ""});
        assert!(matches!(search_results(&raw), Err(Error::UpstreamFormat(_))));
    }

    #[test]
    fn test_page_meta_missing_page() {
        let raw = json!({
            "query": {"pages": {"-1": {"title": "Nope", "missing": ""}}}
        });
        let err = page_meta(&raw, "Nope").unwrap_err();
        assert!(matches!(err, Error::ArticleNotFound(title) if title == "Nope"));
    }

    #[test]
    fn test_page_meta_full() {
        let raw = json!({
            "query": {"pages": {"42": {
                "pageid": 42,
                "title": "Rust (programming language)",
                "fullurl": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
                "touched": "2024-05-01T12:00:00Z",
                "original": {"source": "https://upload.wikimedia.org/rust.png"},
                "categories": [
                    {"title": "Category:Programming languages"},
                    {"title": "Category:Rust (programming language)"},
                ]
            }}}
        });
        let meta = page_meta(&raw, "Rust (programming language)").unwrap();
        assert_eq!(meta.title, "Rust (programming language)");
        assert_eq!(meta.categories[0], "Programming languages");
        assert_eq!(meta.image.as_deref(), Some("https://upload.wikimedia.org/rust.png"));
        assert!(meta.last_modified.is_some());
    }

    #[test]
    fn test_page_meta_tolerates_missing_optionals() {
        let raw = json!({
            "query": {"pages": {"7": {"pageid": 7, "title": "Bare"}}}
        });
        let meta = page_meta(&raw, "Bare").unwrap();
        assert!(meta.image.is_none());
        assert!(meta.categories.is_empty());
        assert!(meta.last_modified.is_none());
        assert_eq!(meta.url, "");
    }

    #[test]
    fn test_parsed_content_sections_in_order() {
        let raw = json!({
            "parse": {
                "title": "Cat",
                "text": "<div class=\"mw-parser-output\"><p>Cats.</p></div>",
                "sections": [
                    {"toclevel": 1, "level": "2", "line": "History", "anchor": "History"},
                    {"toclevel": 2, "level": "3", "line": "Domestication", "anchor": "Domestication"},
                ]
            }
        });
        let (content, sections) = parsed_content(&raw).unwrap();
        assert!(content.contains("Cats."));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, "History");
        assert_eq!(sections[0].level, 2);
        assert_eq!(sections[1].text, "Domestication");
    }

    #[test]
    fn test_parsed_content_missing_text() {
        let raw = json!({"parse": {"title": "Cat"}});
        assert!(matches!(parsed_content(&raw), Err(Error::UpstreamFormat(_))));
    }

    #[test]
    fn test_featured_summaries_tolerate_absent_pages() {
        assert!(featured_summaries(&json!({"query": {}})).is_empty());
        assert!(featured_summaries(&json!({})).is_empty());
    }

    #[test]
    fn test_featured_summaries_optional_image() {
        let raw = json!({
            "query": {"pages": {
                "1": {"title": "A", "extract": "About A", "original": {"source": "http://img/a"}},
                "2": {"title": "B", "extract": "About B"},
            }}
        });
        let summaries = featured_summaries(&raw);
        assert_eq!(summaries.len(), 2);
        let b = summaries.iter().find(|s| s.title == "B").unwrap();
        assert!(b.image.is_none());
    }

    #[test]
    fn test_category_entries() {
        let raw = json!({
            "query": {"categorymembers": [
                {"title": "Event one", "timestamp": "2024-05-01T00:00:00Z"},
                {"title": "Event two"},
            ]}
        });
        let entries = category_entries(&raw);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].timestamp.is_some());
        assert!(entries[1].timestamp.is_none());
    }

    #[test]
    fn test_revisions() {
        let raw = json!({
            "query": {"pages": {"42": {"revisions": [
                {"timestamp": "2024-05-01T10:00:00Z", "user": "Alice", "comment": "fix typo"},
                {"timestamp": "2024-04-30T10:00:00Z", "user": "Bob"},
            ]}}}
        });
        let revs = revisions(&raw).unwrap();
        assert_eq!(revs.len(), 2);
        assert_eq!(revs[0].user, "Alice");
        assert_eq!(revs[1].comment, "");
    }

    #[test]
    fn test_categories_strip_prefix() {
        let raw = json!({
            "query": {"pages": {"42": {"categories": [
                {"title": "Category:Felines"},
                {"title": "Category:Domesticated animals"},
            ]}}}
        });
        let cats = categories(&raw).unwrap();
        assert_eq!(cats, vec!["Felines", "Domesticated animals"]);
    }

    #[test]
    fn test_random_title() {
        let raw = json!({"query": {"random": [{"id": 9, "title": "Serendipity"}]}});
        assert_eq!(random_title(&raw).unwrap(), "Serendipity");
        assert!(random_title(&json!({})).is_err());
    }
}
