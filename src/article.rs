//! Article data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fully-fetched Wikipedia article with rendered HTML content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Article title (canonical form from the page metadata)
    pub title: String,
    /// Rendered HTML content from the parse API
    pub content: String,
    /// Section outline in document order
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Article categories, `Category:` prefix stripped
    #[serde(default)]
    pub categories: Vec<String>,
    /// Lead image URL, if the page has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Canonical URL on the upstream wiki
    pub url: String,
    /// Last modification timestamp (`touched` from the page metadata)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Article {
    /// Get estimated word count of the rendered content
    pub fn word_count(&self) -> usize {
        crate::rewrite::plain_text(&self.content)
            .split_whitespace()
            .count()
    }
}

/// One entry of an article's section outline.
///
/// `id` is the upstream anchor verbatim so in-page `#fragment` links keep
/// working; `level` is the heading nesting depth (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Anchor identifier, taken verbatim from the upstream `anchor` field
    pub id: String,
    /// Heading nesting depth (positive)
    pub level: u32,
    /// Heading text
    pub text: String,
}

/// A short article summary as returned by featured/extract queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// Article title
    pub title: String,
    /// Plain-text intro extract
    pub extract: String,
    /// Lead image URL, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ArticleSummary {
    /// Get a preview of the extract (first N characters, cut at a word end)
    pub fn preview(&self, max_chars: usize) -> &str {
        if self.extract.len() <= max_chars {
            &self.extract
        } else {
            let mut end = max_chars;
            while end > 0 && !self.extract.is_char_boundary(end) {
                end -= 1;
            }
            if let Some(space_pos) = self.extract[..end].rfind(' ') {
                &self.extract[..space_pos]
            } else {
                &self.extract[..end]
            }
        }
    }
}

/// One full-text search hit, in upstream relevance order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Upstream page ID
    pub page_id: u64,
    /// Article title
    pub title: String,
    /// Snippet with upstream highlight markup
    pub snippet: String,
}

/// A member of a listing category (current events, on-this-day)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Article title
    pub title: String,
    /// Timestamp of the category membership, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One revision from an article's edit history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    /// When the edit was made
    pub timestamp: DateTime<Utc>,
    /// Editor name or IP
    pub user: String,
    /// Edit summary, empty when the editor left none
    #[serde(default)]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(extract: &str) -> ArticleSummary {
        ArticleSummary {
            title: "Test".to_string(),
            extract: extract.to_string(),
            image: None,
        }
    }

    #[test]
    fn test_preview_short_text() {
        let s = summary("short text");
        assert_eq!(s.preview(100), "short text");
    }

    #[test]
    fn test_preview_cuts_at_word() {
        let s = summary("one two three four");
        assert_eq!(s.preview(9), "one two");
    }

    #[test]
    fn test_preview_respects_char_boundary() {
        let s = summary("日本語のテキスト");
        // 4 is mid-character for 3-byte glyphs; must not panic
        let p = s.preview(4);
        assert!(s.extract.starts_with(p));
    }

    #[test]
    fn test_word_count_ignores_markup() {
        let article = Article {
            title: "T".to_string(),
            content: "<p>two <b>words</b></p>".to_string(),
            sections: vec![],
            categories: vec![],
            image: None,
            url: String::new(),
            last_modified: None,
        };
        assert_eq!(article.word_count(), 2);
    }
}
