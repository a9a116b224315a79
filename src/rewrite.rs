//! HTML post-processing for server-supplied article markup

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex patterns for HTML post-processing (compiled once)
static WIKI_HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href=(['"])/wiki/"#).unwrap());
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<!--.*?-->").unwrap());
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static MULTI_NEWLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Rewrite upstream `/wiki/` anchor hrefs to the local `/article/` route.
///
/// Only hrefs whose path begins with `/wiki/` immediately after the opening
/// quote are touched; the title segment and any trailing fragment or query
/// survive byte-for-byte. Both quote styles are handled. External links,
/// bare fragments and mailto hrefs pass through unchanged, and a second
/// application finds no remaining `/wiki/` prefixes, so the transform is
/// idempotent.
pub fn rewrite_wiki_links(html: &str) -> String {
    WIKI_HREF_RE.replace_all(html, "href=${1}/article/").into_owned()
}

/// Reduce rendered article HTML to plain text.
///
/// Strips comments and tags, decodes the handful of entities the upstream
/// renderer emits, and collapses runs of whitespace. Used to build the
/// generative-API prompts, where markup is noise.
pub fn plain_text(html: &str) -> String {
    let mut result = COMMENT_RE.replace_all(html, " ").to_string();
    result = HTML_TAG_RE.replace_all(&result, " ").to_string();

    result = result
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");

    result = MULTI_SPACE_RE.replace_all(&result, " ").to_string();
    result = MULTI_NEWLINE_RE.replace_all(&result, "\n\n").to_string();

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_double_quoted_href() {
        let input = r#"<a href="/wiki/Foo_Bar">Foo Bar</a>"#;
        let result = rewrite_wiki_links(input);
        assert_eq!(result, r#"<a href="/article/Foo_Bar">Foo Bar</a>"#);
    }

    #[test]
    fn test_rewrite_single_quoted_href() {
        let input = "<a href='/wiki/Foo'>Foo</a>";
        assert_eq!(rewrite_wiki_links(input), "<a href='/article/Foo'>Foo</a>");
    }

    #[test]
    fn test_rewrite_preserves_fragment_and_query() {
        let input = r#"<a href="/wiki/Foo#History">Foo</a> <a href="/wiki/Bar?x=1">Bar</a>"#;
        let result = rewrite_wiki_links(input);
        assert!(result.contains(r#"href="/article/Foo#History""#));
        assert!(result.contains(r#"href="/article/Bar?x=1""#));
    }

    #[test]
    fn test_rewrite_leaves_other_hrefs_alone() {
        let input = concat!(
            r#"<a href="https://example.org/wiki/X">ext</a>"#,
            r##"<a href="#top">frag</a>"##,
            r#"<a href="mailto:a@b.c">mail</a>"#,
        );
        assert_eq!(rewrite_wiki_links(input), input);
    }

    #[test]
    fn test_rewrite_no_match_returns_input_unchanged() {
        let input = "<p>no links here</p>";
        assert_eq!(rewrite_wiki_links(input), input);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let input = r#"<a href="/wiki/Foo_Bar">Foo</a><a href="/wiki/Baz">Baz</a>"#;
        let once = rewrite_wiki_links(input);
        let twice = rewrite_wiki_links(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrite_only_alters_matching_hrefs() {
        let input = r#"<img src="/wiki/logo.png"><a href="/wiki/Foo">Foo</a>"#;
        let result = rewrite_wiki_links(input);
        // src attributes are not hrefs and stay untouched
        assert!(result.contains(r#"src="/wiki/logo.png""#));
        assert!(result.contains(r#"href="/article/Foo""#));
    }

    #[test]
    fn test_plain_text_strips_tags() {
        let input = "<p>Hello <b>world</b></p><!-- note -->";
        assert_eq!(plain_text(input), "Hello world");
    }

    #[test]
    fn test_plain_text_decodes_entities() {
        let input = "Tom &amp; Jerry &lt;3 &quot;cartoons&quot;";
        assert_eq!(plain_text(input), "Tom & Jerry <3 \"cartoons\"");
    }

    #[test]
    fn test_plain_text_collapses_whitespace() {
        let input = "a\t\t b   <span>c</span>";
        assert_eq!(plain_text(input), "a b c");
    }
}
