//! Studypedia Web Server
//!
//! Browse Wikipedia through a local reader with AI-powered study tools.
//!
//! # Examples
//!
//! Serve with default settings:
//! ```bash
//! studypedia-serve
//! ```
//!
//! Specify edition and port:
//! ```bash
//! STUDYPEDIA_GEMINI_KEY=... studypedia-serve --lang de --port 3000
//! ```

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::EnvFilter;

use studypedia::{
    rewrite_wiki_links, Article, Config, Error, Flashcard, StudyClient, StudyConfig, SummaryPair,
    WikiClient, WikiLanguage,
};

#[derive(Parser)]
#[command(name = "studypedia-serve")]
#[command(author, version, about = "Browse Wikipedia with AI study tools")]
#[command(long_about = r#"
Serve a Wikipedia reader backed by the public Wikipedia API.

Articles, search and home-page listings are fetched live from the upstream
wiki. With a Gemini API key in the environment (STUDYPEDIA_GEMINI_KEY or
GEMINI_API_KEY) the server also offers TL;DR/ELI5 summaries and flashcard
generation; without one, those endpoints report that study tools are off.

EXAMPLES:
  Start with defaults (English Wikipedia, port 8080):
    studypedia-serve

  Another edition:
    studypedia-serve --lang fr

  Bind to all interfaces:
    studypedia-serve --host 0.0.0.0 --port 3000
"#)]
struct Cli {
    /// Wikipedia edition to read from
    #[arg(short, long, default_value = "en")]
    lang: WikiLanguage,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Application state shared across handlers
struct AppState {
    /// Wikipedia gateway
    wiki: WikiClient,
    /// Study client; `None` when no API key is configured
    study: Option<StudyClient>,
    /// Edition display name for templates
    edition: String,
}

type SharedState = Arc<AppState>;

/// Wraps library errors for axum, mapping the taxonomy to HTTP statuses
struct AppError(Error);

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::ArticleNotFound(_) => StatusCode::NOT_FOUND,
            Error::Network(_) | Error::Status(_) | Error::UpstreamFormat(_) | Error::AiParse(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        if status.is_server_error() {
            tracing::warn!("request failed: {}", self.0);
        }
        (status, self.0.to_string()).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("studypedia=debug,tower_http=debug,info")
    } else {
        EnvFilter::new("studypedia=info,warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::new().with_language(cli.lang);
    let wiki = WikiClient::with_config(config)?;

    let study = match StudyConfig::from_env() {
        Some(study_config) => {
            tracing::info!("Study tools enabled (model: {})", study_config.model);
            Some(StudyClient::new(study_config)?)
        }
        None => {
            tracing::warn!("No Gemini API key found; study tools disabled");
            None
        }
    };

    let state: SharedState = Arc::new(AppState {
        wiki,
        study,
        edition: cli.lang.display_name().to_string(),
    });

    let app = Router::new()
        .route("/", get(home))
        .route("/article/:title", get(article_page))
        .route("/search", get(search_page))
        .route("/random", get(random_page))
        .route("/api/search", get(api_search))
        .route("/api/article/:title", get(api_article))
        .route("/api/article/:title/summary", get(api_summary))
        .route("/api/article/:title/flashcards", post(api_flashcards))
        .route("/api/article/:title/history", get(api_history))
        .route("/api/article/:title/categories", get(api_categories))
        .route("/api/featured", get(api_featured))
        .route("/api/news", get(api_news))
        .route("/api/on-this-day", get(api_on_this_day))
        .with_state(state);

    let csp = "default-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' https://upload.wikimedia.org data:;";
    let app = app
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("content-security-policy"),
            HeaderValue::from_str(csp).unwrap(),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = format!("{}:{}", cli.host, cli.port);
    tracing::info!("Server running at http://{}", addr);
    tracing::info!("Reading from {} Wikipedia", cli.lang.display_name());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// HTML Templates
// ============================================================================

/// Escape text destined for an HTML template
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn article_href(title: &str) -> String {
    format!("/article/{}", urlencoding::encode(title))
}

fn base_html(title: &str, content: &str, edition: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Studypedia</title>
    <style>
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: Georgia, 'Times New Roman', serif;
            background: #f8f9fa;
            color: #202122;
            line-height: 1.6;
        }}
        .container {{ max-width: 960px; margin: 0 auto; padding: 0 20px 40px; }}
        header {{
            background: #fff;
            border-bottom: 1px solid #a2a9b1;
            padding: 12px 0;
            margin-bottom: 24px;
        }}
        .header-inner {{
            max-width: 960px;
            margin: 0 auto;
            padding: 0 20px;
            display: flex;
            align-items: center;
            justify-content: space-between;
            gap: 16px;
        }}
        .logo {{ font-size: 1.4rem; font-weight: 700; color: #202122; text-decoration: none; }}
        .logo span {{ color: #3366cc; }}
        .search-form {{ flex: 1; max-width: 380px; display: flex; gap: 6px; }}
        .search-input {{
            flex: 1;
            padding: 6px 10px;
            border: 1px solid #a2a9b1;
            border-radius: 2px;
            font-size: 0.95rem;
        }}
        .nav-links a {{ color: #3366cc; text-decoration: none; margin-left: 12px; }}
        h1 {{ font-weight: 400; font-size: 2.2rem; border-bottom: 1px solid #a2a9b1; margin-bottom: 0.5em; }}
        h2 {{ font-weight: 400; font-size: 1.5rem; border-bottom: 1px solid #a2a9b1; margin: 0.8em 0 0.4em; }}
        a {{ color: #0645ad; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        .panel {{
            background: #fff;
            border: 1px solid #a2a9b1;
            padding: 16px;
            margin-bottom: 20px;
        }}
        .panel-title {{
            font-weight: 700;
            background: #eaf3e2;
            border-bottom: 1px solid #a2a9b1;
            margin: -16px -16px 12px;
            padding: 6px 12px;
        }}
        .panel-title.news {{ background: #cedff2; }}
        .muted {{ color: #72777d; font-size: 0.9rem; }}
        .error {{ color: #d33; }}
        ul.listing {{ margin-left: 1.4em; }}
        .toc {{ background: #f8f9fa; border: 1px solid #a2a9b1; padding: 10px 16px; margin-bottom: 16px; display: inline-block; }}
        .categories {{ border-top: 1px solid #a2a9b1; margin-top: 24px; padding-top: 8px; font-size: 0.9rem; }}
        .article-body img {{ max-width: 100%; height: auto; }}
        .article-body .infobox {{ float: right; clear: right; margin: 0 0 1em 1em; border: 1px solid #a2a9b1; background: #f8f9fa; font-size: 88%; }}
    </style>
</head>
<body>
    <header>
        <div class="header-inner">
            <a href="/" class="logo">Study<span>pedia</span></a>
            <form class="search-form" action="/search" method="get">
                <input class="search-input" type="search" name="q" placeholder="Search {edition} Wikipedia" required>
            </form>
            <nav class="nav-links">
                <a href="/random">Random</a>
            </nav>
        </div>
    </header>
    <div class="container">
        {content}
    </div>
</body>
</html>"#,
        title = html_escape(title),
        edition = html_escape(edition),
        content = content,
    )
}

// ============================================================================
// Page handlers
// ============================================================================

/// Home page: featured article, news and on-this-day fetched concurrently.
/// Each section tolerates its own failure; one slow or broken listing never
/// blanks the others.
async fn home(State(state): State<SharedState>) -> Html<String> {
    let (featured, news, on_this_day) = tokio::join!(
        state.wiki.get_featured_articles(),
        state.wiki.get_news(),
        state.wiki.get_on_this_day(),
    );

    let featured_html = match featured {
        Ok(summaries) if !summaries.is_empty() => {
            let lead = &summaries[0];
            let mut html = format!(
                r#"<p><a href="{}"><b>{}</b></a></p><p>{}</p>"#,
                article_href(&lead.title),
                html_escape(&lead.title),
                html_escape(lead.preview(600)),
            );
            if summaries.len() > 1 {
                html.push_str("<ul class=\"listing\">");
                for summary in &summaries[1..] {
                    html.push_str(&format!(
                        r#"<li><a href="{}">{}</a></li>"#,
                        article_href(&summary.title),
                        html_escape(&summary.title),
                    ));
                }
                html.push_str("</ul>");
            }
            html
        }
        Ok(_) => "<p class=\"muted\">Nothing featured right now.</p>".to_string(),
        Err(e) => {
            tracing::warn!("featured listing failed: {}", e);
            "<p class=\"error\">Featured articles are unavailable.</p>".to_string()
        }
    };

    let listing_html = |entries: studypedia::Result<Vec<studypedia::CategoryEntry>>, what: &str| {
        match entries {
            Ok(entries) if !entries.is_empty() => {
                let items: String = entries
                    .iter()
                    .map(|entry| {
                        format!(
                            r#"<li><a href="{}">{}</a></li>"#,
                            article_href(&entry.title),
                            html_escape(&entry.title),
                        )
                    })
                    .collect();
                format!("<ul class=\"listing\">{}</ul>", items)
            }
            Ok(_) => format!("<p class=\"muted\">No {} entries.</p>", what),
            Err(e) => {
                tracing::warn!("{} listing failed: {}", what, e);
                format!("<p class=\"error\">The {} listing is unavailable.</p>", what)
            }
        }
    };

    let content = format!(
        r#"<h1>Welcome to Studypedia</h1>
<p class="muted">A reader for the free encyclopedia, with study tools on the side.</p>
<div class="panel"><div class="panel-title">From the featured articles</div>{}</div>
<div class="panel"><div class="panel-title news">In the news</div>{}</div>
<div class="panel"><div class="panel-title news">On this day</div>{}</div>"#,
        featured_html,
        listing_html(news, "news"),
        listing_html(on_this_day, "on-this-day"),
    );

    Html(base_html("Home", &content, &state.edition))
}

fn render_article(article: &Article, state: &AppState) -> Html<String> {
    let mut content = format!("<h1>{}</h1>", html_escape(&article.title));

    if let Some(modified) = &article.last_modified {
        content.push_str(&format!(
            "<p class=\"muted\">Last modified {}</p>",
            modified.format("%Y-%m-%d %H:%M UTC"),
        ));
    }

    if !article.sections.is_empty() {
        content.push_str("<div class=\"toc\"><b>Contents</b><ul class=\"listing\">");
        for section in &article.sections {
            content.push_str(&format!(
                r##"<li style="margin-left: {}em"><a href="#{}">{}</a></li>"##,
                section.level.saturating_sub(1),
                html_escape(&section.id),
                html_escape(&section.text),
            ));
        }
        content.push_str("</ul></div>");
    }

    content.push_str(&format!(
        "<div class=\"article-body\">{}</div>",
        rewrite_wiki_links(&article.content),
    ));

    if !article.categories.is_empty() {
        let cats: Vec<String> = article.categories.iter().map(|c| html_escape(c)).collect();
        content.push_str(&format!(
            "<div class=\"categories\"><b>Categories:</b> {}</div>",
            cats.join(" | "),
        ));
    }

    if !article.url.is_empty() {
        content.push_str(&format!(
            "<p class=\"muted\"><a href=\"{}\">View on Wikipedia</a></p>",
            html_escape(&article.url),
        ));
    }

    Html(base_html(&article.title, &content, &state.edition))
}

async fn article_page(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<Html<String>, Response> {
    match state.wiki.get_article(&title).await {
        Ok(article) => Ok(render_article(&article, &state)),
        Err(Error::ArticleNotFound(title)) => {
            let content = format!(
                "<h1>Article not found</h1><p>No article named <b>{}</b> exists. <a href=\"/search?q={}\">Search instead?</a></p>",
                html_escape(&title),
                urlencoding::encode(&title),
            );
            Err((
                StatusCode::NOT_FOUND,
                Html(base_html("Not found", &content, &state.edition)),
            )
                .into_response())
        }
        Err(e) => Err(AppError(e).into_response()),
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

async fn search_page(
    State(state): State<SharedState>,
    Query(params): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let results = state.wiki.search(&params.q).await?;

    let mut content = format!("<h1>Search results for \"{}\"</h1>", html_escape(&params.q));
    if results.is_empty() {
        content.push_str(&format!(
            "<p>No results found for \"{}\". Try a different search term.</p>",
            html_escape(&params.q),
        ));
    } else {
        content.push_str("<ul class=\"listing\">");
        for result in &results {
            // snippets carry upstream highlight markup and render as-is
            content.push_str(&format!(
                r#"<li><a href="{}">{}</a><br><span class="muted">{}</span></li>"#,
                article_href(&result.title),
                html_escape(&result.title),
                result.snippet,
            ));
        }
        content.push_str("</ul>");
    }

    Ok(Html(base_html("Search", &content, &state.edition)))
}

async fn random_page(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let article = state.wiki.get_random_article().await?;
    Ok(render_article(&article, &state))
}

// ============================================================================
// JSON API handlers
// ============================================================================

async fn api_search(
    State(state): State<SharedState>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.wiki.search(&params.q).await?))
}

async fn api_article(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut article = state.wiki.get_article(&title).await?;
    article.content = rewrite_wiki_links(&article.content);
    Ok(Json(article))
}

/// Summary response: empty fields plus a message when generation fails,
/// rather than an error status. The article itself never depends on this.
#[derive(Serialize)]
struct SummaryResponse {
    #[serde(flatten)]
    summary: SummaryPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn study_client(state: &AppState) -> Result<&StudyClient, Response> {
    state.study.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "study tools are disabled: no Gemini API key configured",
        )
            .into_response()
    })
}

async fn api_summary(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let study = study_client(&state)?;
    let article = state
        .wiki
        .get_article(&title)
        .await
        .map_err(|e| AppError(e).into_response())?;

    let response = match study.summarize(&article.content).await {
        Ok(summary) => SummaryResponse { summary, error: None },
        Err(e) => {
            tracing::warn!("summary generation failed for {:?}: {}", title, e);
            SummaryResponse {
                summary: SummaryPair::default(),
                error: Some(format!("Could not generate summaries: {}", e)),
            }
        }
    };
    Ok(Json(response))
}

/// Flashcard response: a failed generation is reported distinctly from the
/// model returning zero cards.
#[derive(Serialize)]
struct FlashcardResponse {
    cards: Vec<Flashcard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn api_flashcards(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let study = study_client(&state)?;
    let article = state
        .wiki
        .get_article(&title)
        .await
        .map_err(|e| AppError(e).into_response())?;

    let response = match study.generate_flashcards(&article.content).await {
        Ok(cards) => FlashcardResponse { cards, error: None },
        Err(e) => {
            tracing::warn!("flashcard generation failed for {:?}: {}", title, e);
            FlashcardResponse {
                cards: Vec::new(),
                error: Some(format!("Could not generate flashcards: {}", e)),
            }
        }
    };
    Ok(Json(response))
}

async fn api_history(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.wiki.get_article_history(&title).await?))
}

async fn api_categories(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.wiki.get_categories(&title).await?))
}

async fn api_featured(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.wiki.get_featured_articles().await?))
}

async fn api_news(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.wiki.get_news().await?))
}

async fn api_on_this_day(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.wiki.get_on_this_day().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#x27;");
    }

    #[test]
    fn test_article_href_encodes_title() {
        assert_eq!(article_href("Foo Bar"), "/article/Foo%20Bar");
    }
}
