//! AI summaries and flashcards via the Gemini generateContent API
//!
//! The model is asked for a constrained JSON shape and usually complies,
//! modulo a markdown code fence around the payload. Parsing is therefore a
//! two-step affair: pull the completion text out of the response envelope,
//! then attempt a typed JSON parse of the (de-fenced) text. Any failure along
//! the way is an [`Error::AiParse`] the caller converts to placeholder data;
//! article rendering never waits on or fails with these calls.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::StudyConfig;
use crate::error::{Error, Result};
use crate::rewrite::plain_text;

/// TL;DR and ELI5 summaries of one article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryPair {
    /// Short factual summary
    pub tldr: String,
    /// Simplified explanation
    pub eli5: String,
}

/// One question/answer study card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// Number of flashcards requested per generation
pub const FLASHCARD_COUNT: usize = 10;

/// Strip a markdown code fence the model may wrap around its JSON
fn strip_code_fence(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Attempt to parse a model completion as the requested JSON shape.
///
/// This is the single typed parse step for every study operation; it never
/// touches the network and is tested on its own.
pub fn parse_completion<T: DeserializeOwned>(text: &str) -> Result<T> {
    let cleaned = strip_code_fence(text);
    serde_json::from_str(&cleaned)
        .map_err(|e| Error::AiParse(format!("completion is not the requested JSON: {}", e)))
}

/// Pull the completion text out of a generateContent response envelope
fn extract_completion(raw: &Value) -> Result<String> {
    raw.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(String::from)
        .ok_or_else(|| Error::AiParse("response has no completion text".to_string()))
}

fn summary_prompt(article_text: &str) -> String {
    format!(
        "Generate a TL;DR summary and an ELI5 (Explain Like I'm 5) version of the \
         following article. Keep the length such that anyone can learn with that \
         amount of text. Return as JSON: {{\"tldr\": \"...\", \"eli5\": \"...\"}}\n\n\
         Article:\n{}",
        article_text
    )
}

fn flashcard_prompt(article_text: &str) -> String {
    format!(
        "Generate {} learning flashcards (question and answer pairs) from the \
         following article. Return as a JSON array with objects: \
         {{\"question\": \"...\", \"answer\": \"...\"}}.\n\n\
         Article:\n{}",
        FLASHCARD_COUNT, article_text
    )
}

/// Client for the generative-language endpoint
pub struct StudyClient {
    http: reqwest::Client,
    config: StudyConfig,
}

impl std::fmt::Debug for StudyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyClient").field("config", &self.config).finish()
    }
}

impl StudyClient {
    /// Create a client; fails only if the underlying HTTP client cannot build
    pub fn new(config: StudyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    /// One prompt in, one completion text out
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
        });

        let response = self
            .http
            .post(self.request_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let raw: Value = response.json().await?;
        extract_completion(&raw)
    }

    /// Generate TL;DR and ELI5 summaries for rendered article HTML.
    ///
    /// The whole article body goes into the prompt as plain text; there is no
    /// token budget, only the request timeout.
    pub async fn summarize(&self, content_html: &str) -> Result<SummaryPair> {
        let completion = self.complete(&summary_prompt(&plain_text(content_html))).await?;
        let pair: SummaryPair = parse_completion(&completion)?;
        tracing::debug!("summary generated ({} + {} chars)", pair.tldr.len(), pair.eli5.len());
        Ok(pair)
    }

    /// Generate a flashcard set for rendered article HTML.
    ///
    /// A failed call or unparseable completion is an `Err`, distinct from the
    /// model legitimately returning zero cards.
    pub async fn generate_flashcards(&self, content_html: &str) -> Result<Vec<Flashcard>> {
        let completion = self.complete(&flashcard_prompt(&plain_text(content_html))).await?;
        let cards: Vec<Flashcard> = parse_completion(&completion)?;
        tracing::debug!("generated {} flashcards", cards.len());
        Ok(cards)
    }
}

/// Browsing state for one flashcard session.
///
/// Idle → Generating → Ready(cards, index 0); next/previous wrap around in
/// both directions; dismiss returns to Idle. A generation error returns to
/// Idle with the message retained until the next request.
#[derive(Debug, Clone, Default)]
pub struct FlashcardDeck {
    state: DeckState,
    error: Option<String>,
}

#[derive(Debug, Clone, Default)]
enum DeckState {
    #[default]
    Idle,
    Generating,
    Ready {
        cards: Vec<Flashcard>,
        index: usize,
    },
}

impl FlashcardDeck {
    /// A fresh, idle deck
    pub fn new() -> Self {
        Self::default()
    }

    /// A generation request was issued; clears any previous error
    pub fn begin(&mut self) {
        self.error = None;
        self.state = DeckState::Generating;
    }

    /// Feed the outcome of a generation call into the deck
    pub fn resolve(&mut self, outcome: Result<Vec<Flashcard>>) {
        match outcome {
            Ok(cards) => self.state = DeckState::Ready { cards, index: 0 },
            Err(e) => {
                self.error = Some(e.to_string());
                self.state = DeckState::Idle;
            }
        }
    }

    /// Advance to the next card, wrapping past the last back to the first
    pub fn next(&mut self) {
        if let DeckState::Ready { cards, index } = &mut self.state {
            if !cards.is_empty() {
                *index = (*index + 1) % cards.len();
            }
        }
    }

    /// Retreat to the previous card, wrapping past the first to the last
    pub fn previous(&mut self) {
        if let DeckState::Ready { cards, index } = &mut self.state {
            if !cards.is_empty() {
                *index = (*index + cards.len() - 1) % cards.len();
            }
        }
    }

    /// The card currently shown, with its position and the deck size
    pub fn current(&self) -> Option<(&Flashcard, usize, usize)> {
        match &self.state {
            DeckState::Ready { cards, index } => {
                cards.get(*index).map(|card| (card, *index, cards.len()))
            }
            _ => None,
        }
    }

    /// Close the deck and return to idle
    pub fn dismiss(&mut self) {
        self.state = DeckState::Idle;
    }

    /// Whether a generation call is in flight
    pub fn is_generating(&self) -> bool {
        matches!(self.state, DeckState::Generating)
    }

    /// The last generation error, retained until the next request
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_fenced_object() {
        let completion = "```json\n{\"tldr\": \"Short.\", \"eli5\": \"Simple.\"}\n```";
        let pair: SummaryPair = parse_completion(completion).unwrap();
        assert_eq!(pair.tldr, "Short.");
        assert_eq!(pair.eli5, "Simple.");
    }

    #[test]
    fn test_parse_completion_unfenced() {
        let pair: SummaryPair =
            parse_completion("{\"tldr\": \"a\", \"eli5\": \"b\"}").unwrap();
        assert_eq!(pair.tldr, "a");
    }

    #[test]
    fn test_parse_completion_malformed_is_error_not_panic() {
        let result: Result<SummaryPair> = parse_completion("Sorry, I can't do that.");
        assert!(matches!(result, Err(Error::AiParse(_))));
    }

    #[test]
    fn test_parse_completion_flashcard_array_in_order() {
        let inner = (0..10)
            .map(|i| format!("{{\"question\": \"q{}\", \"answer\": \"a{}\"}}", i, i))
            .collect::<Vec<_>>()
            .join(",");
        let completion = format!("```json\n[{}]\n```", inner);
        let cards: Vec<Flashcard> = parse_completion(&completion).unwrap();
        assert_eq!(cards.len(), 10);
        assert_eq!(cards[0].question, "q0");
        assert_eq!(cards[9].answer, "a9");
    }

    #[test]
    fn test_extract_completion() {
        let raw = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "hello"}]}}]
        });
        assert_eq!(extract_completion(&raw).unwrap(), "hello");

        let empty = serde_json::json!({"candidates": []});
        assert!(matches!(extract_completion(&empty), Err(Error::AiParse(_))));
    }

    #[test]
    fn test_prompts_embed_plain_text() {
        let prompt = summary_prompt("Cats are small felines.");
        assert!(prompt.contains("Cats are small felines."));
        assert!(prompt.contains("\"tldr\""));

        let prompt = flashcard_prompt("body");
        assert!(prompt.contains("10 learning flashcards"));
    }

    fn ten_cards() -> Vec<Flashcard> {
        (0..10)
            .map(|i| Flashcard {
                question: format!("q{}", i),
                answer: format!("a{}", i),
            })
            .collect()
    }

    #[test]
    fn test_deck_happy_path_and_wraparound() {
        let mut deck = FlashcardDeck::new();
        assert!(deck.current().is_none());

        deck.begin();
        assert!(deck.is_generating());

        deck.resolve(Ok(ten_cards()));
        let (card, index, len) = deck.current().unwrap();
        assert_eq!((card.question.as_str(), index, len), ("q0", 0, 10));

        // previous from 0 wraps to 9
        deck.previous();
        assert_eq!(deck.current().unwrap().1, 9);

        // next from 9 wraps to 0
        deck.next();
        assert_eq!(deck.current().unwrap().1, 0);
    }

    #[test]
    fn test_deck_error_retained_until_next_request() {
        let mut deck = FlashcardDeck::new();
        deck.begin();
        deck.resolve(Err(Error::AiParse("bad completion".to_string())));

        assert!(!deck.is_generating());
        assert!(deck.current().is_none());
        assert!(deck.error().unwrap().contains("bad completion"));

        deck.begin();
        assert!(deck.error().is_none());
    }

    #[test]
    fn test_deck_zero_cards_is_ready_not_error() {
        let mut deck = FlashcardDeck::new();
        deck.begin();
        deck.resolve(Ok(vec![]));
        assert!(deck.error().is_none());
        assert!(deck.current().is_none());
        // navigation on an empty deck is a no-op
        deck.next();
        deck.previous();
        assert!(deck.current().is_none());
    }

    #[test]
    fn test_deck_dismiss_returns_to_idle() {
        let mut deck = FlashcardDeck::new();
        deck.begin();
        deck.resolve(Ok(ten_cards()));
        deck.dismiss();
        assert!(deck.current().is_none());
        assert!(!deck.is_generating());
    }
}
