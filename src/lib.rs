//! # Studypedia
//!
//! Browse Wikipedia with AI-powered study tools.
//!
//! This crate provides the building blocks for an encyclopedia reader:
//! - Query the public Wikipedia API (search, articles, featured, news, history)
//! - Normalize the raw API payloads into typed article shapes
//! - Rewrite embedded wiki links so they resolve to local routes
//! - Generate TL;DR/ELI5 summaries and flashcards via a generative-language API
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the reader on port 8080 (Gemini key optional, enables study tools)
//! STUDYPEDIA_GEMINI_KEY=... studypedia-serve --port 8080
//! ```

pub mod article;
pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod rewrite;
pub mod study;

pub use article::{Article, ArticleSummary, CategoryEntry, Revision, SearchResult, Section};
pub use client::WikiClient;
pub use config::{Config, StudyConfig};
pub use error::{Error, Result};
pub use rewrite::{plain_text, rewrite_wiki_links};
pub use study::{Flashcard, FlashcardDeck, StudyClient, SummaryPair};

/// Supported Wikipedia languages/editions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WikiLanguage {
    /// English Wikipedia
    #[default]
    English,
    /// Simple English Wikipedia
    Simple,
    /// German Wikipedia
    German,
    /// French Wikipedia
    French,
    /// Spanish Wikipedia
    Spanish,
    /// Japanese Wikipedia
    Japanese,
    /// Russian Wikipedia
    Russian,
    /// Chinese Wikipedia
    Chinese,
    /// Italian Wikipedia
    Italian,
    /// Portuguese Wikipedia
    Portuguese,
}

impl WikiLanguage {
    /// Get the Wikipedia language code
    pub fn code(&self) -> &'static str {
        match self {
            WikiLanguage::English => "en",
            WikiLanguage::Simple => "simple",
            WikiLanguage::German => "de",
            WikiLanguage::French => "fr",
            WikiLanguage::Spanish => "es",
            WikiLanguage::Japanese => "ja",
            WikiLanguage::Russian => "ru",
            WikiLanguage::Chinese => "zh",
            WikiLanguage::Italian => "it",
            WikiLanguage::Portuguese => "pt",
        }
    }

    /// Get the query API endpoint for this edition
    pub fn api_url(&self) -> String {
        format!("https://{}.wikipedia.org/w/api.php", self.code())
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            WikiLanguage::English => "English",
            WikiLanguage::Simple => "Simple English",
            WikiLanguage::German => "German (Deutsch)",
            WikiLanguage::French => "French (Français)",
            WikiLanguage::Spanish => "Spanish (Español)",
            WikiLanguage::Japanese => "Japanese (日本語)",
            WikiLanguage::Russian => "Russian (Русский)",
            WikiLanguage::Chinese => "Chinese (中文)",
            WikiLanguage::Italian => "Italian (Italiano)",
            WikiLanguage::Portuguese => "Portuguese (Português)",
        }
    }

    /// Parse from string
    pub fn from_code(code: &str) -> Option<WikiLanguage> {
        match code.to_lowercase().as_str() {
            "en" | "english" => Some(WikiLanguage::English),
            "simple" => Some(WikiLanguage::Simple),
            "de" | "german" | "deutsch" => Some(WikiLanguage::German),
            "fr" | "french" | "français" => Some(WikiLanguage::French),
            "es" | "spanish" | "español" => Some(WikiLanguage::Spanish),
            "ja" | "japanese" | "日本語" => Some(WikiLanguage::Japanese),
            "ru" | "russian" | "русский" => Some(WikiLanguage::Russian),
            "zh" | "chinese" | "中文" => Some(WikiLanguage::Chinese),
            "it" | "italian" | "italiano" => Some(WikiLanguage::Italian),
            "pt" | "portuguese" | "português" => Some(WikiLanguage::Portuguese),
            _ => None,
        }
    }
}

impl std::fmt::Display for WikiLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for WikiLanguage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        WikiLanguage::from_code(s)
            .ok_or_else(|| format!("Unknown language: {}. Use one of: en, simple, de, fr, es, ja, ru, zh, it, pt", s))
    }
}
