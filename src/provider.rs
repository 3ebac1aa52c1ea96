//! Fetching typing material from the web.
//!
//! A provider turns a URL into a title and a body. The HTTP implementation
//! scrapes a page with CSS selectors and strips it down to plain letters,
//! digits and whitespace so the result is typeable.

use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SUPPORTED_HOST: &str = "brunch.co.kr";
pub const DEFAULT_MAX_BODY_CHARS: usize = 500;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid url: {0}")]
    InvalidInput(String),
    #[error("only pages from {0} are supported")]
    UnsupportedSource(String),
    #[error("could not extract text: {0}")]
    ExtractionFailed(String),
    #[error("failed to fetch page: {0}")]
    TransportOrServerError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub title: String,
    pub body: String,
}

impl ExtractedText {
    /// Title, a blank separator line, then the body
    pub fn compose(&self) -> String {
        format!("{}\n\n{}", self.title, self.body)
    }
}

/// Source of typing material
pub trait TextProvider: Send + Sync {
    fn extract_text(&self, url: &str) -> Result<ExtractedText, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub supported_host: String,
    pub title_selector: String,
    pub body_selector: String,
    pub max_body_chars: Option<usize>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            supported_host: DEFAULT_SUPPORTED_HOST.to_string(),
            title_selector: ".cover_title".to_string(),
            body_selector: ".wrap_body".to_string(),
            max_body_chars: Some(DEFAULT_MAX_BODY_CHARS),
        }
    }
}

/// Check that `raw` is an http(s) URL on the supported host or one of its subdomains.
pub fn validate_url(raw: &str, supported_host: &str) -> Result<Url, ProviderError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ProviderError::InvalidInput("a url is required".to_string()));
    }

    let url = Url::parse(raw).map_err(|e| ProviderError::InvalidInput(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProviderError::InvalidInput(format!(
            "unsupported scheme {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| ProviderError::InvalidInput("url has no host".to_string()))?;
    let subdomain_suffix = format!(".{supported_host}");
    if host != supported_host && !host.ends_with(&subdomain_suffix) {
        return Err(ProviderError::UnsupportedSource(supported_host.to_string()));
    }

    Ok(url)
}

fn is_typeable(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c.is_whitespace()
        // hangul syllables and compatibility jamo
        || matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{3131}'..='\u{3163}')
}

/// Drop punctuation and symbols, collapse whitespace runs to single spaces.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| is_typeable(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_text(document: &Html, selector: &str) -> Result<String, ProviderError> {
    let parsed = Selector::parse(selector).map_err(|e| {
        ProviderError::ExtractionFailed(format!("invalid selector {selector}: {e:?}"))
    })?;

    let raw: String = document
        .select(&parsed)
        .flat_map(|element| element.text())
        .collect();

    Ok(sanitize(&raw))
}

/// Pull title and body out of a fetched page.
pub fn extract_from_html(
    html: &str,
    config: &ProviderConfig,
) -> Result<ExtractedText, ProviderError> {
    let document = Html::parse_document(html);
    let title = select_text(&document, &config.title_selector)?;
    let mut body = select_text(&document, &config.body_selector)?;

    if title.is_empty() || body.is_empty() {
        return Err(ProviderError::ExtractionFailed(
            "page has no title or body".to_string(),
        ));
    }

    if let Some(max) = config.max_body_chars {
        if body.chars().count() > max {
            body = body.chars().take(max).collect::<String>().trim_end().to_string();
        }
    }

    Ok(ExtractedText { title, body })
}

/// Scrapes pages over HTTP with a blocking client.
/// Meant to be called off the UI thread; there is no timeout and no retry.
#[derive(Debug, Clone)]
pub struct HttpTextProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpTextProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::TransportOrServerError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

impl TextProvider for HttpTextProvider {
    fn extract_text(&self, url: &str) -> Result<ExtractedText, ProviderError> {
        let url = validate_url(url, &self.config.supported_host)?;
        info!("fetching {url}");

        let html = self
            .client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| ProviderError::TransportOrServerError(e.to_string()))?;

        let extracted = extract_from_html(&html, &self.config);
        match &extracted {
            Ok(text) => info!(
                "extracted {} title chars and {} body chars from {url}",
                text.title.chars().count(),
                text.body.chars().count()
            ),
            Err(e) => warn!("extraction from {url} failed: {e}"),
        }
        extracted
    }
}
