use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which combination of extraction stages produced a [`PageContent`].
///
/// Serialised as the kebab-case tags the bookmark API stores
/// (`server-side`, `client-readability`, `client-readability-html`,
/// `client-html`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Nothing was extracted locally; the link alone is handed over.
    ServerSide,
    ClientReadability,
    ClientReadabilityHtml,
    ClientHtml,
}

impl ExtractionMethod {
    /// The tag after cleaned HTML has been attached.
    ///
    /// ```
    /// use pagekeep_common::ExtractionMethod;
    ///
    /// assert_eq!(
    ///     ExtractionMethod::ClientReadability.with_html(),
    ///     ExtractionMethod::ClientReadabilityHtml
    /// );
    /// assert_eq!(ExtractionMethod::ServerSide.with_html(), ExtractionMethod::ClientHtml);
    /// ```
    pub fn with_html(self) -> Self {
        match self {
            Self::ClientReadability | Self::ClientReadabilityHtml => Self::ClientReadabilityHtml,
            Self::ServerSide | Self::ClientHtml => Self::ClientHtml,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerSide => "server-side",
            Self::ClientReadability => "client-readability",
            Self::ClientReadabilityHtml => "client-readability-html",
            Self::ClientHtml => "client-html",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the HTML for a request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMode {
    /// Fetch the page over HTTP before extracting.
    #[default]
    ServerSide,
    /// The HTML was captured from an already-loaded page and is supplied inline.
    Client,
}

/// The single inbound request shape of the pipeline.
///
/// ```
/// use pagekeep_common::{CaptureMode, ExtractRequest};
///
/// let req: ExtractRequest = serde_json::from_str(
///     r#"{"url":"https://example.com","html":"<p>hi</p>","mode":"client"}"#,
/// ).unwrap();
/// assert_eq!(req.mode, CaptureMode::Client);
/// assert!(req.capture_full_content);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub url: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub mode: CaptureMode,
    /// Run the readability stage. Normalization runs regardless.
    #[serde(default = "default_capture_full_content")]
    pub capture_full_content: bool,
}

fn default_capture_full_content() -> bool {
    true
}

impl ExtractRequest {
    pub fn server_side(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: None,
            mode: CaptureMode::ServerSide,
            capture_full_content: true,
        }
    }

    pub fn client(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: Some(html.into()),
            mode: CaptureMode::Client,
            capture_full_content: true,
        }
    }

    pub fn without_full_content(mut self) -> Self {
        self.capture_full_content = false;
        self
    }
}

/// The record returned to the caller, ready to be posted to the bookmark API.
///
/// `link` is always the request URL. Every content field is optional and is
/// omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub link: String,
    pub extraction_method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
}

/// Coarse outcome a UI can report after saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// Article fields and cleaned HTML are both present.
    Full,
    /// One of the two local stages succeeded.
    Partial,
    /// Only the link is available; the server has to fetch the page itself.
    LinkOnly,
}

impl PageContent {
    /// The baseline record: the link tagged `server-side`, nothing else.
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            extraction_method: ExtractionMethod::ServerSide,
            title: None,
            excerpt: None,
            lang: None,
            site_name: None,
            published_time: None,
            text_content: None,
            html_content: None,
        }
    }

    pub fn has_article(&self) -> bool {
        matches!(
            self.extraction_method,
            ExtractionMethod::ClientReadability | ExtractionMethod::ClientReadabilityHtml
        )
    }

    pub fn completeness(&self) -> Completeness {
        match self.extraction_method {
            ExtractionMethod::ClientReadabilityHtml => Completeness::Full,
            ExtractionMethod::ClientReadability | ExtractionMethod::ClientHtml => {
                Completeness::Partial
            }
            ExtractionMethod::ServerSide => Completeness::LinkOnly,
        }
    }
}
