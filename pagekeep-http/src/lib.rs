//! Page fetcher for server-side capture.
//!
//! - One GET per call with browser-like `User-Agent`/`Accept*` headers
//! - http(s) only; links are validated before any request is built
//! - Whole-request timeout reported as [`FetchError::Timeout`]
//! - No retries: a failed fetch is returned to the caller as-is
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), pagekeep_http::FetchError> {
//! use pagekeep_http::{HttpFetcher, PageFetcher, validate_link};
//!
//! let fetcher = HttpFetcher::new(&pagekeep_config::FetchConfig::default())?;
//! let url = validate_link("https://example.com/article")?;
//! let doc = fetcher.fetch(&url).await?;
//! println!("{} bytes of HTML", doc.html.len());
//! # Ok(()) }
//! ```
//!
//! Observability: `fetch.request.start`, `fetch.response` and `fetch.error`
//! events carry a per-request id, host+path and the redacted query string.
//! Bodies are never logged beyond a short `trace` snippet.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pagekeep_common::PagekeepError;
use pagekeep_config::FetchConfig;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_LENGTH, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use reqwest::{Client, redirect};
use thiserror::Error;
use url::Url;

pub use reqwest::StatusCode;

const MAX_LINK_LEN: usize = 2048;
const SNIPPET_LEN: usize = 300;

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("unsupported URL scheme `{0}`")]
    Scheme(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {cause}")]
    Status { status: StatusCode, cause: String },
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

impl FetchError {
    /// Short status tag: the HTTP code for status errors, otherwise a kind
    /// such as `timeout` or `network`.
    ///
    /// ```
    /// use pagekeep_http::{FetchError, StatusCode};
    /// use std::time::Duration;
    ///
    /// assert_eq!(FetchError::Timeout(Duration::from_secs(1)).status(), "timeout");
    /// let err = FetchError::Status {
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    ///     cause: "down".into(),
    /// };
    /// assert_eq!(err.status(), "503");
    /// ```
    pub fn status(&self) -> String {
        match self {
            Self::Url(_) | Self::Scheme(_) => "invalid-url".into(),
            Self::Build(_) => "build".into(),
            Self::Timeout(_) => "timeout".into(),
            Self::Network(_) => "network".into(),
            Self::Status { status, .. } => status.as_u16().to_string(),
            Self::TooLarge { .. } => "too-large".into(),
        }
    }
}

impl From<FetchError> for PagekeepError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Url(_) | FetchError::Scheme(_) => {
                PagekeepError::InvalidLink(err.to_string())
            }
            other => PagekeepError::Fetch {
                status: other.status(),
                cause: other.to_string(),
            },
        }
    }
}

// ==============================
// Documents & validation
// ==============================

/// Raw HTML plus the URL it was requested from.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// The URL the caller asked for.
    pub url: Url,
    /// Where redirects ended up; informational only.
    pub final_url: Url,
    /// `None` for HTML supplied by a client rather than fetched.
    pub status: Option<u16>,
    pub html: String,
}

impl RawDocument {
    /// Wrap HTML captured from an already-loaded page.
    pub fn from_html(url: Url, html: impl Into<String>) -> Self {
        Self {
            final_url: url.clone(),
            url,
            status: None,
            html: html.into(),
        }
    }
}

/// Parse and check a link before it is captured: absolute, http(s), with a
/// host, and at most 2048 characters.
///
/// ```
/// use pagekeep_http::validate_link;
///
/// assert!(validate_link("https://example.com/a?b=c").is_ok());
/// assert!(validate_link("ftp://example.com/file").is_err());
/// assert!(validate_link("").is_err());
/// ```
pub fn validate_link(link: &str) -> Result<Url, FetchError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(FetchError::Url("link is empty".into()));
    }
    if link.len() > MAX_LINK_LEN {
        return Err(FetchError::Url(format!(
            "link is longer than {MAX_LINK_LEN} characters"
        )));
    }
    let url = Url::parse(link).map_err(|e| FetchError::Url(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::Scheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::Url("link has no host".into()));
    }
    Ok(url)
}

// ==============================
// Fetcher
// ==============================

/// Anything that can turn a URL into raw HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<RawDocument, FetchError>;
}

/// reqwest-backed [`PageFetcher`].
#[derive(Clone)]
pub struct HttpFetcher {
    inner: Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Build a fetcher whose default headers mimic a desktop browser.
    pub fn new(cfg: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&cfg.user_agent)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&cfg.accept_language)?);
        headers.insert(ACCEPT, header_value(&cfg.accept)?);
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
        let inner = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs.max(1)))
            .timeout(timeout)
            .redirect(redirect::Policy::limited(cfg.max_redirects))
            .build()
            .map_err(|e| FetchError::Build(e.to_string()))?;

        Ok(Self {
            inner,
            timeout,
            max_body_bytes: cfg.max_body_bytes,
        })
    }

    /// Stream the body chunk by chunk, giving up as soon as it passes
    /// `max_body_bytes` whether or not a `Content-Length` was sent.
    async fn read_capped(&self, mut resp: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_body_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<RawDocument, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::Scheme(url.scheme().to_string()));
        }

        let req_id = uuid::Uuid::new_v4().simple().to_string();
        let (host_path, query) = redact_query(url);
        tracing::debug!(
            req_id=%req_id,
            host_path=%host_path,
            query=?query,
            timeout_ms=self.timeout.as_millis() as u64,
            "fetch.request.start"
        );

        let t0 = Instant::now();
        let resp = match self.inner.get(url.clone()).send().await {
            Ok(resp) => resp,
            Err(err) => {
                let err = self.classify(err);
                tracing::warn!(req_id=%req_id, host_path=%host_path, error=%err, "fetch.error");
                return Err(err);
            }
        };

        let status = resp.status();
        let final_url = resp.url().clone();
        let declared_len = content_len(resp.headers());
        if declared_len.is_some_and(|len| len > self.max_body_bytes) {
            let err = FetchError::TooLarge {
                limit: self.max_body_bytes,
            };
            tracing::warn!(req_id=%req_id, %status, declared_len=?declared_len, "fetch.error");
            return Err(err);
        }

        let bytes = match self.read_capped(resp).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(req_id=%req_id, %status, error=%err, "fetch.error");
                return Err(err);
            }
        };
        let duration_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms,
            body_len=bytes.len(),
            redirected=%(final_url != *url),
            "fetch.response"
        );
        tracing::trace!(req_id=%req_id, body_snippet=%snip_body(&bytes), "fetch.response.body_snippet");

        if !(status.is_success() || status.is_redirection()) {
            let cause = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| snip_body(&bytes));
            tracing::warn!(req_id=%req_id, %status, cause=%cause, "fetch.error");
            return Err(FetchError::Status { status, cause });
        }

        Ok(RawDocument {
            url: url.clone(),
            final_url,
            status: Some(status.as_u16()),
            html: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

// ==============================
// Helpers
// ==============================

fn header_value(raw: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(raw.trim())
        .map_err(|e| FetchError::Build(format!("invalid header value `{raw}`: {e}")))
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let is_secret = matches!(
                k.to_ascii_lowercase().as_str(),
                "access_token" | "auth" | "key" | "api_key" | "token" | "secret" | "sig"
            );
            let v = if is_secret {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    (host_path, redacted)
}

fn content_len(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut snip: String = text.chars().take(SNIPPET_LEN).collect();
    if text.chars().count() > SNIPPET_LEN {
        snip.push_str("...");
    }
    snip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_links_without_http_scheme() {
        assert!(matches!(
            validate_link("javascript:alert(1)"),
            Err(FetchError::Scheme(s)) if s == "javascript"
        ));
        assert!(matches!(
            validate_link("chrome://extensions"),
            Err(FetchError::Scheme(_))
        ));
    }

    #[test]
    fn rejects_overlong_and_relative_links() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_LINK_LEN));
        assert!(matches!(validate_link(&long), Err(FetchError::Url(_))));
        assert!(matches!(validate_link("/relative/path"), Err(FetchError::Url(_))));
    }

    #[test]
    fn redacts_secret_query_params() {
        let url = Url::parse("https://example.com/p?token=abc&page=2").unwrap();
        let (host_path, q) = redact_query(&url);
        assert_eq!(host_path, "example.com/p");
        assert_eq!(
            q,
            vec![
                ("token".to_string(), "<redacted>".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn invalid_link_maps_to_invalid_link_error() {
        let err: PagekeepError = validate_link("mailto:a@b.c").unwrap_err().into();
        assert!(matches!(err, PagekeepError::InvalidLink(_)));
    }

    #[test]
    fn status_errors_keep_their_code() {
        let err: PagekeepError = FetchError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            cause: "Service Unavailable".into(),
        }
        .into();
        match err {
            PagekeepError::Fetch { status, .. } => assert_eq!(status, "503"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn snippet_is_bounded() {
        let body = "x".repeat(SNIPPET_LEN * 2);
        let snip = snip_body(body.as_bytes());
        assert_eq!(snip.chars().count(), SNIPPET_LEN + 3);
    }
}
