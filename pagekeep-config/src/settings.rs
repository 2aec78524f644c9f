use serde::{Deserialize, Serialize};

/// Top-level configuration consumed by the fetcher, the extraction pipeline
/// and the CLI. Every field has a default, so an empty source is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PagekeepConfig {
    pub version: Option<String>,
    pub fetch: FetchConfig,
    pub extraction: ExtractionConfig,
    pub logging: LoggingConfig,
}

/// Outbound HTTP settings for server-side capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub accept: String,
    /// Whole-request timeout; exceeding it is reported as a `timeout` fetch error.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_redirects: usize,
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            timeout_secs: 20,
            connect_timeout_secs: 5,
            max_redirects: 10,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Knobs of the extraction pipeline: normalizer policy, readability limits
/// and which hosts are never captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rendered-text budget of the cleaned HTML.
    pub max_chars: usize,
    /// A content-selector match must hold more text than this to be used as
    /// main content.
    pub min_content_chars: usize,
    /// Candidate selectors for the main content region, in priority order.
    pub content_selectors: Vec<String>,
    /// Removed from an isolated main-content region.
    pub minimal_noise_selectors: Vec<String>,
    /// Removed from the whole page when no main content was isolated.
    pub conservative_noise_selectors: Vec<String>,
    /// Tags kept by the whitelist stage; everything else is unwrapped.
    pub allowed_tags: Vec<String>,
    /// Attributes stripped lexically. A trailing `*` matches by prefix.
    pub stripped_attributes: Vec<String>,
    /// Attribute name prefixes that cause the whole opening tag to be dropped.
    pub tracking_attributes: Vec<String>,
    pub truncation_marker: String,
    /// Hosts (and their subdomains) that are never captured.
    pub excluded_hosts: Vec<String>,
    pub readability: ReadabilityConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_chars: 100_000,
            min_content_chars: 500,
            content_selectors: strings(&[
                "main",
                "article",
                ".post-content",
                ".entry-content",
                ".content",
                r#"[role="main"]"#,
                ".post",
                ".hrecipe",
                r#"[itemtype*="Recipe"]"#,
            ]),
            minimal_noise_selectors: strings(&[
                "script",
                "style",
                "noscript",
                ".advertisement",
                ".ads",
                ".ad-container",
                ".social-share",
                ".share-buttons",
                r#"[aria-hidden="true"]"#,
            ]),
            conservative_noise_selectors: strings(&[
                "script",
                "style",
                "noscript",
                "iframe",
                "embed",
                "object",
                "nav",
                "header",
                "footer",
                r#"[role="navigation"]"#,
                r#"[role="banner"]"#,
                r#"[role="contentinfo"]"#,
                r#"[aria-hidden="true"]"#,
                ".advertisement",
                ".ads",
                ".ad-container",
                ".sidebar-ads",
                ".social-share",
                ".share-buttons",
                ".social-media",
                ".cookie-notice",
                ".newsletter-signup",
            ]),
            allowed_tags: strings(&[
                "h1", "h2", "h3", "h4", "h5", "h6", "title", "meta", "header", "nav", "main",
                "article", "section", "aside", "footer", "table", "tr", "td", "th", "thead",
                "tbody", "tfoot", "caption", "colgroup", "col", "ul", "ol", "li", "dl", "dd",
                "dt",
            ]),
            stripped_attributes: strings(&[
                "class",
                "id",
                "style",
                "data-*",
                "onclick",
                "onload",
                "onerror",
                "width",
                "height",
                "align",
                "bgcolor",
                "border",
                "cellpadding",
                "cellspacing",
                "valign",
            ]),
            tracking_attributes: strings(&[
                "data-track",
                "data-analytics",
                "onclick",
                "onload",
                "onerror",
            ]),
            truncation_marker: "<!-- ...(truncated) -->".to_string(),
            excluded_hosts: Vec::new(),
            readability: ReadabilityConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Reject settings the pipeline cannot run with.
    ///
    /// ```
    /// use pagekeep_config::ExtractionConfig;
    ///
    /// let mut cfg = ExtractionConfig::default();
    /// assert!(cfg.validate().is_ok());
    /// cfg.max_chars = 0;
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chars == 0 {
            return Err("extraction.max_chars must be greater than zero".into());
        }
        if self.allowed_tags.iter().all(|t| t.trim().is_empty()) {
            return Err("extraction.allowed_tags must name at least one tag".into());
        }
        if self.truncation_marker.trim().is_empty() {
            return Err("extraction.truncation_marker must not be empty".into());
        }
        Ok(())
    }
}

/// Limits handed to the wrapped readability algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadabilityConfig {
    /// Upper bound on elements the algorithm scores; `0` disables the cap.
    pub max_elements_to_parse: usize,
    /// Minimum article length in characters the algorithm accepts.
    pub char_threshold: usize,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            max_elements_to_parse: 9000,
            char_threshold: 500,
        }
    }
}

/// Logging preferences for the CLI; libraries only emit events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `text` or `json`.
    pub format: String,
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub dir: Option<String>,
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            level: "info".to_string(),
            dir: None,
            stderr: false,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
