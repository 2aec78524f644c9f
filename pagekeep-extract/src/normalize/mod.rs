//! Three-stage HTML reduction: lexical strip, main-content isolation and a
//! tag whitelist, followed by truncation on rendered text length.
//!
//! ```
//! use pagekeep_config::ExtractionConfig;
//! use pagekeep_extract::Normalizer;
//!
//! let normalizer = Normalizer::new(&ExtractionConfig::default()).unwrap();
//! let cleaned = normalizer
//!     .normalize(r#"<body><h1 class="t">Hi</h1><script>x()</script><p>there</p></body>"#)
//!     .unwrap();
//!
//! assert_eq!(
//!     cleaned.html,
//!     "<!DOCTYPE html><html><head></head><body><h1>Hi</h1>  there</body></html>"
//! );
//! assert!(!cleaned.truncated);
//! ```
mod isolate;
mod lexical;
mod truncate;
mod whitelist;

pub use isolate::Isolation;
pub use lexical::LexicalPatternError;

use crate::dom::{element_name, inner_html, parse_document, rendered_len, select_first};
use crate::error::MalformedInputError;
use isolate::IsolationPolicy;
use kuchikikiki::{NodeRef, Selectors};
use lexical::LexicalRules;
use whitelist::AttributeScrub;
use pagekeep_config::ExtractionConfig;
use std::collections::HashSet;

const DOCUMENT_HEAD: &str = "<!DOCTYPE html><html><head></head><body>";
const DOCUMENT_TAIL: &str = "</body></html>";

/// Output of [`Normalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedHtml {
    /// Complete document, with the truncation marker appended when cut.
    pub html: String,
    /// Rendered characters of the kept body text.
    pub text_len: usize,
    pub truncated: bool,
    pub isolation: Isolation,
}

/// Stateless normalizer; share it freely across threads.
#[derive(Debug, Clone)]
pub struct Normalizer {
    lexical: LexicalRules,
    content_selectors: Vec<String>,
    minimal_noise: Vec<String>,
    conservative_noise: Vec<String>,
    allowed_tags: HashSet<String>,
    scrub: AttributeScrub,
    min_content_chars: usize,
    max_chars: usize,
    marker: String,
}

impl Normalizer {
    /// Compile the configured rules. Selectors that fail to parse are logged
    /// and left out rather than failing construction.
    pub fn new(cfg: &ExtractionConfig) -> Result<Self, LexicalPatternError> {
        Ok(Self {
            lexical: LexicalRules::from_config(cfg)?,
            content_selectors: valid_selectors("content_selectors", &cfg.content_selectors),
            minimal_noise: valid_selectors("minimal_noise_selectors", &cfg.minimal_noise_selectors),
            conservative_noise: valid_selectors(
                "conservative_noise_selectors",
                &cfg.conservative_noise_selectors,
            ),
            allowed_tags: cfg
                .allowed_tags
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            scrub: AttributeScrub::new(&cfg.stripped_attributes, &cfg.tracking_attributes),
            min_content_chars: cfg.min_content_chars,
            max_chars: cfg.max_chars,
            marker: cfg.truncation_marker.clone(),
        })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn normalize(&self, html: &str) -> Result<CleanedHtml, MalformedInputError> {
        self.normalize_with_budget(html, self.max_chars)
    }

    /// Like [`normalize`](Self::normalize) with an explicit text budget.
    pub fn normalize_with_budget(
        &self,
        html: &str,
        max_chars: usize,
    ) -> Result<CleanedHtml, MalformedInputError> {
        if html.trim().is_empty() {
            return Err(MalformedInputError::Empty);
        }
        if html.contains('\0') {
            return Err(MalformedInputError::Binary);
        }

        let stripped = self.lexical.apply(html);
        if stripped.is_empty() {
            return Err(MalformedInputError::EmptyAfterCleanup);
        }

        let policy = IsolationPolicy {
            content_selectors: &self.content_selectors,
            minimal_noise: &self.minimal_noise,
            conservative_noise: &self.conservative_noise,
            min_content_chars: self.min_content_chars,
        };
        let (doc, isolation) = isolate::isolate(parse_document(&stripped), &policy);

        let container = whitelist::container(&doc).ok_or(MalformedInputError::MissingBody)?;
        let out = parse_document("");
        let body = select_first(&out, "body").ok_or(MalformedInputError::MissingBody)?;
        move_into(&body, &container);

        let hidden = whitelist::remove_hidden(&body);
        let filtered = whitelist::filter_tags(&body, &self.allowed_tags, &self.scrub);
        let truncated = truncate::truncate_tail(&body, max_chars);
        let text_len = rendered_len(&body);

        let mut html = String::with_capacity(stripped.len() + 64);
        html.push_str(DOCUMENT_HEAD);
        html.push_str(&inner_html(&body));
        html.push_str(DOCUMENT_TAIL);
        if truncated {
            html.push_str(&self.marker);
        }

        tracing::debug!(
            output_bytes = html.len(),
            text_len,
            hidden,
            unwrapped = filtered.unwrapped,
            scrubbed_attributes = filtered.scrubbed_attributes,
            truncated,
            "extract.normalize.done"
        );

        Ok(CleanedHtml {
            html,
            text_len,
            truncated,
            isolation,
        })
    }
}

/// `body` containers contribute their children; anything else moves whole.
fn move_into(body: &NodeRef, container: &NodeRef) {
    if element_name(container).as_deref() == Some("body") {
        let children: Vec<NodeRef> = container.children().collect();
        for child in children {
            body.append(child);
        }
    } else {
        body.append(container.clone());
    }
}

fn valid_selectors(list: &'static str, selectors: &[String]) -> Vec<String> {
    selectors
        .iter()
        .filter(|s| {
            let ok = Selectors::compile(s.as_str()).is_ok();
            if !ok {
                tracing::warn!(list, selector = s.as_str(), "extract.normalize.invalid_selector");
            }
            ok
        })
        .cloned()
        .collect()
}
