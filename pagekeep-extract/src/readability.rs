//! Article extraction on top of a pluggable readability engine.
//!
//! [`ReadabilityExtractor`] asks the engine whether a page looks like an
//! article, runs it, and fills whatever the engine left empty from the
//! page's own metadata.
use crate::dates::parse_published_time;
use crate::error::{ExtractionError, panic_message};
use crate::meta::PageMeta;
use crate::text::{clean_text, non_blank};
use chrono::{DateTime, Utc};
use dom_smoothie::{Config, Readability, ReadabilityError};
use pagekeep_config::ReadabilityConfig;
use pagekeep_http::RawDocument;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Raw engine output before fallbacks are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArticle {
    pub title: Option<String>,
    pub lang: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<String>,
    pub excerpt: Option<String>,
    pub text_content: String,
}

/// Structured article handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    pub lang: Option<String>,
    pub site_name: Option<String>,
    pub published_time: DateTime<Utc>,
    pub excerpt: Option<String>,
    pub text_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadabilityOutcome {
    Article(ArticleRecord),
    NotReadable,
}

/// A readability algorithm. Implementations build their own tree from
/// `doc.html` and must not assume anything about other stages.
pub trait ReadabilityEngine: Send + Sync {
    /// Cheap pre-check; `false` means [`parse`](Self::parse) is not attempted.
    fn probably_readable(&self, doc: &RawDocument) -> bool;

    /// `Ok(None)` when the algorithm finds no article content.
    fn parse(&self, doc: &RawDocument) -> Result<Option<ParsedArticle>, ExtractionError>;
}

/// [`ReadabilityEngine`] backed by `dom_smoothie`.
#[derive(Debug, Clone)]
pub struct DomSmoothieEngine {
    max_elements_to_parse: usize,
    char_threshold: usize,
}

impl DomSmoothieEngine {
    pub fn new(cfg: &ReadabilityConfig) -> Self {
        Self {
            max_elements_to_parse: cfg.max_elements_to_parse,
            char_threshold: cfg.char_threshold,
        }
    }

    fn readability(&self, doc: &RawDocument) -> Result<Readability, ReadabilityError> {
        let cfg = Config {
            max_elements_to_parse: self.max_elements_to_parse,
            char_threshold: self.char_threshold,
            ..Default::default()
        };
        Readability::new(doc.html.as_str(), Some(doc.url.as_str()), Some(cfg))
    }
}

impl Default for DomSmoothieEngine {
    fn default() -> Self {
        Self::new(&ReadabilityConfig::default())
    }
}

impl ReadabilityEngine for DomSmoothieEngine {
    fn probably_readable(&self, doc: &RawDocument) -> bool {
        match self.readability(doc) {
            Ok(readability) => readability.is_probably_readable(),
            Err(e) => {
                tracing::warn!(error = %e, "extract.readability.engine_init_failed");
                false
            }
        }
    }

    fn parse(&self, doc: &RawDocument) -> Result<Option<ParsedArticle>, ExtractionError> {
        let mut readability = self
            .readability(doc)
            .map_err(|e| ExtractionError::Engine(e.to_string()))?;
        let article = match readability.parse() {
            Ok(article) => article,
            Err(ReadabilityError::GrabFailed) => return Ok(None),
            Err(e) => return Err(ExtractionError::Engine(e.to_string())),
        };

        Ok(Some(ParsedArticle {
            title: Some(article.title),
            lang: article.lang,
            site_name: article.site_name,
            published_time: article.published_time,
            excerpt: article.excerpt,
            text_content: article.text_content.to_string(),
        }))
    }
}

/// Runs an engine and applies the metadata fallbacks.
#[derive(Clone)]
pub struct ReadabilityExtractor {
    engine: Arc<dyn ReadabilityEngine>,
}

impl ReadabilityExtractor {
    pub fn new(engine: Arc<dyn ReadabilityEngine>) -> Self {
        Self { engine }
    }

    pub fn extract(
        &self,
        doc: &RawDocument,
        captured_at: DateTime<Utc>,
    ) -> Result<ReadabilityOutcome, ExtractionError> {
        let readable = guarded(|| Ok(self.engine.probably_readable(doc)))?;
        if !readable {
            tracing::debug!(url = %doc.url, "extract.readability.not_readable");
            return Ok(ReadabilityOutcome::NotReadable);
        }

        let Some(parsed) = guarded(|| self.engine.parse(doc))? else {
            tracing::debug!(url = %doc.url, "extract.readability.no_article");
            return Ok(ReadabilityOutcome::NotReadable);
        };

        let meta = PageMeta::from_html(&doc.html);
        Ok(ReadabilityOutcome::Article(build_record(
            parsed,
            meta,
            captured_at,
        )))
    }
}

impl std::fmt::Debug for ReadabilityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadabilityExtractor").finish_non_exhaustive()
    }
}

fn guarded<T>(
    f: impl FnOnce() -> Result<T, ExtractionError>,
) -> Result<T, ExtractionError> {
    catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| ExtractionError::Panicked(panic_message(payload.as_ref())))?
}

fn build_record(parsed: ParsedArticle, meta: PageMeta, captured_at: DateTime<Utc>) -> ArticleRecord {
    let title = parsed
        .title
        .as_deref()
        .and_then(non_blank)
        .or_else(|| meta.title.clone())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let site_name = parsed
        .site_name
        .as_deref()
        .and_then(non_blank)
        .or(meta.site_name)
        .or(meta.title);

    let published_time = parsed
        .published_time
        .as_deref()
        .and_then(parse_published_time)
        .or_else(|| meta.published_time.as_deref().and_then(parse_published_time))
        .unwrap_or(captured_at);

    let text_content = non_blank(&parsed.text_content)
        .or(meta.body_text)
        .unwrap_or_default();

    ArticleRecord {
        title,
        lang: parsed.lang.as_deref().and_then(non_blank).or(meta.lang),
        site_name,
        published_time,
        excerpt: parsed
            .excerpt
            .as_deref()
            .and_then(non_blank)
            .or(meta.description),
        text_content: clean_text(&text_content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    struct Scripted {
        readable: bool,
        article: Option<ParsedArticle>,
        parse_calls: AtomicUsize,
    }

    impl Scripted {
        fn new(readable: bool, article: Option<ParsedArticle>) -> Self {
            Self {
                readable,
                article,
                parse_calls: AtomicUsize::new(0),
            }
        }
    }

    impl ReadabilityEngine for Scripted {
        fn probably_readable(&self, _doc: &RawDocument) -> bool {
            self.readable
        }

        fn parse(&self, _doc: &RawDocument) -> Result<Option<ParsedArticle>, ExtractionError> {
            self.parse_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.article.clone())
        }
    }

    struct Exploding;

    impl ReadabilityEngine for Exploding {
        fn probably_readable(&self, _doc: &RawDocument) -> bool {
            true
        }

        fn parse(&self, _doc: &RawDocument) -> Result<Option<ParsedArticle>, ExtractionError> {
            panic!("index out of range");
        }
    }

    const PAGE: &str = r#"<html lang="fr"><head>
        <title>Tab title</title>
        <meta name="description" content="From meta">
        <meta property="og:site_name" content="Le Site">
        <meta property="article:published_time" content="2022-02-02">
        </head><body><p>Body   text</p></body></html>"#;

    fn doc() -> RawDocument {
        RawDocument::from_html(Url::parse("https://example.com/a").unwrap(), PAGE)
    }

    fn captured() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn not_readable_skips_parse() {
        let engine = Arc::new(Scripted::new(false, Some(ParsedArticle::default())));
        let extractor = ReadabilityExtractor::new(engine.clone());
        let outcome = extractor.extract(&doc(), captured()).unwrap();
        assert_eq!(outcome, ReadabilityOutcome::NotReadable);
        assert_eq!(engine.parse_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_parse_is_not_readable() {
        let extractor = ReadabilityExtractor::new(Arc::new(Scripted::new(true, None)));
        let outcome = extractor.extract(&doc(), captured()).unwrap();
        assert_eq!(outcome, ReadabilityOutcome::NotReadable);
    }

    #[test]
    fn engine_fields_win_and_are_cleaned() {
        let parsed = ParsedArticle {
            title: Some("  Engine\n title ".into()),
            lang: Some("en".into()),
            site_name: Some("Engine Site".into()),
            published_time: Some("2024-06-01T10:00:00+00:00".into()),
            excerpt: Some("Engine\texcerpt".into()),
            text_content: "line one\n\n\tline two".into(),
        };
        let extractor = ReadabilityExtractor::new(Arc::new(Scripted::new(true, Some(parsed))));
        let ReadabilityOutcome::Article(rec) = extractor.extract(&doc(), captured()).unwrap() else {
            panic!("expected article");
        };
        assert_eq!(rec.title, "Engine title");
        assert_eq!(rec.lang.as_deref(), Some("en"));
        assert_eq!(rec.site_name.as_deref(), Some("Engine Site"));
        assert_eq!(
            rec.published_time,
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(rec.excerpt.as_deref(), Some("Engine excerpt"));
        assert_eq!(rec.text_content, "line one line two");
    }

    #[test]
    fn gaps_are_filled_from_page_metadata() {
        let parsed = ParsedArticle {
            title: Some("   ".into()),
            published_time: Some("not a date".into()),
            ..ParsedArticle::default()
        };
        let extractor = ReadabilityExtractor::new(Arc::new(Scripted::new(true, Some(parsed))));
        let ReadabilityOutcome::Article(rec) = extractor.extract(&doc(), captured()).unwrap() else {
            panic!("expected article");
        };
        assert_eq!(rec.title, "Tab title");
        assert_eq!(rec.lang.as_deref(), Some("fr"));
        assert_eq!(rec.site_name.as_deref(), Some("Le Site"));
        assert_eq!(
            rec.published_time,
            Utc.with_ymd_and_hms(2022, 2, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(rec.excerpt.as_deref(), Some("From meta"));
        assert_eq!(rec.text_content, "Body text");
    }

    #[test]
    fn bare_page_uses_last_resort_defaults() {
        let bare = RawDocument::from_html(
            Url::parse("https://example.com/b").unwrap(),
            "<p>just text</p>",
        );
        let extractor = ReadabilityExtractor::new(Arc::new(Scripted::new(
            true,
            Some(ParsedArticle::default()),
        )));
        let ReadabilityOutcome::Article(rec) = extractor.extract(&bare, captured()).unwrap() else {
            panic!("expected article");
        };
        assert_eq!(rec.title, UNKNOWN_TITLE);
        assert_eq!(rec.site_name, None);
        assert_eq!(rec.published_time, captured());
        assert_eq!(rec.text_content, "just text");
    }

    #[test]
    fn engine_panics_become_errors() {
        let extractor = ReadabilityExtractor::new(Arc::new(Exploding));
        let err = extractor.extract(&doc(), captured()).unwrap_err();
        assert!(matches!(err, ExtractionError::Panicked(msg) if msg.contains("index out of range")));
    }
}
