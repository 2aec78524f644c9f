use crate::normalize::{CleanedHtml, LexicalPatternError, Normalizer};
use crate::readability::{
    ArticleRecord, DomSmoothieEngine, ReadabilityEngine, ReadabilityExtractor, ReadabilityOutcome,
};
use crate::error::{ExtractionError, MalformedInputError};
use chrono::{DateTime, Utc};
use pagekeep_common::{CaptureMode, ExtractRequest, ExtractionMethod, PageContent, PagekeepError};
use pagekeep_config::PagekeepConfig;
use pagekeep_http::{HttpFetcher, PageFetcher, RawDocument, validate_link};
use std::sync::Arc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Drives one request through fetch, readability and normalization and
/// merges whatever succeeded into a [`PageContent`].
///
/// Holds no per-request state; wrap it in an `Arc` and share it.
#[derive(Clone)]
pub struct Extractor {
    fetcher: Arc<dyn PageFetcher>,
    readability: Arc<ReadabilityExtractor>,
    normalizer: Arc<Normalizer>,
    excluded_hosts: Vec<String>,
}

impl Extractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        engine: Arc<dyn ReadabilityEngine>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            fetcher,
            readability: Arc::new(ReadabilityExtractor::new(engine)),
            normalizer: Arc::new(normalizer),
            excluded_hosts: Vec::new(),
        }
    }

    /// Production wiring: reqwest fetcher, `dom_smoothie` engine and the
    /// configured normalizer.
    pub fn from_config(cfg: &PagekeepConfig) -> Result<Self, PagekeepError> {
        let fetcher = HttpFetcher::new(&cfg.fetch)
            .map_err(|e| PagekeepError::Config(format!("http client: {e}")))?;
        let normalizer = Normalizer::new(&cfg.extraction)
            .map_err(|e: LexicalPatternError| PagekeepError::Config(e.to_string()))?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(DomSmoothieEngine::new(&cfg.extraction.readability)),
            normalizer,
        )
        .with_excluded_hosts(cfg.extraction.excluded_hosts.clone()))
    }

    /// Hosts (and their subdomains) that are refused up front.
    pub fn with_excluded_hosts(mut self, hosts: Vec<String>) -> Self {
        self.excluded_hosts = hosts
            .into_iter()
            .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        self
    }

    /// Run the pipeline for one request.
    ///
    /// Only an invalid or excluded link, a failed server-side fetch, or
    /// cancellation fail the call. Readability and normalization failures
    /// leave their fields absent and are logged.
    pub async fn extract(
        &self,
        request: ExtractRequest,
        cancel: &CancellationToken,
    ) -> pagekeep_common::Result<PageContent> {
        let link = request.url.trim().to_string();
        let url = validate_link(&link).map_err(PagekeepError::from)?;
        self.check_excluded(&url)?;

        let req_id = uuid::Uuid::new_v4().simple().to_string();
        let captured_at = Utc::now();
        let mut page = PageContent::new(link);
        tracing::info!(req_id, host = url.host_str().unwrap_or(""), mode = ?request.mode, "extract.start");

        if cancel.is_cancelled() {
            return Err(PagekeepError::Cancelled);
        }

        let doc = match request.mode {
            CaptureMode::ServerSide => {
                let fetched = tokio::select! {
                    _ = cancel.cancelled() => return Err(PagekeepError::Cancelled),
                    res = self.fetcher.fetch(&url) => res,
                };
                fetched.map_err(|e| {
                    tracing::warn!(req_id, status = %e.status(), error = %e, "extract.fetch_failed");
                    PagekeepError::from(e)
                })?
            }
            CaptureMode::Client => match request.html {
                Some(html) => RawDocument::from_html(url.clone(), html),
                None => {
                    tracing::info!(req_id, "extract.client.no_html");
                    return Ok(page);
                }
            },
        };

        let (article, cleaned) = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(req_id, "extract.cancelled");
                return Err(PagekeepError::Cancelled);
            }
            out = self.run_stages(Arc::new(doc), request.capture_full_content, captured_at) => out,
        };

        if let Some(article) = settle_article(&req_id, article) {
            apply_article(&mut page, article);
            page.extraction_method = ExtractionMethod::ClientReadability;
        }
        if let Some(cleaned) = settle_cleaned(&req_id, cleaned) {
            page.html_content = Some(cleaned.html);
            page.extraction_method = page.extraction_method.with_html();
        }

        tracing::info!(
            req_id,
            method = page.extraction_method.as_str(),
            completeness = ?page.completeness(),
            "extract.done"
        );
        Ok(page)
    }

    /// Both stages start on blocking threads before either is awaited.
    async fn run_stages(
        &self,
        doc: Arc<RawDocument>,
        capture_full_content: bool,
        captured_at: DateTime<Utc>,
    ) -> (Option<ArticleStage>, NormalizeStage) {
        let readability_task = capture_full_content.then(|| {
            let extractor = self.readability.clone();
            let doc = doc.clone();
            tokio::task::spawn_blocking(move || extractor.extract(&doc, captured_at))
        });
        let normalize_task = {
            let normalizer = self.normalizer.clone();
            let doc = doc.clone();
            tokio::task::spawn_blocking(move || normalizer.normalize(&doc.html))
        };

        let article = match readability_task {
            Some(task) => Some(task.await),
            None => None,
        };
        (article, normalize_task.await)
    }

    fn check_excluded(&self, url: &Url) -> pagekeep_common::Result<()> {
        let Some(host) = url.host_str() else {
            return Ok(());
        };
        let host = host.to_ascii_lowercase();
        let excluded = self.excluded_hosts.iter().any(|ex| {
            host == *ex
                || host
                    .strip_suffix(ex.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        });
        if excluded {
            return Err(PagekeepError::ExcludedHost(host));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("normalizer", &self.normalizer)
            .field("excluded_hosts", &self.excluded_hosts)
            .finish_non_exhaustive()
    }
}

type ArticleStage = Result<Result<ReadabilityOutcome, ExtractionError>, JoinError>;
type NormalizeStage = Result<Result<CleanedHtml, MalformedInputError>, JoinError>;

fn settle_article(req_id: &str, stage: Option<ArticleStage>) -> Option<ArticleRecord> {
    match stage? {
        Ok(Ok(ReadabilityOutcome::Article(article))) => Some(article),
        Ok(Ok(ReadabilityOutcome::NotReadable)) => {
            tracing::debug!(req_id, "extract.readability.not_readable");
            None
        }
        Ok(Err(e)) => {
            tracing::warn!(req_id, error = %e, "extract.readability.failed");
            None
        }
        Err(e) => {
            tracing::warn!(req_id, error = %e, "extract.readability.task_failed");
            None
        }
    }
}

fn settle_cleaned(req_id: &str, stage: NormalizeStage) -> Option<CleanedHtml> {
    match stage {
        Ok(Ok(cleaned)) => {
            tracing::debug!(
                req_id,
                text_len = cleaned.text_len,
                truncated = cleaned.truncated,
                "extract.normalize.ok"
            );
            Some(cleaned)
        }
        Ok(Err(e)) => {
            tracing::warn!(req_id, error = %e, "extract.normalize.failed");
            None
        }
        Err(e) => {
            tracing::warn!(req_id, error = %e, "extract.normalize.task_failed");
            None
        }
    }
}

fn apply_article(page: &mut PageContent, article: ArticleRecord) {
    page.title = Some(article.title);
    page.excerpt = article.excerpt;
    page.lang = article.lang;
    page.site_name = article.site_name;
    page.published_time = Some(article.published_time);
    page.text_content = Some(article.text_content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekeep_config::ExtractionConfig;
    use pagekeep_http::FetchError;

    struct NoFetch;

    #[async_trait::async_trait]
    impl PageFetcher for NoFetch {
        async fn fetch(&self, url: &Url) -> Result<RawDocument, FetchError> {
            Err(FetchError::Network(format!("unexpected fetch of {url}")))
        }
    }

    struct NeverReadable;

    impl ReadabilityEngine for NeverReadable {
        fn probably_readable(&self, _doc: &RawDocument) -> bool {
            false
        }

        fn parse(&self, _doc: &RawDocument) -> Result<Option<crate::ParsedArticle>, ExtractionError> {
            Ok(None)
        }
    }

    fn no_cancel() -> CancellationToken {
        CancellationToken::new()
    }

    fn extractor() -> Extractor {
        Extractor::new(
            Arc::new(NoFetch),
            Arc::new(NeverReadable),
            Normalizer::new(&ExtractionConfig::default()).unwrap(),
        )
        .with_excluded_hosts(vec!["Pagekeep.example".into()])
    }

    #[tokio::test]
    async fn excluded_hosts_cover_subdomains() {
        let ex = extractor();
        for link in ["https://pagekeep.example/x", "https://app.pagekeep.example/"] {
            let err = ex.extract(ExtractRequest::client(link, "<p>x</p>"), &no_cancel()).await.unwrap_err();
            assert!(matches!(err, PagekeepError::ExcludedHost(_)), "{link}");
        }
        let ok = ex
            .extract(ExtractRequest::client("https://notpagekeep.example/", "<p>x</p>"), &no_cancel())
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn invalid_links_are_rejected() {
        let err = extractor()
            .extract(ExtractRequest::client("javascript:alert(1)", "<p>x</p>"), &no_cancel())
            .await
            .unwrap_err();
        assert!(matches!(err, PagekeepError::InvalidLink(_)));
    }

    #[tokio::test]
    async fn client_mode_without_html_returns_baseline() {
        let mut request = ExtractRequest::client("https://example.com/p", "");
        request.html = None;
        let page = extractor().extract(request, &no_cancel()).await.unwrap();
        assert_eq!(page, PageContent::new("https://example.com/p"));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let err = extractor()
            .extract(ExtractRequest::client("https://example.com/", "<p>x</p>"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, PagekeepError::Cancelled));
    }
}
