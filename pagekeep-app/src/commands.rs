use crate::cli::ModeArg;
use anyhow::{Context, Result};
use pagekeep_common::{CaptureMode, ExtractRequest};
use pagekeep_config::PagekeepConfig;
use pagekeep_extract::{Extractor, Normalizer};
use pagekeep_runtime::PagekeepHandle;
use std::path::{Path, PathBuf};

pub struct ExtractArgs {
    pub url: String,
    pub html_file: Option<PathBuf>,
    pub mode: Option<ModeArg>,
    pub no_full_content: bool,
    pub pretty: bool,
}

/// Apply a `--max-chars` override and re-check the extraction settings.
pub fn override_max_chars(cfg: &mut PagekeepConfig, max_chars: Option<u64>) -> Result<()> {
    if let Some(max) = max_chars {
        cfg.extraction.max_chars = usize::try_from(max).context("--max-chars")?;
    }
    cfg.extraction
        .validate()
        .map_err(anyhow::Error::msg)
        .context("--max-chars")
}

/// Build the request the CLI flags describe. A supplied HTML file means
/// client mode unless `--mode` says otherwise.
pub fn build_request(args: &ExtractArgs) -> Result<ExtractRequest> {
    let html = args.html_file.as_deref().map(read_html).transpose()?;
    let mode = match (args.mode, &html) {
        (Some(mode), _) => mode.into(),
        (None, Some(_)) => CaptureMode::Client,
        (None, None) => CaptureMode::ServerSide,
    };
    Ok(ExtractRequest {
        url: args.url.clone(),
        html,
        mode,
        capture_full_content: !args.no_full_content,
    })
}

pub async fn extract(cfg: &PagekeepConfig, handle: &PagekeepHandle, args: ExtractArgs) -> Result<String> {
    let request = build_request(&args)?;
    let extractor = Extractor::from_config(cfg).context("building extractor")?;
    let page = extractor
        .extract(request, &handle.request_token())
        .await
        .with_context(|| format!("extracting {}", args.url))?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&page)?
    } else {
        serde_json::to_string(&page)?
    };
    Ok(json)
}

pub fn normalize(cfg: &PagekeepConfig, html_file: &Path) -> Result<String> {
    let html = read_html(html_file)?;
    let normalizer = Normalizer::new(&cfg.extraction).context("compiling normalizer rules")?;
    let cleaned = normalizer
        .normalize(&html)
        .with_context(|| format!("normalizing {}", html_file.display()))?;
    tracing::info!(
        text_len = cleaned.text_len,
        truncated = cleaned.truncated,
        "app.normalize.done"
    );
    Ok(cleaned.html)
}

fn read_html(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(html_file: Option<PathBuf>, mode: Option<ModeArg>) -> ExtractArgs {
        ExtractArgs {
            url: "https://example.com/a".into(),
            html_file,
            mode,
            no_full_content: false,
            pretty: false,
        }
    }

    #[test]
    fn html_file_implies_client_mode() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<p>saved</p>").unwrap();

        let request = build_request(&args(Some(file.path().to_path_buf()), None)).unwrap();
        assert_eq!(request.mode, CaptureMode::Client);
        assert_eq!(request.html.as_deref(), Some("<p>saved</p>"));

        let request =
            build_request(&args(Some(file.path().to_path_buf()), Some(ModeArg::ServerSide))).unwrap();
        assert_eq!(request.mode, CaptureMode::ServerSide);
    }

    #[test]
    fn no_file_means_server_side() {
        let request = build_request(&args(None, None)).unwrap();
        assert_eq!(request.mode, CaptureMode::ServerSide);
        assert!(request.html.is_none());
        assert!(request.capture_full_content);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = build_request(&args(Some(PathBuf::from("/nonexistent/page.html")), None)).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/page.html"));
    }

    #[test]
    fn normalize_honours_the_configured_budget() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<ul><li>{}</li><li>{}</li></ul>", "a".repeat(30), "b".repeat(30)).unwrap();
        let mut cfg = PagekeepConfig::default();
        cfg.extraction.max_chars = 40;

        let html = normalize(&cfg, file.path()).unwrap();
        assert!(html.ends_with(&cfg.extraction.truncation_marker));
        assert!(html.contains(&"a".repeat(30)));
        assert!(!html.contains("bbb"));
    }

    #[test]
    fn budget_override_is_validated() {
        let mut cfg = PagekeepConfig::default();
        override_max_chars(&mut cfg, Some(2_500)).unwrap();
        assert_eq!(cfg.extraction.max_chars, 2_500);

        let err = override_max_chars(&mut cfg, Some(0)).unwrap_err();
        assert!(format!("{err:#}").contains("max_chars must be greater than zero"));
    }

    #[test]
    fn absent_override_keeps_the_configured_budget() {
        let mut cfg = PagekeepConfig::default();
        override_max_chars(&mut cfg, None).unwrap();
        assert_eq!(cfg.extraction.max_chars, 100_000);
    }
}
