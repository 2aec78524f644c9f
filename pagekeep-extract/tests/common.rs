#![allow(dead_code)]

use std::sync::OnceLock;

use pagekeep_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "pagekeep-tests",
            log_dir: Some(std::env::temp_dir().join("pagekeep-tests")),
            emit_stderr: true,
            format: if std::env::var("PAGEKEEP_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
        };

        pagekeep_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// A long-form article page that readability engines accept.
pub fn article_page(paragraphs: usize) -> String {
    let mut body = String::new();
    for i in 0..paragraphs {
        body.push_str(&format!(
            "<p>Paragraph {i}: Rivers carve valleys over thousands of years, moving sediment \
             from the highlands toward the sea. Each flood reshapes the banks, deposits fresh \
             silt across the plain and shifts the channel a little further from where it \
             started. Geologists read these layers like pages in a book, dating the wet and \
             dry centuries by the thickness of each band of clay and sand.</p>\n"
        ));
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>How Rivers Shape Valleys</title>
  <meta name="description" content="A short tour of fluvial geology.">
  <meta property="og:site_name" content="Field Notes">
  <meta property="article:published_time" content="2024-04-02T09:30:00Z">
  <style>body {{ font-family: serif; }}</style>
  <script>window.analytics = [];</script>
</head>
<body>
  <header class="site-header"><nav><a href="/">Home</a> <a href="/about">About</a></nav></header>
  <article class="post">
    <h1>How Rivers Shape Valleys</h1>
    {body}
    <div class="share-buttons" onclick="share()">Share this</div>
  </article>
  <footer id="footer">Copyright Field Notes</footer>
  <script src="/tracker.js"></script>
</body>
</html>"#
    )
}
