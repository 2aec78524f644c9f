use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run (tabs and newlines included) into a single
/// space and trim the ends.
pub fn clean_text(s: &str) -> String {
    WHITESPACE_RUNS.replace_all(s.trim(), " ").into_owned()
}

/// [`clean_text`], mapping blank results to `None`.
pub(crate) fn non_blank(s: &str) -> Option<String> {
    let cleaned = clean_text(s);
    (!cleaned.is_empty()).then_some(cleaned)
}
