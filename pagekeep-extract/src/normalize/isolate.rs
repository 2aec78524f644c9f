use crate::dom::{parse_document, remove_matching, select_first, select_nodes, visible_chars};
use kuchikikiki::NodeRef;

/// How the working document for the whitelist stage was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Isolation {
    /// A content-selector match held enough text and became its own document.
    /// `text_len` counts its non-whitespace characters.
    MainContent { selector: String, text_len: usize },
    /// No match qualified; `best_len` is the longest candidate seen (0 if none).
    WholeDocument { best_len: usize },
}

pub(crate) struct IsolationPolicy<'a> {
    pub content_selectors: &'a [String],
    pub minimal_noise: &'a [String],
    pub conservative_noise: &'a [String],
    pub min_content_chars: usize,
}

/// The element with the most non-whitespace text among all matches of all
/// selectors. Earlier selectors, then earlier elements, win ties.
pub(crate) fn best_candidate<'s>(
    doc: &NodeRef,
    selectors: &'s [String],
) -> Option<(NodeRef, &'s str, usize)> {
    let mut best: Option<(NodeRef, &'s str, usize)> = None;
    for selector in selectors {
        for node in select_nodes(doc, selector) {
            let len = visible_chars(&node);
            if best.as_ref().is_none_or(|(_, _, best_len)| len > *best_len) {
                best = Some((node, selector.as_str(), len));
            }
        }
    }
    best
}

/// Pick the working document: the best candidate moved into a fresh document
/// with light noise removal, or the whole page with heavier noise removal.
pub(crate) fn isolate(doc: NodeRef, policy: &IsolationPolicy<'_>) -> (NodeRef, Isolation) {
    let best = best_candidate(&doc, policy.content_selectors);
    let best_len = best.as_ref().map(|(_, _, len)| *len).unwrap_or(0);

    if let Some((node, selector, text_len)) = best.filter(|(_, _, len)| *len > policy.min_content_chars) {
        let fresh = parse_document("");
        if let Some(body) = select_first(&fresh, "body") {
            body.append(node);
            let removed: usize = policy
                .minimal_noise
                .iter()
                .map(|s| remove_matching(&fresh, s))
                .sum();
            tracing::debug!(selector, text_len, removed, "extract.normalize.main_content");
            return (
                fresh,
                Isolation::MainContent {
                    selector: selector.to_string(),
                    text_len,
                },
            );
        }
    }

    let removed: usize = policy
        .conservative_noise
        .iter()
        .map(|s| remove_matching(&doc, s))
        .sum();
    tracing::debug!(best_len, removed, "extract.normalize.whole_document");
    (doc, Isolation::WholeDocument { best_len })
}
