//! Small helpers over the `kuchikikiki` DOM shared by the readability and
//! normalizer stages.
use kuchikikiki::traits::TendrilSink;
use kuchikikiki::{NodeData, NodeRef};

pub(crate) fn parse_document(html: &str) -> NodeRef {
    kuchikikiki::parse_html().one(html)
}

/// Local tag name, lowercase as produced by the HTML parser.
pub(crate) fn element_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|e| e.name.local.as_ref().to_string())
}

pub(crate) fn attr_value(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|e| e.attributes.borrow().get(name).map(|v| v.to_string()))
}

pub(crate) fn has_attr(node: &NodeRef, name: &str) -> bool {
    node.as_element()
        .map(|e| e.attributes.borrow().contains(name))
        .unwrap_or(false)
}

/// Character count of the node's text with whitespace runs counted once and
/// the ends trimmed, i.e. roughly what a browser renders.
pub(crate) fn rendered_len(node: &NodeRef) -> usize {
    rendered_len_of(&node.text_contents())
}

pub(crate) fn rendered_len_of(text: &str) -> usize {
    let mut count = 0;
    let mut pending_space = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            count += 1;
            pending_space = false;
        }
        count += 1;
    }
    count
}

/// Non-whitespace characters of the node's text. Separators inserted by the
/// whitelist stage do not change it, so a page measures the same on every pass.
pub(crate) fn visible_chars(node: &NodeRef) -> usize {
    node.text_contents()
        .chars()
        .filter(|c| !c.is_whitespace())
        .count()
}

/// All elements under `root` (inclusive) matching `selector`, collected so the
/// caller can mutate the tree while walking the result.
pub(crate) fn select_nodes(root: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match root.select(selector) {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(()) => {
            tracing::warn!(selector, "extract.dom.invalid_selector");
            Vec::new()
        }
    }
}

pub(crate) fn select_first(root: &NodeRef, selector: &str) -> Option<NodeRef> {
    root.select_first(selector).ok().map(|m| m.as_node().clone())
}

/// Detach every element matching `selector`. Returns how many were removed.
pub(crate) fn remove_matching(root: &NodeRef, selector: &str) -> usize {
    let nodes = select_nodes(root, selector);
    for node in &nodes {
        node.detach();
    }
    nodes.len()
}

/// Replace `node` with `separator` text (when given) followed by its
/// children, so words on either side do not run together.
pub(crate) fn unwrap_node(node: &NodeRef, separator: Option<&str>) {
    if let Some(sep) = separator {
        node.insert_before(NodeRef::new_text(sep));
    }
    let children: Vec<NodeRef> = node.children().collect();
    for child in children {
        node.insert_before(child);
    }
    node.detach();
}

pub(crate) fn is_comment_like(node: &NodeRef) -> bool {
    matches!(
        node.data(),
        NodeData::Comment(_) | NodeData::ProcessingInstruction(_)
    )
}

/// Serialize the children of `node`, without the node's own tags.
pub(crate) fn inner_html(node: &NodeRef) -> String {
    let mut out = String::new();
    for child in node.children() {
        out.push_str(&child.to_string());
    }
    out
}

/// `content` of the first element matching `selector`, trimmed, if non-empty.
pub(crate) fn meta_content(root: &NodeRef, selector: &str) -> Option<String> {
    select_first(root, selector)
        .and_then(|n| attr_value(&n, "content"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_len_collapses_whitespace() {
        assert_eq!(rendered_len_of("  a \n\t b  "), 3);
        assert_eq!(rendered_len_of(""), 0);
        assert_eq!(rendered_len_of("héllo"), 5);
    }

    #[test]
    fn unwrap_keeps_children_in_order() {
        let doc = parse_document("<p>one <span>two <b>three</b></span> four</p>");
        let span = select_first(&doc, "span").unwrap();
        unwrap_node(&span, Some(" "));
        let p = select_first(&doc, "p").unwrap();
        assert_eq!(inner_html(&p), "one  two <b>three</b> four");
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let doc = parse_document("<p>x</p>");
        assert!(select_nodes(&doc, "p[[").is_empty());
        assert_eq!(remove_matching(&doc, "p"), 1);
        assert!(select_first(&doc, "p").is_none());
    }

    #[test]
    fn meta_content_skips_blank_values() {
        let doc = parse_document(
            r#"<head><meta name="description" content="  "><meta property="og:site_name" content=" Site "></head>"#,
        );
        assert_eq!(meta_content(&doc, r#"meta[name="description"]"#), None);
        assert_eq!(
            meta_content(&doc, r#"meta[property="og:site_name"]"#).as_deref(),
            Some("Site")
        );
    }
}
