use crate::dom::rendered_len;
use kuchikikiki::NodeRef;

fn text_chars(node: &NodeRef) -> usize {
    node.text_contents().chars().count()
}

/// Drop trailing content of `root` until its rendered text fits `max_chars`.
///
/// Nodes are removed whole, last first. When the last node holds more text
/// than the remaining overflow the walk descends into it instead, so the kept
/// text is always a prefix of the original. Returns whether anything was cut.
pub(crate) fn truncate_tail(root: &NodeRef, max_chars: usize) -> bool {
    if rendered_len(root) <= max_chars {
        return false;
    }

    // Raw counts never undercount the rendered length, so stopping on them
    // keeps the bound.
    let mut total = text_chars(root);
    let mut level = root.clone();
    while total > max_chars {
        let Some(last) = level.last_child() else {
            match pop_empty(&level, root) {
                Some(parent) => level = parent,
                None => break,
            }
            continue;
        };

        let len = text_chars(&last);
        let overflow = total - max_chars;
        if len > overflow && last.first_child().is_some() {
            level = last;
            continue;
        }
        last.detach();
        total -= len;
    }

    while level.first_child().is_none() {
        match pop_empty(&level, root) {
            Some(parent) => level = parent,
            None => break,
        }
    }
    true
}

/// Detach an emptied element below `root` and hand back its parent.
fn pop_empty(level: &NodeRef, root: &NodeRef) -> Option<NodeRef> {
    if level == root {
        return None;
    }
    let parent = level.parent();
    level.detach();
    parent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{inner_html, parse_document, select_first};

    fn body_of(html: &str) -> NodeRef {
        let doc = parse_document(html);
        select_first(&doc, "body").unwrap()
    }

    #[test]
    fn short_content_is_untouched() {
        let body = body_of("<h1>abc</h1>");
        assert!(!truncate_tail(&body, 3));
        assert_eq!(inner_html(&body), "<h1>abc</h1>");
    }

    #[test]
    fn removes_whole_trailing_nodes() {
        let body = body_of("<h1>aaaa</h1><h2>bbbb</h2><h3>cccc</h3>");
        assert!(truncate_tail(&body, 8));
        assert_eq!(inner_html(&body), "<h1>aaaa</h1><h2>bbbb</h2>");
    }

    #[test]
    fn descends_into_a_large_last_node() {
        let body = body_of("<h1>aa</h1><section><h2>bbbb</h2><h3>cccc</h3></section>");
        assert!(truncate_tail(&body, 7));
        assert_eq!(inner_html(&body), "<h1>aa</h1><section><h2>bbbb</h2></section>");
    }

    #[test]
    fn never_splits_a_text_node() {
        let body = body_of("<h1>aa</h1>bbbbbbbb");
        assert!(truncate_tail(&body, 5));
        assert_eq!(inner_html(&body), "<h1>aa</h1>");
    }

    #[test]
    fn emptied_containers_are_dropped() {
        let body = body_of("<h1>aa</h1><section><h2>bbbbbb</h2></section>");
        assert!(truncate_tail(&body, 3));
        assert_eq!(inner_html(&body), "<h1>aa</h1>");
    }
}
