use crate::dom::{attr_value, element_name, has_attr, is_comment_like, select_first, unwrap_node};
use kuchikikiki::NodeRef;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*(?:display\s*:\s*none|visibility\s*:\s*hidden)\b").unwrap()
});

/// First `main` element, else `body`.
pub(crate) fn container(doc: &NodeRef) -> Option<NodeRef> {
    select_first(doc, "main").or_else(|| select_first(doc, "body"))
}

fn is_hidden(node: &NodeRef) -> bool {
    has_attr(node, "hidden")
        || attr_value(node, "style").is_some_and(|style| HIDDEN_STYLE.is_match(&style))
}

/// Remove hidden descendants of `root` together with their content.
pub(crate) fn remove_hidden(root: &NodeRef) -> usize {
    let hidden: Vec<NodeRef> = root
        .descendants()
        .filter(|n| n.as_element().is_some() && is_hidden(n))
        .collect();
    for node in &hidden {
        node.detach();
    }
    hidden.len()
}

/// Attributes dropped from every element that survives the whitelist:
/// inline event handlers (`on*`) always, plus configured names. A trailing
/// `*` on a configured name matches by prefix.
#[derive(Debug, Clone)]
pub(crate) struct AttributeScrub {
    exact: HashSet<String>,
    prefixes: Vec<String>,
}

impl AttributeScrub {
    /// `stripped` entries match exactly unless starred; `tracking` entries
    /// are always prefixes.
    pub(crate) fn new(stripped: &[String], tracking: &[String]) -> Self {
        let mut scrub = Self {
            exact: HashSet::new(),
            prefixes: vec!["on".to_string()],
        };
        for name in stripped {
            scrub.add(name, false);
        }
        for name in tracking {
            scrub.add(name, true);
        }
        scrub
    }

    fn add(&mut self, raw: &str, as_prefix: bool) {
        let name = raw.trim().to_ascii_lowercase();
        match name.strip_suffix('*') {
            Some("") => {}
            Some(stem) => self.prefixes.push(stem.to_string()),
            None if name.is_empty() => {}
            None if as_prefix => self.prefixes.push(name),
            None => {
                self.exact.insert(name);
            }
        }
    }

    fn matches(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.exact.contains(&name) || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Remove matching attributes from `node`. Returns how many went.
    pub(crate) fn apply(&self, node: &NodeRef) -> usize {
        let Some(element) = node.as_element() else {
            return 0;
        };
        let mut attrs = element.attributes.borrow_mut();
        let before = attrs.map.len();
        attrs.map.retain(|name, _| !self.matches(&name.local));
        before - attrs.map.len()
    }
}

/// Result of [`filter_tags`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TagFilterCounts {
    pub unwrapped: usize,
    pub scrubbed_attributes: usize,
}

/// Unwrap every descendant element of `root` whose tag is not in `allowed`,
/// scrub the attributes of the ones that stay, and drop comments.
pub(crate) fn filter_tags(
    root: &NodeRef,
    allowed: &HashSet<String>,
    scrub: &AttributeScrub,
) -> TagFilterCounts {
    let nodes: Vec<NodeRef> = root.descendants().collect();
    let mut counts = TagFilterCounts::default();
    for node in nodes {
        if is_comment_like(&node) {
            node.detach();
            continue;
        }
        match element_name(&node) {
            Some(name) if !allowed.contains(&name) => {
                unwrap_node(&node, Some(" "));
                counts.unwrapped += 1;
            }
            Some(_) => counts.scrubbed_attributes += scrub.apply(&node),
            None => {}
        }
    }
    counts
}
