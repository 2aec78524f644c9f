//! Regex pass over the raw markup, run before any DOM parsing.
use pagekeep_config::ExtractionConfig;
use regex::Regex;

const SCRIPT_BLOCK: &str = r"(?is)<script\b[^>]*>.*?</script\s*>";
const STYLE_BLOCK: &str = r"(?is)<style\b[^>]*>.*?</style\s*>";
const COMMENT: &str = r"(?s)<!--.*?-->";
const WHITESPACE: &str = r"\s+";

#[derive(thiserror::Error, Debug)]
#[error("invalid lexical pattern for {what}: {source}")]
pub struct LexicalPatternError {
    what: &'static str,
    #[source]
    source: regex::Error,
}

/// Compiled lexical rules; built once per [`Normalizer`](super::Normalizer).
#[derive(Debug, Clone)]
pub(crate) struct LexicalRules {
    blocks: Vec<Regex>,
    tracking_tag: Option<Regex>,
    attributes: Option<Regex>,
    whitespace: Regex,
}

impl LexicalRules {
    pub(crate) fn from_config(cfg: &ExtractionConfig) -> Result<Self, LexicalPatternError> {
        let compile = |what, pattern: &str| {
            Regex::new(pattern).map_err(|source| LexicalPatternError { what, source })
        };

        let blocks = vec![
            compile("script", SCRIPT_BLOCK)?,
            compile("style", STYLE_BLOCK)?,
            compile("comment", COMMENT)?,
        ];

        let tracking_tag = match name_alternation(&cfg.tracking_attributes, true) {
            Some(names) => Some(compile(
                "tracking attributes",
                &format!(r#"(?i)<[a-z][^>]*?\s(?:{names})(?:[\s=/][^>]*)?>"#),
            )?),
            None => None,
        };

        let attributes = match name_alternation(&cfg.stripped_attributes, false) {
            Some(names) => Some(compile(
                "stripped attributes",
                &format!(r#"(?i)\s+(?:{names})\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+)"#),
            )?),
            None => None,
        };

        Ok(Self {
            blocks,
            tracking_tag,
            attributes,
            whitespace: compile("whitespace", WHITESPACE)?,
        })
    }

    /// Apply every rule in order. Each removal leaves one space behind and
    /// whitespace runs are collapsed at the end.
    pub(crate) fn apply(&self, html: &str) -> String {
        let mut out = html.to_string();
        for re in &self.blocks {
            out = re.replace_all(&out, " ").into_owned();
        }
        if let Some(re) = &self.tracking_tag {
            out = re.replace_all(&out, " ").into_owned();
        }
        if let Some(re) = &self.attributes {
            out = re.replace_all(&out, " ").into_owned();
        }
        self.whitespace.replace_all(out.trim(), " ").into_owned()
    }
}

/// `a|b|c[\w:.-]*` from configured attribute names. A trailing `*` marks a
/// prefix; `prefix_all` treats every entry as one.
fn name_alternation(names: &[String], prefix_all: bool) -> Option<String> {
    let parts: Vec<String> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty() && *n != "*")
        .map(|n| match n.strip_suffix('*') {
            Some(stem) => format!(r"{}[\w:.-]*", regex::escape(stem)),
            None if prefix_all => format!(r"{}[\w:.-]*", regex::escape(n)),
            None => regex::escape(n),
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> LexicalRules {
        LexicalRules::from_config(&ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn strips_scripts_styles_and_comments() {
        let out = rules().apply(
            "<p>a</p><SCRIPT type=\"x\">var s = '</p>';\n</script ><style>p{}</style><!-- note\n -->b",
        );
        assert_eq!(out, "<p>a</p> b");
    }

    #[test]
    fn drops_opening_tags_with_event_handlers() {
        let out = rules().apply(r#"<img src="x.jpg" onerror="alert(1)" /><p>ok</p>"#);
        assert_eq!(out, "<p>ok</p>");

        let out = rules().apply(r#"<div data-tracking-id="7">text</div>"#);
        assert_eq!(out, "text</div>");
    }

    #[test]
    fn strips_presentational_attributes_but_keeps_others() {
        let out = rules().apply(
            r#"<table border=1 width="100%"><td class='c' data-x="1" colspan="2" valign=top>v</td></table>"#,
        );
        assert_eq!(out, r#"<table ><td colspan="2" >v</td></table>"#);
    }

    #[test]
    fn attribute_names_must_match_whole_words() {
        let out = rules().apply(r#"<a href="/x" idx="3" data-id="9">l</a>"#);
        assert_eq!(out, r#"<a href="/x" idx="3" >l</a>"#);
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(rules().apply("  <p>\n\n a \t b</p>\n"), "<p> a b</p>");
    }

    #[test]
    fn empty_lists_disable_their_rules() {
        let cfg = ExtractionConfig {
            tracking_attributes: vec![],
            stripped_attributes: vec![" ".into()],
            ..ExtractionConfig::default()
        };
        let rules = LexicalRules::from_config(&cfg).unwrap();
        assert!(rules.tracking_tag.is_none());
        assert!(rules.attributes.is_none());
        assert_eq!(
            rules.apply(r#"<b class="x" onclick="y()">t</b>"#),
            r#"<b class="x" onclick="y()">t</b>"#
        );
    }
}
