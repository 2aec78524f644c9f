use crate::dom::{attr_value, meta_content, parse_document, select_first};
use crate::text::non_blank;

/// Page-level metadata used to fill gaps left by the readability engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub lang: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<String>,
    pub body_text: Option<String>,
}

impl PageMeta {
    pub fn from_html(html: &str) -> Self {
        let doc = parse_document(html);
        Self {
            title: select_first(&doc, "title").and_then(|t| non_blank(&t.text_contents())),
            description: meta_content(&doc, r#"meta[name="description"]"#),
            lang: select_first(&doc, "html")
                .and_then(|h| attr_value(&h, "lang"))
                .and_then(|l| non_blank(&l)),
            site_name: meta_content(&doc, r#"meta[property="og:site_name"]"#),
            published_time: meta_content(&doc, r#"meta[property="article:published_time"]"#),
            body_text: select_first(&doc, "body").and_then(|b| non_blank(&b.text_contents())),
        }
    }
}
