//! Tolerant scanning of third-party result pages.
//!
//! Retail and search-engine markup is uncontrolled and changes often, so this
//! does not build a DOM. It walks opening tags with a case-insensitive regex,
//! reads their attributes, and decodes the handful of entities that show up
//! in hrefs and rating text.

use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)] // Static patterns: a failure here is a programming error
static ANCHOR_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b((?:"[^"]*"|'[^']*'|[^'">])*)>"#).expect("valid anchor pattern")
});

#[allow(clippy::expect_used)]
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid attribute pattern")
});

#[allow(clippy::expect_used)]
static SPAN_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<(/?)span\b((?:"[^"]*"|'[^']*'|[^'">])*)>"#).expect("valid span pattern")
});

#[allow(clippy::expect_used)]
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

/// An opening tag's attributes, names lowercased and values entity-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    attributes: Vec<(String, String)>,
}

impl Element {
    fn parse(raw_attributes: &str) -> Self {
        let attributes = ATTRIBUTE
            .captures_iter(raw_attributes)
            .map(|caps| {
                let name = caps[1].to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map_or("", |m| m.as_str());
                (name, decode_entities(value))
            })
            .collect();
        Self { attributes }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn has_classes(&self, classes: &[&str]) -> bool {
        classes.iter().all(|class| self.has_class(class))
    }
}

/// Every `<a>` tag in document order.
pub fn anchors(html: &str) -> impl Iterator<Item = Element> + '_ {
    ANCHOR_TAG
        .captures_iter(html)
        .map(|caps| Element::parse(&caps[1]))
}

/// Text content of the first `<span>` carrying `class`, with inner tags
/// stripped and whitespace collapsed. Empty spans are skipped.
///
/// Every opening tag is considered on its own, so a match nested inside other
/// spans is still found, and its content runs to its own closing tag.
pub fn first_span_text(html: &str, class: &str) -> Option<String> {
    SPAN_TAG.captures_iter(html).find_map(|caps| {
        if !caps[1].is_empty() || !Element::parse(&caps[2]).has_class(class) {
            return None;
        }
        let start = caps.get(0)?.end();
        let inner = &html[start..closing_span(html, start)];
        let text = TAG.replace_all(inner, " ");
        let text = decode_entities(&text)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        (!text.is_empty()).then_some(text)
    })
}

/// Offset of the `</span>` closing the span whose content starts at `start`,
/// or the end of the document when it is never closed.
fn closing_span(html: &str, start: usize) -> usize {
    let mut depth = 0usize;
    for caps in SPAN_TAG.captures_iter(&html[start..]) {
        let Some(tag) = caps.get(0) else { continue };
        if caps[1].is_empty() {
            depth += 1;
        } else if depth == 0 {
            return start + tag.start();
        } else {
            depth -= 1;
        }
    }
    html.len()
}

fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&#x2F;", "/")
        .replace("&#x2f;", "/")
        .replace("&amp;", "&")
}
