//! Tolerant markup scanner for server-rendered fragments
//!
//! Covers the vocabulary the console's server actually renders: nested
//! elements, quoted/unquoted/boolean attributes, void elements, text and the
//! common character references. Comments are dropped and `<script>`/`<style>`
//! bodies are ignored. Stray closing tags are skipped and unclosed elements
//! are closed at the end of input, the way browsers recover.

use super::DocumentError;
use regex::Regex;
use std::sync::OnceLock;

/// One parsed element with its subtree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<ParsedElement>,
}

impl ParsedElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text of this element and all descendants
    pub fn deep_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.deep_text());
        }
        out
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(
            r#"(?s)<!--.*?-->|<!(?:[^>]*)>|<(/?)([a-zA-Z][a-zA-Z0-9:-]*)((?:\s+[^\s=>/]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*(/?)>|[^<]+|<"#,
        )
        .expect("token regex is valid")
    })
}

fn attribute_regex() -> &'static Regex {
    static ATTR: OnceLock<Regex> = OnceLock::new();
    ATTR.get_or_init(|| {
        Regex::new(r#"([^\s=>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
            .expect("attribute regex is valid")
    })
}

fn raw_text_regex() -> &'static Regex {
    static RAW: OnceLock<Regex> = OnceLock::new();
    RAW.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
            .expect("raw text regex is valid")
    })
}

/// Decode the character references the server's templates emit
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Parse a fragment into its top-level elements
pub fn parse_fragment(markup: &str) -> Result<Vec<ParsedElement>, DocumentError> {
    let cleaned = raw_text_regex().replace_all(markup, "");
    let mut roots: Vec<ParsedElement> = Vec::new();
    let mut stack: Vec<ParsedElement> = Vec::new();

    for caps in token_regex().captures_iter(&cleaned) {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

        let Some(tag) = caps.get(2) else {
            if whole.starts_with("<!") || whole == "<" {
                continue;
            }
            let text = decode_entities(whole);
            if text.trim().is_empty() {
                continue;
            }
            if let Some(current) = stack.last_mut() {
                current.text.push_str(text.trim());
            }
            continue;
        };

        let tag = tag.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

        if closing {
            let Some(depth) = stack.iter().rposition(|el| el.tag == tag) else {
                continue;
            };
            while stack.len() > depth {
                let finished = stack.pop().ok_or_else(|| {
                    DocumentError::Markup(format!("unbalanced </{}>", tag))
                })?;
                attach(finished, &mut stack, &mut roots);
            }
            continue;
        }

        let attributes = caps
            .get(3)
            .map(|m| parse_attributes(m.as_str()))
            .unwrap_or_default();
        let self_closing = caps.get(4).is_some_and(|m| !m.as_str().is_empty());
        let element = ParsedElement {
            tag: tag.clone(),
            attributes,
            ..Default::default()
        };

        if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
            attach(element, &mut stack, &mut roots);
        } else {
            stack.push(element);
        }
    }

    while let Some(finished) = stack.pop() {
        attach(finished, &mut stack, &mut roots);
    }

    Ok(roots)
}

fn attach(element: ParsedElement, stack: &mut [ParsedElement], roots: &mut Vec<ParsedElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    attribute_regex()
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_elements_and_attributes() {
        let roots = parse_fragment(
            r#"<div class="modal" id='entityModal'><form action=/client/create/><input name="a" required></form></div>"#,
        )
        .unwrap();
        assert_eq!(roots.len(), 1);
        let modal = &roots[0];
        assert_eq!(modal.attribute("id"), Some("entityModal"));
        let form = &modal.children[0];
        assert_eq!(form.attribute("action"), Some("/client/create/"));
        assert_eq!(form.children[0].attribute("required"), Some(""));
    }

    #[test]
    fn test_void_and_self_closing_elements_do_not_nest() {
        let roots = parse_fragment(r#"<p><input name="a"><br/><input name="b"></p>"#).unwrap();
        assert_eq!(roots[0].children.len(), 3);
    }

    #[test]
    fn test_scripts_and_comments_are_dropped() {
        let roots = parse_fragment(
            "<!-- note --><div>ok<script>if (a < b) { x(); }</script></div>",
        )
        .unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].deep_text(), "ok");
    }

    #[test]
    fn test_stray_close_and_unclosed_recover() {
        let roots = parse_fragment("</span><div><label>Name</div><p>tail").unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].children[0].tag, "label");
        assert_eq!(roots[1].text, "tail");
    }

    #[test]
    fn test_entities_are_decoded() {
        let roots = parse_fragment(r#"<option value="a&amp;b">Tom &amp; Jerry</option>"#).unwrap();
        assert_eq!(roots[0].attribute("value"), Some("a&b"));
        assert_eq!(roots[0].text, "Tom & Jerry");
    }
}
