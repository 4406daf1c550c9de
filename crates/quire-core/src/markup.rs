//! Markup normalization used when comparing text parts.
//!
//! Comparison runs in two stages. [`strip_formatting`] removes newlines and tabs,
//! which settles most parts. Only when the stripped texts still differ are both sides
//! pretty-printed through a [`MarkupNormalizer`] and compared again.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

lazy_static! {
    /// Comments, processing instructions, CDATA, tags, or runs of text.
    static ref TOKEN: Regex =
        Regex::new(r"(?s)<!--.*?-->|<\?.*?\?>|<!\[CDATA\[.*?\]\]>|<[^>]*>|[^<]+").unwrap();
    /// Attribute with a single- or double-quoted value.
    static ref ATTRIBUTE: Regex =
        Regex::new(r#"([^\s=/<>]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
}

/// Removes every newline and tab character.
pub fn strip_formatting(text: &str) -> String {
    text.chars().filter(|c| *c != '\n' && *c != '\t').collect()
}

/// Same as [`strip_formatting`]; kept for fixtures written against the older name.
pub fn remove_spaces(text: &str) -> String {
    strip_formatting(text)
}

/// Options passed to a [`MarkupNormalizer`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Emit attributes in lexical order.
    pub sort_attributes: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            sort_attributes: true,
        }
    }
}

/// Canonical pretty-printer for markup. Must be deterministic.
pub trait MarkupNormalizer: Send + Sync {
    fn normalize(&self, text: &str, options: &NormalizeOptions) -> String;
}

/// Line-per-node XML pretty-printer.
///
/// Not a validating parser: tags are matched lexically, whitespace-only text is dropped,
/// attributes are re-quoted with `"` and `<a></a>` is collapsed to `<a/>`. Any other text
/// is emitted untouched, since spaces inside a run are document content.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlPrettifier;

enum Node<'a> {
    Open(&'a str, String),
    Close(&'a str),
    Leaf(String),
}

impl XmlPrettifier {
    fn classify<'a>(token: &'a str, options: &NormalizeOptions) -> Node<'a> {
        if !token.starts_with('<') || token.starts_with("<!") || token.starts_with("<?") {
            return Node::Leaf(token.to_string());
        }
        if let Some(rest) = token.strip_prefix("</") {
            return Node::Close(rest.trim_end_matches('>').trim());
        }

        let self_closing = token.ends_with("/>");
        let inner = token
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/');
        let name_end = inner
            .find(|c: char| c.is_whitespace())
            .unwrap_or(inner.len());
        let name = &inner[..name_end];

        let mut attributes: Vec<(String, String)> = ATTRIBUTE
            .captures_iter(&inner[name_end..])
            .map(|c| {
                let value = c.get(2).or_else(|| c.get(3)).map_or("", |m| m.as_str());
                (c[1].to_string(), value.to_string())
            })
            .collect();
        if options.sort_attributes {
            attributes.sort();
        }

        let mut rendered = format!("<{name}");
        for (key, value) in &attributes {
            rendered.push_str(&format!(" {key}=\"{value}\""));
        }

        if self_closing {
            rendered.push_str("/>");
            Node::Leaf(rendered)
        } else {
            rendered.push('>');
            Node::Open(name, rendered)
        }
    }
}

impl MarkupNormalizer for XmlPrettifier {
    fn normalize(&self, text: &str, options: &NormalizeOptions) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut depth = 0usize;
        // Set while the last emitted line is an opening tag with nothing after it.
        let mut open_line: Option<(usize, &str)> = None;

        for token in TOKEN.find_iter(text).map(|m| m.as_str()) {
            if !token.starts_with('<') && token.trim().is_empty() {
                continue;
            }
            match Self::classify(token, options) {
                Node::Open(name, rendered) => {
                    lines.push(format!("{}{}", " ".repeat(depth * options.indent), rendered));
                    open_line = Some((lines.len() - 1, name));
                    depth += 1;
                }
                Node::Close(name) => {
                    depth = depth.saturating_sub(1);
                    match open_line.take() {
                        Some((idx, open)) if open == name => {
                            let line = &mut lines[idx];
                            line.pop();
                            line.push_str("/>");
                        }
                        _ => lines.push(format!(
                            "{}</{}>",
                            " ".repeat(depth * options.indent),
                            name
                        )),
                    }
                }
                Node::Leaf(rendered) => {
                    lines.push(format!("{}{}", " ".repeat(depth * options.indent), rendered));
                    open_line = None;
                }
            }
        }

        lines.join("\n")
    }
}
