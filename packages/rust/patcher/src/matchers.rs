//! Named anchor matchers.
//!
//! Every matcher returns the byte spans of the *value* it addresses, never the
//! surrounding markup, so a replacement keeps quotes, attributes and tags
//! exactly as the author wrote them.

use std::fmt;
use std::ops::Range;

use readmepulse_shared::{ReadmeError, Result};
use regex::{Regex, escape};

/// Where a dynamic value lives in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// The value of `attr` on a `tag` element whose current value starts
    /// with `value_prefix`. Attribute order and quote style are free.
    AttributeValue {
        tag: String,
        attr: String,
        value_prefix: String,
    },
    /// A run of digits (commas allowed) between two literal strings.
    EmbeddedNumber { before: String, after: String },
    /// The text content of `<tag attr="attr_value">…</tag>`.
    ElementText {
        tag: String,
        attr: String,
        attr_value: String,
    },
    /// Everything strictly between the first `start` and the first `end`
    /// that follows it.
    Section { start: String, end: String },
    /// The value of an HTML comment of the form `<!-- label: value -->`.
    CommentMarker { label: String },
}

/// A matched value span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub range: Range<usize>,
    /// Quote character around an attribute value, if any.
    pub quote: Option<char>,
}

impl Span {
    fn plain(range: Range<usize>) -> Self {
        Self { range, quote: None }
    }
}

impl Anchor {
    pub fn attribute(tag: &str, attr: &str, value_prefix: &str) -> Self {
        Self::AttributeValue {
            tag: tag.into(),
            attr: attr.into(),
            value_prefix: value_prefix.into(),
        }
    }

    pub fn embedded_number(before: &str, after: &str) -> Self {
        Self::EmbeddedNumber {
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn element(tag: &str, attr: &str, attr_value: &str) -> Self {
        Self::ElementText {
            tag: tag.into(),
            attr: attr.into(),
            attr_value: attr_value.into(),
        }
    }

    pub fn section(start: &str, end: &str) -> Self {
        Self::Section {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn marker(label: &str) -> Self {
        Self::CommentMarker {
            label: label.into(),
        }
    }

    /// All value spans in `document`, in document order.
    pub fn find(&self, document: &str) -> Result<Vec<Span>> {
        match self {
            Self::Section { start, end } => Ok(find_section(document, start, end)
                .map(Span::plain)
                .into_iter()
                .collect()),
            Self::AttributeValue { .. } => {
                let re = self.regex()?;
                Ok(re
                    .captures_iter(document)
                    .filter_map(|caps| {
                        if let Some(m) = caps.get(1) {
                            Some(Span {
                                range: m.range(),
                                quote: Some('"'),
                            })
                        } else {
                            caps.get(2).map(|m| Span {
                                range: m.range(),
                                quote: Some('\''),
                            })
                        }
                    })
                    .collect())
            }
            _ => {
                let re = self.regex()?;
                Ok(re
                    .captures_iter(document)
                    .filter_map(|caps| caps.get(1).map(|m| Span::plain(m.range())))
                    .collect())
            }
        }
    }

    /// Escape `value` for the context the span sits in.
    pub fn encode(&self, value: &str, span: &Span) -> String {
        match (self, span.quote) {
            (Self::AttributeValue { .. }, Some('"')) => value.replace('"', "&quot;"),
            (Self::AttributeValue { .. }, Some('\'')) => value.replace('\'', "&#39;"),
            (Self::ElementText { .. }, _) => value.replace('&', "&amp;").replace('<', "&lt;"),
            (Self::CommentMarker { .. }, _) => value.replace("-->", "- ->"),
            _ => value.to_string(),
        }
    }

    fn regex(&self) -> Result<Regex> {
        let pattern = match self {
            Self::AttributeValue {
                tag,
                attr,
                value_prefix,
            } => {
                let prefix = escape(value_prefix);
                format!(
                    r#"<(?i:{tag})\b[^>]*?\s(?i:{attr})\s*=\s*(?:"({prefix}[^"]*)"|'({prefix}[^']*)')"#,
                    tag = escape(tag),
                    attr = escape(attr),
                )
            }
            Self::EmbeddedNumber { before, after } => {
                format!(r"{}(\d[\d,]*){}", escape(before), escape(after))
            }
            Self::ElementText {
                tag,
                attr,
                attr_value,
            } => {
                let tag = escape(tag);
                let value = escape(attr_value);
                format!(
                    r#"<(?i:{tag})\b[^>]*?\s(?i:{attr})\s*=\s*(?:"{value}"|'{value}')[^>]*>([^<]*)</(?i:{tag})\s*>"#,
                    attr = escape(attr),
                )
            }
            Self::CommentMarker { label } => {
                format!(r"<!--[ \t]*{}:[ \t]*(.*?)[ \t]*-->", escape(label))
            }
            Self::Section { .. } => {
                return Err(ReadmeError::validation("sections are matched literally"));
            }
        };

        Regex::new(&pattern)
            .map_err(|e| ReadmeError::validation(format!("anchor {} does not compile: {e}", self)))
    }
}

fn find_section(document: &str, start: &str, end: &str) -> Option<Range<usize>> {
    let open = document.find(start)? + start.len();
    let close = open + document[open..].find(end)?;
    Some(open..close)
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeValue {
                tag,
                attr,
                value_prefix,
            } => write!(f, "<{tag} {attr}=\"{value_prefix}…\">"),
            Self::EmbeddedNumber { before, after } => write!(f, "{before}<n>{after}"),
            Self::ElementText {
                tag,
                attr,
                attr_value,
            } => write!(f, "<{tag} {attr}=\"{attr_value}\">…</{tag}>"),
            Self::Section { start, end } => write!(f, "{start}…{end}"),
            Self::CommentMarker { label } => write!(f, "<!-- {label}: … -->"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(doc: &'a str, spans: &[Span]) -> Vec<&'a str> {
        spans.iter().map(|s| &doc[s.range.clone()]).collect()
    }

    #[test]
    fn attribute_value_any_order_and_quote() {
        let doc = r#"<img alt="q" src="https://cards.test/api?quote=a">
<img src='https://cards.test/api?quote=b' width="600">
<img src="https://other.test/x.png">"#;
        let anchor = Anchor::attribute("img", "src", "https://cards.test/api?");
        let spans = anchor.find(doc).unwrap();

        assert_eq!(
            texts(doc, &spans),
            vec![
                "https://cards.test/api?quote=a",
                "https://cards.test/api?quote=b"
            ]
        );
        assert_eq!(spans[0].quote, Some('"'));
        assert_eq!(spans[1].quote, Some('\''));
    }

    #[test]
    fn attribute_name_must_stand_alone() {
        let doc = r#"<img data-src="https://cards.test/api?x">"#;
        let anchor = Anchor::attribute("img", "src", "https://cards.test/api?");
        assert!(anchor.find(doc).unwrap().is_empty());
    }

    #[test]
    fn embedded_number_with_separators() {
        let doc = "badge/🔥_Current_Streak-1,234_Days-F85D7F and 🔥_Current_Streak-7_Days-";
        let anchor = Anchor::embedded_number("🔥_Current_Streak-", "_Days-");
        assert_eq!(texts(doc, &anchor.find(doc).unwrap()), vec!["1,234", "7"]);
    }

    #[test]
    fn element_text_by_attribute() {
        let doc = r#"<b class="x" data-stat='followers'>42</b> <b data-stat="stars">9</b>"#;
        let anchor = Anchor::element("b", "data-stat", "followers");
        assert_eq!(texts(doc, &anchor.find(doc).unwrap()), vec!["42"]);
    }

    #[test]
    fn section_is_first_pair_only() {
        let doc = "a<!--S-->one<!--E-->b<!--S-->two<!--E-->";
        let spans = Anchor::section("<!--S-->", "<!--E-->").find(doc).unwrap();
        assert_eq!(texts(doc, &spans), vec!["one"]);
    }

    #[test]
    fn section_without_end_is_missing() {
        let doc = "a<!--S-->one";
        assert!(Anchor::section("<!--S-->", "<!--E-->").find(doc).unwrap().is_empty());
    }

    #[test]
    fn empty_section_yields_insertion_point() {
        let doc = "<!--S--><!--E-->";
        let spans = Anchor::section("<!--S-->", "<!--E-->").find(doc).unwrap();
        assert_eq!(spans[0].range, 8..8);
    }

    #[test]
    fn comment_marker_value() {
        let doc = "x\n<!-- Last Updated: May 01, 2025 at 09:00 AM UTC -->\n";
        let spans = Anchor::marker("Last Updated").find(doc).unwrap();
        assert_eq!(texts(doc, &spans), vec!["May 01, 2025 at 09:00 AM UTC"]);
    }

    #[test]
    fn encode_matches_quote_style() {
        let anchor = Anchor::attribute("img", "src", "x");
        let single = Span {
            range: 0..0,
            quote: Some('\''),
        };
        assert_eq!(anchor.encode("it's", &single), "it&#39;s");
    }
}
