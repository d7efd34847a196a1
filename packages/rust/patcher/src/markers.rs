//! Timestamp comment markers (`<!-- Label: value -->`).

use readmepulse_shared::Result;
use serde::Serialize;

use crate::matchers::Anchor;

/// Where to insert a marker the document does not have yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Own line at the very start.
    Start,
    /// New line at the very end.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "marker", rename_all = "snake_case")]
pub enum MarkerOutcome {
    Replaced { count: usize },
    Inserted,
}

pub fn render_marker(label: &str, value: &str) -> String {
    format!("<!-- {label}: {value} -->")
}

/// Current value of the first `label` marker.
pub fn read_marker(document: &str, label: &str) -> Result<Option<String>> {
    let spans = Anchor::marker(label).find(document)?;
    Ok(spans.first().map(|s| document[s.range.clone()].to_string()))
}

/// Set every `label` marker to `value`, inserting one at `placement` when
/// none exists.
pub fn upsert_marker(
    document: &str,
    label: &str,
    value: &str,
    placement: Placement,
) -> Result<(String, MarkerOutcome)> {
    let anchor = Anchor::marker(label);
    let spans = anchor.find(document)?;

    if spans.is_empty() {
        let marker = render_marker(label, &anchor.encode(value, &placeholder()));
        let out = match placement {
            Placement::Start => format!("{marker}\n{document}"),
            Placement::End => {
                let mut out = document.to_string();
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&marker);
                out.push('\n');
                out
            }
        };
        return Ok((out, MarkerOutcome::Inserted));
    }

    let mut out = document.to_string();
    for span in spans.iter().rev() {
        out.replace_range(span.range.clone(), &anchor.encode(value, span));
    }
    Ok((out, MarkerOutcome::Replaced { count: spans.len() }))
}

fn placeholder() -> crate::Span {
    crate::Span {
        range: 0..0,
        quote: None,
    }
}
