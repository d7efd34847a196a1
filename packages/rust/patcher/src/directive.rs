//! Directives, planning and application.

use std::ops::Range;

use readmepulse_shared::{FetchResult, UnavailableReason};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::matchers::Anchor;

/// One named replacement: put `value` wherever `anchor` matches.
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: String,
    pub anchor: Anchor,
    pub value: FetchResult<String>,
}

impl Directive {
    pub fn new(name: impl Into<String>, anchor: Anchor, value: FetchResult<String>) -> Self {
        Self {
            name: name.into(),
            anchor,
            value,
        }
    }
}

/// What happened to a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Value differed and was written at every match.
    Applied { matches: usize },
    /// Every match already held the value.
    Unchanged { matches: usize },
    /// Anchor not present; the document is left alone for this directive.
    AnchorMissing,
    /// The source was unavailable; nothing was searched or written.
    Skipped { reason: UnavailableReason },
    /// Spans overlapped another directive's spans; neither was written.
    Conflict { with: String },
    /// The anchor itself could not be evaluated.
    Invalid { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug)]
struct Edit {
    range: Range<usize>,
    text: String,
}

/// Every directive resolved against one original document.
#[derive(Debug)]
pub struct Plan<'a> {
    document: &'a str,
    edits: Vec<Edit>,
    reports: Vec<DirectiveReport>,
}

/// Result of applying a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PatchReport {
    #[serde(skip)]
    pub document: String,
    pub directives: Vec<DirectiveReport>,
    pub changed: bool,
}

impl PatchReport {
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.directives
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }

    /// Names of directives that changed the document, in directive order.
    pub fn applied(&self) -> Vec<&str> {
        self.directives
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Applied { .. }))
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Entry point for patching.
pub struct Patcher;

impl Patcher {
    /// Resolve every directive's spans against `document`.
    ///
    /// Spans are computed on the original text and every member of an
    /// overlapping pair is rejected, so directive order never changes the
    /// resulting document.
    pub fn plan<'a>(document: &'a str, directives: &[Directive]) -> Plan<'a> {
        let resolved: Vec<Resolved> = directives
            .iter()
            .map(|directive| resolve(document, directive))
            .collect();

        let mut conflicts: Vec<Option<usize>> = vec![None; resolved.len()];
        for i in 0..resolved.len() {
            for j in (i + 1)..resolved.len() {
                if collide(&resolved[i], &resolved[j]) {
                    conflicts[i].get_or_insert(j);
                    conflicts[j].get_or_insert(i);
                }
            }
        }

        let mut edits = Vec::new();
        let mut reports = Vec::with_capacity(directives.len());
        let settled = resolved.into_iter().zip(conflicts);
        for (directive, (resolved, conflict)) in directives.iter().zip(settled) {
            let name = directive.name.as_str();
            let outcome = match (resolved, conflict) {
                (Resolved::Done(outcome), _) => outcome,
                (Resolved::Edits(_), Some(other)) => {
                    let with = directives[other].name.clone();
                    warn!(
                        directive = name,
                        with = %with,
                        "anchor overlaps another directive, rejected"
                    );
                    Outcome::Conflict { with }
                }
                (Resolved::Edits(planned), None) => {
                    let matches = planned.len();
                    let unchanged = planned
                        .iter()
                        .all(|(range, text)| document[range.clone()] == *text);
                    edits.extend(
                        planned
                            .into_iter()
                            .map(|(range, text)| Edit { range, text }),
                    );
                    if unchanged {
                        debug!(directive = name, matches, "value already current");
                        Outcome::Unchanged { matches }
                    } else {
                        debug!(directive = name, matches, "value replaced");
                        Outcome::Applied { matches }
                    }
                }
            };
            reports.push(DirectiveReport {
                name: directive.name.clone(),
                outcome,
            });
        }

        Plan {
            document,
            edits,
            reports,
        }
    }

    /// Plan and apply in one step.
    pub fn apply(document: &str, directives: &[Directive]) -> PatchReport {
        Self::plan(document, directives).apply()
    }
}

/// A directive before conflicts are settled: a final outcome, or the
/// replacements it would make.
enum Resolved {
    Done(Outcome),
    Edits(Vec<(Range<usize>, String)>),
}

fn resolve(document: &str, directive: &Directive) -> Resolved {
    let name = directive.name.as_str();

    let value = match &directive.value {
        FetchResult::Success(value) => value,
        FetchResult::Unavailable(reason) => {
            info!(directive = name, %reason, "source unavailable, keeping existing value");
            return Resolved::Done(Outcome::Skipped {
                reason: reason.clone(),
            });
        }
    };

    let spans = match directive.anchor.find(document) {
        Ok(spans) => spans,
        Err(e) => {
            warn!(directive = name, error = %e, "anchor could not be evaluated");
            return Resolved::Done(Outcome::Invalid {
                message: e.to_string(),
            });
        }
    };

    if spans.is_empty() {
        warn!(directive = name, anchor = %directive.anchor, "anchor not found in document");
        return Resolved::Done(Outcome::AnchorMissing);
    }

    Resolved::Edits(
        spans
            .into_iter()
            .map(|span| {
                let text = directive.anchor.encode(value, &span);
                (span.range, text)
            })
            .collect(),
    )
}

fn collide(a: &Resolved, b: &Resolved) -> bool {
    match (a, b) {
        (Resolved::Edits(a), Resolved::Edits(b)) => a
            .iter()
            .any(|(ra, _)| b.iter().any(|(rb, _)| overlaps(ra, rb))),
        _ => false,
    }
}

/// Insertion points conflict with each other at the same offset and with any
/// span they fall inside.
fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    if a.is_empty() || b.is_empty() {
        a.start == b.start
            || (b.start < a.start && a.start < b.end)
            || (a.start < b.start && b.start < a.end)
    } else {
        a.start < b.end && b.start < a.end
    }
}

impl Plan<'_> {
    pub fn reports(&self) -> &[DirectiveReport] {
        &self.reports
    }

    /// Write every planned edit, back to front.
    pub fn apply(mut self) -> PatchReport {
        self.edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));

        let mut document = self.document.to_string();
        for edit in &self.edits {
            document.replace_range(edit.range.clone(), &edit.text);
        }

        let changed = document != self.document;
        PatchReport {
            document,
            directives: self.reports,
            changed,
        }
    }
}
