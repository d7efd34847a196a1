//! Anchor-based patching of a profile document.
//!
//! A run produces one [`Directive`] per dynamic region: a named [`Anchor`]
//! saying where the value lives and a [`FetchResult`] saying what goes there.
//! [`Patcher::plan`] resolves every anchor against the original text, rejects
//! overlapping edits, and [`Plan::apply`] writes them back to front. Text
//! outside the matched value spans is never touched.
//!
//! [`FetchResult`]: readmepulse_shared::FetchResult

pub mod directive;
pub mod markers;
pub mod matchers;

pub use directive::{Directive, DirectiveReport, Outcome, PatchReport, Patcher, Plan};
pub use markers::{MarkerOutcome, Placement, read_marker, render_marker, upsert_marker};
pub use matchers::{Anchor, Span};
