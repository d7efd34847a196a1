//! Turns fetched values into the exact text written into the document.
//!
//! Everything here is deterministic: the same input always renders the same
//! bytes, which is what makes a second run over an updated document a no-op.

use chrono::{DateTime, Utc};
use readmepulse_shared::{
    FetchResult, NamedDuration, Quote, ReadmeError, Result, UnavailableReason, WakaSummary,
};
use url::Url;
use url::form_urlencoded;

/// Width of the WakaTime progress bars, in characters.
const BAR_WIDTH: usize = 25;

/// Stat roles that have both a badge and an inline `<b>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatRole {
    Followers,
    Stars,
    Repos,
    Streak,
}

impl StatRole {
    /// Value of the role attribute on inline elements.
    pub fn key(self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Stars => "stars",
            Self::Repos => "repos",
            Self::Streak => "streak",
        }
    }

    /// Badge label. Also the `label=` value the badge anchors look for.
    pub fn label(self) -> &'static str {
        match self {
            Self::Followers => "Followers",
            Self::Stars => "Total Stars",
            Self::Repos => "Repositories",
            Self::Streak => "Current Streak",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Followers => "4c1",
            Self::Stars => "yellow",
            Self::Repos => "blue",
            Self::Streak => "F85D7F",
        }
    }
}

// ---------------------------------------------------------------------------
// Query encoding
// ---------------------------------------------------------------------------

/// Form-encode pairs, spelling spaces `%20` the way badge URLs usually do.
/// A literal `+` is already `%2B` at this point, so the swap is lossless.
pub fn encode_query(pairs: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
        .replace('+', "%20")
}

fn checked_base(base: &str) -> Result<&str> {
    Url::parse(base)
        .map_err(|e| ReadmeError::validation(format!("invalid base URL {base}: {e}")))?;
    Ok(base.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Quote card
// ---------------------------------------------------------------------------

/// Start of every quote card URL; used as the anchor prefix.
pub fn quote_card_prefix(base: &str) -> String {
    format!("{}?", base.trim_end_matches('/'))
}

pub fn quote_card_url(base: &str, quote: &Quote) -> Result<String> {
    checked_base(base)?;
    let query = encode_query(&[
        ("type", "horizontal"),
        ("theme", "tokyonight"),
        ("border", "true"),
        ("quote", quote.content.as_str()),
        ("author", quote.author.as_str()),
    ]);
    Ok(format!("{}{query}", quote_card_prefix(base)))
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

/// A shields.io static badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeSpec {
    pub label: String,
    pub message: String,
    pub color: String,
    pub style: String,
    pub logo: Option<String>,
}

impl BadgeSpec {
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
            color: "blue".into(),
            style: "for-the-badge".into(),
            logo: None,
        }
    }

    /// Badge for a stat role, coloured by role.
    pub fn for_role(role: StatRole, value: u64) -> Self {
        Self::new(role.label(), value.to_string())
            .color(role.color())
            .logo("github")
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self
    }

    /// `{shields_base}/static/v1?label=…&message=…&…`
    pub fn url(&self, shields_base: &str) -> Result<String> {
        let base = checked_base(shields_base)?;
        let mut pairs = vec![
            ("label", self.label.as_str()),
            ("message", self.message.as_str()),
            ("color", self.color.as_str()),
            ("style", self.style.as_str()),
        ];
        if let Some(logo) = &self.logo {
            pairs.push(("logo", logo.as_str()));
            pairs.push(("logoColor", "white"));
        }
        Ok(format!("{base}/static/v1?{}", encode_query(&pairs)))
    }
}

/// Anchor prefix matching any static badge with this label.
pub fn badge_prefix(shields_base: &str, label: &str) -> String {
    format!(
        "{}/static/v1?{}&",
        shields_base.trim_end_matches('/'),
        encode_query(&[("label", label)])
    )
}

// ---------------------------------------------------------------------------
// WakaTime section
// ---------------------------------------------------------------------------

/// `3 hrs 5 mins`, or `5 mins` under an hour.
pub fn format_duration(total_seconds: f64) -> String {
    let minutes = (total_seconds.max(0.0) / 60.0).round() as u64;
    let (hrs, mins) = (minutes / 60, minutes % 60);
    match hrs {
        0 => format!("{mins} mins"),
        1 => format!("1 hr {mins} mins"),
        _ => format!("{hrs} hrs {mins} mins"),
    }
}

fn bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn push_rows(out: &mut String, heading: &str, items: &[NamedDuration], total: f64) {
    if items.is_empty() {
        return;
    }
    out.push('\n');
    out.push_str(heading);
    out.push('\n');
    for item in items {
        let percent = if total > 0.0 {
            item.total_seconds / total * 100.0
        } else {
            0.0
        };
        out.push_str(&format!(
            "{:<20}{:<18}{}  {:>6.2} %\n",
            item.name,
            format_duration(item.total_seconds),
            bar(percent),
            percent
        ));
    }
}

fn fenced(body: &str) -> String {
    format!("\n```text\n{}\n```\n", body.trim_end())
}

/// Body of the WakaTime section.
pub fn waka_block(summary: &WakaSummary) -> String {
    let mut body = format!(
        "Coding time {} to {}: {}\n",
        summary.start.format("%b %d, %Y"),
        summary.end.format("%b %d, %Y"),
        format_duration(summary.total_seconds)
    );
    push_rows(&mut body, "Languages:", &summary.languages, summary.total_seconds);
    push_rows(&mut body, "Editors:", &summary.editors, summary.total_seconds);
    fenced(&body)
}

pub fn waka_needs_configuration(key_env: &str) -> String {
    fenced(&format!(
        "WakaTime stats need configuration: set {key_env} to a valid API key."
    ))
}

pub fn waka_no_activity(window_days: u32) -> String {
    fenced(&format!(
        "No coding activity recorded in the last {window_days} days."
    ))
}

/// Section value for a WakaTime result.
///
/// Credential problems and an empty window have their own messages;
/// transient failures stay `Unavailable` so the previous block is kept.
pub fn waka_section(
    result: &FetchResult<WakaSummary>,
    key_env: &str,
    window_days: u32,
) -> FetchResult<String> {
    match result {
        FetchResult::Success(summary) => FetchResult::Success(waka_block(summary)),
        FetchResult::Unavailable(reason) if reason.needs_configuration() => {
            FetchResult::Success(waka_needs_configuration(key_env))
        }
        FetchResult::Unavailable(UnavailableReason::NoData) => {
            FetchResult::Success(waka_no_activity(window_days))
        }
        FetchResult::Unavailable(reason) => FetchResult::Unavailable(reason.clone()),
    }
}

// ---------------------------------------------------------------------------
// Timestamps and commit message
// ---------------------------------------------------------------------------

/// `November 12, 2025 at 08:00 AM UTC`
pub fn marker_timestamp(now: DateTime<Utc>) -> String {
    now.format("%B %d, %Y at %I:%M %p UTC").to_string()
}

pub fn commit_message(changes: &[String], now: DateTime<Utc>) -> String {
    let mut msg = format!("🤖 Daily Update - {}\n\n", now.format("%Y-%m-%d"));
    if changes.is_empty() {
        msg.push_str("• Refreshed generated assets\n");
    }
    for change in changes {
        msg.push_str(&format!("• Updated {change}\n"));
    }
    msg.push_str(&format!("\nUpdated at: {} UTC", now.format("%Y-%m-%d %H:%M:%S")));
    msg
}
