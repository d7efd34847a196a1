//! End-to-end daily update: read → fetch → patch → write → publish.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use readmepulse_patcher::{
    Anchor, Directive, DirectiveReport, MarkerOutcome, Outcome, Patcher, Placement, read_marker,
    upsert_marker,
};
use readmepulse_shared::{
    AppConfig, Credentials, FetchResult, GithubStats, Quote, Result, SnakeConfig, WakaSummary,
};
use readmepulse_sources::{
    ContributionsClient, GithubStatsClient, QuoteClient, SnakeClient, Source, StreakSvgClient,
    WakaTimeClient, build_client, fallback_quote,
};
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::document::{digest, read_document, write_atomic};
use crate::publish::{PublishOutcome, Publisher};
use crate::render::{self, BadgeSpec, StatRole};
use crate::streak::{self, StreakEstimate};

/// Directive name of the quote card; its outcome gates the quote timestamp.
pub const QUOTE_CARD: &str = "quote_card";

/// Options for one `run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Document to patch.
    pub readme: PathBuf,
    /// Patch in memory only; nothing is written or published.
    pub dry_run: bool,
    /// Hand the result to the publisher.
    pub publish: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOrigin {
    Api,
    Fallback,
}

/// Everything the sources returned for one run.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedData {
    pub quote: Quote,
    pub quote_origin: QuoteOrigin,
    pub stats: FetchResult<GithubStats>,
    pub streak: FetchResult<StreakEstimate>,
    pub wakatime: FetchResult<WakaSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerReport {
    pub label: String,
    #[serde(flatten)]
    pub outcome: MarkerOutcome,
}

/// The patched document plus what happened to each directive and marker.
#[derive(Debug, Clone, Serialize)]
pub struct PatchOutcome {
    #[serde(skip)]
    pub document: String,
    pub directives: Vec<DirectiveReport>,
    pub markers: Vec<MarkerReport>,
    pub changed: bool,
}

impl PatchOutcome {
    /// Human-readable names of the directives that changed the document.
    pub fn applied(&self) -> Vec<String> {
        self.directives
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Applied { .. }))
            .map(|r| r.name.replace('_', " "))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SnakeStatus {
    Written,
    Unchanged,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SnakeReport {
    pub file: String,
    #[serde(flatten)]
    pub status: SnakeStatus,
}

/// Result of a `run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub readme: PathBuf,
    pub dry_run: bool,
    pub quote_origin: QuoteOrigin,
    pub directives: Vec<DirectiveReport>,
    pub markers: Vec<MarkerReport>,
    pub changed: bool,
    pub written: bool,
    pub before_sha256: String,
    pub after_sha256: String,
    pub snake: Vec<SnakeReport>,
    pub publish: Option<PublishOutcome>,
    pub elapsed_ms: u128,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each source responds.
    fn source_done(&self, source: &str, available: bool);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn source_done(&self, _source: &str, _available: bool) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// One client per source, built from config and credentials.
pub struct Clients {
    pub quote: QuoteClient,
    pub stats: GithubStatsClient,
    pub calendar: ContributionsClient,
    pub streak_svg: StreakSvgClient,
    pub wakatime: WakaTimeClient,
    pub snake: SnakeClient,
}

impl Clients {
    pub fn new(config: &AppConfig, credentials: &Credentials, today: NaiveDate) -> Result<Self> {
        let http = build_client(Duration::from_secs(config.http.timeout_secs))?;
        let quote_http = build_client(Duration::from_secs(config.http.quote_timeout_secs))?;
        let user = config.profile.username.as_str();
        let endpoints = &config.endpoints;

        Ok(Self {
            quote: QuoteClient::new(quote_http, endpoints.quote_api.clone()),
            stats: GithubStatsClient::new(
                http.clone(),
                &endpoints.github_api,
                user,
                credentials.github_token.clone(),
            ),
            calendar: ContributionsClient::new(
                http.clone(),
                &endpoints.github_api,
                user,
                credentials.github_token.clone(),
                today,
            ),
            streak_svg: StreakSvgClient::new(http.clone(), &endpoints.streak_svg_urls, user),
            wakatime: WakaTimeClient::new(
                http.clone(),
                &endpoints.wakatime_api,
                credentials.wakatime_key.clone(),
                today,
                config.wakatime.window_days,
                config.wakatime.top_n,
            ),
            snake: SnakeClient::new(http, endpoints.snake_url.clone(), user),
        })
    }
}

/// Call every source in turn. Each failure stays local to its own field.
pub async fn fetch_all(
    clients: &Clients,
    today: NaiveDate,
    progress: &dyn ProgressReporter,
) -> FetchedData {
    progress.phase("Fetching quote");
    let (quote, quote_origin) = match clients.quote.fetch().await {
        FetchResult::Success(quote) => (quote, QuoteOrigin::Api),
        FetchResult::Unavailable(reason) => {
            warn!(%reason, "using a fallback quote");
            (fallback_quote(), QuoteOrigin::Fallback)
        }
    };
    progress.source_done(clients.quote.name(), quote_origin == QuoteOrigin::Api);

    progress.phase("Fetching GitHub stats");
    let stats = clients.stats.fetch().await;
    progress.source_done(clients.stats.name(), stats.is_success());

    progress.phase("Computing streak");
    let streak = streak::estimate(&clients.calendar, &clients.streak_svg, today).await;
    progress.source_done("streak", streak.is_success());

    progress.phase("Fetching WakaTime summary");
    let wakatime = clients.wakatime.fetch().await;
    progress.source_done(clients.wakatime.name(), wakatime.is_success());

    FetchedData {
        quote,
        quote_origin,
        stats,
        streak,
        wakatime,
    }
}

// ---------------------------------------------------------------------------
// Directives and patching
// ---------------------------------------------------------------------------

/// One directive per dynamic region, in a fixed order.
pub fn build_directives(data: &FetchedData, config: &AppConfig) -> Result<Vec<Directive>> {
    let endpoints = &config.endpoints;
    let anchors = &config.anchors;
    let mut directives = Vec::new();

    directives.push(Directive::new(
        QUOTE_CARD,
        Anchor::attribute(
            "img",
            "src",
            &render::quote_card_prefix(&endpoints.quote_card_base),
        ),
        FetchResult::Success(render::quote_card_url(
            &endpoints.quote_card_base,
            &data.quote,
        )?),
    ));

    let stats = data.stats.as_ref();
    let roles = [
        (StatRole::Followers, stats.clone().map(|s| s.followers)),
        (StatRole::Stars, stats.clone().map(|s| s.total_stars)),
        (StatRole::Repos, stats.map(|s| s.public_repos)),
    ];
    for (role, value) in roles {
        let badge = match &value {
            FetchResult::Success(n) => {
                FetchResult::Success(BadgeSpec::for_role(role, *n).url(&endpoints.shields_base)?)
            }
            FetchResult::Unavailable(reason) => FetchResult::Unavailable(reason.clone()),
        };
        directives.push(Directive::new(
            format!("{}_badge", role.key()),
            Anchor::attribute(
                "img",
                "src",
                &render::badge_prefix(&endpoints.shields_base, role.label()),
            ),
            badge,
        ));
        directives.push(Directive::new(
            role.key(),
            Anchor::element("b", &anchors.role_attr, role.key()),
            value.map(|n| n.to_string()),
        ));
    }

    let streak_days = data.streak.as_ref().map(|e| e.days.to_string());
    directives.push(Directive::new(
        "streak_badge",
        Anchor::embedded_number(&anchors.streak_before, &anchors.streak_after),
        streak_days.clone(),
    ));
    directives.push(Directive::new(
        StatRole::Streak.key(),
        Anchor::element("b", &anchors.role_attr, StatRole::Streak.key()),
        streak_days,
    ));

    directives.push(Directive::new(
        "wakatime",
        Anchor::section(&anchors.waka_start, &anchors.waka_end),
        render::waka_section(
            &data.wakatime,
            &config.credentials.wakatime_key_env,
            config.wakatime.window_days,
        ),
    ));

    Ok(directives)
}

/// Apply every directive, then refresh the timestamp markers.
///
/// The quote marker moves only when the quote card changed and the
/// last-updated marker only when anything changed, so re-running with the same
/// data leaves the document byte-identical. Missing markers are always added.
pub fn patch_document(
    original: &str,
    data: &FetchedData,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<PatchOutcome> {
    let directives = build_directives(data, config)?;
    let report = Patcher::apply(original, &directives);

    let quote_changed = matches!(report.outcome(QUOTE_CARD), Some(Outcome::Applied { .. }));
    let content_changed = report.changed;
    let stamp = render::marker_timestamp(now);
    let anchors = &config.anchors;

    let mut document = report.document;
    let mut markers = Vec::new();
    for (label, refresh, placement) in [
        (&anchors.quote_marker, quote_changed, Placement::Start),
        (&anchors.updated_marker, content_changed, Placement::End),
    ] {
        let present = read_marker(&document, label)?.is_some();
        if !refresh && present {
            debug!(label = %label, "content unchanged, marker kept");
            continue;
        }
        let (next, outcome) = upsert_marker(&document, label, &stamp, placement)?;
        document = next;
        markers.push(MarkerReport {
            label: label.clone(),
            outcome,
        });
    }

    let changed = document != original;
    Ok(PatchOutcome {
        document,
        directives: report.directives,
        markers,
        changed,
    })
}

// ---------------------------------------------------------------------------
// Snake assets
// ---------------------------------------------------------------------------

/// Download each configured snake SVG into `assets_dir` under `root`.
/// Failures are reported per file and never end the run.
#[instrument(skip_all, fields(files = config.files.len()))]
pub async fn download_snake(
    client: &SnakeClient,
    config: &SnakeConfig,
    root: &Path,
) -> Vec<SnakeReport> {
    let dir = root.join(&config.assets_dir);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!(dir = %dir.display(), error = %e, "cannot create assets directory");
        return config
            .files
            .iter()
            .map(|file| SnakeReport {
                file: file.clone(),
                status: SnakeStatus::Failed {
                    reason: e.to_string(),
                },
            })
            .collect();
    }

    let mut reports = Vec::with_capacity(config.files.len());
    for file in &config.files {
        let status = match client.fetch_file(file).await {
            FetchResult::Success(svg) => {
                let path = dir.join(file);
                if std::fs::read_to_string(&path).is_ok_and(|old| old == svg) {
                    SnakeStatus::Unchanged
                } else {
                    match write_atomic(&path, &svg) {
                        Ok(()) => SnakeStatus::Written,
                        Err(e) => {
                            warn!(file = %file, error = %e, "snake SVG not saved");
                            SnakeStatus::Failed {
                                reason: e.to_string(),
                            }
                        }
                    }
                }
            }
            FetchResult::Unavailable(reason) => SnakeStatus::Failed {
                reason: reason.to_string(),
            },
        };
        reports.push(SnakeReport {
            file: file.clone(),
            status,
        });
    }
    reports
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run the full daily update.
///
/// 1. Read the document (fatal on failure)
/// 2. Fetch every source
/// 3. Patch in memory
/// 4. Write, only if the text changed
/// 5. Download snake assets (optional)
/// 6. Publish
pub async fn run(
    config: &AppConfig,
    credentials: &Credentials,
    options: &RunOptions,
    publisher: &dyn Publisher,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let run_id = Uuid::now_v7();
    run_inner(run_id, config, credentials, options, publisher, progress)
        .instrument(info_span!("run", %run_id))
        .await
}

async fn run_inner(
    run_id: Uuid,
    config: &AppConfig,
    credentials: &Credentials,
    options: &RunOptions,
    publisher: &dyn Publisher,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let now = Utc::now();
    let today = now.date_naive();

    info!(
        readme = %options.readme.display(),
        user = %config.profile.username,
        dry_run = options.dry_run,
        "starting daily update"
    );

    // --- Phase 1: Read ---
    progress.phase("Reading document");
    let original = read_document(&options.readme)?;
    let before_sha256 = digest(&original);

    // --- Phase 2: Fetch ---
    let clients = Clients::new(config, credentials, today)?;
    let data = fetch_all(&clients, today, progress).await;

    // --- Phase 3: Patch ---
    progress.phase("Patching document");
    let patch = patch_document(&original, &data, config, now)?;
    let after_sha256 = digest(&patch.document);
    info!(
        before = %before_sha256,
        after = %after_sha256,
        changed = patch.changed,
        applied = patch.applied().len(),
        "document patched"
    );

    // --- Phase 4: Write ---
    let written = patch.changed && !options.dry_run;
    if written {
        progress.phase("Writing document");
        write_atomic(&options.readme, &patch.document)?;
    } else if options.dry_run {
        info!("dry run, document not written");
    } else {
        info!("document unchanged, not rewritten");
    }

    // --- Phase 5: Snake assets ---
    let snake = if config.snake.enabled && !options.dry_run {
        progress.phase("Downloading snake animation");
        download_snake(&clients.snake, &config.snake, document_dir(&options.readme)).await
    } else {
        Vec::new()
    };

    // --- Phase 6: Publish ---
    let publish = if options.publish && !options.dry_run {
        progress.phase("Publishing");
        let mut changes = patch.applied();
        changes.extend(
            snake
                .iter()
                .filter(|s| s.status == SnakeStatus::Written)
                .map(|s| format!("snake animation ({})", s.file)),
        );
        Some(publisher.publish(&render::commit_message(&changes, now))?)
    } else {
        None
    };

    let summary = RunSummary {
        run_id,
        readme: options.readme.clone(),
        dry_run: options.dry_run,
        quote_origin: data.quote_origin,
        directives: patch.directives,
        markers: patch.markers,
        changed: patch.changed,
        written,
        before_sha256,
        after_sha256,
        snake,
        publish,
        elapsed_ms: start.elapsed().as_millis(),
    };

    progress.done(&summary);
    info!(
        changed = summary.changed,
        written = summary.written,
        publish = ?summary.publish,
        elapsed_ms = summary.elapsed_ms,
        "daily update complete"
    );

    Ok(summary)
}

/// Directory holding the document; the git working tree for publishing.
pub fn document_dir(readme: &Path) -> &Path {
    readme
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Paths a run may change, relative to [`document_dir`]. Publishing is
/// limited to these.
pub fn publish_scope(readme: &Path, config: &AppConfig) -> Vec<PathBuf> {
    let mut scope: Vec<PathBuf> = readme.file_name().map(PathBuf::from).into_iter().collect();
    if config.snake.enabled {
        scope.push(config.snake.assets_dir.clone());
    }
    scope
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// One source's answer, summarised for display.
#[derive(Debug, Clone, Serialize)]
pub struct SourceProbe {
    pub source: &'static str,
    pub result: FetchResult<String>,
}

/// Query every source once and summarise what came back.
pub async fn check_sources(
    config: &AppConfig,
    credentials: &Credentials,
) -> Result<Vec<SourceProbe>> {
    let today = Utc::now().date_naive();
    let clients = Clients::new(config, credentials, today)?;
    let mut probes = Vec::new();

    let quote = clients.quote.fetch().await;
    probes.push(SourceProbe {
        source: clients.quote.name(),
        result: quote.map(|q| format!("\"{}\" by {}", q.content, q.author)),
    });

    let stats = clients.stats.fetch().await;
    probes.push(SourceProbe {
        source: clients.stats.name(),
        result: stats.map(|s| {
            format!(
                "{} followers, {} repositories, {} stars{}",
                s.followers,
                s.public_repos,
                s.total_stars,
                if s.complete { "" } else { " (partial)" }
            )
        }),
    });

    let calendar = clients.calendar.fetch().await;
    probes.push(SourceProbe {
        source: clients.calendar.name(),
        result: calendar.map(|days| {
            let total: u64 = days.iter().map(|d| u64::from(d.count)).sum();
            format!("{} days, {total} contributions", days.len())
        }),
    });

    let svg = clients.streak_svg.fetch().await;
    probes.push(SourceProbe {
        source: clients.streak_svg.name(),
        result: svg.map(|n| format!("current streak {n} days")),
    });

    let wakatime = clients.wakatime.fetch().await;
    probes.push(SourceProbe {
        source: clients.wakatime.name(),
        result: wakatime.map(|w| {
            format!(
                "{} over {} days",
                render::format_duration(w.total_seconds),
                w.days
            )
        }),
    });

    Ok(probes)
}

/// Streak plus the source that produced it.
pub async fn estimate_streak(
    config: &AppConfig,
    credentials: &Credentials,
) -> Result<FetchResult<StreakEstimate>> {
    let today = Utc::now().date_naive();
    let clients = Clients::new(config, credentials, today)?;
    Ok(streak::estimate(&clients.calendar, &clients.streak_svg, today).await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::TimeZone;
    use readmepulse_shared::{NamedDuration, ReadmeError, UnavailableReason};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::streak::StreakSource;

    fn fixture() -> String {
        let path =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/readme/profile.md");
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "readmepulse-pipeline-test-{}",
            Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 12, 8, 0, 0).unwrap()
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.profile.username = "octocat".into();
        config
    }

    fn waka() -> WakaSummary {
        WakaSummary {
            start: NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 11, 12).unwrap(),
            days: 7,
            total_seconds: 36000.0,
            languages: vec![NamedDuration {
                name: "Rust".into(),
                total_seconds: 36000.0,
            }],
            editors: vec![],
        }
    }

    fn data() -> FetchedData {
        FetchedData {
            quote: Quote::new("Simplicity is prerequisite for reliability.", "Edsger W. Dijkstra"),
            quote_origin: QuoteOrigin::Api,
            stats: FetchResult::Success(GithubStats {
                followers: 42,
                following: 1,
                public_repos: 7,
                total_stars: 310,
                total_forks: 12,
                complete: true,
            }),
            streak: FetchResult::Success(StreakEstimate {
                days: 15,
                source: StreakSource::Calendar,
            }),
            wakatime: FetchResult::Success(waka()),
        }
    }

    #[test]
    fn patches_every_region() {
        let out = patch_document(&fixture(), &data(), &config(), now()).unwrap();
        let doc = &out.document;

        assert!(out.changed);
        assert!(doc.contains("quote=Simplicity%20is%20prerequisite%20for%20reliability."));
        assert!(doc.contains("label=Followers&message=42&color=4c1"));
        // Single-quoted attribute keeps its quotes.
        assert!(doc.contains("src='https://img.shields.io/static/v1?label=Total%20Stars&message=310&"));
        assert!(doc.contains("label=Repositories&message=7&"));
        assert!(doc.contains("🔥_Current_Streak-15_Days-F85D7F"));
        assert!(doc.contains(r#"<b style="color:#4c1" data-stat="followers">42</b>"#));
        assert!(doc.contains("<b data-stat='repos'>7</b>"));
        assert!(doc.contains(r#"<b data-stat="streak" style="color:#F85D7F">15</b>"#));
        assert!(doc.contains("Coding time Nov 05, 2025 to Nov 12, 2025: 10 hrs 0 mins"));
        assert!(doc.starts_with("<!-- Quote Updated: November 12, 2025 at 08:00 AM UTC -->\n"));
        assert!(doc.ends_with("<!-- Last Updated: November 12, 2025 at 08:00 AM UTC -->\n"));
    }

    #[test]
    fn second_patch_is_identity() {
        let first = patch_document(&fixture(), &data(), &config(), now()).unwrap();
        let later = now() + chrono::Duration::hours(3);
        let second = patch_document(&first.document, &data(), &config(), later).unwrap();

        assert!(!second.changed);
        assert_eq!(second.document, first.document);
        assert!(second.markers.is_empty());
        assert!(second.applied().is_empty());
    }

    #[test]
    fn wakatime_outage_does_not_touch_other_regions() {
        let mut data = data();
        data.wakatime = FetchResult::Unavailable(UnavailableReason::Network("timed out".into()));
        let original = fixture();
        let out = patch_document(&original, &data, &config(), now()).unwrap();

        assert!(out.document.contains("label=Followers&message=42&"));
        assert!(out.document.contains("quote=Simplicity"));
        assert!(out.document.contains("Coding time last week: 1 hr 0 mins"));
        let waka = out.directives.iter().find(|d| d.name == "wakatime").unwrap();
        assert!(matches!(waka.outcome, Outcome::Skipped { .. }));
    }

    #[test]
    fn unavailable_streak_keeps_badge_bytes() {
        let mut data = data();
        data.streak = FetchResult::Unavailable(UnavailableReason::NoData);
        let out = patch_document(&fixture(), &data, &config(), now()).unwrap();

        assert!(out.document.contains("🔥_Current_Streak-12_Days-F85D7F"));
        assert!(out.document.contains(r#"data-stat="streak" style="color:#F85D7F">12</b>"#));
    }

    #[test]
    fn missing_wakatime_key_renders_configuration_hint() {
        let mut data = data();
        data.wakatime = FetchResult::Unavailable(UnavailableReason::MissingCredentials);
        let out = patch_document(&fixture(), &data, &config(), now()).unwrap();
        assert!(out.document.contains("set WAKATIME_API_KEY to a valid API key"));
    }

    #[test]
    fn missing_anchors_are_tolerated() {
        let doc = "# Just a title\n\n<b data-stat=\"followers\">1</b>\n";
        let out = patch_document(doc, &data(), &config(), now()).unwrap();

        assert!(out.document.contains("<b data-stat=\"followers\">42</b>"));
        let missing = out
            .directives
            .iter()
            .filter(|d| d.outcome == Outcome::AnchorMissing)
            .count();
        assert!(missing >= 5);
        // Both markers get inserted on a document that has none.
        assert_eq!(out.markers.len(), 2);
        assert!(out.document.starts_with("<!-- Quote Updated: "));
    }

    #[test]
    fn unchanged_quote_keeps_quote_marker() {
        let first = patch_document(&fixture(), &data(), &config(), now()).unwrap();
        let mut next = data();
        if let FetchResult::Success(stats) = &mut next.stats {
            stats.followers = 43;
        }
        let later = Utc.with_ymd_and_hms(2025, 11, 13, 9, 30, 0).unwrap();
        let second = patch_document(&first.document, &next, &config(), later).unwrap();

        assert!(second.document.starts_with("<!-- Quote Updated: November 12, 2025 at 08:00 AM UTC -->"));
        assert!(second.document.contains("<!-- Last Updated: November 13, 2025 at 09:30 AM UTC -->"));
        assert_eq!(second.applied(), vec!["followers badge", "followers"]);
    }

    // -- End-to-end against mock services ----------------------------------

    /// Mimics `git status`: dirty when the file differs from the last commit.
    struct RecordingPublisher {
        path: PathBuf,
        committed: Mutex<String>,
        messages: Mutex<Vec<String>>,
    }

    impl RecordingPublisher {
        fn new(path: &Path) -> Self {
            Self {
                path: path.to_path_buf(),
                committed: Mutex::new(std::fs::read_to_string(path).unwrap()),
                messages: Mutex::new(Vec::new()),
            }
        }
    }

    impl Publisher for RecordingPublisher {
        fn publish(&self, message: &str) -> Result<PublishOutcome> {
            let current = read_document(&self.path)?;
            let mut committed = self.committed.lock().unwrap();
            if *committed == current {
                return Ok(PublishOutcome::NothingToCommit);
            }
            *committed = current;
            self.messages.lock().unwrap().push(message.to_string());
            Ok(PublishOutcome::Committed { pushed: false })
        }
    }

    async fn mock_services() -> MockServer {
        let server = MockServer::start().await;
        let today = Utc::now().date_naive();

        Mock::given(method("GET"))
            .and(path("/random"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": "Talk is cheap. Show me the code.",
                "author": "Linus Torvalds"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "followers": 42, "following": 1, "public_repos": 2
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/octocat/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "stargazers_count": 300, "forks_count": 4 },
                { "stargazers_count": 10, "forks_count": 0 }
            ])))
            .mount(&server)
            .await;

        let days: Vec<_> = (0..3)
            .map(|i| {
                json!({
                    "contributionCount": 2,
                    "date": (today - chrono::Days::new(i)).to_string()
                })
            })
            .collect();
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "user": { "contributionsCollection": { "contributionCalendar": {
                    "totalContributions": 6,
                    "weeks": [ { "contributionDays": days } ]
                }}}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/current/summaries"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        server
    }

    fn mocked_config(server: &MockServer) -> AppConfig {
        let mut config = config();
        config.endpoints.quote_api = format!("{}/random", server.uri());
        config.endpoints.github_api = server.uri();
        config.endpoints.wakatime_api = server.uri();
        config.endpoints.streak_svg_urls = vec![format!("{}/streak?user={{user}}", server.uri())];
        config
    }

    fn credentials() -> Credentials {
        Credentials {
            github_token: Some("token".into()),
            wakatime_key: Some("key".into()),
        }
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let server = mock_services().await;
        let config = mocked_config(&server);
        let dir = temp_dir();
        let readme = dir.join("README.md");
        std::fs::write(&readme, fixture()).unwrap();
        let publisher = RecordingPublisher::new(&readme);
        let options = RunOptions {
            readme: readme.clone(),
            dry_run: false,
            publish: true,
        };

        let first = run(&config, &credentials(), &options, &publisher, &SilentProgress)
            .await
            .unwrap();
        assert!(first.written);
        assert_eq!(first.publish, Some(PublishOutcome::Committed { pushed: false }));
        let after_first = std::fs::read_to_string(&readme).unwrap();
        assert!(after_first.contains("quote=Talk%20is%20cheap."));
        assert!(after_first.contains("label=Total%20Stars&message=310&"));
        assert!(after_first.contains("🔥_Current_Streak-3_Days-"));
        // WakaTime was down: previous block kept.
        assert!(after_first.contains("Coding time last week: 1 hr 0 mins"));

        let messages = publisher.messages.lock().unwrap().clone();
        assert!(messages[0].starts_with("🤖 Daily Update - "));
        assert!(messages[0].contains("• Updated quote card"));

        let second = run(&config, &credentials(), &options, &publisher, &SilentProgress)
            .await
            .unwrap();
        assert!(!second.changed);
        assert!(!second.written);
        assert_eq!(second.before_sha256, second.after_sha256);
        assert_eq!(second.publish, Some(PublishOutcome::NothingToCommit));
        assert_eq!(std::fs::read_to_string(&readme).unwrap(), after_first);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let server = mock_services().await;
        let config = mocked_config(&server);
        let dir = temp_dir();
        let readme = dir.join("README.md");
        std::fs::write(&readme, fixture()).unwrap();
        let publisher = RecordingPublisher::new(&readme);
        let options = RunOptions {
            readme: readme.clone(),
            dry_run: true,
            publish: true,
        };

        let summary = run(&config, &credentials(), &options, &publisher, &SilentProgress)
            .await
            .unwrap();
        assert!(summary.changed);
        assert!(!summary.written);
        assert_eq!(summary.publish, None);
        assert_eq!(std::fs::read_to_string(&readme).unwrap(), fixture());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_document_is_fatal() {
        let server = mock_services().await;
        let config = mocked_config(&server);
        let dir = temp_dir();
        let readme = dir.join("missing.md");
        std::fs::write(&readme, "").unwrap();
        let publisher = RecordingPublisher::new(&readme);
        std::fs::remove_file(&readme).unwrap();
        let options = RunOptions {
            readme,
            dry_run: false,
            publish: true,
        };

        let err = run(&config, &credentials(), &options, &publisher, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, ReadmeError::Io { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn snake_files_land_next_to_the_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/octocat/github-contribution-grid-snake.svg"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<svg>light</svg>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/octocat/github-contribution-grid-snake-dark.svg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = temp_dir();
        let http = build_client(Duration::from_secs(5)).unwrap();
        let client =
            SnakeClient::new(http, format!("{}/{{user}}/{{file}}", server.uri()), "octocat");
        let config = SnakeConfig {
            enabled: true,
            ..SnakeConfig::default()
        };

        let reports = download_snake(&client, &config, &dir).await;
        assert_eq!(reports[0].file, config.files[0]);
        assert_eq!(reports[0].status, SnakeStatus::Written);
        assert!(matches!(reports[1].status, SnakeStatus::Failed { .. }));
        assert_eq!(
            std::fs::read_to_string(dir.join("assets/github-contribution-grid-snake.svg"))
                .unwrap(),
            "<svg>light</svg>"
        );

        let again = download_snake(&client, &config, &dir).await;
        assert_eq!(again[0].status, SnakeStatus::Unchanged);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn fixture_references_default_snake_files() {
        let doc = fixture();
        let config = SnakeConfig::default();
        for file in &config.files {
            let reference = format!("{}/{file}", config.assets_dir.display());
            assert!(doc.contains(&reference), "fixture does not reference {reference}");
        }
    }

    #[test]
    fn publish_scope_covers_document_and_assets() {
        let mut config = AppConfig::default();
        let readme = Path::new("profile/README.md");
        assert_eq!(publish_scope(readme, &config), vec![PathBuf::from("README.md")]);

        config.snake.enabled = true;
        assert_eq!(
            publish_scope(readme, &config),
            vec![PathBuf::from("README.md"), PathBuf::from("assets")]
        );
        assert_eq!(document_dir(readme), Path::new("profile"));
    }
}
