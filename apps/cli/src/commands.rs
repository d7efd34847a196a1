//! CLI command definitions, routing, and tracing setup.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use readmepulse_core::pipeline::{
    self, ProgressReporter, RunOptions, RunSummary, SilentProgress, SnakeStatus,
};
use readmepulse_core::publish::{GitCli, PublishOutcome};
use readmepulse_core::render::BadgeSpec;
use readmepulse_patcher::{MarkerOutcome, Outcome};
use readmepulse_shared::{
    AppConfig, Credentials, FetchResult, init_config, render_config, validate_config,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// readmepulse: keep a profile README up to date.
#[derive(Parser)]
#[command(
    name = "readmepulse",
    version,
    about = "Refresh the dynamic parts of a GitHub profile README and commit the result.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./readmepulse.toml, then ~/.readmepulse/readmepulse.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch every source, patch the README and publish it.
    Run {
        /// README to patch (defaults to profile.readme_path).
        #[arg(long)]
        readme: Option<PathBuf>,

        /// GitHub login (overrides profile.username).
        #[arg(long, env = "GITHUB_REPOSITORY_OWNER")]
        user: Option<String>,

        /// Push after committing (overrides publish.push).
        #[arg(
            long,
            env = "PUSH_CHANGES",
            value_name = "BOOL",
            value_parser = clap::builder::BoolishValueParser::new(),
        )]
        push: Option<bool>,

        /// Write the README but do not commit.
        #[arg(long)]
        no_publish: bool,

        /// Patch in memory and report; write nothing.
        #[arg(long)]
        dry_run: bool,

        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the current contribution streak and where it came from.
    Streak {
        /// GitHub login (overrides profile.username).
        #[arg(long, env = "GITHUB_REPOSITORY_OWNER")]
        user: Option<String>,
    },

    /// Query every source once and report what it returns.
    Check {
        /// GitHub login (overrides profile.username).
        #[arg(long, env = "GITHUB_REPOSITORY_OWNER")]
        user: Option<String>,
    },

    /// Print a static badge URL.
    Badge {
        /// Left-hand text.
        label: String,

        /// Right-hand text.
        message: String,

        #[arg(long, default_value = "blue")]
        color: String,

        #[arg(long, default_value = "for-the-badge")]
        style: String,

        /// simple-icons slug, rendered white.
        #[arg(long)]
        logo: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing: stdout in the chosen format, plus a plain-text copy
/// appended to `log_file`.
pub(crate) fn init_tracing(cli: &Cli, log_file: &Path) {
    use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

    let filter = match cli.verbose {
        0 => "readmepulse=info",
        1 => "readmepulse=debug",
        _ => "readmepulse=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let stdout_layer = match cli.log_format {
        LogFormat::Text => fmt::layer().with_target(false).boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };

    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = std::fs::create_dir_all(parent);
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file);
    let (file_layer, file_error) = match file {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!(path = %log_file.display(), error = %e, "cannot open log file, logging to stdout only");
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Run {
            readme,
            user,
            push,
            no_publish,
            dry_run,
            json,
        } => {
            let config = with_user(config, user)?;
            let options = RunOptions {
                readme: readme.unwrap_or_else(|| config.profile.readme_path.clone()),
                dry_run,
                publish: config.publish.enabled && !no_publish,
            };
            cmd_run(&config, options, push, json).await
        }
        Command::Streak { user } => cmd_streak(&with_user(config, user)?).await,
        Command::Check { user } => cmd_check(&with_user(config, user)?).await,
        Command::Badge {
            label,
            message,
            color,
            style,
            logo,
        } => cmd_badge(&config, &label, &message, &color, &style, logo.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(cli.config.as_deref()),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Apply a `--user` override and validate.
fn with_user(mut config: AppConfig, user: Option<String>) -> Result<AppConfig> {
    if let Some(user) = user.filter(|u| !u.trim().is_empty()) {
        config.profile.username = user.trim().to_string();
    }
    validate_config(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config: &AppConfig,
    options: RunOptions,
    push: Option<bool>,
    json: bool,
) -> Result<()> {
    let credentials = Credentials::from_env(&config.credentials);
    let workdir = pipeline::document_dir(&options.readme).to_path_buf();
    let publisher = GitCli::from_config(workdir, &config.publish)
        .push(push.unwrap_or(config.publish.push))
        .scope(pipeline::publish_scope(&options.readme, config));

    info!(
        user = %config.profile.username,
        readme = %options.readme.display(),
        dry_run = options.dry_run,
        publish = options.publish,
        "running daily update"
    );

    let summary = if json {
        pipeline::run(config, &credentials, &options, &publisher, &SilentProgress).await?
    } else {
        let reporter = CliProgress::new();
        pipeline::run(config, &credentials, &options, &publisher, &reporter).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    if summary.dry_run {
        let verdict = if summary.changed { "would change" } else { "is up to date" };
        println!("  Dry run: {} {verdict}.", summary.readme.display());
    } else if summary.written {
        println!("  README updated!");
    } else {
        println!("  README already up to date.");
    }
    println!("  Run:      {}", summary.run_id);
    println!();
    for report in &summary.directives {
        println!("  {:<18} {}", report.name, describe(&report.outcome));
    }
    for marker in &summary.markers {
        let outcome = match marker.outcome {
            MarkerOutcome::Replaced { .. } => "refreshed",
            MarkerOutcome::Inserted => "inserted",
        };
        println!("  {:<18} {outcome}", marker.label);
    }
    for snake in &summary.snake {
        let status = match &snake.status {
            SnakeStatus::Written => "downloaded".to_string(),
            SnakeStatus::Unchanged => "unchanged".to_string(),
            SnakeStatus::Failed { reason } => format!("failed: {reason}"),
        };
        println!("  {:<18} {status}", snake.file);
    }
    println!();
    let publish = match summary.publish {
        None => "skipped",
        Some(PublishOutcome::NothingToCommit) => "nothing to commit",
        Some(PublishOutcome::Committed { pushed: true }) => "committed and pushed",
        Some(PublishOutcome::Committed { pushed: false }) => "committed (not pushed)",
    };
    println!("  Publish:  {publish}");
    println!("  Time:     {:.1}s", summary.elapsed_ms as f64 / 1000.0);
    println!();
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Applied { matches: 1 } => "updated".to_string(),
        Outcome::Applied { matches } => format!("updated ({matches} places)"),
        Outcome::Unchanged { .. } => "unchanged".to_string(),
        Outcome::AnchorMissing => "anchor not found".to_string(),
        Outcome::Skipped { reason } => format!("kept, {reason}"),
        Outcome::Conflict { with } => format!("rejected, overlaps {with}"),
        Outcome::Invalid { message } => format!("invalid anchor: {message}"),
    }
}

async fn cmd_streak(config: &AppConfig) -> Result<()> {
    let credentials = Credentials::from_env(&config.credentials);
    match pipeline::estimate_streak(config, &credentials).await? {
        FetchResult::Success(estimate) => {
            println!(
                "Current streak for {}: {} days (from {:?})",
                config.profile.username, estimate.days, estimate.source
            );
        }
        FetchResult::Unavailable(reason) => {
            println!("Streak unavailable for {}: {reason}", config.profile.username);
        }
    }
    Ok(())
}

async fn cmd_check(config: &AppConfig) -> Result<()> {
    let credentials = Credentials::from_env(&config.credentials);
    let probes = pipeline::check_sources(config, &credentials).await?;

    println!();
    for probe in &probes {
        match &probe.result {
            FetchResult::Success(detail) => println!("  ✓ {:<22} {detail}", probe.source),
            FetchResult::Unavailable(reason) if reason.needs_configuration() => {
                println!("  ✗ {:<22} {reason} (check credentials)", probe.source)
            }
            FetchResult::Unavailable(reason) => println!("  ✗ {:<22} {reason}", probe.source),
        }
    }
    println!();

    let failing = probes.iter().filter(|p| !p.result.is_success()).count();
    info!(sources = probes.len(), failing, "source check complete");
    Ok(())
}

fn cmd_badge(
    config: &AppConfig,
    label: &str,
    message: &str,
    color: &str,
    style: &str,
    logo: Option<&str>,
) -> Result<()> {
    let mut badge = BadgeSpec::new(label, message).color(color).style(style);
    if let Some(logo) = logo {
        badge = badge.logo(logo);
    }
    let url = badge.url(&config.endpoints.shields_base)?;
    println!("{url}");
    println!("![{label}]({url})");
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = render_config(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn source_done(&self, source: &str, available: bool) {
        if !available {
            self.spinner.println(format!("  {source}: unavailable, keeping previous value"));
        }
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
