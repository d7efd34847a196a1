//! Application configuration for readmepulse.
//!
//! Lookup order: an explicit `--config` path, then `./readmepulse.toml`, then
//! `~/.readmepulse/readmepulse.toml`, then built-in defaults.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored here, only the names of the env vars holding them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ReadmeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "readmepulse.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".readmepulse";

// ---------------------------------------------------------------------------
// Config structs (matching readmepulse.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub profile: ProfileConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub wakatime: WakaTimeConfig,

    #[serde(default)]
    pub anchors: AnchorsConfig,

    #[serde(default)]
    pub snake: SnakeConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

/// `[profile]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// GitHub login whose profile README is maintained.
    #[serde(default)]
    pub username: String,

    /// Path to the Markdown document to patch.
    #[serde(default = "default_readme_path")]
    pub readme_path: PathBuf,

    /// Append-only run log. Kept outside the repository by default so that
    /// logging never dirties the working tree.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            readme_path: default_readme_path(),
            log_file: default_log_file(),
        }
    }
}

fn default_readme_path() -> PathBuf {
    PathBuf::from("README.md")
}
fn default_log_file() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(CONFIG_DIR_NAME).join("readmepulse.log"),
        None => std::env::temp_dir().join("readmepulse.log"),
    }
}

/// `[endpoints]` section. Overridable so tests can point at a mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_quote_api")]
    pub quote_api: String,

    /// REST root; GraphQL lives at `{github_api}/graphql`.
    #[serde(default = "default_github_api")]
    pub github_api: String,

    #[serde(default = "default_wakatime_api")]
    pub wakatime_api: String,

    /// Streak SVG renderers, tried in order. `{user}` is substituted.
    #[serde(default = "default_streak_svg_urls")]
    pub streak_svg_urls: Vec<String>,

    /// Quote card renderer embedded in the README `<img>`.
    #[serde(default = "default_quote_card_base")]
    pub quote_card_base: String,

    #[serde(default = "default_shields_base")]
    pub shields_base: String,

    /// Contribution snake output; `{user}` and `{file}` are substituted.
    #[serde(default = "default_snake_url")]
    pub snake_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            quote_api: default_quote_api(),
            github_api: default_github_api(),
            wakatime_api: default_wakatime_api(),
            streak_svg_urls: default_streak_svg_urls(),
            quote_card_base: default_quote_card_base(),
            shields_base: default_shields_base(),
            snake_url: default_snake_url(),
        }
    }
}

fn default_quote_api() -> String {
    "https://api.quotable.io/random".into()
}
fn default_github_api() -> String {
    "https://api.github.com".into()
}
fn default_wakatime_api() -> String {
    "https://wakatime.com/api/v1".into()
}
fn default_streak_svg_urls() -> Vec<String> {
    vec![
        "https://streak-stats.demolab.com/?user={user}&theme=tokyonight".into(),
        "https://github-readme-streak-stats.herokuapp.com/?user={user}&theme=tokyonight".into(),
    ]
}
fn default_quote_card_base() -> String {
    "https://quotes-github-readme.vercel.app/api".into()
}
fn default_shields_base() -> String {
    "https://img.shields.io".into()
}
fn default_snake_url() -> String {
    "https://raw.githubusercontent.com/Platane/snk/output/{user}/{file}".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for GitHub, WakaTime and SVG requests.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// The quote API is optional; it gets a shorter leash.
    #[serde(default = "default_quote_timeout_secs")]
    pub quote_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            quote_timeout_secs: default_quote_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_quote_timeout_secs() -> u64 {
    5
}

/// `[credentials]` section: names of env vars, never the secrets themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Checked in order; the first non-empty one wins.
    #[serde(default = "default_github_token_envs")]
    pub github_token_env: Vec<String>,

    #[serde(default = "default_wakatime_key_env")]
    pub wakatime_key_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            github_token_env: default_github_token_envs(),
            wakatime_key_env: default_wakatime_key_env(),
        }
    }
}

fn default_github_token_envs() -> Vec<String> {
    vec!["GITHUB_TOKEN".into(), "GH_TOKEN".into()]
}
fn default_wakatime_key_env() -> String {
    "WAKATIME_API_KEY".into()
}

/// `[wakatime]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakaTimeConfig {
    /// Summary window length, ending today.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Languages/editors kept per day and in the rendered block.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for WakaTimeConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            top_n: default_top_n(),
        }
    }
}

fn default_window_days() -> u32 {
    7
}
fn default_top_n() -> usize {
    5
}

/// `[anchors]` section: literal markers the patcher looks for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorsConfig {
    #[serde(default = "default_waka_start")]
    pub waka_start: String,

    #[serde(default = "default_waka_end")]
    pub waka_end: String,

    #[serde(default = "default_quote_marker")]
    pub quote_marker: String,

    #[serde(default = "default_updated_marker")]
    pub updated_marker: String,

    /// Text before the streak number in the streak badge URL.
    #[serde(default = "default_streak_before")]
    pub streak_before: String,

    /// Text after the streak number in the streak badge URL.
    #[serde(default = "default_streak_after")]
    pub streak_after: String,

    /// Attribute naming the role of a `<b>` stat element.
    #[serde(default = "default_role_attr")]
    pub role_attr: String,
}

impl Default for AnchorsConfig {
    fn default() -> Self {
        Self {
            waka_start: default_waka_start(),
            waka_end: default_waka_end(),
            quote_marker: default_quote_marker(),
            updated_marker: default_updated_marker(),
            streak_before: default_streak_before(),
            streak_after: default_streak_after(),
            role_attr: default_role_attr(),
        }
    }
}

fn default_waka_start() -> String {
    "<!--START_SECTION:waka-->".into()
}
fn default_waka_end() -> String {
    "<!--END_SECTION:waka-->".into()
}
fn default_quote_marker() -> String {
    "Quote Updated".into()
}
fn default_updated_marker() -> String {
    "Last Updated".into()
}
fn default_streak_before() -> String {
    "🔥_Current_Streak-".into()
}
fn default_streak_after() -> String {
    "_Days-".into()
}
fn default_role_attr() -> String {
    "data-stat".into()
}

/// `[snake]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnakeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Relative to the README's directory.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    #[serde(default = "default_snake_files")]
    pub files: Vec<String>,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            assets_dir: default_assets_dir(),
            files: default_snake_files(),
        }
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}
fn default_snake_files() -> Vec<String> {
    vec![
        "github-contribution-grid-snake.svg".into(),
        "github-contribution-grid-snake-dark.svg".into(),
    ]
}

/// `[publish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Commit the document when it changed.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Push after a successful commit.
    #[serde(default = "default_true")]
    pub push: bool,

    /// Committer identity passed as `-c user.name=…`, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            push: true,
            author_name: None,
            author_email: None,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Credentials (runtime, resolved from the environment)
// ---------------------------------------------------------------------------

/// Secrets resolved from the environment at startup.
#[derive(Clone, Default)]
pub struct Credentials {
    pub github_token: Option<String>,
    pub wakatime_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &self.github_token.as_ref().map(|_| "***"))
            .field("wakatime_key", &self.wakatime_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    /// Read the configured env vars. Empty values count as absent.
    pub fn from_env(config: &CredentialsConfig) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve with an arbitrary lookup (used by tests).
    pub fn resolve(config: &CredentialsConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let github_token = config
            .github_token_env
            .iter()
            .find_map(|name| non_empty(name));
        let wakatime_key = non_empty(&config.wakatime_key_env);

        if github_token.is_none() {
            tracing::warn!(
                vars = ?config.github_token_env,
                "no GitHub token set, stats and calendar will be unavailable"
            );
        }
        if wakatime_key.is_none() {
            tracing::warn!(
                var = %config.wakatime_key_env,
                "no WakaTime API key set, coding activity will be unavailable"
            );
        }

        Self {
            github_token,
            wakatime_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.readmepulse/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReadmeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.readmepulse/readmepulse.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Find the config file to use, if any.
pub fn locate_config(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ReadmeError::config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    let user = config_file_path()?;
    Ok(user.exists().then_some(user))
}

/// Load the application config. Returns defaults if no file is found.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match locate_config(explicit)? {
        Some(path) => {
            tracing::debug!(?path, "loading config");
            load_config_from(&path)
        }
        None => {
            tracing::debug!("no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReadmeError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ReadmeError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `path` (or `./readmepulse.toml`).
/// Returns the path to the created file.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if path.exists() {
        return Err(ReadmeError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = render_config(&AppConfig::default())?;
    std::fs::write(&path, content).map_err(|e| ReadmeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Serialize a config as pretty TOML.
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| ReadmeError::config(e.to_string()))
}

/// Check the settings every run depends on.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let username = config.profile.username.trim();
    if username.is_empty() {
        return Err(ReadmeError::config(
            "profile.username is empty. Set it in readmepulse.toml or pass --user",
        ));
    }
    if username.len() > 39
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ReadmeError::config(format!(
            "profile.username {username:?} is not a valid GitHub login"
        )));
    }

    let endpoints = &config.endpoints;
    let named = [
        ("endpoints.quote_api", &endpoints.quote_api),
        ("endpoints.github_api", &endpoints.github_api),
        ("endpoints.wakatime_api", &endpoints.wakatime_api),
        ("endpoints.quote_card_base", &endpoints.quote_card_base),
        ("endpoints.shields_base", &endpoints.shields_base),
    ];
    for (name, value) in named {
        Url::parse(value)
            .map_err(|e| ReadmeError::config(format!("{name} = {value:?} is not a URL: {e}")))?;
    }

    if !(1..=60).contains(&config.http.timeout_secs)
        || !(1..=60).contains(&config.http.quote_timeout_secs)
    {
        return Err(ReadmeError::config("http timeouts must be between 1 and 60 seconds"));
    }
    if config.wakatime.window_days == 0 {
        return Err(ReadmeError::config("wakatime.window_days must be at least 1"));
    }

    Ok(())
}
