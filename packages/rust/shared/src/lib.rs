//! Shared types, error model, and configuration for readmepulse.
//!
//! This crate is the foundation depended on by all other readmepulse crates.
//! It provides:
//! - [`ReadmeError`], the unified error type
//! - [`FetchResult`] and the source payload types ([`Quote`], [`GithubStats`],
//!   [`ContributionDay`], [`WakaSummary`])
//! - Configuration ([`AppConfig`], [`Credentials`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnchorsConfig, AppConfig, Credentials, CredentialsConfig, EndpointsConfig, HttpConfig,
    ProfileConfig, PublishConfig, SnakeConfig, WakaTimeConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, locate_config, render_config, validate_config,
};
pub use error::{ReadmeError, Result};
pub use types::{
    ContributionDay, FetchResult, GithubStats, NamedDuration, Quote, UnavailableReason,
    WakaSummary,
};
