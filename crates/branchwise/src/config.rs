// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the branchwise command line
//!
//! Flags and environment variables are parsed with clap. Anything not given
//! there falls back to the settings file, then to built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use branchwise_git::cache::{DEFAULT_TTL_DAYS, default_cache_root};
use branchwise_git::source::{DEFAULT_TIMEOUT, DEFAULT_WORKERS};
use branchwise_git::{CacheConfig, CommitFilter, DateWindow, SourceOptions, ValidationError};
use branchwise_lineage::DEFAULT_PRIMARY_BRANCH;
use chrono::{DateTime, Duration as Span, NaiveDate, NaiveTime, Utc};
use clap::{ArgGroup, Parser, Subcommand};

use crate::settings::Settings;

/// Days covered when no range is given
pub const DEFAULT_RANGE_DAYS: u32 = 7;

/// Days counted per `--months`
const DAYS_PER_MONTH: i64 = 30;

/// Branchwise - attribute each commit to the branch it was written on
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "branchwise")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("range").args(["days", "weeks", "months", "start"])))]
pub struct Config {
    /// Subcommand to run (defaults to resolving `repository`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Repository path or URL
    ///
    /// GitHub URLs are read through the API when a token is configured and
    /// cloned otherwise. Other URLs are mirrored into the cache.
    pub repository: Option<String>,

    /// First day of the range (YYYY-MM-DD), requires --end
    #[arg(short, long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD), inclusive
    #[arg(short, long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Cover the last N days
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Cover the last N weeks
    #[arg(short, long)]
    pub weeks: Option<u32>,

    /// Cover the last N months of 30 days
    #[arg(short, long)]
    pub months: Option<u32>,

    /// Only resolve this branch
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Only include commits whose author name or email is exactly this
    #[arg(short, long)]
    pub author: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Branch that keeps commits shared with other branches
    #[arg(long, env = "BRANCHWISE_PRIMARY_BRANCH")]
    pub primary_branch: Option<String>,

    /// Directory for mirrors of remote repositories
    #[arg(long, env = "BRANCHWISE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Days a mirror is reused before it is cloned again
    #[arg(long, env = "BRANCHWISE_CACHE_TTL_DAYS")]
    pub cache_ttl_days: Option<u64>,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Branches listed concurrently
    #[arg(long, env = "BRANCHWISE_WORKERS")]
    pub workers: Option<usize>,

    /// Timeout in seconds for each branch listing
    #[arg(long, env = "BRANCHWISE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Settings file
    ///
    /// Defaults to ~/.config/branchwise/config.json (or platform equivalent).
    #[arg(long, env = "BRANCHWISE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so the report on stdout stays clean.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show or change the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// `config` actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print the effective settings (token redacted)
    Show,
    /// Set one key in the settings file; an empty value clears it
    ///
    /// Keys: github_token, cache_dir, cache_ttl_days, primary_branch,
    /// workers, timeout_secs
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
}

impl Config {
    /// Settings file path, using the platform default if not specified
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(Settings::default_path)
    }

    /// Validate the configuration for a resolve run
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no repository was given
    /// - `--start` and `--end` are not given together
    /// - the range ends before it starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.as_deref().is_none_or(|r| r.trim().is_empty()) {
            return Err(ConfigError::MissingRepository);
        }
        if self.start.is_some() != self.end.is_some() {
            return Err(ConfigError::PartialRange);
        }
        self.date_window(Utc::now())?;
        Ok(())
    }

    /// Date window relative to `now`
    ///
    /// `--start`/`--end` cover whole days in UTC; `--days`, `--weeks` and
    /// `--months` end at `now`. Without any of them the last
    /// [`DEFAULT_RANGE_DAYS`] days are used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::PartialRange` if only one of `--start`/`--end`
    /// is set and `ConfigError::InvalidWindow` if the range is reversed.
    pub fn date_window(&self, now: DateTime<Utc>) -> Result<DateWindow, ConfigError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                let start = start.and_time(NaiveTime::MIN).and_utc();
                let end = end
                    .and_hms_opt(23, 59, 59)
                    .map(|t| t.and_utc())
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                Ok(DateWindow::new(start, end)?)
            }
            (None, None) => {
                let days = if let Some(days) = self.days {
                    i64::from(days)
                } else if let Some(weeks) = self.weeks {
                    i64::from(weeks) * 7
                } else if let Some(months) = self.months {
                    i64::from(months) * DAYS_PER_MONTH
                } else {
                    i64::from(DEFAULT_RANGE_DAYS)
                };
                let span = Span::try_days(days).unwrap_or(Span::MAX);
                Ok(DateWindow::ending_at(now, span)?)
            }
            _ => Err(ConfigError::PartialRange),
        }
    }

    /// Window and author filter relative to `now`
    ///
    /// # Errors
    ///
    /// See [`Config::date_window`].
    pub fn commit_filter(&self, now: DateTime<Utc>) -> Result<CommitFilter, ConfigError> {
        let filter = CommitFilter::new(self.date_window(now)?);
        Ok(match &self.author {
            Some(author) => filter.with_author(author.clone()),
            None => filter,
        })
    }

    /// Primary branch: flag, then settings, then `main`
    #[must_use]
    pub fn primary_branch(&self, settings: &Settings) -> String {
        self.primary_branch
            .clone()
            .or_else(|| settings.primary_branch.clone())
            .unwrap_or_else(|| DEFAULT_PRIMARY_BRANCH.to_string())
    }

    /// Backend options merged from flags, settings and defaults
    #[must_use]
    pub fn source_options(&self, settings: &Settings) -> SourceOptions {
        let cache_root = self
            .cache_dir
            .clone()
            .or_else(|| settings.cache_dir.clone())
            .unwrap_or_else(default_cache_root);
        let ttl_days = self
            .cache_ttl_days
            .or(settings.cache_ttl_days)
            .unwrap_or(DEFAULT_TTL_DAYS);
        let workers = self.workers.or(settings.workers).unwrap_or(DEFAULT_WORKERS);
        let timeout = self
            .timeout_secs
            .or(settings.timeout_secs)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        let options = SourceOptions::default()
            .with_cache(CacheConfig::new(cache_root).with_ttl_days(ttl_days))
            .with_workers(workers)
            .with_timeout(timeout);

        match self
            .github_token
            .clone()
            .or_else(|| settings.github_token.clone())
            .filter(|t| !t.trim().is_empty())
        {
            Some(token) => options.with_token(token),
            None => options,
        }
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No repository locator given
    #[error("A repository path or URL is required")]
    MissingRepository,

    /// Only one end of an explicit range given
    #[error("--start and --end must be given together")]
    PartialRange,

    /// Range ends before it starts
    #[error(transparent)]
    InvalidWindow(#[from] ValidationError),

    /// Settings file exists but cannot be read
    #[error("Failed to read settings file {0}: {1}")]
    SettingsRead(PathBuf, std::io::Error),

    /// Settings file is not valid JSON for [`Settings`]
    #[error("Invalid settings file {0}: {1}")]
    SettingsParse(PathBuf, serde_json::Error),

    /// Settings file cannot be written
    #[error("Failed to write settings file {0}: {1}")]
    SettingsWrite(PathBuf, std::io::Error),

    /// `config set` with an unknown key
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// `config set` with a value of the wrong type
    #[error("Invalid value for {key}: {value}")]
    InvalidSettingValue {
        /// Setting name
        key: String,
        /// Rejected value
        value: String,
    },
}
