// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! The resolve run: read a repository, attribute its commits, report them

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use branchwise_git::{CommitFilter, RepositorySource, SourceError, SourceOptions};
use branchwise_lineage::{CommitGroup, LineageMap, resolve_branches};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Config, ConfigError};
use crate::settings::Settings;

/// Everything a resolve run needs, with flags and settings merged
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Repository path or URL
    pub locator: String,
    /// Window and author filter
    pub filter: CommitFilter,
    /// Restrict to one branch
    pub branch: Option<String>,
    /// Branch that keeps shared commits
    pub primary: String,
    /// Backend options
    pub options: SourceOptions,
}

impl ResolveRequest {
    /// Build a request from parsed flags and loaded settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no repository was given or the range is
    /// invalid.
    pub fn from_config(
        config: &Config,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let locator = config
            .repository
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(ConfigError::MissingRepository)?;

        Ok(Self {
            locator: locator.to_string(),
            filter: config.commit_filter(now)?,
            branch: config.branch.clone(),
            primary: config.primary_branch(settings),
            options: config.source_options(settings),
        })
    }
}

/// One author's commits on one branch, as printed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// Branch the commits are attributed to
    pub branch: String,
    /// Author name
    pub author: String,
    /// Earliest commit time
    pub start: DateTime<Utc>,
    /// Latest commit time
    pub end: DateTime<Utc>,
    /// Number of commits
    pub commit_count: usize,
    /// Full commit messages, newest first
    pub messages: Vec<String>,
}

impl From<&CommitGroup> for GroupReport {
    fn from(group: &CommitGroup) -> Self {
        Self {
            branch: group.branch.clone(),
            author: group.author.clone(),
            start: group.start,
            end: group.end,
            commit_count: group.commits.len(),
            messages: group.messages().map(str::to_string).collect(),
        }
    }
}

/// Result of a resolve run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// Locator as given
    pub repository: String,
    /// Backend used: `local`, `mirror` or `hosted`
    pub source: String,
    /// Window start
    pub since: DateTime<Utc>,
    /// Window end
    pub until: DateTime<Utc>,
    /// Branch that kept shared commits
    pub primary_branch: String,
    /// Branch restriction, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Author restriction, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Inferred parent of each branch
    pub lineage: LineageMap,
    /// Deduplicated author groups
    pub groups: Vec<GroupReport>,
    /// Commits dropped because another branch already had them
    pub duplicates_removed: usize,
}

/// Read the repository and attribute each commit to one branch
///
/// # Errors
///
/// Returns `SourceError` if the repository cannot be opened, fetched or
/// read.
pub async fn resolve(request: &ResolveRequest) -> Result<ResolveReport, SourceError> {
    let source = RepositorySource::resolve(&request.locator, &request.options).await?;
    let branches = source
        .list_branch_commits(&request.filter, request.branch.as_deref(), &request.options)
        .await?;
    debug!(
        branches = branches.len(),
        commits = branches.commit_count(),
        "Fetched branch commits"
    );

    let resolution = resolve_branches(&branches, &request.primary);
    for (branch, removed) in resolution.report.iter() {
        debug!(branch, removed, "Dropped commits already attributed elsewhere");
    }

    let report = ResolveReport {
        repository: request.locator.clone(),
        source: source.kind().to_string(),
        since: request.filter.window.start(),
        until: request.filter.window.end(),
        primary_branch: request.primary.clone(),
        branch: request.branch.clone(),
        author: request.filter.author.clone(),
        groups: resolution.groups.iter().map(GroupReport::from).collect(),
        duplicates_removed: resolution.report.total(),
        lineage: resolution.lineage,
    };
    info!(
        repository = %report.repository,
        groups = report.groups.len(),
        "Resolve complete"
    );
    Ok(report)
}

/// Write the report as pretty JSON to `output`, or stdout when `None`
///
/// # Errors
///
/// Returns an I/O error if the destination cannot be written.
pub fn write_report(report: &ResolveReport, output: Option<&Path>) -> io::Result<()> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
            info!(path = %path.display(), "Wrote report");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchwise_git::{Author, CommitRef};
    use chrono::TimeZone;
    use similar_asserts::assert_eq;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_request_merges_flags_and_settings() {
        let config = Config {
            repository: Some(" ./repo ".into()),
            author: Some("alice@example.com".into()),
            branch: Some("feature".into()),
            workers: Some(2),
            ..Default::default()
        };
        let settings = Settings {
            primary_branch: Some("trunk".into()),
            workers: Some(8),
            ..Default::default()
        };
        let request = ResolveRequest::from_config(&config, &settings, now()).unwrap();
        assert_eq!(request.locator, "./repo");
        assert_eq!(request.primary, "trunk");
        assert_eq!(request.branch.as_deref(), Some("feature"));
        assert_eq!(request.filter.author.as_deref(), Some("alice@example.com"));
        assert_eq!(request.options.workers, 2);
        assert_eq!(request.filter.window.end(), now());
    }

    #[test]
    fn test_request_requires_repository() {
        let config = Config {
            repository: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            ResolveRequest::from_config(&config, &Settings::default(), now()),
            Err(ConfigError::MissingRepository)
        ));
    }

    #[test]
    fn test_group_report_from_group() {
        let commits = vec![
            CommitRef::new("b", Author::new("Alice", "a@x"), now(), "second\n\nbody"),
            CommitRef::new("a", Author::new("Alice", "a@x"), now() - chrono::Duration::hours(1), "first"),
        ];
        let group = CommitGroup::new("main", "Alice", commits).unwrap();
        let report = GroupReport::from(&group);
        assert_eq!(report.commit_count, 2);
        assert_eq!(report.messages, vec!["second\n\nbody", "first"]);
        assert_eq!(report.start, now() - chrono::Duration::hours(1));
        assert_eq!(report.end, now());
    }

    #[test]
    fn test_write_report_to_nested_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("report.json");
        let report = ResolveReport {
            repository: "repo".into(),
            source: "local".into(),
            since: now() - chrono::Duration::days(7),
            until: now(),
            primary_branch: "main".into(),
            branch: None,
            author: None,
            lineage: LineageMap::default(),
            groups: Vec::new(),
            duplicates_removed: 0,
        };
        write_report(&report, Some(&path)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["source"], "local");
        assert_eq!(value["groups"], serde_json::json!([]));
        assert!(value.get("branch").is_none());
    }
}
