// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit, branch and date-window types

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identity of a commit author
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    /// Author name
    pub name: String,
    /// Author email
    pub email: String,
}

impl Author {
    /// Create an author identity
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Case-sensitive exact match against either the name or the email
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        self.name == filter || self.email == filter
    }
}

/// A commit read from a repository
///
/// Equality and hashing use `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRef {
    /// Content-addressed commit id (full hex SHA)
    pub id: String,
    /// Who wrote the change
    pub author: Author,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Full commit message
    pub message: String,
}

impl PartialEq for CommitRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CommitRef {}

impl Hash for CommitRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl CommitRef {
    /// Create a commit reference
    pub fn new(
        id: impl Into<String>,
        author: Author,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author,
            timestamp,
            message: message.into(),
        }
    }

    /// Get the short id (first 7 characters)
    #[must_use]
    pub fn short_id(&self) -> &str {
        &self.id[..7.min(self.id.len())]
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// A named branch and the commit its head points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name, unique within a repository snapshot
    pub name: String,
    /// Head commit
    pub head: CommitRef,
}

/// Inclusive time range commits must fall in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Unchecked wire form of [`DateWindow`]
#[derive(Deserialize)]
struct RawWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawWindow> for DateWindow {
    type Error = ValidationError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateWindow {
    /// Create a window
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidWindow` if `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering `span` before `end`
    ///
    /// A span reaching past the earliest representable time starts there.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidWindow` if `span` is negative.
    pub fn ending_at(end: DateTime<Utc>, span: Duration) -> Result<Self, ValidationError> {
        if span < Duration::zero() {
            let start = end.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC);
            return Err(ValidationError::InvalidWindow { start, end });
        }
        let start = end.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::new(start, end)
    }

    /// Window start
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Window end
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `timestamp` lies in the window (both ends inclusive)
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Which commits a source should return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFilter {
    /// Only commits in this window
    pub window: DateWindow,
    /// Only commits whose author name or email equals this exactly
    pub author: Option<String>,
}

impl CommitFilter {
    /// Filter by window only
    #[must_use]
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            author: None,
        }
    }

    /// Also require an exact author name or email
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Check a commit against the window and the author filter
    #[must_use]
    pub fn matches(&self, commit: &CommitRef) -> bool {
        self.window.contains(commit.timestamp)
            && self
                .author
                .as_deref()
                .is_none_or(|author| commit.author.matches(author))
    }
}

/// The filtered commits of one branch, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchHistory {
    /// Branch name
    pub branch: String,
    /// Commits in reverse-chronological order
    pub commits: Vec<CommitRef>,
}

impl BranchHistory {
    /// Create a branch history
    pub fn new(branch: impl Into<String>, commits: Vec<CommitRef>) -> Self {
        Self {
            branch: branch.into(),
            commits,
        }
    }

    /// Iterate over the commit ids
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.commits.iter().map(|c| c.id.as_str())
    }
}

/// Per-branch commit lists in the order the backend listed the branches
///
/// That order is significant: lineage inference breaks overlap ties by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCommits {
    histories: Vec<BranchHistory>,
}

impl BranchCommits {
    /// Create an empty mapping
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a branch; a branch already present is replaced in place
    pub fn insert(&mut self, history: BranchHistory) {
        match self
            .histories
            .iter_mut()
            .find(|h| h.branch == history.branch)
        {
            Some(existing) => *existing = history,
            None => self.histories.push(history),
        }
    }

    /// Look up a branch by name
    #[must_use]
    pub fn get(&self, branch: &str) -> Option<&BranchHistory> {
        self.histories.iter().find(|h| h.branch == branch)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, BranchHistory> {
        self.histories.iter()
    }

    /// Branch names in insertion order
    pub fn branch_names(&self) -> impl Iterator<Item = &str> {
        self.histories.iter().map(|h| h.branch.as_str())
    }

    /// Number of branches
    #[must_use]
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// Whether there are no branches
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Total commits across all branches (a shared commit counts once per branch)
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.histories.iter().map(|h| h.commits.len()).sum()
    }
}

impl FromIterator<BranchHistory> for BranchCommits {
    fn from_iter<I: IntoIterator<Item = BranchHistory>>(iter: I) -> Self {
        let mut commits = Self::new();
        for history in iter {
            commits.insert(history);
        }
        commits
    }
}

impl<'a> IntoIterator for &'a BranchCommits {
    type Item = &'a BranchHistory;
    type IntoIter = std::slice::Iter<'a, BranchHistory>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for BranchCommits {
    type Item = BranchHistory;
    type IntoIter = std::vec::IntoIter<BranchHistory>;

    fn into_iter(self) -> Self::IntoIter {
        self.histories.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap()
    }

    fn sample_commit() -> CommitRef {
        CommitRef::new(
            "1945ab9c752534e733c38ba0109dc3b741f0a6eb",
            Author::new("Test Author", "test@example.com"),
            at(17),
            "feat(lineage): infer parents\n\nDetailed description here.",
        )
    }

    #[test]
    fn test_commit_equality_uses_id_only() {
        let a = sample_commit();
        let mut b = sample_commit();
        b.message = "different".to_string();
        b.author = Author::new("Someone Else", "else@example.com");
        assert_eq!(a, b);

        let mut c = sample_commit();
        c.id = "f".repeat(40);
        assert_ne!(a, c);
    }

    #[test]
    fn test_commit_hash_uses_id_only() {
        use std::collections::HashSet;
        let a = sample_commit();
        let mut b = sample_commit();
        b.message = "amended".to_string();
        let set: HashSet<CommitRef> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_short_id_and_subject() {
        let commit = sample_commit();
        assert_eq!(commit.short_id(), "1945ab9");
        assert_eq!(commit.subject(), "feat(lineage): infer parents");
    }

    #[test]
    fn test_short_id_handles_short_input() {
        let mut commit = sample_commit();
        commit.id = "abc".to_string();
        assert_eq!(commit.short_id(), "abc");
    }

    #[test]
    fn test_subject_empty_message() {
        let mut commit = sample_commit();
        commit.message = String::new();
        assert_eq!(commit.subject(), "");
    }

    #[test]
    fn test_window_rejects_start_after_end() {
        let err = DateWindow::new(at(10), at(9)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidWindow { .. }));
    }

    #[test]
    fn test_window_allows_single_instant() {
        let window = DateWindow::new(at(10), at(10)).expect("valid window");
        assert!(window.contains(at(10)));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = DateWindow::new(at(10), at(12)).unwrap();
        assert!(window.contains(at(10)));
        assert!(window.contains(at(11)));
        assert!(window.contains(at(12)));
        assert!(!window.contains(at(9)));
        assert!(!window.contains(at(13)));
    }

    #[test]
    fn test_window_ending_at() {
        let window = DateWindow::ending_at(at(15), Duration::days(7)).unwrap();
        assert_eq!(window.start(), at(8));
        assert_eq!(window.end(), at(15));
        assert!(DateWindow::ending_at(at(15), Duration::days(-1)).is_err());
        let saturated = DateWindow::ending_at(at(15), Duration::MAX).unwrap();
        assert_eq!(saturated.start(), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_window_deserialize_validates_order() {
        let ok: DateWindow = serde_json::from_str(
            r#"{"start":"2026-01-01T00:00:00Z","end":"2026-01-02T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(ok.end(), Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());

        let reversed = serde_json::from_str::<DateWindow>(
            r#"{"start":"2026-01-02T00:00:00Z","end":"2026-01-01T00:00:00Z"}"#,
        );
        assert!(reversed.is_err());
    }

    #[test]
    fn test_author_filter_matches_name_or_email_exactly() {
        let author = Author::new("Test Author", "test@example.com");
        assert!(author.matches("Test Author"));
        assert!(author.matches("test@example.com"));
        assert!(!author.matches("test author"));
        assert!(!author.matches("TEST@example.com"));
        assert!(!author.matches("Test"));
    }

    #[test]
    fn test_commit_filter_combines_window_and_author() {
        let window = DateWindow::new(at(10), at(20)).unwrap();
        let commit = sample_commit();

        assert!(CommitFilter::new(window).matches(&commit));
        assert!(
            CommitFilter::new(window)
                .with_author("test@example.com")
                .matches(&commit)
        );
        assert!(
            !CommitFilter::new(window)
                .with_author("nobody")
                .matches(&commit)
        );

        let narrow = DateWindow::new(at(1), at(2)).unwrap();
        assert!(!CommitFilter::new(narrow).matches(&commit));
    }

    #[test]
    fn test_branch_commits_keeps_insertion_order() {
        let commits: BranchCommits = ["main", "feature", "hotfix"]
            .into_iter()
            .map(|name| BranchHistory::new(name, vec![]))
            .collect();
        let names: Vec<&str> = commits.branch_names().collect();
        assert_eq!(names, vec!["main", "feature", "hotfix"]);
    }

    #[test]
    fn test_branch_commits_insert_replaces_in_place() {
        let mut commits = BranchCommits::new();
        commits.insert(BranchHistory::new("main", vec![]));
        commits.insert(BranchHistory::new("feature", vec![]));
        commits.insert(BranchHistory::new("main", vec![sample_commit()]));

        assert_eq!(commits.len(), 2);
        assert_eq!(commits.branch_names().next(), Some("main"));
        assert_eq!(commits.get("main").map(|h| h.commits.len()), Some(1));
        assert_eq!(commits.commit_count(), 1);
    }

    #[test]
    fn test_commit_json_format() {
        let json = serde_json::to_string(&sample_commit()).expect("serialize");
        assert!(json.contains("\"id\":"));
        assert!(json.contains("\"author\":{\"name\":\"Test Author\""));
        assert!(json.contains("2026-01-17"));
    }
}
