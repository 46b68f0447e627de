// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Author grouping and cross-branch deduplication
//!
//! After unique-commit extraction a commit can still sit under several
//! branches (for example a branch merged into a sibling). Deduplication walks
//! the author groups once, in a fixed order, and keeps only the first
//! sighting of every commit id.

use std::collections::{BTreeMap, HashSet};

use branchwise_git::CommitRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::unique::UniqueCommitSet;

/// Branch name promoted to the front of each author's groups by default
pub const DEFAULT_PRIMARY_BRANCH: &str = "main";

/// The commits one author made on one branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitGroup {
    /// Branch the commits are attributed to
    pub branch: String,
    /// Author name
    pub author: String,
    /// Oldest commit timestamp
    pub start: DateTime<Utc>,
    /// Newest commit timestamp
    pub end: DateTime<Utc>,
    /// Commits, newest first
    pub commits: Vec<CommitRef>,
}

impl CommitGroup {
    /// Build a group, computing its time bounds
    ///
    /// Returns `None` for an empty commit list.
    #[must_use]
    pub fn new(
        branch: impl Into<String>,
        author: impl Into<String>,
        commits: Vec<CommitRef>,
    ) -> Option<Self> {
        let (start, end) = bounds(&commits)?;
        Some(Self {
            branch: branch.into(),
            author: author.into(),
            start,
            end,
            commits,
        })
    }

    /// Commit messages in commit order
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.commits.iter().map(|c| c.message.as_str())
    }

    /// Commit ids in commit order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.commits.iter().map(|c| c.id.as_str())
    }

    fn refresh_bounds(&mut self) {
        if let Some((start, end)) = bounds(&self.commits) {
            self.start = start;
            self.end = end;
        }
    }
}

fn bounds(commits: &[CommitRef]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = commits.iter().map(|c| c.timestamp).min()?;
    let end = commits.iter().map(|c| c.timestamp).max()?;
    Some((start, end))
}

/// Group each branch's commits by author name
///
/// Branches keep their order; within a branch, authors appear in the order
/// their first commit appears. Branches without commits produce no group.
#[must_use]
pub fn group_by_author(unique: &UniqueCommitSet) -> Vec<CommitGroup> {
    let mut groups = Vec::new();
    for history in unique {
        let mut by_author: Vec<(&str, Vec<CommitRef>)> = Vec::new();
        for commit in &history.commits {
            let name = commit.author.name.as_str();
            match by_author.iter_mut().find(|(author, _)| *author == name) {
                Some((_, commits)) => commits.push(commit.clone()),
                None => by_author.push((name, vec![commit.clone()])),
            }
        }
        groups.extend(
            by_author
                .into_iter()
                .filter_map(|(author, commits)| CommitGroup::new(&history.branch, author, commits)),
        );
    }
    groups
}

/// Commit ids already attributed to a group
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`; returns `false` if it was already seen
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    /// Whether `id` has been seen
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of distinct ids seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing has been seen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Commits dropped by deduplication, counted per branch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    removed: BTreeMap<String, usize>,
}

impl DedupReport {
    /// Removals for `branch`
    #[must_use]
    pub fn removed_from(&self, branch: &str) -> usize {
        self.removed.get(branch).copied().unwrap_or(0)
    }

    /// Total removals
    #[must_use]
    pub fn total(&self) -> usize {
        self.removed.values().sum()
    }

    /// Per-branch removals, sorted by branch name
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.removed.iter().map(|(b, n)| (b.as_str(), *n))
    }

    fn record(&mut self, branch: &str) {
        *self.removed.entry(branch.to_string()).or_default() += 1;
    }
}

/// Attribute every commit id to exactly one group
///
/// See [`deduplicate_with`].
#[must_use]
pub fn deduplicate(groups: Vec<CommitGroup>, primary: &str) -> Vec<CommitGroup> {
    deduplicate_with(groups, primary, &mut SeenSet::new()).0
}

/// Attribute every commit id to exactly one group, sharing `seen`
///
/// Groups are stably sorted by author, with the `primary` branch first
/// within each author. The first group to contain an id keeps it; later
/// groups lose it. Groups left empty are dropped. Ids already in `seen`
/// are removed everywhere, which lets several passes share one
/// accumulator.
pub fn deduplicate_with(
    mut groups: Vec<CommitGroup>,
    primary: &str,
    seen: &mut SeenSet,
) -> (Vec<CommitGroup>, DedupReport) {
    groups.sort_by(|a, b| {
        a.author
            .cmp(&b.author)
            .then_with(|| (b.branch == primary).cmp(&(a.branch == primary)))
    });

    let mut report = DedupReport::default();
    let mut kept = Vec::with_capacity(groups.len());
    for mut group in groups {
        let before = group.commits.len();
        group.commits.retain(|commit| {
            let first = seen.insert(&commit.id);
            if !first {
                report.record(&group.branch);
            }
            first
        });

        if group.commits.is_empty() {
            debug!(branch = %group.branch, author = %group.author, "Dropping emptied group");
            continue;
        }
        if group.commits.len() != before {
            group.refresh_bounds();
        }
        kept.push(group);
    }

    debug!(groups = kept.len(), removed = report.total(), "Deduplicated commit groups");
    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::infer_lineage;
    use crate::unique::extract_unique;
    use branchwise_git::{Author, BranchCommits, BranchHistory};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    fn commit(id: &str, author: &str, secs: i64) -> CommitRef {
        CommitRef::new(
            id,
            Author::new(author, format!("{}@example.com", author.to_lowercase())),
            Utc.timestamp_opt(secs, 0).unwrap(),
            format!("message {id}"),
        )
    }

    fn group(branch: &str, author: &str, ids: &[&str]) -> CommitGroup {
        let commits = ids
            .iter()
            .enumerate()
            .map(|(i, id)| commit(id, author, 1_000 - i as i64))
            .collect();
        CommitGroup::new(branch, author, commits).unwrap()
    }

    fn summary(groups: &[CommitGroup]) -> Vec<(String, String, Vec<String>)> {
        groups
            .iter()
            .map(|g| {
                (
                    g.branch.clone(),
                    g.author.clone(),
                    g.ids().map(str::to_string).collect(),
                )
            })
            .collect()
    }

    fn row(branch: &str, author: &str, ids: &[&str]) -> (String, String, Vec<String>) {
        (
            branch.to_string(),
            author.to_string(),
            ids.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_group_new_computes_bounds() {
        let g = CommitGroup::new(
            "main",
            "Alice",
            vec![commit("b", "Alice", 2_000), commit("a", "Alice", 1_000)],
        )
        .unwrap();
        assert_eq!(g.start, Utc.timestamp_opt(1_000, 0).unwrap());
        assert_eq!(g.end, Utc.timestamp_opt(2_000, 0).unwrap());
        assert_eq!(g.messages().collect::<Vec<_>>(), vec!["message b", "message a"]);
        assert!(CommitGroup::new("main", "Alice", Vec::new()).is_none());
    }

    #[test]
    fn test_group_by_author_first_seen_order() {
        let branches: BranchCommits = [
            BranchHistory::new(
                "main",
                vec![
                    commit("c", "Alice", 3_000),
                    commit("b", "Bob", 2_000),
                    commit("a", "Alice", 1_000),
                ],
            ),
            BranchHistory::new("empty", Vec::new()),
        ]
        .into_iter()
        .collect();
        let unique = extract_unique(&branches, &infer_lineage(&branches, "main"));

        let groups = group_by_author(&unique);
        assert_eq!(
            summary(&groups),
            vec![row("main", "Alice", &["c", "a"]), row("main", "Bob", &["b"])]
        );
        assert_eq!(groups[0].start, Utc.timestamp_opt(1_000, 0).unwrap());
        assert_eq!(groups[0].end, Utc.timestamp_opt(3_000, 0).unwrap());
    }

    #[test]
    fn test_primary_branch_wins_shared_commit() {
        let groups = vec![
            group("feature", "Alice", &["x", "f"]),
            group("main", "Alice", &["x", "m"]),
        ];
        let (out, report) = deduplicate_with(groups, "main", &mut SeenSet::new());
        assert_eq!(
            summary(&out),
            vec![row("main", "Alice", &["x", "m"]), row("feature", "Alice", &["f"])]
        );
        assert_eq!(report.removed_from("feature"), 1);
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn test_sorted_by_author_then_input_order() {
        let groups = vec![
            group("b-branch", "Zed", &["z1"]),
            group("a-branch", "Alice", &["shared"]),
            group("c-branch", "Alice", &["shared", "c1"]),
        ];
        let out = deduplicate(groups, "main");
        assert_eq!(
            summary(&out),
            vec![
                row("a-branch", "Alice", &["shared"]),
                row("c-branch", "Alice", &["c1"]),
                row("b-branch", "Zed", &["z1"]),
            ]
        );
    }

    #[test]
    fn test_emptied_group_is_dropped() {
        let groups = vec![
            group("main", "Alice", &["a", "b"]),
            group("merged", "Alice", &["b"]),
        ];
        let (out, report) = deduplicate_with(groups, "main", &mut SeenSet::new());
        assert_eq!(summary(&out), vec![row("main", "Alice", &["a", "b"])]);
        assert_eq!(report.iter().collect::<Vec<_>>(), vec![("merged", 1)]);
    }

    #[test]
    fn test_bounds_follow_remaining_commits() {
        let groups = vec![
            group("main", "Alice", &["newest"]),
            group("feature", "Alice", &["newest", "middle", "oldest"]),
        ];
        let out = deduplicate(groups, "main");
        let feature = out.iter().find(|g| g.branch == "feature").unwrap();
        assert_eq!(feature.end, Utc.timestamp_opt(999, 0).unwrap());
        assert_eq!(feature.start, Utc.timestamp_opt(998, 0).unwrap());
    }

    #[test]
    fn test_shared_seen_set_across_passes() {
        let mut seen = SeenSet::new();
        let (first, _) = deduplicate_with(vec![group("main", "Alice", &["a"])], "main", &mut seen);
        assert_eq!(first.len(), 1);
        assert!(seen.contains("a"));

        let (second, report) =
            deduplicate_with(vec![group("feature", "Bob", &["a", "b"])], "main", &mut seen);
        assert_eq!(summary(&second), vec![row("feature", "Bob", &["b"])]);
        assert_eq!(report.total(), 1);
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(Vec::new(), DEFAULT_PRIMARY_BRANCH).is_empty());
    }

    fn arbitrary_groups() -> impl Strategy<Value = Vec<CommitGroup>> {
        let branch = prop::sample::select(vec!["main", "feature", "release", "docs"]);
        let author = prop::sample::select(vec!["Alice", "Bob", "Carol"]);
        let ids = prop::collection::vec(0u8..16, 1..6);
        prop::collection::vec((branch, author, ids), 0..8).prop_map(|rows| {
            rows.into_iter()
                .filter_map(|(branch, author, ids)| {
                    let mut seen = HashSet::new();
                    let commits: Vec<CommitRef> = ids
                        .into_iter()
                        .filter(|id| seen.insert(*id))
                        .map(|id| commit(&format!("c{id}"), author, 1_000 + i64::from(id)))
                        .collect();
                    CommitGroup::new(branch, author, commits)
                })
                .collect()
        })
    }

    fn all_ids(groups: &[CommitGroup]) -> HashSet<String> {
        groups
            .iter()
            .flat_map(|g| g.ids().map(str::to_string))
            .collect()
    }

    proptest! {
        #[test]
        fn prop_no_id_under_two_groups(groups in arbitrary_groups()) {
            let out = deduplicate(groups, "main");
            let mut seen = HashSet::new();
            for g in &out {
                for id in g.ids() {
                    prop_assert!(seen.insert(id.to_string()), "duplicate id {}", id);
                }
            }
        }

        #[test]
        fn prop_ids_are_preserved_as_a_set(groups in arbitrary_groups()) {
            let input_ids = all_ids(&groups);
            let input_total: usize = groups.iter().map(|g| g.commits.len()).sum();
            let (out, report) = deduplicate_with(groups, "main", &mut SeenSet::new());
            prop_assert_eq!(all_ids(&out), input_ids);
            let output_total: usize = out.iter().map(|g| g.commits.len()).sum();
            prop_assert_eq!(input_total - output_total, report.total());
        }

        #[test]
        fn prop_deduplicate_is_idempotent(groups in arbitrary_groups()) {
            let once = deduplicate(groups, "main");
            let twice = deduplicate(once.clone(), "main");
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_no_empty_groups(groups in arbitrary_groups()) {
            for g in deduplicate(groups, "main") {
                prop_assert!(!g.commits.is_empty());
            }
        }
    }
}
