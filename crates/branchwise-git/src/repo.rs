// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Local repository access
//!
//! Reads branches and their commit lists from a repository on disk using the
//! `git2` crate. Mirrors produced by the cache are read the same way.

use crate::commit::{Author, Branch, CommitFilter, CommitRef};
use crate::error::SourceError;
use chrono::{DateTime, TimeZone, Utc};
use git2::{BranchType, Repository, Sort};
use std::path::Path;
use tracing::debug;

/// A git repository wrapper for listing branches and commits
pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Open a git repository (bare or with a working tree) at the given path
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InvalidRepository` if the path is not a git repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .map_err(|e| SourceError::invalid(path.display().to_string(), e.message()))?;
        Ok(Self { repo })
    }

    /// List local branches with their head commits
    ///
    /// Branches are sorted by name, which fixes the tie-break order used by
    /// lineage inference. Branches whose head cannot be peeled to a commit
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the branch list cannot be read.
    pub fn list_branches(&self) -> Result<Vec<Branch>, SourceError> {
        let mut branches = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                continue;
            };
            match branch.get().peel_to_commit() {
                Ok(head) => branches.push(Branch {
                    name,
                    head: to_commit_ref(&head),
                }),
                Err(e) => debug!(branch = %name, error = %e, "Skipping branch without a commit"),
            }
        }
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    /// Commits reachable from a branch head that pass `filter`, newest first
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InvalidRepository` if the branch does not exist,
    /// or `SourceError::Git2` if the history cannot be walked.
    pub fn branch_commits(
        &self,
        branch: &str,
        filter: &CommitFilter,
    ) -> Result<Vec<CommitRef>, SourceError> {
        let head = self
            .repo
            .find_branch(branch, BranchType::Local)
            .and_then(|b| b.get().peel_to_commit())
            .map_err(|_| {
                SourceError::invalid(
                    self.repo.path().display().to_string(),
                    format!("branch '{branch}' not found"),
                )
            })?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
        revwalk.push(head.id())?;

        let mut commits = Vec::new();
        let mut walked = 0usize;
        for oid_result in revwalk {
            let oid = oid_result?;
            let git_commit = self.repo.find_commit(oid)?;
            walked += 1;

            let commit = to_commit_ref(&git_commit);
            if filter.matches(&commit) {
                commits.push(commit);
            }
        }

        debug!(branch, walked, kept = commits.len(), "Walked branch history");
        Ok(commits)
    }
}

/// Convert a git2 commit into a [`CommitRef`]
pub(crate) fn to_commit_ref(git_commit: &git2::Commit<'_>) -> CommitRef {
    let author = git_commit.author();
    CommitRef {
        id: git_commit.id().to_string(),
        author: Author::new(
            author.name().unwrap_or("Unknown"),
            author.email().unwrap_or(""),
        ),
        timestamp: git_time_to_utc(git_commit.time()),
        message: git_commit.message().unwrap_or("").to_string(),
    }
}

fn git_time_to_utc(time: git2::Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::DateWindow;
    use crate::error::SourceError;
    use git2::{Signature, Time};
    use similar_asserts::assert_eq;
    use tempfile::TempDir;

    fn commit_on(repo: &Repository, branch: &str, message: &str, who: (&str, &str), secs: i64) {
        let sig = Signature::new(who.0, who.1, &Time::new(secs, 0)).unwrap();
        let refname = format!("refs/heads/{branch}");
        let parent = repo
            .find_reference(&refname)
            .ok()
            .and_then(|r| r.peel_to_commit().ok());
        let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        repo.commit(Some(&refname), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    fn fixture() -> (TempDir, GitRepo) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.set_head("refs/heads/main").unwrap();
        let alice = ("Alice", "alice@example.com");
        let bob = ("Bob", "bob@example.com");
        commit_on(&repo, "main", "A", alice, 1_000);
        commit_on(&repo, "main", "B", bob, 2_000);
        let b = repo.find_branch("main", BranchType::Local).unwrap();
        let head = b.get().peel_to_commit().unwrap();
        repo.branch("feature", &head, false).unwrap();
        commit_on(&repo, "main", "C", alice, 3_000);
        commit_on(&repo, "feature", "D", bob, 4_000);
        let git_repo = GitRepo::open(dir.path()).unwrap();
        (dir, git_repo)
    }

    fn full_window() -> DateWindow {
        DateWindow::new(
            Utc.timestamp_opt(0, 0).unwrap(),
            Utc.timestamp_opt(10_000, 0).unwrap(),
        )
        .unwrap()
    }

    fn subjects(commits: &[CommitRef]) -> Vec<&str> {
        commits.iter().map(CommitRef::subject).collect()
    }

    #[test]
    fn test_open_nonexistent_repository() {
        let result = GitRepo::open("/nonexistent/path");
        match result {
            Err(SourceError::InvalidRepository { locator, .. }) => {
                assert!(locator.contains("nonexistent"));
            }
            _ => panic!("Expected InvalidRepository error"),
        }
    }

    #[test]
    fn test_open_plain_directory_is_invalid() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            GitRepo::open(dir.path()),
            Err(SourceError::InvalidRepository { .. })
        ));
    }

    #[test]
    fn test_list_branches() {
        let (_dir, repo) = fixture();
        let branches = repo.list_branches().expect("list branches");
        let names: Vec<&str> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["feature", "main"]);
        assert_eq!(branches[0].head.subject(), "D");
        assert_eq!(branches[1].head.subject(), "C");
    }

    #[test]
    fn test_branch_commits_newest_first() {
        let (_dir, repo) = fixture();
        let filter = CommitFilter::new(full_window());
        let main = repo.branch_commits("main", &filter).unwrap();
        assert_eq!(subjects(&main), vec!["C", "B", "A"]);
        let feature = repo.branch_commits("feature", &filter).unwrap();
        assert_eq!(subjects(&feature), vec!["D", "B", "A"]);
    }

    #[test]
    fn test_branch_commits_window_filter() {
        let (_dir, repo) = fixture();
        let window = DateWindow::new(
            Utc.timestamp_opt(2_000, 0).unwrap(),
            Utc.timestamp_opt(3_000, 0).unwrap(),
        )
        .unwrap();
        let main = repo
            .branch_commits("main", &CommitFilter::new(window))
            .unwrap();
        assert_eq!(subjects(&main), vec!["C", "B"]);
    }

    #[test]
    fn test_branch_commits_author_filter() {
        let (_dir, repo) = fixture();
        let by_name = CommitFilter::new(full_window()).with_author("Alice");
        assert_eq!(
            subjects(&repo.branch_commits("main", &by_name).unwrap()),
            vec!["C", "A"]
        );
        let by_email = CommitFilter::new(full_window()).with_author("bob@example.com");
        assert_eq!(
            subjects(&repo.branch_commits("feature", &by_email).unwrap()),
            vec!["D", "B"]
        );
        let wrong_case = CommitFilter::new(full_window()).with_author("alice");
        assert!(repo.branch_commits("main", &wrong_case).unwrap().is_empty());
    }

    #[test]
    fn test_branch_commits_unknown_branch() {
        let (_dir, repo) = fixture();
        let result = repo.branch_commits("nope", &CommitFilter::new(full_window()));
        assert!(matches!(result, Err(SourceError::InvalidRepository { .. })));
    }

    #[test]
    fn test_commit_fields() {
        let (_dir, repo) = fixture();
        let commits = repo
            .branch_commits("main", &CommitFilter::new(full_window()))
            .unwrap();
        let oldest = commits.last().unwrap();
        assert_eq!(oldest.author, Author::new("Alice", "alice@example.com"));
        assert_eq!(oldest.timestamp, Utc.timestamp_opt(1_000, 0).unwrap());
        assert_eq!(oldest.id.len(), 40);
    }
}
