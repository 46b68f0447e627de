// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository fixtures for tests
//!
//! Builds real git repositories in temporary directories with full control
//! over commit timestamps and authors. Enabled by the `test-utils` feature
//! and shared by the integration tests of every branchwise crate.
//!
//! Every helper panics on git or filesystem failure.

use std::path::Path;

use git2::{BranchType, Oid, Repository, Signature, Time};
use tempfile::TempDir;

/// Default author for fixture commits
pub const ALICE: (&str, &str) = ("Alice", "alice@example.com");
/// Second author for fixture commits
pub const BOB: (&str, &str) = ("Bob", "bob@example.com");

/// A temporary git repository with HEAD on `main`
pub struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repository");
        repo.set_head("refs/heads/main").expect("Failed to set HEAD");
        Self { dir, repo }
    }

    /// Path of the working copy
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `file://` URL of the repository
    pub fn url(&self) -> String {
        format!("file://{}", self.dir.path().display())
    }

    /// Commit an empty tree on `branch` (creating it if needed)
    pub fn commit(&self, branch: &str, message: &str, author: (&str, &str), secs: i64) -> Oid {
        let sig = Signature::new(author.0, author.1, &Time::new(secs, 0))
            .expect("Failed to build signature");
        let refname = format!("refs/heads/{branch}");
        let parent = self
            .repo
            .find_reference(&refname)
            .ok()
            .and_then(|r| r.peel_to_commit().ok());
        let tree_id = self
            .repo
            .treebuilder(None)
            .and_then(|tb| tb.write())
            .expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some(&refname), &sig, &sig, message, &tree, &parents)
            .expect("Failed to commit")
    }

    /// Create `new_branch` pointing at the head of `from`
    pub fn branch_from(&self, new_branch: &str, from: &str) {
        let head = self
            .repo
            .find_branch(from, BranchType::Local)
            .and_then(|b| b.get().peel_to_commit())
            .expect("Failed to find source branch");
        self.repo
            .branch(new_branch, &head, false)
            .expect("Failed to create branch");
    }

    /// main: A, B, C and feature: A, B, D (forked after B)
    #[must_use]
    pub fn main_and_feature() -> (Self, [Oid; 4]) {
        let repo = Self::new();
        let a = repo.commit("main", "A", ALICE, 1_000);
        let b = repo.commit("main", "B", BOB, 2_000);
        repo.branch_from("feature", "main");
        let c = repo.commit("main", "C", ALICE, 3_000);
        let d = repo.commit("feature", "D", BOB, 4_000);
        (repo, [a, b, c, d])
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
