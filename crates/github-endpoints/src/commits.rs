// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Commit history and comparisons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::branches::BranchSummary;
use crate::client::{encode_path, GithubEndpointClient};
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::pulls::PullRequest;
use crate::types::{GitActor, SimpleUser};

const GITHUB_SHA: &str = "application/vnd.github.sha";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaRef {
	pub sha: String,
	#[serde(default)]
	pub url: String,
}

/// The git-level part of a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetails {
	pub message: String,
	pub author: Option<GitActor>,
	pub committer: Option<GitActor>,
	pub tree: ShaRef,
	#[serde(default)]
	pub comment_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitStats {
	pub additions: u64,
	pub deletions: u64,
	pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitFile {
	pub filename: String,
	/// `added`, `removed`, `modified`, `renamed`, ...
	pub status: String,
	#[serde(default)]
	pub additions: u64,
	#[serde(default)]
	pub deletions: u64,
	#[serde(default)]
	pub changes: u64,
	pub patch: Option<String>,
	pub previous_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
	pub sha: String,
	#[serde(default)]
	pub node_id: String,
	#[serde(default)]
	pub html_url: String,
	pub commit: CommitDetails,
	/// GitHub account of the author, when it could be matched.
	pub author: Option<SimpleUser>,
	pub committer: Option<SimpleUser>,
	#[serde(default)]
	pub parents: Vec<ShaRef>,
	pub stats: Option<CommitStats>,
	#[serde(default)]
	pub files: Vec<CommitFile>,
}

/// Result of comparing two commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
	/// `ahead`, `behind`, `identical` or `diverged`.
	pub status: String,
	pub ahead_by: u64,
	pub behind_by: u64,
	pub total_commits: u64,
	pub base_commit: Commit,
	pub merge_base_commit: Commit,
	#[serde(default)]
	pub commits: Vec<Commit>,
	#[serde(default)]
	pub files: Vec<CommitFile>,
	#[serde(default)]
	pub html_url: String,
}

/// Filters for [`GithubEndpointClient::list_commits`].
#[derive(Debug, Clone, Default)]
pub struct CommitFilter {
	/// Branch or SHA to start listing from.
	pub sha: Option<String>,
	/// Only commits touching this path.
	pub path: Option<String>,
	/// GitHub login or email address.
	pub author: Option<String>,
	pub since: Option<DateTime<Utc>>,
	pub until: Option<DateTime<Utc>>,
}

impl CommitFilter {
	fn to_query(&self) -> Vec<(&'static str, String)> {
		let mut query = Vec::new();
		if let Some(sha) = &self.sha {
			query.push(("sha", sha.clone()));
		}
		if let Some(path) = &self.path {
			query.push(("path", path.clone()));
		}
		if let Some(author) = &self.author {
			query.push(("author", author.clone()));
		}
		if let Some(since) = self.since {
			query.push(("since", since.to_rfc3339()));
		}
		if let Some(until) = self.until {
			query.push(("until", until.to_rfc3339()));
		}
		query
	}
}

impl GithubEndpointClient {
	/// Every commit matching `filter`, newest first.
	#[instrument(skip(self, filter))]
	pub async fn list_commits(&self, filter: &CommitFilter) -> Result<Vec<Commit>, GithubEndpointError> {
		self
			.get_all_pages(&self.repo_path("commits"), &filter.to_query())
			.await
	}

	/// Commit for a SHA, branch or tag name.
	#[instrument(skip(self))]
	pub async fn get_commit(&self, reference: &str) -> Result<Commit, GithubEndpointError> {
		ensure_not_blank(reference, "reference")?;
		self
			.get_json(&self.repo_path(&format!("commits/{}", encode_path(reference))), &[])
			.await
	}

	/// Resolve a branch, tag or partial SHA to the full 40-character SHA.
	#[instrument(skip(self))]
	pub async fn get_commit_sha1(&self, reference: &str) -> Result<String, GithubEndpointError> {
		ensure_not_blank(reference, "reference")?;
		let sha = self
			.get_text(
				&self.repo_path(&format!("commits/{}", encode_path(reference))),
				GITHUB_SHA,
				&[],
			)
			.await?;
		Ok(sha.trim().to_string())
	}

	/// Compare `base...head`.
	#[instrument(skip(self))]
	pub async fn compare_commits(&self, base: &str, head: &str) -> Result<Comparison, GithubEndpointError> {
		ensure_not_blank(base, "base")?;
		ensure_not_blank(head, "head")?;
		self
			.get_json(
				&self.repo_path(&format!(
					"compare/{}...{}",
					encode_path(base),
					encode_path(head)
				)),
				&[],
			)
			.await
	}

	/// Branches whose head is `sha`.
	#[instrument(skip(self))]
	pub async fn branches_where_head(&self, sha: &str) -> Result<Vec<BranchSummary>, GithubEndpointError> {
		ensure_not_blank(sha, "sha")?;
		self
			.get_json(&self.repo_path(&format!("commits/{sha}/branches-where-head")), &[])
			.await
	}

	/// Pull requests that contain `sha`.
	#[instrument(skip(self))]
	pub async fn pull_requests_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>, GithubEndpointError> {
		ensure_not_blank(sha, "sha")?;
		self
			.get_all_pages(&self.repo_path(&format!("commits/{sha}/pulls")), &[])
			.await
	}
}
