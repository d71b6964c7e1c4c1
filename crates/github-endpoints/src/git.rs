// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Low-level git database: blobs, commits, tags, trees and references.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::{encode_path, GithubEndpointClient};
use crate::commits::ShaRef;
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::types::GitActor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitObjectType {
	Blob,
	Tree,
	Commit,
	Tag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitObject {
	#[serde(rename = "type")]
	pub kind: GitObjectType,
	pub sha: String,
	#[serde(default)]
	pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blob {
	pub sha: String,
	#[serde(default)]
	pub node_id: String,
	pub size: Option<u64>,
	/// `base64` or `utf-8`.
	pub encoding: String,
	pub content: String,
}

impl Blob {
	/// Blob bytes, decoding base64 when needed.
	pub fn decoded(&self) -> Result<Vec<u8>, GithubEndpointError> {
		if self.encoding != "base64" {
			return Ok(self.content.as_bytes().to_vec());
		}
		let compact: String = self.content.chars().filter(|c| !c.is_whitespace()).collect();
		STANDARD
			.decode(compact)
			.map_err(|e| GithubEndpointError::InvalidResponse(format!("Invalid base64 blob: {e}")))
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitCommit {
	pub sha: String,
	#[serde(default)]
	pub node_id: String,
	pub message: String,
	pub author: GitActor,
	pub committer: GitActor,
	pub tree: ShaRef,
	#[serde(default)]
	pub parents: Vec<ShaRef>,
	#[serde(default)]
	pub html_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGitCommit {
	pub message: String,
	/// SHA of the tree this commit points at.
	pub tree: String,
	pub parents: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub author: Option<GitActor>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub committer: Option<GitActor>,
}

/// Annotated tag object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitTag {
	pub tag: String,
	pub sha: String,
	#[serde(default)]
	pub node_id: String,
	pub message: String,
	pub tagger: GitActor,
	pub object: GitObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
	pub path: String,
	/// File mode: `100644`, `100755`, `040000`, `160000` or `120000`.
	pub mode: String,
	#[serde(rename = "type")]
	pub kind: GitObjectType,
	pub sha: String,
	pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
	pub sha: String,
	pub tree: Vec<TreeEntry>,
	/// The recursive listing hit GitHub's size limit.
	#[serde(default)]
	pub truncated: bool,
}

/// Entry of a tree being created. Give either `sha` or `content`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTreeEntry {
	pub path: String,
	pub mode: String,
	#[serde(rename = "type")]
	pub kind: GitObjectType,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sha: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
}

impl NewTreeEntry {
	/// Regular file with inline UTF-8 content.
	pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			mode: "100644".to_string(),
			kind: GitObjectType::Blob,
			sha: None,
			content: Some(content.into()),
		}
	}

	/// Regular file pointing at an existing blob.
	pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			mode: "100644".to_string(),
			kind: GitObjectType::Blob,
			sha: Some(sha.into()),
			content: None,
		}
	}
}

#[derive(Debug, Serialize)]
struct NewTree<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	base_tree: Option<&'a str>,
	tree: &'a [NewTreeEntry],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
	#[serde(rename = "ref")]
	pub ref_name: String,
	#[serde(default)]
	pub node_id: String,
	pub object: GitObject,
}

/// `heads/main` or `refs/heads/main` as the fully qualified `refs/heads/main`.
fn qualified_ref(reference: &str) -> String {
	let reference = reference.trim_start_matches('/');
	if reference.starts_with("refs/") {
		reference.to_string()
	} else {
		format!("refs/{reference}")
	}
}

/// `refs/heads/main` or `heads/main` as `heads/main`, the form used in paths.
fn short_ref(reference: &str) -> &str {
	let reference = reference.trim_start_matches('/');
	reference.strip_prefix("refs/").unwrap_or(reference)
}

impl GithubEndpointClient {
	#[instrument(skip(self))]
	pub async fn get_blob(&self, sha: &str) -> Result<Blob, GithubEndpointError> {
		ensure_not_blank(sha, "sha")?;
		self
			.get_json(&self.repo_path(&format!("git/blobs/{sha}")), &[])
			.await
	}

	/// Store `content` as a blob, returning its SHA.
	#[instrument(skip(self, content), fields(bytes = content.len()))]
	pub async fn create_blob(&self, content: &[u8]) -> Result<ShaRef, GithubEndpointError> {
		let body = json!({
			"content": STANDARD.encode(content),
			"encoding": "base64"
		});
		self
			.send_json(Method::POST, &self.repo_path("git/blobs"), &body)
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_git_commit(&self, sha: &str) -> Result<GitCommit, GithubEndpointError> {
		ensure_not_blank(sha, "sha")?;
		self
			.get_json(&self.repo_path(&format!("git/commits/{sha}")), &[])
			.await
	}

	#[instrument(skip(self, commit), fields(tree = %commit.tree))]
	pub async fn create_git_commit(&self, commit: &NewGitCommit) -> Result<GitCommit, GithubEndpointError> {
		ensure_not_blank(&commit.message, "message")?;
		ensure_not_blank(&commit.tree, "tree")?;

		let created: GitCommit = self
			.send_json(Method::POST, &self.repo_path("git/commits"), commit)
			.await?;
		info!(sha = %created.sha, "Created commit");
		Ok(created)
	}

	#[instrument(skip(self))]
	pub async fn get_git_tag(&self, sha: &str) -> Result<GitTag, GithubEndpointError> {
		ensure_not_blank(sha, "sha")?;
		self
			.get_json(&self.repo_path(&format!("git/tags/{sha}")), &[])
			.await
	}

	/// Create an annotated tag object, stamping the tagger with the current
	/// time. The `refs/tags/...` reference must be created separately.
	#[instrument(skip(self, message, tagger))]
	pub async fn create_git_tag(
		&self,
		tag: &str,
		message: &str,
		object_sha: &str,
		object_type: GitObjectType,
		tagger: GitActor,
	) -> Result<GitTag, GithubEndpointError> {
		ensure_not_blank(tag, "tag")?;
		ensure_not_blank(object_sha, "object")?;

		let body = json!({
			"tag": tag,
			"message": message,
			"object": object_sha,
			"type": object_type,
			"tagger": tagger.at(Utc::now()),
		});

		let created: GitTag = self
			.send_json(Method::POST, &self.repo_path("git/tags"), &body)
			.await?;
		info!(sha = %created.sha, "Created tag object");
		Ok(created)
	}

	#[instrument(skip(self))]
	pub async fn get_tree(&self, sha: &str) -> Result<Tree, GithubEndpointError> {
		ensure_not_blank(sha, "sha")?;
		self
			.get_json(&self.repo_path(&format!("git/trees/{}", encode_path(sha))), &[])
			.await
	}

	/// Tree with every nested entry flattened into `tree`.
	#[instrument(skip(self))]
	pub async fn get_tree_recursive(&self, sha: &str) -> Result<Tree, GithubEndpointError> {
		ensure_not_blank(sha, "sha")?;
		self
			.get_json(
				&self.repo_path(&format!("git/trees/{}", encode_path(sha))),
				&[("recursive", "1".to_string())],
			)
			.await
	}

	/// Create a tree from `entries`, layered on `base_tree` when given.
	#[instrument(skip(self, entries), fields(entries = entries.len()))]
	pub async fn create_tree(
		&self,
		base_tree: Option<&str>,
		entries: &[NewTreeEntry],
	) -> Result<Tree, GithubEndpointError> {
		if entries.is_empty() {
			return Err(GithubEndpointError::invalid_argument(
				"tree entries must not be empty",
			));
		}
		let body = NewTree {
			base_tree: base_tree.filter(|b| !b.trim().is_empty()),
			tree: entries,
		};
		self
			.send_json(Method::POST, &self.repo_path("git/trees"), &body)
			.await
	}

	/// Reference such as `heads/main` or `tags/v1.0.0`.
	#[instrument(skip(self))]
	pub async fn get_reference(&self, reference: &str) -> Result<Reference, GithubEndpointError> {
		ensure_not_blank(reference, "ref")?;
		self
			.get_json(
				&self.repo_path(&format!("git/ref/{}", encode_path(short_ref(reference)))),
				&[],
			)
			.await
	}

	/// Create `reference` (`refs/` prefix optional) pointing at `sha`.
	#[instrument(skip(self))]
	pub async fn create_reference(&self, reference: &str, sha: &str) -> Result<Reference, GithubEndpointError> {
		ensure_not_blank(reference, "ref")?;
		ensure_not_blank(sha, "sha")?;

		let created: Reference = self
			.send_json(
				Method::POST,
				&self.repo_path("git/refs"),
				&json!({ "ref": qualified_ref(reference), "sha": sha }),
			)
			.await?;
		info!(reference = %created.ref_name, "Created reference");
		Ok(created)
	}

	/// Move `reference` to `sha`; `force` allows non-fast-forward updates.
	#[instrument(skip(self))]
	pub async fn update_reference(
		&self,
		reference: &str,
		sha: &str,
		force: bool,
	) -> Result<Reference, GithubEndpointError> {
		ensure_not_blank(reference, "ref")?;
		ensure_not_blank(sha, "sha")?;

		self
			.send_json(
				Method::PATCH,
				&self.repo_path(&format!("git/refs/{}", encode_path(short_ref(reference)))),
				&json!({ "sha": sha, "force": force }),
			)
			.await
	}

	#[instrument(skip(self))]
	pub async fn delete_reference(&self, reference: &str) -> Result<(), GithubEndpointError> {
		ensure_not_blank(reference, "ref")?;
		self
			.send_no_body(
				Method::DELETE,
				&self.repo_path(&format!("git/refs/{}", encode_path(short_ref(reference)))),
			)
			.await?;
		info!("Deleted reference");
		Ok(())
	}
}
