// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Repository contents: file reads and writes, archives and the README.
//!
//! Writes fall back to the configured [`ContentDefaults`](crate::ContentDefaults)
//! when the caller leaves the commit message or branch blank.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use github_endpoints_http::{GITHUB_HTML, GITHUB_RAW};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::client::{encode_path, GithubEndpointClient};
use crate::commits::ShaRef;
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::types::GitActor;

/// File, directory, symlink or submodule entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
	#[serde(rename = "type")]
	pub kind: String,
	pub name: String,
	pub path: String,
	pub sha: String,
	#[serde(default)]
	pub size: u64,
	pub encoding: Option<String>,
	/// Base64 with embedded newlines, for files up to 1 MB.
	pub content: Option<String>,
	#[serde(default)]
	pub html_url: Option<String>,
	#[serde(default)]
	pub download_url: Option<String>,
}

impl Content {
	/// Decoded file bytes, when the entry carries inline base64 content.
	pub fn decoded(&self) -> Result<Option<Vec<u8>>, GithubEndpointError> {
		let Some(content) = &self.content else {
			return Ok(None);
		};
		let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
		STANDARD
			.decode(compact)
			.map(Some)
			.map_err(|e| GithubEndpointError::InvalidResponse(format!("Invalid base64 content: {e}")))
	}
}

/// Commit created by a contents write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCommit {
	pub sha: String,
	#[serde(default)]
	pub node_id: String,
	pub message: String,
	pub author: Option<GitActor>,
	pub committer: Option<GitActor>,
	pub tree: Option<ShaRef>,
	#[serde(default)]
	pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCommitResponse {
	/// The written file; `None` after a delete.
	pub content: Option<Content>,
	pub commit: FileCommit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
	Tarball,
	Zipball,
}

impl ArchiveFormat {
	fn as_str(self) -> &'static str {
		match self {
			Self::Tarball => "tarball",
			Self::Zipball => "zipball",
		}
	}
}

#[derive(Debug, Serialize)]
struct FileWriteBody<'a> {
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	content: Option<String>,
	branch: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	sha: Option<&'a str>,
}

fn ref_query(reference: Option<&str>) -> Vec<(&'static str, String)> {
	reference
		.filter(|r| !r.trim().is_empty())
		.map(|r| vec![("ref", r.to_string())])
		.unwrap_or_default()
}

impl GithubEndpointClient {
	fn contents_path(&self, path: &str) -> String {
		self.repo_path(&format!("contents/{}", encode_path(path.trim_start_matches('/'))))
	}

	/// Metadata (and inline base64 content) of a file or directory entry.
	#[instrument(skip(self))]
	pub async fn get_content(&self, path: &str, reference: Option<&str>) -> Result<Content, GithubEndpointError> {
		ensure_not_blank(path, "path")?;
		self
			.get_json(&self.contents_path(path), &ref_query(reference))
			.await
	}

	/// Raw bytes of a file, at `reference` or the default branch.
	#[instrument(skip(self))]
	pub async fn get_raw_content(
		&self,
		path: &str,
		reference: Option<&str>,
	) -> Result<Vec<u8>, GithubEndpointError> {
		ensure_not_blank(path, "path")?;
		let bytes = self
			.get_bytes(&self.contents_path(path), GITHUB_RAW, &ref_query(reference))
			.await?;
		debug!(bytes = bytes.len(), "Fetched raw content");
		Ok(bytes)
	}

	/// File content as UTF-8 text.
	pub async fn get_content_string(
		&self,
		path: &str,
		reference: Option<&str>,
	) -> Result<String, GithubEndpointError> {
		let bytes = self.get_raw_content(path, reference).await?;
		String::from_utf8(bytes)
			.map_err(|_| GithubEndpointError::InvalidResponse(format!("{path} is not UTF-8 text")))
	}

	/// Create a file. Blank `message` and `branch` use the content defaults.
	#[instrument(skip(self, content, message))]
	pub async fn create_file(
		&self,
		path: &str,
		content: &[u8],
		message: Option<&str>,
		branch: Option<&str>,
	) -> Result<FileCommitResponse, GithubEndpointError> {
		self.write_file(path, content, None, message, branch).await
	}

	/// Replace a file whose current blob SHA is `sha`.
	#[instrument(skip(self, content, message))]
	pub async fn update_file(
		&self,
		path: &str,
		content: &[u8],
		sha: &str,
		message: Option<&str>,
		branch: Option<&str>,
	) -> Result<FileCommitResponse, GithubEndpointError> {
		ensure_not_blank(sha, "sha")?;
		self.write_file(path, content, Some(sha), message, branch).await
	}

	async fn write_file(
		&self,
		path: &str,
		content: &[u8],
		sha: Option<&str>,
		message: Option<&str>,
		branch: Option<&str>,
	) -> Result<FileCommitResponse, GithubEndpointError> {
		ensure_not_blank(path, "path")?;
		if content.is_empty() {
			return Err(GithubEndpointError::invalid_argument("content must not be empty"));
		}

		let defaults = self.config().content_defaults();
		let body = FileWriteBody {
			message: defaults.message_or_default(message, path),
			content: Some(STANDARD.encode(content)),
			branch: defaults.branch_or_default(branch),
			sha,
		};

		let response: FileCommitResponse = self
			.send_json(Method::PUT, &self.contents_path(path), &body)
			.await?;
		info!(commit = %response.commit.sha, branch = %body.branch, "Wrote file");
		Ok(response)
	}

	/// Delete a file whose current blob SHA is `sha`.
	#[instrument(skip(self, message))]
	pub async fn delete_file(
		&self,
		path: &str,
		sha: &str,
		message: Option<&str>,
		branch: Option<&str>,
	) -> Result<FileCommitResponse, GithubEndpointError> {
		ensure_not_blank(path, "path")?;
		ensure_not_blank(sha, "sha")?;

		let defaults = self.config().content_defaults();
		let body = FileWriteBody {
			message: defaults.message_or_default(message, path),
			content: None,
			branch: defaults.branch_or_default(branch),
			sha: Some(sha),
		};

		let response: FileCommitResponse = self
			.send_json(Method::DELETE, &self.contents_path(path), &body)
			.await?;
		info!(commit = %response.commit.sha, "Deleted file");
		Ok(response)
	}

	/// Download a tarball or zipball of `reference` (default branch if `None`).
	#[instrument(skip(self))]
	pub async fn download_archive(
		&self,
		format: ArchiveFormat,
		reference: Option<&str>,
	) -> Result<Vec<u8>, GithubEndpointError> {
		let path = match reference.filter(|r| !r.trim().is_empty()) {
			Some(r) => self.repo_path(&format!("{}/{}", format.as_str(), encode_path(r))),
			None => self.repo_path(format.as_str()),
		};
		self.get_bytes(&path, "application/octet-stream", &[]).await
	}

	#[instrument(skip(self))]
	pub async fn get_readme(&self, reference: Option<&str>) -> Result<Content, GithubEndpointError> {
		self
			.get_json(&self.repo_path("readme"), &ref_query(reference))
			.await
	}

	/// README rendered to HTML by GitHub.
	#[instrument(skip(self))]
	pub async fn get_readme_html(&self, reference: Option<&str>) -> Result<String, GithubEndpointError> {
		self
			.get_text(&self.repo_path("readme"), GITHUB_HTML, &ref_query(reference))
			.await
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use wiremock::matchers::{body_json, header, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::config::ContentDefaults;
	use crate::context::EndpointContext;
	use crate::test_support::{mock_client, mock_config, repo_path, TEST_TOKEN};

	fn write_response() -> serde_json::Value {
		json!({
			"content": {
				"type": "file",
				"name": "hello.txt",
				"path": "notes/hello.txt",
				"sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3",
				"size": 9
			},
			"commit": {
				"sha": "7638417db6d59f3c431d3e1f261cc637155684cd",
				"message": "File uploaded: hello.txt",
				"tree": {"sha": "691272480426f78a0138979dd3ce63b77f706feb"}
			}
		})
	}

	#[tokio::test]
	async fn raw_content_uses_raw_media_type_and_ref() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("contents/docs/guide.md")))
			.and(query_param("ref", "v2"))
			.and(header("accept", "application/vnd.github.raw"))
			.respond_with(ResponseTemplate::new(200).set_body_string("# Guide\n"))
			.expect(1)
			.mount(&server)
			.await;

		let text = mock_client(&server)
			.get_content_string("docs/guide.md", Some("v2"))
			.await
			.unwrap();
		assert_eq!(text, "# Guide\n");
	}

	#[tokio::test]
	async fn non_utf8_content_is_invalid_response() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("contents/logo.png")))
			.respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0xff, 0xfe]))
			.mount(&server)
			.await;

		let client = mock_client(&server);
		assert_eq!(client.get_raw_content("logo.png", None).await.unwrap().len(), 4);
		let err = client.get_content_string("logo.png", None).await.unwrap_err();
		assert!(matches!(err, GithubEndpointError::InvalidResponse(_)));
	}

	#[tokio::test]
	async fn create_fills_default_message_and_branch() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.and(path(repo_path("contents/notes/hello.txt")))
			.and(body_json(json!({
				"message": "File uploaded: hello.txt",
				"content": "aGVsbG8gd29ybGQ=",
				"branch": "main"
			})))
			.respond_with(ResponseTemplate::new(201).set_body_json(write_response()))
			.expect(1)
			.mount(&server)
			.await;

		let response = mock_client(&server)
			.create_file("notes/hello.txt", b"hello world", Some("  "), None)
			.await
			.unwrap();
		assert_eq!(response.commit.sha, "7638417db6d59f3c431d3e1f261cc637155684cd");
	}

	#[tokio::test]
	async fn configured_defaults_apply_to_updates() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.and(path(repo_path("contents/hello.txt")))
			.and(body_json(json!({
				"message": "docs: hello.txt",
				"content": "aGk=",
				"branch": "trunk",
				"sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3"
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(write_response()))
			.expect(1)
			.mount(&server)
			.await;

		let config = mock_config(&server).with_content_defaults(ContentDefaults {
			branch: "trunk".to_string(),
			message_template: "docs: {}".to_string(),
		});
		let context = EndpointContext::new("octo-org", "hello-world", TEST_TOKEN).unwrap();
		let client = GithubEndpointClient::new(config, context).unwrap();

		client
			.update_file("hello.txt", b"hi", "95b966ae1c166bd92f8ae7d1c313e738c731dfc3", None, None)
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn blank_inputs_fail_before_network() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.respond_with(ResponseTemplate::new(201))
			.expect(0)
			.mount(&server)
			.await;

		let client = mock_client(&server);
		assert!(matches!(
			client.create_file(" ", b"x", None, None).await.unwrap_err(),
			GithubEndpointError::InvalidArgument(_)
		));
		assert!(matches!(
			client.create_file("a.txt", b"", None, None).await.unwrap_err(),
			GithubEndpointError::InvalidArgument(_)
		));
		assert!(matches!(
			client.update_file("a.txt", b"x", "", None, None).await.unwrap_err(),
			GithubEndpointError::InvalidArgument(_)
		));
		assert!(matches!(
			client.delete_file("a.txt", " ", None, None).await.unwrap_err(),
			GithubEndpointError::InvalidArgument(_)
		));
	}

	#[tokio::test]
	async fn delete_sends_sha_and_defaults() {
		let server = MockServer::start().await;
		Mock::given(method("DELETE"))
			.and(path(repo_path("contents/old.txt")))
			.and(body_json(json!({
				"message": "Remove old file",
				"branch": "main",
				"sha": "abc"
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"content": null,
				"commit": {"sha": "def", "message": "Remove old file"}
			})))
			.expect(1)
			.mount(&server)
			.await;

		let response = mock_client(&server)
			.delete_file("old.txt", "abc", Some("Remove old file"), None)
			.await
			.unwrap();
		assert!(response.content.is_none());
	}

	#[tokio::test]
	async fn readme_content_decodes() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("readme")))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"type": "file",
				"name": "README.md",
				"path": "README.md",
				"sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
				"size": 12,
				"encoding": "base64",
				"content": "SGVsbG8g\nV29ybGQh\n"
			})))
			.mount(&server)
			.await;

		let readme = mock_client(&server).get_readme(None).await.unwrap();
		assert_eq!(readme.decoded().unwrap().unwrap(), b"Hello World!");
	}

	#[tokio::test]
	async fn archive_targets_reference() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("zipball/v1.0.0")))
			.respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
			.expect(1)
			.mount(&server)
			.await;

		let bytes = mock_client(&server)
			.download_archive(ArchiveFormat::Zipball, Some("v1.0.0"))
			.await
			.unwrap();
		assert_eq!(&bytes[..2], b"PK");
	}
}
