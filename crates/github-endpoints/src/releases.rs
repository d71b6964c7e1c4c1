// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Releases, release assets and generated release notes.

use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::client::{encode_path, GithubEndpointClient};
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::types::SimpleUser;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
	pub id: u64,
	#[serde(default)]
	pub node_id: String,
	pub name: String,
	pub label: Option<String>,
	/// `uploaded` or `open`.
	pub state: String,
	pub content_type: String,
	pub size: u64,
	#[serde(default)]
	pub download_count: u64,
	#[serde(default)]
	pub browser_download_url: String,
	pub uploader: Option<SimpleUser>,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
	pub id: u64,
	#[serde(default)]
	pub node_id: String,
	pub tag_name: String,
	#[serde(default)]
	pub target_commitish: String,
	pub name: Option<String>,
	pub body: Option<String>,
	pub draft: bool,
	pub prerelease: bool,
	#[serde(default)]
	pub html_url: String,
	/// Hypermedia template such as `https://uploads.github.com/.../assets{?name,label}`.
	#[serde(default)]
	pub upload_url: String,
	pub author: Option<SimpleUser>,
	#[serde(default)]
	pub assets: Vec<ReleaseAsset>,
	pub created_at: Option<DateTime<Utc>>,
	pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewRelease {
	pub tag_name: String,
	/// Branch or SHA the tag is created from when it does not exist yet.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_commitish: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub draft: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prerelease: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub generate_release_notes: Option<bool>,
}

impl NewRelease {
	pub fn new(tag_name: impl Into<String>) -> Self {
		Self {
			tag_name: tag_name.into(),
			..Self::default()
		}
	}
}

/// Release fields to change; `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReleaseUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tag_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_commitish: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub draft: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prerelease: Option<bool>,
}

/// Release name and markdown body generated by GitHub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseNotes {
	pub name: String,
	pub body: String,
}

/// Upload URL from a release's `upload_url` template.
fn upload_url(template: &str, name: &str, label: Option<&str>) -> Result<Url, GithubEndpointError> {
	let base = template.split('{').next().unwrap_or(template);
	let mut url = Url::parse(base)
		.map_err(|e| GithubEndpointError::InvalidResponse(format!("Invalid upload_url '{template}': {e}")))?;
	{
		let mut query = url.query_pairs_mut();
		query.append_pair("name", name);
		if let Some(label) = label {
			query.append_pair("label", label);
		}
	}
	Ok(url)
}

impl GithubEndpointClient {
	#[instrument(skip(self))]
	pub async fn list_releases(&self) -> Result<Vec<Release>, GithubEndpointError> {
		self.get_all_pages(&self.repo_path("releases"), &[]).await
	}

	#[instrument(skip(self))]
	pub async fn get_release_by_tag(&self, tag: &str) -> Result<Release, GithubEndpointError> {
		ensure_not_blank(tag, "tag")?;
		self
			.get_json(&self.repo_path(&format!("releases/tags/{}", encode_path(tag))), &[])
			.await
	}

	/// Most recent non-draft, non-prerelease release.
	#[instrument(skip(self))]
	pub async fn get_latest_release(&self) -> Result<Release, GithubEndpointError> {
		self.get_json(&self.repo_path("releases/latest"), &[]).await
	}

	#[instrument(skip(self, release), fields(tag = %release.tag_name))]
	pub async fn create_release(&self, release: &NewRelease) -> Result<Release, GithubEndpointError> {
		ensure_not_blank(&release.tag_name, "tag_name")?;

		let created: Release = self
			.send_json(Method::POST, &self.repo_path("releases"), release)
			.await?;
		info!(id = created.id, "Created release");
		Ok(created)
	}

	#[instrument(skip(self, update))]
	pub async fn edit_release(
		&self,
		release_id: u64,
		update: &ReleaseUpdate,
	) -> Result<Release, GithubEndpointError> {
		self
			.send_json(Method::PATCH, &self.repo_path(&format!("releases/{release_id}")), update)
			.await
	}

	#[instrument(skip(self))]
	pub async fn delete_release(&self, release_id: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::DELETE, &self.repo_path(&format!("releases/{release_id}")))
			.await?;
		info!("Deleted release");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn get_release_asset(&self, asset_id: u64) -> Result<ReleaseAsset, GithubEndpointError> {
		self
			.get_json(&self.repo_path(&format!("releases/assets/{asset_id}")), &[])
			.await
	}

	#[instrument(skip(self))]
	pub async fn list_release_assets(&self, release_id: u64) -> Result<Vec<ReleaseAsset>, GithubEndpointError> {
		self
			.get_all_pages(&self.repo_path(&format!("releases/{release_id}/assets")), &[])
			.await
	}

	/// Rename or relabel an asset.
	#[instrument(skip(self))]
	pub async fn edit_release_asset(
		&self,
		asset_id: u64,
		name: Option<&str>,
		label: Option<&str>,
	) -> Result<ReleaseAsset, GithubEndpointError> {
		let mut body = json!({});
		if let Some(name) = name {
			body["name"] = json!(name);
		}
		if let Some(label) = label {
			body["label"] = json!(label);
		}
		self
			.send_json(
				Method::PATCH,
				&self.repo_path(&format!("releases/assets/{asset_id}")),
				&body,
			)
			.await
	}

	#[instrument(skip(self))]
	pub async fn delete_release_asset(&self, asset_id: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(
				Method::DELETE,
				&self.repo_path(&format!("releases/assets/{asset_id}")),
			)
			.await
	}

	/// Upload `data` as an asset of the release tagged `tag`.
	///
	/// A missing release is [`GithubEndpointError::NotFound`]. Cancelling
	/// `cancel` abandons the lookup or upload in flight and returns
	/// [`GithubEndpointError::Cancelled`].
	#[instrument(skip(self, data, cancel), fields(bytes = data.len()))]
	pub async fn upload_release_asset_by_tag(
		&self,
		tag: &str,
		file_name: &str,
		content_type: &str,
		data: Vec<u8>,
		label: Option<&str>,
		cancel: &CancellationToken,
	) -> Result<ReleaseAsset, GithubEndpointError> {
		ensure_not_blank(tag, "tag")?;
		ensure_not_blank(file_name, "file_name")?;
		ensure_not_blank(content_type, "content_type")?;

		tokio::select! {
			biased;
			_ = cancel.cancelled() => {
				warn!("Release asset upload cancelled");
				Err(GithubEndpointError::Cancelled)
			}
			result = self.upload_asset_to_tag(tag, file_name, content_type, data, label) => result,
		}
	}

	async fn upload_asset_to_tag(
		&self,
		tag: &str,
		file_name: &str,
		content_type: &str,
		data: Vec<u8>,
		label: Option<&str>,
	) -> Result<ReleaseAsset, GithubEndpointError> {
		let release = match self.get_release_by_tag(tag).await {
			Ok(release) => release,
			Err(e) if e.status() == Some(404) => {
				return Err(GithubEndpointError::not_found(format!(
					"Release with tag {tag} not found"
				)));
			}
			Err(e) => return Err(e),
		};

		let url = upload_url(&release.upload_url, file_name, label)?;
		let asset: ReleaseAsset = self.upload(url, content_type, data).await?;
		info!(asset_id = asset.id, release_id = release.id, "Uploaded release asset");
		Ok(asset)
	}

	/// Release notes GitHub would generate for `tag_name`.
	#[instrument(skip(self))]
	pub async fn generate_release_notes(
		&self,
		tag_name: &str,
		previous_tag_name: Option<&str>,
		target_commitish: Option<&str>,
	) -> Result<ReleaseNotes, GithubEndpointError> {
		ensure_not_blank(tag_name, "tag_name")?;

		let mut body = json!({ "tag_name": tag_name });
		if let Some(previous) = previous_tag_name {
			body["previous_tag_name"] = json!(previous);
		}
		if let Some(target) = target_commitish {
			body["target_commitish"] = json!(target);
		}
		self
			.send_json(Method::POST, &self.repo_path("releases/generate-notes"), &body)
			.await
	}
}
