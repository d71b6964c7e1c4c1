// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Repository metadata, tags, teams and custom properties.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::client::GithubEndpointClient;
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::types::{SimpleUser, Team};

/// Repository metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
	pub id: u64,
	#[serde(default)]
	pub node_id: String,
	pub name: String,
	/// `owner/repo`
	pub full_name: String,
	pub owner: SimpleUser,
	pub private: bool,
	pub description: Option<String>,
	#[serde(default)]
	pub fork: bool,
	#[serde(default)]
	pub archived: bool,
	pub visibility: Option<String>,
	#[serde(default)]
	pub html_url: String,
	#[serde(default)]
	pub clone_url: String,
	pub default_branch: Option<String>,
	pub language: Option<String>,
	#[serde(default)]
	pub topics: Vec<String>,
	#[serde(default)]
	pub stargazers_count: u64,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewRepository {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub homepage: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub private: Option<bool>,
	/// Create an initial commit with an empty README.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auto_init: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gitignore_template: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub license_template: Option<String>,
}

impl NewRepository {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}
}

/// Repository settings to change; `None` leaves a setting as is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub homepage: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub private: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub default_branch: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub archived: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub allow_auto_merge: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub allow_squash_merge: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delete_branch_on_merge: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCommit {
	pub sha: String,
	#[serde(default)]
	pub url: String,
}

/// Lightweight tag as listed by the repository tags endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
	pub name: String,
	pub commit: TagCommit,
	#[serde(default)]
	pub zipball_url: String,
	#[serde(default)]
	pub tarball_url: String,
}

/// Value of one organization-defined custom property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPropertyValue {
	pub property_name: String,
	/// String, array of strings, or `null` to unset.
	pub value: Value,
}

impl CustomPropertyValue {
	pub fn new(property_name: impl Into<String>, value: impl Into<Value>) -> Self {
		Self {
			property_name: property_name.into(),
			value: value.into(),
		}
	}
}

impl GithubEndpointClient {
	#[instrument(skip(self))]
	pub async fn get_repository(&self) -> Result<Repository, GithubEndpointError> {
		self.get_json(&self.repo_path(""), &[]).await
	}

	/// Create a repository for the authenticated user, or inside
	/// `organization` when given.
	#[instrument(skip(self, repository), fields(name = %repository.name))]
	pub async fn create_repository(
		&self,
		repository: &NewRepository,
		organization: Option<&str>,
	) -> Result<Repository, GithubEndpointError> {
		ensure_not_blank(&repository.name, "name")?;

		let path = match organization {
			Some(org) => {
				ensure_not_blank(org, "organization")?;
				format!("orgs/{}/repos", urlencoding::encode(org))
			}
			None => "user/repos".to_string(),
		};

		let created: Repository = self.send_json(Method::POST, &path, repository).await?;
		info!(full_name = %created.full_name, "Created repository");
		Ok(created)
	}

	#[instrument(skip(self, update))]
	pub async fn update_repository(
		&self,
		update: &RepositoryUpdate,
	) -> Result<Repository, GithubEndpointError> {
		self
			.send_json(Method::PATCH, &self.repo_path(""), update)
			.await
	}

	/// Delete the bound repository. Irreversible.
	#[instrument(skip(self), fields(repository = %self.context().full_name()))]
	pub async fn delete_repository(&self) -> Result<(), GithubEndpointError> {
		self.send_no_body(Method::DELETE, &self.repo_path("")).await?;
		warn!("Deleted repository");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn list_tags(&self) -> Result<Vec<Tag>, GithubEndpointError> {
		self.get_all_pages(&self.repo_path("tags"), &[]).await
	}

	#[instrument(skip(self))]
	pub async fn list_teams(&self) -> Result<Vec<Team>, GithubEndpointError> {
		self.get_all_pages(&self.repo_path("teams"), &[]).await
	}

	/// Whether Dependabot vulnerability alerts are enabled.
	#[instrument(skip(self))]
	pub async fn vulnerability_alerts_enabled(&self) -> Result<bool, GithubEndpointError> {
		self.probe(&self.repo_path("vulnerability-alerts")).await
	}

	#[instrument(skip(self))]
	pub async fn get_custom_property_values(
		&self,
	) -> Result<Vec<CustomPropertyValue>, GithubEndpointError> {
		self
			.get_json(&self.repo_path("properties/values"), &[])
			.await
	}

	/// Create or update custom property values; a `null` value unsets one.
	#[instrument(skip(self, values), fields(count = values.len()))]
	pub async fn save_custom_property_values(
		&self,
		values: &[CustomPropertyValue],
	) -> Result<(), GithubEndpointError> {
		if values.is_empty() {
			return Err(GithubEndpointError::invalid_argument(
				"at least one property value is required",
			));
		}
		self
			.send_empty(
				Method::PATCH,
				&self.repo_path("properties/values"),
				Some(&json!({ "properties": values })),
			)
			.await
	}
}
