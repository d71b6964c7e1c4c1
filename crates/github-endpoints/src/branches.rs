// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Branches and branch protection.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::client::{encode_path, GithubEndpointClient};
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::types::{SimpleUser, Team};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchCommit {
	pub sha: String,
	#[serde(default)]
	pub url: String,
}

/// Branch as listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSummary {
	pub name: String,
	pub commit: BranchCommit,
	#[serde(default)]
	pub protected: bool,
}

/// Branch with its protection summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
	pub name: String,
	pub commit: BranchCommit,
	#[serde(default)]
	pub protected: bool,
	pub protection: Option<Value>,
	pub protection_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheck {
	pub context: String,
	pub app_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredStatusChecks {
	/// Branch must be up to date before merging.
	pub strict: bool,
	#[serde(default)]
	pub contexts: Vec<String>,
	#[serde(default)]
	pub checks: Vec<StatusCheck>,
}

/// App allowed to push to a restricted branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictionApp {
	pub id: u64,
	pub slug: Option<String>,
	pub name: String,
}

/// Who may push to a protected branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRestrictions {
	#[serde(default)]
	pub users: Vec<SimpleUser>,
	#[serde(default)]
	pub teams: Vec<Team>,
	#[serde(default)]
	pub apps: Vec<RestrictionApp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnabledSetting {
	pub enabled: bool,
}

/// Protection rules of a branch. Sections that are not configured are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchProtection {
	#[serde(default)]
	pub url: String,
	pub required_status_checks: Option<RequiredStatusChecks>,
	pub required_pull_request_reviews: Option<Value>,
	pub restrictions: Option<BranchRestrictions>,
	pub enforce_admins: Option<EnabledSetting>,
	pub required_linear_history: Option<EnabledSetting>,
	pub allow_force_pushes: Option<EnabledSetting>,
	pub allow_deletions: Option<EnabledSetting>,
}

impl GithubEndpointClient {
	/// Every branch, optionally only protected or unprotected ones.
	#[instrument(skip(self))]
	pub async fn list_branches(
		&self,
		protected: Option<bool>,
	) -> Result<Vec<BranchSummary>, GithubEndpointError> {
		let query: Vec<(&str, String)> = protected
			.map(|p| vec![("protected", p.to_string())])
			.unwrap_or_default();
		self.get_all_pages(&self.repo_path("branches"), &query).await
	}

	#[instrument(skip(self))]
	pub async fn get_branch(&self, branch: &str) -> Result<Branch, GithubEndpointError> {
		ensure_not_blank(branch, "branch")?;
		self
			.get_json(&self.repo_path(&format!("branches/{}", encode_path(branch))), &[])
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_branch_protection(
		&self,
		branch: &str,
	) -> Result<BranchProtection, GithubEndpointError> {
		ensure_not_blank(branch, "branch")?;
		self
			.get_json(
				&self.repo_path(&format!("branches/{}/protection", encode_path(branch))),
				&[],
			)
			.await
	}

	#[instrument(skip(self))]
	pub async fn rename_branch(&self, branch: &str, new_name: &str) -> Result<Branch, GithubEndpointError> {
		ensure_not_blank(branch, "branch")?;
		ensure_not_blank(new_name, "new_name")?;

		let renamed: Branch = self
			.send_json(
				Method::POST,
				&self.repo_path(&format!("branches/{}/rename", encode_path(branch))),
				&json!({ "new_name": new_name }),
			)
			.await?;
		info!(new_name = %renamed.name, "Renamed branch");
		Ok(renamed)
	}

	#[instrument(skip(self))]
	pub async fn get_required_status_checks(
		&self,
		branch: &str,
	) -> Result<RequiredStatusChecks, GithubEndpointError> {
		ensure_not_blank(branch, "branch")?;
		self
			.get_json(
				&self.repo_path(&format!(
					"branches/{}/protection/required_status_checks",
					encode_path(branch)
				)),
				&[],
			)
			.await
	}

	/// Users, teams and apps allowed to push to a protected branch.
	#[instrument(skip(self))]
	pub async fn get_branch_restrictions(
		&self,
		branch: &str,
	) -> Result<BranchRestrictions, GithubEndpointError> {
		ensure_not_blank(branch, "branch")?;
		self
			.get_json(
				&self.repo_path(&format!(
					"branches/{}/protection/restrictions",
					encode_path(branch)
				)),
				&[],
			)
			.await
	}
}
