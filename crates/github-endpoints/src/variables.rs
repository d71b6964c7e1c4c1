// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub Actions configuration variables.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::GithubEndpointClient;
use crate::error::{ensure_not_blank, GithubEndpointError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsVariable {
	pub name: String,
	pub value: String,
	/// Only present on organization variables: `all`, `private` or `selected`.
	pub visibility: Option<String>,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
}

impl GithubEndpointClient {
	fn variable_path(&self, name: &str) -> Result<String, GithubEndpointError> {
		ensure_not_blank(name, "variable name")?;
		Ok(self.repo_path(&format!("actions/variables/{}", urlencoding::encode(name))))
	}

	#[instrument(skip(self))]
	pub async fn list_variables(&self) -> Result<Vec<ActionsVariable>, GithubEndpointError> {
		self
			.get_all_pages_in(&self.repo_path("actions/variables"), &[], "variables")
			.await
	}

	/// Variables defined on an organization.
	#[instrument(skip(self))]
	pub async fn list_org_variables(&self, org: &str) -> Result<Vec<ActionsVariable>, GithubEndpointError> {
		ensure_not_blank(org, "organization")?;
		self
			.get_all_pages_in(
				&format!("orgs/{}/actions/variables", urlencoding::encode(org)),
				&[],
				"variables",
			)
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_variable(&self, name: &str) -> Result<ActionsVariable, GithubEndpointError> {
		self.get_json(&self.variable_path(name)?, &[]).await
	}

	#[instrument(skip(self, value))]
	pub async fn create_variable(&self, name: &str, value: &str) -> Result<(), GithubEndpointError> {
		ensure_not_blank(name, "variable name")?;
		self
			.send_empty(
				Method::POST,
				&self.repo_path("actions/variables"),
				Some(&json!({ "name": name, "value": value })),
			)
			.await?;
		info!("Created Actions variable");
		Ok(())
	}

	#[instrument(skip(self, value))]
	pub async fn update_variable(&self, name: &str, value: &str) -> Result<(), GithubEndpointError> {
		self
			.send_empty(
				Method::PATCH,
				&self.variable_path(name)?,
				Some(&json!({ "name": name, "value": value })),
			)
			.await?;
		info!("Updated Actions variable");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn delete_variable(&self, name: &str) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::DELETE, &self.variable_path(name)?)
			.await
	}
}
