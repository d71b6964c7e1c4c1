// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Deployments, deployment statuses and environments.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::client::GithubEndpointClient;
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::types::SimpleUser;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
	pub id: u64,
	#[serde(default)]
	pub node_id: String,
	pub sha: String,
	#[serde(rename = "ref")]
	pub ref_name: String,
	pub task: String,
	pub environment: String,
	pub description: Option<String>,
	#[serde(default)]
	pub payload: Value,
	pub creator: Option<SimpleUser>,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub production_environment: bool,
	#[serde(default)]
	pub transient_environment: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewDeployment {
	/// Branch, tag or SHA to deploy.
	#[serde(rename = "ref")]
	pub ref_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub task: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auto_merge: Option<bool>,
	/// Status contexts that must pass; `Some(vec![])` bypasses checks.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub required_contexts: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub payload: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub environment: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub production_environment: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub transient_environment: Option<bool>,
}

impl NewDeployment {
	pub fn new(ref_name: impl Into<String>) -> Self {
		Self {
			ref_name: ref_name.into(),
			..Self::default()
		}
	}

	pub fn to_environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());
		self
	}
}

/// Filters for [`GithubEndpointClient::list_deployments`].
#[derive(Debug, Clone, Default)]
pub struct DeploymentFilter {
	pub sha: Option<String>,
	pub ref_name: Option<String>,
	pub task: Option<String>,
	pub environment: Option<String>,
}

impl DeploymentFilter {
	fn to_query(&self) -> Vec<(&'static str, String)> {
		[
			("sha", &self.sha),
			("ref", &self.ref_name),
			("task", &self.task),
			("environment", &self.environment),
		]
		.into_iter()
		.filter_map(|(key, value)| value.clone().map(|v| (key, v)))
		.collect()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
	Error,
	Failure,
	Inactive,
	InProgress,
	Queued,
	Pending,
	Success,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
	pub id: u64,
	pub state: DeploymentState,
	pub description: Option<String>,
	pub environment: Option<String>,
	pub target_url: Option<String>,
	pub environment_url: Option<String>,
	pub log_url: Option<String>,
	pub creator: Option<SimpleUser>,
	pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDeploymentStatus {
	pub state: DeploymentState,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub environment: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub environment_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub log_url: Option<String>,
	/// Mark earlier non-transient deployments to the environment inactive.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auto_inactive: Option<bool>,
}

impl NewDeploymentStatus {
	pub fn new(state: DeploymentState) -> Self {
		Self {
			state,
			description: None,
			environment: None,
			environment_url: None,
			log_url: None,
			auto_inactive: None,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
	pub id: u64,
	#[serde(default)]
	pub node_id: String,
	pub name: String,
	#[serde(default)]
	pub html_url: String,
	#[serde(default)]
	pub protection_rules: Vec<Value>,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
}

impl GithubEndpointClient {
	#[instrument(skip(self, filter))]
	pub async fn list_deployments(
		&self,
		filter: &DeploymentFilter,
	) -> Result<Vec<Deployment>, GithubEndpointError> {
		self
			.get_all_pages(&self.repo_path("deployments"), &filter.to_query())
			.await
	}

	#[instrument(skip(self, deployment), fields(reference = %deployment.ref_name))]
	pub async fn create_deployment(
		&self,
		deployment: &NewDeployment,
	) -> Result<Deployment, GithubEndpointError> {
		ensure_not_blank(&deployment.ref_name, "ref")?;

		let created: Deployment = self
			.send_json(Method::POST, &self.repo_path("deployments"), deployment)
			.await?;
		info!(id = created.id, environment = %created.environment, "Created deployment");
		Ok(created)
	}

	#[instrument(skip(self))]
	pub async fn list_deployment_statuses(
		&self,
		deployment_id: u64,
	) -> Result<Vec<DeploymentStatus>, GithubEndpointError> {
		self
			.get_all_pages(
				&self.repo_path(&format!("deployments/{deployment_id}/statuses")),
				&[],
			)
			.await
	}

	#[instrument(skip(self, status), fields(state = ?status.state))]
	pub async fn create_deployment_status(
		&self,
		deployment_id: u64,
		status: &NewDeploymentStatus,
	) -> Result<DeploymentStatus, GithubEndpointError> {
		self
			.send_json(
				Method::POST,
				&self.repo_path(&format!("deployments/{deployment_id}/statuses")),
				status,
			)
			.await
	}

	#[instrument(skip(self))]
	pub async fn list_environments(&self) -> Result<Vec<Environment>, GithubEndpointError> {
		self
			.get_all_pages_in(&self.repo_path("environments"), &[], "environments")
			.await
	}
}
