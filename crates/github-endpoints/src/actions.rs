// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub Actions workflows, workflow runs and jobs.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::client::GithubEndpointClient;
use crate::deployments::Deployment;
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::types::SimpleUser;

/// A workflow, addressed by numeric id or by its file name (`ci.yml`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowId {
	Id(u64),
	FileName(String),
}

impl From<u64> for WorkflowId {
	fn from(id: u64) -> Self {
		Self::Id(id)
	}
}

impl From<&str> for WorkflowId {
	fn from(file_name: &str) -> Self {
		Self::FileName(file_name.to_string())
	}
}

impl From<String> for WorkflowId {
	fn from(file_name: String) -> Self {
		Self::FileName(file_name)
	}
}

impl fmt::Display for WorkflowId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Id(id) => write!(f, "{id}"),
			Self::FileName(name) => f.write_str(&urlencoding::encode(name)),
		}
	}
}

impl WorkflowId {
	fn validate(&self) -> Result<(), GithubEndpointError> {
		match self {
			Self::Id(_) => Ok(()),
			Self::FileName(name) => ensure_not_blank(name, "workflow"),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
	pub id: u64,
	#[serde(default)]
	pub node_id: String,
	pub name: String,
	/// Path of the workflow file, e.g. `.github/workflows/ci.yml`.
	pub path: String,
	/// `active`, `disabled_manually`, `disabled_inactivity`, ...
	pub state: String,
	#[serde(default)]
	pub html_url: String,
	#[serde(default)]
	pub badge_url: String,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillableTime {
	pub total_ms: u64,
	pub jobs: Option<u64>,
}

/// Billable minutes per runner OS (`UBUNTU`, `MACOS`, `WINDOWS`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsUsage {
	#[serde(default)]
	pub billable: HashMap<String, BillableTime>,
	pub run_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
	pub id: u64,
	pub name: Option<String>,
	#[serde(default)]
	pub node_id: String,
	pub head_branch: Option<String>,
	pub head_sha: String,
	pub run_number: u64,
	#[serde(default = "first_attempt")]
	pub run_attempt: u32,
	pub event: String,
	pub status: Option<String>,
	pub conclusion: Option<String>,
	pub workflow_id: u64,
	#[serde(default)]
	pub html_url: String,
	pub actor: Option<SimpleUser>,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	pub run_started_at: Option<DateTime<Utc>>,
}

fn first_attempt() -> u32 {
	1
}

/// Filters for the workflow run listings.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRunFilter {
	pub actor: Option<String>,
	pub branch: Option<String>,
	/// Triggering event, e.g. `push` or `pull_request`.
	pub event: Option<String>,
	/// `queued`, `in_progress`, `completed`, `success`, `failure`, ...
	pub status: Option<String>,
	pub head_sha: Option<String>,
}

impl WorkflowRunFilter {
	fn to_query(&self) -> Vec<(&'static str, String)> {
		[
			("actor", &self.actor),
			("branch", &self.branch),
			("event", &self.event),
			("status", &self.status),
			("head_sha", &self.head_sha),
		]
		.into_iter()
		.filter_map(|(key, value)| value.clone().map(|v| (key, v)))
		.collect()
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStep {
	pub name: String,
	pub number: u64,
	pub status: String,
	pub conclusion: Option<String>,
	pub started_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
	pub id: u64,
	pub run_id: u64,
	#[serde(default = "first_attempt")]
	pub run_attempt: u32,
	pub name: String,
	pub head_sha: String,
	pub status: String,
	pub conclusion: Option<String>,
	pub started_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub steps: Vec<JobStep>,
	#[serde(default)]
	pub labels: Vec<String>,
	pub runner_name: Option<String>,
	#[serde(default)]
	pub html_url: Option<String>,
}

/// One approval or rejection of a run waiting on protected environments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentApproval {
	/// `approved` or `rejected`.
	pub state: String,
	pub comment: Option<String>,
	pub user: SimpleUser,
	#[serde(default)]
	pub environments: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentReviewState {
	Approved,
	Rejected,
}

impl GithubEndpointClient {
	fn workflow_path(&self, workflow: &WorkflowId, rest: &str) -> Result<String, GithubEndpointError> {
		workflow.validate()?;
		Ok(match rest {
			"" => self.repo_path(&format!("actions/workflows/{workflow}")),
			rest => self.repo_path(&format!("actions/workflows/{workflow}/{rest}")),
		})
	}

	fn run_path(&self, run_id: u64, rest: &str) -> String {
		match rest {
			"" => self.repo_path(&format!("actions/runs/{run_id}")),
			rest => self.repo_path(&format!("actions/runs/{run_id}/{rest}")),
		}
	}

	#[instrument(skip(self))]
	pub async fn list_workflows(&self) -> Result<Vec<Workflow>, GithubEndpointError> {
		self
			.get_all_pages_in(&self.repo_path("actions/workflows"), &[], "workflows")
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_workflow(&self, workflow: &WorkflowId) -> Result<Workflow, GithubEndpointError> {
		self.get_json(&self.workflow_path(workflow, "")?, &[]).await
	}

	#[instrument(skip(self))]
	pub async fn enable_workflow(&self, workflow: &WorkflowId) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::PUT, &self.workflow_path(workflow, "enable")?)
			.await?;
		info!("Enabled workflow");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn disable_workflow(&self, workflow: &WorkflowId) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::PUT, &self.workflow_path(workflow, "disable")?)
			.await?;
		info!("Disabled workflow");
		Ok(())
	}

	/// Billable time of a workflow in the current billing cycle.
	#[instrument(skip(self))]
	pub async fn get_workflow_usage(&self, workflow: &WorkflowId) -> Result<ActionsUsage, GithubEndpointError> {
		self
			.get_json(&self.workflow_path(workflow, "timing")?, &[])
			.await
	}

	/// Trigger a `workflow_dispatch` run on `git_ref`.
	#[instrument(skip(self, inputs))]
	pub async fn dispatch_workflow(
		&self,
		workflow: &WorkflowId,
		git_ref: &str,
		inputs: Option<&HashMap<String, String>>,
	) -> Result<(), GithubEndpointError> {
		ensure_not_blank(git_ref, "ref")?;

		let mut body = json!({ "ref": git_ref });
		if let Some(inputs) = inputs {
			body["inputs"] = json!(inputs);
		}
		self
			.send_empty(Method::POST, &self.workflow_path(workflow, "dispatches")?, Some(&body))
			.await?;
		info!("Dispatched workflow");
		Ok(())
	}

	/// Every run in the repository matching `filter`.
	#[instrument(skip(self, filter))]
	pub async fn list_workflow_runs(
		&self,
		filter: &WorkflowRunFilter,
	) -> Result<Vec<WorkflowRun>, GithubEndpointError> {
		self
			.get_all_pages_in(
				&self.repo_path("actions/runs"),
				&filter.to_query(),
				"workflow_runs",
			)
			.await
	}

	/// Every run of one workflow matching `filter`.
	#[instrument(skip(self, filter))]
	pub async fn list_workflow_runs_for_workflow(
		&self,
		workflow: &WorkflowId,
		filter: &WorkflowRunFilter,
	) -> Result<Vec<WorkflowRun>, GithubEndpointError> {
		self
			.get_all_pages_in(
				&self.workflow_path(workflow, "runs")?,
				&filter.to_query(),
				"workflow_runs",
			)
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_workflow_run(&self, run_id: u64) -> Result<WorkflowRun, GithubEndpointError> {
		self.get_json(&self.run_path(run_id, ""), &[]).await
	}

	#[instrument(skip(self))]
	pub async fn delete_workflow_run(&self, run_id: u64) -> Result<(), GithubEndpointError> {
		self.send_no_body(Method::DELETE, &self.run_path(run_id, "")).await
	}

	/// Approve a run from a first-time contributor's fork.
	#[instrument(skip(self))]
	pub async fn approve_workflow_run(&self, run_id: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::POST, &self.run_path(run_id, "approve"))
			.await
	}

	#[instrument(skip(self))]
	pub async fn cancel_workflow_run(&self, run_id: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::POST, &self.run_path(run_id, "cancel"))
			.await?;
		info!("Cancelled workflow run");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn rerun_workflow_run(&self, run_id: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::POST, &self.run_path(run_id, "rerun"))
			.await?;
		info!("Re-ran workflow run");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn rerun_failed_jobs(&self, run_id: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::POST, &self.run_path(run_id, "rerun-failed-jobs"))
			.await?;
		info!("Re-ran failed jobs");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn get_workflow_run_attempt(
		&self,
		run_id: u64,
		attempt: u32,
	) -> Result<WorkflowRun, GithubEndpointError> {
		self
			.get_json(&self.run_path(run_id, &format!("attempts/{attempt}")), &[])
			.await
	}

	/// Zip archive with the logs of one attempt.
	#[instrument(skip(self))]
	pub async fn download_workflow_run_attempt_logs(
		&self,
		run_id: u64,
		attempt: u32,
	) -> Result<Vec<u8>, GithubEndpointError> {
		self
			.get_bytes(
				&self.run_path(run_id, &format!("attempts/{attempt}/logs")),
				"application/zip",
				&[],
			)
			.await
	}

	/// Zip archive with the logs of the latest attempt.
	#[instrument(skip(self))]
	pub async fn download_workflow_run_logs(&self, run_id: u64) -> Result<Vec<u8>, GithubEndpointError> {
		self
			.get_bytes(&self.run_path(run_id, "logs"), "application/zip", &[])
			.await
	}

	#[instrument(skip(self))]
	pub async fn delete_workflow_run_logs(&self, run_id: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::DELETE, &self.run_path(run_id, "logs"))
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_workflow_run_usage(&self, run_id: u64) -> Result<ActionsUsage, GithubEndpointError> {
		self.get_json(&self.run_path(run_id, "timing"), &[]).await
	}

	/// Approvals and rejections recorded for a run's protected environments.
	#[instrument(skip(self))]
	pub async fn get_workflow_run_reviews(
		&self,
		run_id: u64,
	) -> Result<Vec<EnvironmentApproval>, GithubEndpointError> {
		self.get_json(&self.run_path(run_id, "approvals"), &[]).await
	}

	/// Approve or reject a run waiting on protected environments.
	#[instrument(skip(self, comment))]
	pub async fn review_pending_deployments(
		&self,
		run_id: u64,
		environment_ids: &[u64],
		state: DeploymentReviewState,
		comment: &str,
	) -> Result<Vec<Deployment>, GithubEndpointError> {
		if environment_ids.is_empty() {
			return Err(GithubEndpointError::invalid_argument(
				"environment_ids must not be empty",
			));
		}
		let body = json!({
			"environment_ids": environment_ids,
			"state": state,
			"comment": comment,
		});
		self
			.send_json(Method::POST, &self.run_path(run_id, "pending_deployments"), &body)
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_job(&self, job_id: u64) -> Result<Job, GithubEndpointError> {
		self
			.get_json(&self.repo_path(&format!("actions/jobs/{job_id}")), &[])
			.await
	}

	/// Plain-text log of one job.
	#[instrument(skip(self))]
	pub async fn download_job_logs(&self, job_id: u64) -> Result<String, GithubEndpointError> {
		self
			.get_text(
				&self.repo_path(&format!("actions/jobs/{job_id}/logs")),
				"text/plain",
				&[],
			)
			.await
	}

	#[instrument(skip(self))]
	pub async fn rerun_job(&self, job_id: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(
				Method::POST,
				&self.repo_path(&format!("actions/jobs/{job_id}/rerun")),
			)
			.await?;
		info!("Re-ran job");
		Ok(())
	}

	/// Jobs of a run: of one attempt when given, else of the latest attempt.
	#[instrument(skip(self))]
	pub async fn list_jobs(&self, run_id: u64, attempt: Option<u32>) -> Result<Vec<Job>, GithubEndpointError> {
		let path = match attempt {
			Some(attempt) => self.run_path(run_id, &format!("attempts/{attempt}/jobs")),
			None => self.run_path(run_id, "jobs"),
		};
		self.get_all_pages_in(&path, &[], "jobs").await
	}
}

#[cfg(test)]
mod tests {
	use wiremock::matchers::{body_json, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::test_support::{mock_client, repo_path};

	fn run_json(id: u64) -> Value {
		json!({
			"id": id,
			"name": "Build",
			"head_branch": "main",
			"head_sha": "acb5820ced9479c074f688cc328bf03f341a511d",
			"run_number": 562,
			"run_attempt": 2,
			"event": "push",
			"status": "completed",
			"conclusion": "success",
			"workflow_id": 159038
		})
	}

	fn job_json(id: u64) -> Value {
		json!({
			"id": id,
			"run_id": 29679449,
			"name": "build",
			"head_sha": "f83a356604ae3c5d03e1b46ef4d1ca77d64a90b0",
			"status": "completed",
			"conclusion": "success",
			"steps": [{"name": "Set up job", "number": 1, "status": "completed", "conclusion": "success"}]
		})
	}

	#[test]
	fn workflow_id_display() {
		assert_eq!(WorkflowId::from(161335).to_string(), "161335");
		assert_eq!(WorkflowId::from("ci.yml").to_string(), "ci.yml");
		assert_eq!(WorkflowId::from("my workflow.yml").to_string(), "my%20workflow.yml");
	}

	#[tokio::test]
	async fn workflow_by_file_name_targets_bound_repository() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("actions/workflows/ci.yml")))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"id": 161335,
				"name": "CI",
				"path": ".github/workflows/ci.yml",
				"state": "active"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let workflow = mock_client(&server)
			.get_workflow(&WorkflowId::from("ci.yml"))
			.await
			.unwrap();
		assert_eq!(workflow.id, 161335);
	}

	#[tokio::test]
	async fn dispatch_sends_ref_and_inputs() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(repo_path("actions/workflows/161335/dispatches")))
			.and(body_json(json!({"ref": "main", "inputs": {"environment": "staging"}})))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;

		let inputs = HashMap::from([("environment".to_string(), "staging".to_string())]);
		mock_client(&server)
			.dispatch_workflow(&WorkflowId::Id(161335), "main", Some(&inputs))
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn blank_workflow_file_name_is_rejected() {
		let server = MockServer::start().await;
		let err = mock_client(&server)
			.enable_workflow(&WorkflowId::from(""))
			.await
			.unwrap_err();
		assert!(matches!(err, GithubEndpointError::InvalidArgument(_)));
	}

	#[tokio::test]
	async fn runs_list_unwraps_and_filters() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("actions/runs")))
			.and(query_param("branch", "main"))
			.and(query_param("status", "failure"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"total_count": 2,
				"workflow_runs": [run_json(1), run_json(2)]
			})))
			.expect(1)
			.mount(&server)
			.await;

		let filter = WorkflowRunFilter {
			branch: Some("main".to_string()),
			status: Some("failure".to_string()),
			..WorkflowRunFilter::default()
		};
		let runs = mock_client(&server).list_workflow_runs(&filter).await.unwrap();
		assert_eq!(runs.len(), 2);
		assert_eq!(runs[0].run_attempt, 2);
	}

	#[tokio::test]
	async fn jobs_for_specific_attempt() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("actions/runs/30433642/attempts/1/jobs")))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"total_count": 1,
				"jobs": [job_json(399444496)]
			})))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path(repo_path("actions/runs/30433642/jobs")))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"total_count": 0,
				"jobs": []
			})))
			.expect(1)
			.mount(&server)
			.await;

		let client = mock_client(&server);
		let jobs = client.list_jobs(30433642, Some(1)).await.unwrap();
		assert_eq!(jobs[0].steps.len(), 1);
		assert_eq!(jobs[0].run_attempt, 1);
		assert!(client.list_jobs(30433642, None).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn job_logs_are_text() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("actions/jobs/399444496/logs")))
			.respond_with(ResponseTemplate::new(200).set_body_string("2024-01-01T00:00:00Z Run cargo test\n"))
			.mount(&server)
			.await;

		let logs = mock_client(&server).download_job_logs(399444496).await.unwrap();
		assert!(logs.contains("cargo test"));
	}

	#[tokio::test]
	async fn run_control_endpoints() {
		let server = MockServer::start().await;
		for action in ["cancel", "rerun", "rerun-failed-jobs", "approve"] {
			Mock::given(method("POST"))
				.and(path(repo_path(&format!("actions/runs/42/{action}"))))
				.respond_with(ResponseTemplate::new(201))
				.expect(1)
				.mount(&server)
				.await;
		}

		let client = mock_client(&server);
		client.cancel_workflow_run(42).await.unwrap();
		client.rerun_workflow_run(42).await.unwrap();
		client.rerun_failed_jobs(42).await.unwrap();
		client.approve_workflow_run(42).await.unwrap();
	}

	#[tokio::test]
	async fn usage_decodes_billable_map() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("actions/runs/42/timing")))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"billable": {"UBUNTU": {"total_ms": 180000, "jobs": 1}},
				"run_duration_ms": 500000
			})))
			.mount(&server)
			.await;

		let usage = mock_client(&server).get_workflow_run_usage(42).await.unwrap();
		assert_eq!(usage.billable["UBUNTU"].total_ms, 180000);
		assert_eq!(usage.run_duration_ms, Some(500000));
	}

	#[tokio::test]
	async fn pending_deployments_need_environments() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(repo_path("actions/runs/42/pending_deployments")))
			.and(body_json(json!({"environment_ids": [161171787], "state": "approved", "comment": "Ship it"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
			.expect(1)
			.mount(&server)
			.await;

		let client = mock_client(&server);
		let err = client
			.review_pending_deployments(42, &[], DeploymentReviewState::Approved, "")
			.await
			.unwrap_err();
		assert!(matches!(err, GithubEndpointError::InvalidArgument(_)));

		let deployments = client
			.review_pending_deployments(42, &[161171787], DeploymentReviewState::Approved, "Ship it")
			.await
			.unwrap();
		assert!(deployments.is_empty());
	}
}
