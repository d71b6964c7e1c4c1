// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pull requests, reviews and review requests.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::GithubEndpointClient;
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::issues::LockReason;
use crate::types::{Label, SimpleUser, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
	#[default]
	Open,
	Closed,
	All,
}

impl PullRequestState {
	fn as_str(self) -> &'static str {
		match self {
			Self::Open => "open",
			Self::Closed => "closed",
			Self::All => "all",
		}
	}
}

/// Head or base of a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRef {
	#[serde(rename = "ref")]
	pub ref_name: String,
	pub sha: String,
	#[serde(default)]
	pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
	pub id: u64,
	/// GraphQL global id.
	pub node_id: String,
	pub number: u64,
	pub state: String,
	pub title: String,
	pub body: Option<String>,
	#[serde(default)]
	pub html_url: String,
	pub user: Option<SimpleUser>,
	pub head: PullRequestRef,
	pub base: PullRequestRef,
	#[serde(default)]
	pub draft: bool,
	#[serde(default)]
	pub merged: bool,
	pub mergeable: Option<bool>,
	pub merge_commit_sha: Option<String>,
	#[serde(default)]
	pub labels: Vec<Label>,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	pub closed_at: Option<DateTime<Utc>>,
	pub merged_at: Option<DateTime<Utc>>,
	/// Auto-merge request, present once enabled.
	pub auto_merge: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
	pub title: String,
	/// Branch with the changes (`branch` or `user:branch`).
	pub head: String,
	/// Branch to merge into.
	pub base: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub draft: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub maintainer_can_modify: Option<bool>,
}

impl NewPullRequest {
	pub fn new(title: impl Into<String>, head: impl Into<String>, base: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			head: head.into(),
			base: base.into(),
			body: None,
			draft: None,
			maintainer_can_modify: None,
		}
	}

	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self
	}

	pub fn draft(mut self) -> Self {
		self.draft = Some(true);
		self
	}
}

/// Fields to change on an existing pull request; `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PullRequestUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state: Option<PullRequestState>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
	pub sha: Option<String>,
	pub merged: bool,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
	Approve,
	RequestChanges,
	Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
	pub id: u64,
	pub node_id: String,
	pub user: Option<SimpleUser>,
	pub body: Option<String>,
	/// `APPROVED`, `CHANGES_REQUESTED`, `COMMENTED`, `DISMISSED` or `PENDING`.
	pub state: String,
	pub commit_id: Option<String>,
	#[serde(default)]
	pub html_url: String,
	pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewComment {
	pub id: u64,
	pub body: String,
	pub path: String,
	pub position: Option<u64>,
	pub line: Option<u64>,
	pub commit_id: String,
	pub user: Option<SimpleUser>,
	#[serde(default)]
	pub html_url: String,
	pub created_at: Option<DateTime<Utc>>,
}

/// Inline comment attached to a new review.
#[derive(Debug, Clone, Serialize)]
pub struct DraftReviewComment {
	pub path: String,
	pub body: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub line: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub side: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewReview {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub commit_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	/// `None` leaves the review pending.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub event: Option<ReviewEvent>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub comments: Vec<DraftReviewComment>,
}

/// Users and teams whose review is requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewerRequest {
	#[serde(default)]
	pub reviewers: Vec<String>,
	#[serde(default)]
	pub team_reviewers: Vec<String>,
}

impl ReviewerRequest {
	pub fn users<I, S>(users: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			reviewers: users.into_iter().map(Into::into).collect(),
			team_reviewers: Vec::new(),
		}
	}

	pub fn with_teams<I, S>(mut self, teams: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.team_reviewers = teams.into_iter().map(Into::into).collect();
		self
	}

	fn ensure_not_empty(&self) -> Result<(), GithubEndpointError> {
		let any = self
			.reviewers
			.iter()
			.chain(self.team_reviewers.iter())
			.any(|r| !r.trim().is_empty());
		if !any {
			return Err(GithubEndpointError::invalid_argument(
				"at least one reviewer or team reviewer is required",
			));
		}
		Ok(())
	}
}

/// Pending review requests on a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedReviewers {
	pub users: Vec<SimpleUser>,
	pub teams: Vec<Team>,
}

impl GithubEndpointClient {
	#[instrument(skip(self))]
	pub async fn get_pull_request(&self, number: u64) -> Result<PullRequest, GithubEndpointError> {
		self
			.get_json(&self.repo_path(&format!("pulls/{number}")), &[])
			.await
	}

	/// Every pull request in `state`, across all pages.
	#[instrument(skip(self))]
	pub async fn list_pull_requests(
		&self,
		state: PullRequestState,
	) -> Result<Vec<PullRequest>, GithubEndpointError> {
		self
			.get_all_pages(&self.repo_path("pulls"), &[("state", state.as_str().to_string())])
			.await
	}

	#[instrument(skip(self, pull), fields(head = %pull.head, base = %pull.base))]
	pub async fn create_pull_request(
		&self,
		pull: &NewPullRequest,
	) -> Result<PullRequest, GithubEndpointError> {
		ensure_not_blank(&pull.title, "title")?;
		ensure_not_blank(&pull.head, "head")?;
		ensure_not_blank(&pull.base, "base")?;

		let created: PullRequest = self
			.send_json(Method::POST, &self.repo_path("pulls"), pull)
			.await?;
		info!(number = created.number, "Created pull request");
		Ok(created)
	}

	/// Convert an existing issue into a pull request.
	#[instrument(skip(self))]
	pub async fn create_pull_request_from_issue(
		&self,
		issue: u64,
		head: &str,
		base: &str,
	) -> Result<PullRequest, GithubEndpointError> {
		ensure_not_blank(head, "head")?;
		ensure_not_blank(base, "base")?;

		let body = json!({ "issue": issue, "head": head, "base": base });
		self
			.send_json(Method::POST, &self.repo_path("pulls"), &body)
			.await
	}

	#[instrument(skip(self, update))]
	pub async fn update_pull_request(
		&self,
		number: u64,
		update: &PullRequestUpdate,
	) -> Result<PullRequest, GithubEndpointError> {
		self
			.send_json(Method::PATCH, &self.repo_path(&format!("pulls/{number}")), update)
			.await
	}

	/// Squash-merge a pull request.
	#[instrument(skip(self, commit_title, commit_message))]
	pub async fn merge_pull_request(
		&self,
		number: u64,
		commit_title: Option<&str>,
		commit_message: Option<&str>,
	) -> Result<MergeResult, GithubEndpointError> {
		let mut body = json!({ "merge_method": "squash" });
		if let Some(title) = commit_title {
			body["commit_title"] = json!(title);
		}
		if let Some(message) = commit_message {
			body["commit_message"] = json!(message);
		}

		let result: MergeResult = self
			.send_json(Method::PUT, &self.repo_path(&format!("pulls/{number}/merge")), &body)
			.await?;
		info!(merged = result.merged, "Merged pull request");
		Ok(result)
	}

	/// Whether the pull request has been merged.
	#[instrument(skip(self))]
	pub async fn is_pull_request_merged(&self, number: u64) -> Result<bool, GithubEndpointError> {
		self
			.probe(&self.repo_path(&format!("pulls/{number}/merge")))
			.await
	}

	pub async fn lock_pull_request(
		&self,
		number: u64,
		reason: Option<LockReason>,
	) -> Result<(), GithubEndpointError> {
		self.lock_issue(number, reason).await
	}

	pub async fn unlock_pull_request(&self, number: u64) -> Result<(), GithubEndpointError> {
		self.unlock_issue(number).await
	}

	#[instrument(skip(self))]
	pub async fn get_review(&self, number: u64, review_id: u64) -> Result<Review, GithubEndpointError> {
		self
			.get_json(&self.repo_path(&format!("pulls/{number}/reviews/{review_id}")), &[])
			.await
	}

	#[instrument(skip(self))]
	pub async fn list_reviews(&self, number: u64) -> Result<Vec<Review>, GithubEndpointError> {
		self
			.get_all_pages(&self.repo_path(&format!("pulls/{number}/reviews")), &[])
			.await
	}

	/// Inline comments belonging to one review.
	#[instrument(skip(self))]
	pub async fn list_review_comments(
		&self,
		number: u64,
		review_id: u64,
	) -> Result<Vec<ReviewComment>, GithubEndpointError> {
		self
			.get_all_pages(
				&self.repo_path(&format!("pulls/{number}/reviews/{review_id}/comments")),
				&[],
			)
			.await
	}

	#[instrument(skip(self, review))]
	pub async fn create_review(
		&self,
		number: u64,
		review: &NewReview,
	) -> Result<Review, GithubEndpointError> {
		self
			.send_json(Method::POST, &self.repo_path(&format!("pulls/{number}/reviews")), review)
			.await
	}

	/// Delete a review that has not been submitted yet.
	#[instrument(skip(self))]
	pub async fn delete_pending_review(
		&self,
		number: u64,
		review_id: u64,
	) -> Result<Review, GithubEndpointError> {
		let response = self
			.send(self.request(
				Method::DELETE,
				&self.repo_path(&format!("pulls/{number}/reviews/{review_id}")),
			)?)
			.await?;
		crate::client::read_json(response).await
	}

	#[instrument(skip(self, body))]
	pub async fn submit_review(
		&self,
		number: u64,
		review_id: u64,
		event: ReviewEvent,
		body: Option<&str>,
	) -> Result<Review, GithubEndpointError> {
		let mut payload = json!({ "event": event });
		if let Some(body) = body {
			payload["body"] = json!(body);
		}
		self
			.send_json(
				Method::POST,
				&self.repo_path(&format!("pulls/{number}/reviews/{review_id}/events")),
				&payload,
			)
			.await
	}

	#[instrument(skip(self, message))]
	pub async fn dismiss_review(
		&self,
		number: u64,
		review_id: u64,
		message: &str,
	) -> Result<Review, GithubEndpointError> {
		ensure_not_blank(message, "message")?;
		self
			.send_json(
				Method::PUT,
				&self.repo_path(&format!("pulls/{number}/reviews/{review_id}/dismissals")),
				&json!({ "message": message }),
			)
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_review_requests(
		&self,
		number: u64,
	) -> Result<RequestedReviewers, GithubEndpointError> {
		self
			.get_json(&self.repo_path(&format!("pulls/{number}/requested_reviewers")), &[])
			.await
	}

	/// Request reviews; at least one user or team is required.
	#[instrument(skip(self, request))]
	pub async fn request_reviewers(
		&self,
		number: u64,
		request: &ReviewerRequest,
	) -> Result<PullRequest, GithubEndpointError> {
		request.ensure_not_empty()?;
		self
			.send_json(
				Method::POST,
				&self.repo_path(&format!("pulls/{number}/requested_reviewers")),
				request,
			)
			.await
	}

	/// Withdraw review requests; at least one user or team is required.
	#[instrument(skip(self, request))]
	pub async fn remove_review_requests(
		&self,
		number: u64,
		request: &ReviewerRequest,
	) -> Result<PullRequest, GithubEndpointError> {
		request.ensure_not_empty()?;
		self
			.send_json(
				Method::DELETE,
				&self.repo_path(&format!("pulls/{number}/requested_reviewers")),
				request,
			)
			.await
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use wiremock::matchers::{body_json, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::test_support::{mock_client, repo_path};

	pub(crate) fn pull_request_json(number: u64, node_id: &str) -> serde_json::Value {
		json!({
			"id": 1_296_269,
			"node_id": node_id,
			"number": number,
			"state": "open",
			"title": "Amazing new feature",
			"body": "Please pull these awesome changes in!",
			"html_url": format!("https://github.com/octo-org/hello-world/pull/{number}"),
			"user": {"login": "octocat", "id": 1, "type": "User"},
			"head": {"ref": "new-topic", "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e", "label": "octocat:new-topic"},
			"base": {"ref": "main", "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e", "label": "octocat:main"},
			"draft": false,
			"merged": false,
			"mergeable": true,
			"labels": [],
			"created_at": "2011-01-26T19:01:12Z",
			"auto_merge": null
		})
	}

	#[tokio::test]
	async fn get_pull_request_decodes_model() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("pulls/1347")))
			.respond_with(ResponseTemplate::new(200).set_body_json(pull_request_json(1347, "PR_kwDOA")))
			.expect(1)
			.mount(&server)
			.await;

		let pr = mock_client(&server).get_pull_request(1347).await.unwrap();
		assert_eq!(pr.number, 1347);
		assert_eq!(pr.node_id, "PR_kwDOA");
		assert_eq!(pr.head.ref_name, "new-topic");
		assert_eq!(pr.user.unwrap().login, "octocat");
	}

	#[tokio::test]
	async fn list_passes_state_filter() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("pulls")))
			.and(query_param("state", "closed"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([pull_request_json(1, "PR_a")])))
			.expect(1)
			.mount(&server)
			.await;

		let prs = mock_client(&server)
			.list_pull_requests(PullRequestState::Closed)
			.await
			.unwrap();
		assert_eq!(prs.len(), 1);
	}

	#[tokio::test]
	async fn create_from_issue_sends_issue_number() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(repo_path("pulls")))
			.and(body_json(json!({"issue": 42, "head": "fix-42", "base": "main"})))
			.respond_with(ResponseTemplate::new(201).set_body_json(pull_request_json(42, "PR_b")))
			.expect(1)
			.mount(&server)
			.await;

		let pr = mock_client(&server)
			.create_pull_request_from_issue(42, "fix-42", "main")
			.await
			.unwrap();
		assert_eq!(pr.number, 42);
	}

	#[tokio::test]
	async fn create_omits_unset_fields() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(repo_path("pulls")))
			.and(body_json(json!({
				"title": "Bump deps",
				"head": "deps",
				"base": "main",
				"draft": true
			})))
			.respond_with(ResponseTemplate::new(201).set_body_json(pull_request_json(7, "PR_c")))
			.expect(1)
			.mount(&server)
			.await;

		let request = NewPullRequest::new("Bump deps", "deps", "main").draft();
		let pr = mock_client(&server).create_pull_request(&request).await.unwrap();
		assert_eq!(pr.number, 7);
	}

	#[tokio::test]
	async fn merge_is_squash() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.and(path(repo_path("pulls/9/merge")))
			.and(body_json(json!({"merge_method": "squash", "commit_title": "Release 1.2"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
				"merged": true,
				"message": "Pull Request successfully merged"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let result = mock_client(&server)
			.merge_pull_request(9, Some("Release 1.2"), None)
			.await
			.unwrap();
		assert!(result.merged);
	}

	#[tokio::test]
	async fn merge_status_maps_204_and_404() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("pulls/1/merge")))
			.respond_with(ResponseTemplate::new(204))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path(repo_path("pulls/2/merge")))
			.respond_with(ResponseTemplate::new(404))
			.mount(&server)
			.await;

		let client = mock_client(&server);
		assert!(client.is_pull_request_merged(1).await.unwrap());
		assert!(!client.is_pull_request_merged(2).await.unwrap());
	}

	#[tokio::test]
	async fn review_requests_need_a_reviewer() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(201))
			.expect(0)
			.mount(&server)
			.await;
		Mock::given(method("DELETE"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		let client = mock_client(&server);
		let err = client
			.request_reviewers(5, &ReviewerRequest::default())
			.await
			.unwrap_err();
		assert!(matches!(err, GithubEndpointError::InvalidArgument(_)));

		let blank = ReviewerRequest::users([" "]);
		let err = client.remove_review_requests(5, &blank).await.unwrap_err();
		assert!(matches!(err, GithubEndpointError::InvalidArgument(_)));
	}

	#[tokio::test]
	async fn request_reviewers_sends_users_and_teams() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(repo_path("pulls/5/requested_reviewers")))
			.and(body_json(json!({"reviewers": ["hubot"], "team_reviewers": ["justice-league"]})))
			.respond_with(ResponseTemplate::new(201).set_body_json(pull_request_json(5, "PR_d")))
			.expect(1)
			.mount(&server)
			.await;

		let request = ReviewerRequest::users(["hubot"]).with_teams(["justice-league"]);
		mock_client(&server).request_reviewers(5, &request).await.unwrap();
	}

	#[tokio::test]
	async fn submit_review_sends_event() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(repo_path("pulls/5/reviews/80/events")))
			.and(body_json(json!({"event": "REQUEST_CHANGES", "body": "Needs tests"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"id": 80,
				"node_id": "PRR_kwDOA",
				"body": "Needs tests",
				"state": "CHANGES_REQUESTED",
				"commit_id": "ecdd80bb57125d7ba9641ffaa4d7d2c19d3f3091"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let review = mock_client(&server)
			.submit_review(5, 80, ReviewEvent::RequestChanges, Some("Needs tests"))
			.await
			.unwrap();
		assert_eq!(review.state, "CHANGES_REQUESTED");
	}
}
