// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pull request auto-merge over GraphQL.
//!
//! The REST API cannot enable auto-merge, so this is the one operation that
//! speaks GraphQL. The mutation text is fixed; only the node id and merge
//! method vary.

use std::fmt;

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::client::GithubEndpointClient;
use crate::error::GithubEndpointError;
use crate::pulls::PullRequest;

/// How a pull request is merged once auto-merge fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MergeMethod {
	Merge,
	#[default]
	Squash,
	Rebase,
}

impl MergeMethod {
	/// GraphQL `PullRequestMergeMethod` enum value.
	pub fn as_graphql(self) -> &'static str {
		match self {
			Self::Merge => "MERGE",
			Self::Squash => "SQUASH",
			Self::Rebase => "REBASE",
		}
	}
}

impl fmt::Display for MergeMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_graphql())
	}
}

/// GraphQL request body.
#[derive(Debug, Serialize)]
pub(crate) struct GraphqlRequest {
	pub(crate) query: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
	#[serde(default)]
	errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
	message: String,
}

/// Mutation that enables auto-merge on the pull request with `node_id`.
pub fn auto_merge_mutation(node_id: &str, method: MergeMethod) -> String {
	format!(
		"mutation PullRequestAutoMerge {{ enablePullRequestAutoMerge(input: {{pullRequestId: \"{node_id}\", mergeMethod: {method}}}) {{ clientMutationId }} }}"
	)
}

impl GithubEndpointClient {
	/// Enable auto-merge on a pull request.
	///
	/// Fetches the pull request to learn its node id, then sends the mutation
	/// with the client's own token. The mutation's answer is not read back:
	/// the returned pull request is the one fetched before the mutation.
	/// A pull request that does not exist is
	/// [`GithubEndpointError::NotFound`] and no mutation is sent.
	#[instrument(skip(self))]
	pub async fn enable_auto_merge(
		&self,
		number: u64,
		method: MergeMethod,
	) -> Result<PullRequest, GithubEndpointError> {
		let pull = match self.get_pull_request(number).await {
			Ok(pull) => pull,
			Err(e) if e.status() == Some(404) => {
				return Err(GithubEndpointError::not_found(format!(
					"Pull request {number} not found"
				)));
			}
			Err(e) => return Err(e),
		};

		let body = GraphqlRequest {
			query: auto_merge_mutation(&pull.node_id, method),
		};

		let request = self
			.request_url(Method::POST, self.config().graphql_url().clone())
			.header(CONTENT_TYPE, "application/json")
			.json(&body);
		let response = self.send(request).await?;

		// Only errors are of interest in the mutation's answer.
		if let Ok(parsed) = response.json::<GraphqlResponse>().await {
			for error in &parsed.errors {
				warn!(message = %error.message, "GraphQL reported an error enabling auto-merge");
			}
		}

		info!(method = %method, "Enabled auto-merge");
		Ok(pull)
	}

	/// Auto-merge with the default squash method.
	pub async fn enable_squash_auto_merge(&self, number: u64) -> Result<PullRequest, GithubEndpointError> {
		self.enable_auto_merge(number, MergeMethod::default()).await
	}
}
