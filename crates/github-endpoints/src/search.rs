// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Search API: repositories, users, issues, code and labels.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::GithubEndpointClient;
use crate::error::{ensure_not_blank, GithubEndpointError};
use crate::repos::Repository;
use crate::types::{Label, SearchResults, SimpleUser};

fn default_page() -> u32 {
	1
}

/// One page of a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
	/// Query in GitHub search syntax.
	pub q: String,
	/// Endpoint-specific sort field (`stars`, `updated`, `indexed`, ...).
	pub sort: Option<String>,
	/// `asc` or `desc`.
	pub order: Option<String>,
	/// Results per page; the client's default page size when `None`.
	pub per_page: Option<u32>,
	#[serde(default = "default_page")]
	pub page: u32,
}

impl SearchQuery {
	pub fn new(q: impl Into<String>) -> Self {
		Self {
			q: q.into(),
			sort: None,
			order: None,
			per_page: None,
			page: default_page(),
		}
	}

	pub fn sorted_by(mut self, sort: impl Into<String>, order: impl Into<String>) -> Self {
		self.sort = Some(sort.into());
		self.order = Some(order.into());
		self
	}

	/// Set the number of results per page.
	pub fn with_per_page(mut self, per_page: u32) -> Self {
		self.per_page = Some(per_page.clamp(1, 100));
		self
	}

	/// Set the page number.
	pub fn with_page(mut self, page: u32) -> Self {
		self.page = page.max(1);
		self
	}

	fn to_query(&self, default_per_page: u32) -> Vec<(&'static str, String)> {
		let mut query = vec![
			("q", self.q.clone()),
			("per_page", self.per_page.unwrap_or(default_per_page).to_string()),
			("page", self.page.to_string()),
		];
		if let Some(sort) = &self.sort {
			query.push(("sort", sort.clone()));
		}
		if let Some(order) = &self.order {
			query.push(("order", order.clone()));
		}
		query
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSearchItem {
	pub id: u64,
	pub number: u64,
	pub title: String,
	pub state: String,
	pub body: Option<String>,
	#[serde(default)]
	pub html_url: String,
	pub user: Option<SimpleUser>,
	#[serde(default)]
	pub labels: Vec<Label>,
	/// Present when the item is a pull request.
	pub pull_request: Option<Value>,
	#[serde(default)]
	pub score: f64,
}

impl IssueSearchItem {
	pub fn is_pull_request(&self) -> bool {
		self.pull_request.is_some()
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSearchRepository {
	pub id: u64,
	pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSearchItem {
	pub name: String,
	pub path: String,
	pub sha: String,
	#[serde(default)]
	pub html_url: String,
	pub repository: CodeSearchRepository,
	#[serde(default)]
	pub score: f64,
}

impl GithubEndpointClient {
	async fn search<T: serde::de::DeserializeOwned>(
		&self,
		kind: &str,
		query: &SearchQuery,
		extra: &[(&'static str, String)],
	) -> Result<SearchResults<T>, GithubEndpointError> {
		ensure_not_blank(&query.q, "query")?;

		let mut params = query.to_query(self.per_page());
		params.extend_from_slice(extra);

		let results: SearchResults<T> = self.get_json(&format!("search/{kind}"), &params).await?;
		debug!(
			kind,
			total_count = results.total_count,
			items = results.items.len(),
			incomplete = results.incomplete_results,
			"Search completed"
		);
		Ok(results)
	}

	#[instrument(skip(self), fields(q = %query.q))]
	pub async fn search_repositories(
		&self,
		query: &SearchQuery,
	) -> Result<SearchResults<Repository>, GithubEndpointError> {
		self.search("repositories", query, &[]).await
	}

	#[instrument(skip(self), fields(q = %query.q))]
	pub async fn search_users(
		&self,
		query: &SearchQuery,
	) -> Result<SearchResults<SimpleUser>, GithubEndpointError> {
		self.search("users", query, &[]).await
	}

	/// Issues and pull requests.
	#[instrument(skip(self), fields(q = %query.q))]
	pub async fn search_issues(
		&self,
		query: &SearchQuery,
	) -> Result<SearchResults<IssueSearchItem>, GithubEndpointError> {
		self.search("issues", query, &[]).await
	}

	#[instrument(skip(self), fields(q = %query.q))]
	pub async fn search_code(
		&self,
		query: &SearchQuery,
	) -> Result<SearchResults<CodeSearchItem>, GithubEndpointError> {
		self.search("code", query, &[]).await
	}

	/// Code search limited to the bound repository.
	pub async fn search_code_in_repository(
		&self,
		query: &SearchQuery,
	) -> Result<SearchResults<CodeSearchItem>, GithubEndpointError> {
		ensure_not_blank(&query.q, "query")?;
		let scoped = SearchQuery {
			q: format!("{} repo:{}", query.q, self.context().full_name()),
			..query.clone()
		};
		self.search_code(&scoped).await
	}

	/// Labels of repository `repository_id` matching the query.
	#[instrument(skip(self), fields(q = %query.q))]
	pub async fn search_labels(
		&self,
		repository_id: u64,
		query: &SearchQuery,
	) -> Result<SearchResults<Label>, GithubEndpointError> {
		self
			.search("labels", query, &[("repository_id", repository_id.to_string())])
			.await
	}
}
