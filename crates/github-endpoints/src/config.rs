// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration for the GitHub endpoint client.

use std::env;
use std::time::Duration;

use reqwest::Url;
use tracing::warn;

use crate::error::GithubEndpointError;

const DEFAULT_BASE_URL: &str = "https://api.github.com/";
const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const DEFAULT_PER_PAGE: u32 = 30;
const MAX_PER_PAGE: u32 = 100;
const DEFAULT_CONTENT_BRANCH: &str = "main";
const DEFAULT_CONTENT_MESSAGE: &str = "File uploaded: {}";

/// Defaults applied by the repository-contents operations when the caller
/// leaves the commit message or branch blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDefaults {
	/// Branch written to when none is given.
	pub branch: String,
	/// Commit message template; `{}` is replaced with the file name.
	pub message_template: String,
}

impl Default for ContentDefaults {
	fn default() -> Self {
		Self {
			branch: DEFAULT_CONTENT_BRANCH.to_string(),
			message_template: DEFAULT_CONTENT_MESSAGE.to_string(),
		}
	}
}

impl ContentDefaults {
	/// Commit message for `path`, using the last path segment as file name.
	pub fn commit_message(&self, path: &str) -> String {
		let file_name = path
			.trim_end_matches('/')
			.rsplit('/')
			.next()
			.unwrap_or(path);
		self.message_template.replace("{}", file_name)
	}

	/// `message` unless blank, else the templated default.
	pub fn message_or_default(&self, message: Option<&str>, path: &str) -> String {
		match message {
			Some(m) if !m.trim().is_empty() => m.to_string(),
			_ => self.commit_message(path),
		}
	}

	/// `branch` unless blank, else the default branch.
	pub fn branch_or_default(&self, branch: Option<&str>) -> String {
		match branch {
			Some(b) if !b.trim().is_empty() => b.to_string(),
			_ => self.branch.clone(),
		}
	}
}

/// Immutable client configuration.
///
/// Built once and shared by every client instance; builder methods consume
/// and return `Self`.
#[derive(Debug, Clone)]
pub struct GithubEndpointsConfig {
	/// REST API root (validated HTTPS, always ends with `/`)
	base_url: Url,

	/// GraphQL endpoint
	graphql_url: Url,

	/// Product identity sent as `User-Agent`
	user_agent: String,

	/// Value of the `X-GitHub-Api-Version` header
	api_version: String,

	/// Per-request timeout
	request_timeout: Duration,

	/// Timeout for release asset uploads, which replaces `request_timeout`
	upload_timeout: Duration,

	/// Page size used by list operations
	default_per_page: u32,

	/// Defaults for repository-contents writes
	content_defaults: ContentDefaults,
}

impl Default for GithubEndpointsConfig {
	fn default() -> Self {
		Self::new()
	}
}

impl GithubEndpointsConfig {
	/// Validate a URL the access token will be sent to.
	///
	/// Requirements:
	/// - Must be a valid URL
	/// - Must use HTTPS
	/// - Must have a host that is not loopback
	fn validate_token_url(raw: &str, kind: &str) -> Result<Url, GithubEndpointError> {
		let url = Url::parse(raw)
			.map_err(|e| GithubEndpointError::Config(format!("Invalid GitHub {kind} URL '{raw}': {e}")))?;

		if url.scheme() != "https" {
			return Err(GithubEndpointError::Config(format!(
				"GitHub {kind} URL must use https, got '{}'",
				url.scheme()
			)));
		}

		let host = url.host_str().ok_or_else(|| {
			GithubEndpointError::Config(format!("GitHub {kind} URL must include a host"))
		})?;

		if host == "localhost" || host == "127.0.0.1" || host == "[::1]" {
			return Err(GithubEndpointError::Config(format!(
				"GitHub {kind} URL must not be localhost"
			)));
		}

		Ok(url)
	}

	/// Validate and normalize a REST base URL.
	///
	/// The path is given a trailing slash so relative joins keep prefixes such
	/// as `/api/v3`.
	fn validate_and_normalize_base_url(raw: &str) -> Result<Url, GithubEndpointError> {
		let mut url = Self::validate_token_url(raw, "base")?;

		if !url.path().ends_with('/') {
			let path = format!("{}/", url.path());
			url.set_path(&path);
		}

		Ok(url)
	}

	/// GraphQL endpoint matching a REST base URL.
	///
	/// GitHub Enterprise serves REST at `/api/v3` and GraphQL at `/api/graphql`.
	fn graphql_url_for(base_url: &Url) -> Result<Url, GithubEndpointError> {
		let relative = if base_url.path().ends_with("/api/v3/") {
			"../graphql"
		} else {
			"graphql"
		};
		base_url
			.join(relative)
			.map_err(|e| GithubEndpointError::Config(format!("Invalid GraphQL URL: {e}")))
	}

	/// Configuration for github.com with all defaults.
	pub fn new() -> Self {
		Self {
			base_url: Url::parse(DEFAULT_BASE_URL).expect("default URL is valid"),
			graphql_url: Url::parse(DEFAULT_GRAPHQL_URL).expect("default URL is valid"),
			user_agent: github_endpoints_http::user_agent(),
			api_version: github_endpoints_http::DEFAULT_API_VERSION.to_string(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
			default_per_page: DEFAULT_PER_PAGE,
			content_defaults: ContentDefaults::default(),
		}
	}

	/// Create configuration from environment variables.
	///
	/// All variables are optional:
	/// - `GITHUB_ENDPOINTS_BASE_URL` (falls back to `GITHUB_API_URL`, which
	///   GitHub Actions sets): REST root, must be HTTPS
	/// - `GITHUB_ENDPOINTS_GRAPHQL_URL`: GraphQL endpoint, must be HTTPS.
	///   When unset it is derived from `GITHUB_ENDPOINTS_BASE_URL`; only
	///   without that variable does `GITHUB_GRAPHQL_URL` apply
	/// - `GITHUB_ENDPOINTS_PER_PAGE`: list page size, 1..=100
	/// - `GITHUB_ENDPOINTS_DEFAULT_BRANCH`: branch for contents writes
	pub fn from_env() -> Result<Self, GithubEndpointError> {
		let mut config = Self::new();

		let explicit_base = env_var_any(&["GITHUB_ENDPOINTS_BASE_URL"]);
		if let Some(raw) = explicit_base.clone().or_else(|| env_var_any(&["GITHUB_API_URL"])) {
			config.base_url = Self::validate_and_normalize_base_url(&raw)?;
			config.graphql_url = Self::graphql_url_for(&config.base_url)?;
		}

		// GITHUB_GRAPHQL_URL only pairs with GITHUB_API_URL or the default base.
		let graphql_vars: &[&str] = if explicit_base.is_some() {
			&["GITHUB_ENDPOINTS_GRAPHQL_URL"]
		} else {
			&["GITHUB_ENDPOINTS_GRAPHQL_URL", "GITHUB_GRAPHQL_URL"]
		};
		if let Some(raw) = env_var_any(graphql_vars) {
			config.graphql_url = Self::validate_token_url(&raw, "GraphQL")?;
		}

		if let Ok(raw) = env::var("GITHUB_ENDPOINTS_PER_PAGE") {
			let per_page: u32 = raw.parse().map_err(|_| {
				GithubEndpointError::Config(format!("Invalid GITHUB_ENDPOINTS_PER_PAGE: {raw}"))
			})?;
			config.default_per_page = per_page.clamp(1, MAX_PER_PAGE);
		}

		if let Ok(branch) = env::var("GITHUB_ENDPOINTS_DEFAULT_BRANCH") {
			if !branch.trim().is_empty() {
				config.content_defaults.branch = branch;
			}
		}

		Ok(config)
	}

	/// Set a custom REST base URL (GitHub Enterprise).
	///
	/// The GraphQL URL is re-derived from it. If validation fails, logs a
	/// warning and keeps the previous value.
	pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
		let url_str = url.into();
		let validated = Self::validate_and_normalize_base_url(&url_str)
			.and_then(|base| Self::graphql_url_for(&base).map(|graphql| (base, graphql)));
		match validated {
			Ok((base, graphql)) => {
				self.base_url = base;
				self.graphql_url = graphql;
			}
			Err(e) => {
				warn!(error = %e, url = %url_str, "Invalid base_url in with_base_url, keeping previous value");
			}
		}
		self
	}

	/// Set the GraphQL endpoint explicitly.
	///
	/// Held to the same HTTPS and host rules as the base URL. If validation
	/// fails, logs a warning and keeps the previous value.
	pub fn with_graphql_url(mut self, url: impl Into<String>) -> Self {
		let url_str = url.into();
		match Self::validate_token_url(&url_str, "GraphQL") {
			Ok(parsed) => self.graphql_url = parsed,
			Err(e) => {
				warn!(error = %e, url = %url_str, "Invalid graphql_url, keeping previous value");
			}
		}
		self
	}

	/// Replace the product identity sent as `User-Agent`.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();
		self
	}

	pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
		self.api_version = api_version.into();
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Timeout for release asset uploads, covering the whole body transfer.
	pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
		self.upload_timeout = timeout;
		self
	}

	/// Set the list page size (clamped to 1..=100).
	pub fn with_default_per_page(mut self, per_page: u32) -> Self {
		self.default_per_page = per_page.clamp(1, MAX_PER_PAGE);
		self
	}

	pub fn with_content_defaults(mut self, defaults: ContentDefaults) -> Self {
		self.content_defaults = defaults;
		self
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub fn graphql_url(&self) -> &Url {
		&self.graphql_url
	}

	pub fn user_agent(&self) -> &str {
		&self.user_agent
	}

	pub fn api_version(&self) -> &str {
		&self.api_version
	}

	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}

	pub fn upload_timeout(&self) -> Duration {
		self.upload_timeout
	}

	pub fn default_per_page(&self) -> u32 {
		self.default_per_page
	}

	pub fn content_defaults(&self) -> &ContentDefaults {
		&self.content_defaults
	}

	/// Resolve a path relative to the REST base URL.
	pub(crate) fn endpoint(&self, path: &str) -> Result<Url, GithubEndpointError> {
		self
			.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|e| GithubEndpointError::Config(format!("Invalid URL for '{path}': {e}")))
	}

	/// Build the HTTP client every operation uses.
	pub(crate) fn http_client(&self) -> Result<reqwest::Client, GithubEndpointError> {
		github_endpoints_http::new_client(
			self.user_agent.clone(),
			&self.api_version,
			self.request_timeout,
		)
		.map_err(|e| GithubEndpointError::Config(format!("Failed to create HTTP client: {e}")))
	}

	/// Point both endpoints at a local mock server, bypassing validation.
	#[cfg(test)]
	pub(crate) fn for_mock_server(uri: &str) -> Self {
		let base_url = Url::parse(&format!("{}/", uri.trim_end_matches('/'))).expect("mock server URI");
		let graphql_url = base_url.join("graphql").expect("mock graphql URL");
		Self {
			base_url,
			graphql_url,
			..Self::new()
		}
	}
}

fn env_var_any(names: &[&str]) -> Option<String> {
	names
		.iter()
		.filter_map(|name| env::var(name).ok())
		.find(|value| !value.trim().is_empty())
}
