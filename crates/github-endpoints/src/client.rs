// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The endpoint client and the request plumbing every operation shares.
//!
//! Operations themselves live in the per-area modules (`pulls`, `repos`,
//! `releases`, ...) as further `impl GithubEndpointClient` blocks. Each one
//! makes a single authenticated call and returns GitHub's answer or error
//! unchanged; nothing is retried or cached.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::GithubEndpointsConfig;
use crate::context::EndpointContext;
use crate::error::{map_github_error, map_transport_error, GithubEndpointError};

/// Query string pairs appended to a request.
pub(crate) type Query<'a> = &'a [(&'a str, String)];

/// Client bound to one repository and one access token.
#[derive(Debug, Clone)]
pub struct GithubEndpointClient {
	http_client: Client,
	config: GithubEndpointsConfig,
	context: EndpointContext,
}

impl GithubEndpointClient {
	/// Create a client for `context` using `config`.
	pub fn new(
		config: GithubEndpointsConfig,
		context: EndpointContext,
	) -> Result<Self, GithubEndpointError> {
		let http_client = config.http_client()?;

		info!(
			repository = %context.full_name(),
			base_url = %config.base_url(),
			"Created GitHub endpoint client"
		);

		Ok(Self {
			http_client,
			config,
			context,
		})
	}

	/// Client for the context described by the environment, with
	/// configuration from the environment.
	pub fn from_env() -> Result<Self, GithubEndpointError> {
		Self::new(GithubEndpointsConfig::from_env()?, EndpointContext::from_env()?)
	}

	pub fn config(&self) -> &GithubEndpointsConfig {
		&self.config
	}

	pub fn context(&self) -> &EndpointContext {
		&self.context
	}

	/// Same configuration and token, different repository.
	pub fn for_repository(
		&self,
		owner: impl Into<String>,
		repo: impl Into<String>,
	) -> Result<Self, GithubEndpointError> {
		let context = EndpointContext::new(owner, repo, self.context.token().clone())?;
		Ok(Self {
			http_client: self.http_client.clone(),
			config: self.config.clone(),
			context,
		})
	}

	/// `repos/{owner}/{repo}/{rest}` for the bound repository.
	pub(crate) fn repo_path(&self, rest: &str) -> String {
		self.context.repo_path(rest)
	}

	pub(crate) fn per_page(&self) -> u32 {
		self.config.default_per_page()
	}

	/// Authenticated request to a path relative to the REST base URL.
	pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GithubEndpointError> {
		let url = self.config.endpoint(path)?;
		Ok(self.request_url(method, url))
	}

	/// Authenticated request to an absolute URL (GraphQL, uploads).
	pub(crate) fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
		debug!(method = %method, url = %url, "Sending GitHub request");
		self
			.http_client
			.request(method, url)
			.bearer_auth(self.context.token().expose())
	}

	/// Send without interpreting the status.
	pub(crate) async fn send_raw(&self, request: RequestBuilder) -> Result<Response, GithubEndpointError> {
		request.send().await.map_err(map_transport_error)
	}

	/// Send and turn any non-success status into an error.
	pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, GithubEndpointError> {
		let response = self.send_raw(request).await?;
		ensure_success(response).await
	}

	pub(crate) async fn get_json<T: DeserializeOwned>(
		&self,
		path: &str,
		query: Query<'_>,
	) -> Result<T, GithubEndpointError> {
		let response = self.send(self.request(Method::GET, path)?.query(query)).await?;
		read_json(response).await
	}

	/// Send `body` as JSON and decode the JSON answer.
	pub(crate) async fn send_json<B, T>(
		&self,
		method: Method,
		path: &str,
		body: &B,
	) -> Result<T, GithubEndpointError>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let response = self.send(self.request(method, path)?.json(body)).await?;
		read_json(response).await
	}

	/// Send `body` as JSON (if any) where GitHub answers without content.
	pub(crate) async fn send_empty<B>(
		&self,
		method: Method,
		path: &str,
		body: Option<&B>,
	) -> Result<(), GithubEndpointError>
	where
		B: Serialize + ?Sized,
	{
		let mut request = self.request(method, path)?;
		if let Some(body) = body {
			request = request.json(body);
		}
		self.send(request).await?;
		Ok(())
	}

	/// Body-less call answered without content (DELETE, lock, enable, ...).
	pub(crate) async fn send_no_body(&self, method: Method, path: &str) -> Result<(), GithubEndpointError> {
		self.send_empty::<Value>(method, path, None).await
	}

	/// GET with a media-type override, returning the raw body.
	pub(crate) async fn get_bytes(
		&self,
		path: &str,
		accept: &str,
		query: Query<'_>,
	) -> Result<Vec<u8>, GithubEndpointError> {
		let request = self
			.request(Method::GET, path)?
			.header(ACCEPT, accept)
			.query(query);
		let response = self.send(request).await?;
		let bytes = response.bytes().await.map_err(map_transport_error)?;
		Ok(bytes.to_vec())
	}

	/// GET with a media-type override, returning the body as text.
	pub(crate) async fn get_text(
		&self,
		path: &str,
		accept: &str,
		query: Query<'_>,
	) -> Result<String, GithubEndpointError> {
		let request = self
			.request(Method::GET, path)?
			.header(ACCEPT, accept)
			.query(query);
		let response = self.send(request).await?;
		response.text().await.map_err(map_transport_error)
	}

	/// GET answered by 204 when a feature is on and 404 when it is off.
	pub(crate) async fn probe(&self, path: &str) -> Result<bool, GithubEndpointError> {
		let response = self.send_raw(self.request(Method::GET, path)?).await?;
		match response.status() {
			StatusCode::NOT_FOUND => Ok(false),
			status if status.is_success() => Ok(true),
			status => {
				let body = response.text().await.unwrap_or_default();
				Err(map_github_error(status, &body))
			}
		}
	}

	/// Upload raw bytes to an absolute URL.
	///
	/// Runs under the configured upload timeout instead of the request timeout.
	pub(crate) async fn upload<T: DeserializeOwned>(
		&self,
		url: Url,
		content_type: &str,
		data: Vec<u8>,
	) -> Result<T, GithubEndpointError> {
		let request = self
			.request_url(Method::POST, url)
			.header(CONTENT_TYPE, content_type)
			.timeout(self.config.upload_timeout())
			.body(data);
		let response = self.send(request).await?;
		read_json(response).await
	}

	/// Every page of a list endpoint answering with a JSON array.
	pub(crate) async fn get_all_pages<T: DeserializeOwned>(
		&self,
		path: &str,
		query: Query<'_>,
	) -> Result<Vec<T>, GithubEndpointError> {
		self.collect_pages(path, query, |page| from_value(page)).await
	}

	/// Every page of a list endpoint answering with an object such as
	/// `{"total_count": 2, "workflows": [...]}`; `field` names the array.
	pub(crate) async fn get_all_pages_in<T: DeserializeOwned>(
		&self,
		path: &str,
		query: Query<'_>,
		field: &str,
	) -> Result<Vec<T>, GithubEndpointError> {
		self
			.collect_pages(path, query, |mut page| match page.get_mut(field) {
				Some(items) => from_value(items.take()),
				None => Err(GithubEndpointError::InvalidResponse(format!(
					"Response has no '{field}' array"
				))),
			})
			.await
	}

	/// Walk pages until one comes back shorter than the page size.
	async fn collect_pages<T, F>(
		&self,
		path: &str,
		query: Query<'_>,
		extract: F,
	) -> Result<Vec<T>, GithubEndpointError>
	where
		F: Fn(Value) -> Result<Vec<T>, GithubEndpointError>,
	{
		let per_page = self.per_page();
		let mut items = Vec::new();
		let mut page = 1u32;

		loop {
			let mut page_query: Vec<(&str, String)> = query.to_vec();
			page_query.push(("per_page", per_page.to_string()));
			page_query.push(("page", page.to_string()));

			let body: Value = self.get_json(path, &page_query).await?;
			let batch = extract(body)?;
			let fetched = batch.len();
			items.extend(batch);

			if fetched < per_page as usize {
				break;
			}
			page += 1;
		}

		debug!(path, pages = page, items = items.len(), "Fetched all pages");
		Ok(items)
	}
}

/// Percent-encode each segment of a slash-separated name (branch, ref,
/// file path), keeping the slashes.
pub(crate) fn encode_path(name: &str) -> String {
	name
		.split('/')
		.map(|segment| urlencoding::encode(segment).into_owned())
		.collect::<Vec<_>>()
		.join("/")
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response, GithubEndpointError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	let body = response.text().await.unwrap_or_default();
	Err(map_github_error(status, &body))
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GithubEndpointError> {
	response.json().await.map_err(|e| {
		if e.is_decode() {
			error!(error = %e, "Failed to parse GitHub response");
			GithubEndpointError::InvalidResponse(format!("JSON parse error: {e}"))
		} else {
			map_transport_error(e)
		}
	})
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, GithubEndpointError> {
	serde_json::from_value(value).map_err(|e| {
		error!(error = %e, "Failed to parse GitHub list response");
		GithubEndpointError::InvalidResponse(format!("JSON parse error: {e}"))
	})
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use serde::Deserialize;
	use serde_json::json;
	use wiremock::matchers::{header, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::test_support::{bearer, mock_client, mock_config, repo_path};

	#[derive(Debug, Deserialize)]
	struct Item {
		id: u64,
	}

	fn items(range: std::ops::Range<u64>) -> Value {
		Value::Array(range.map(|id| json!({"id": id})).collect())
	}

	#[tokio::test]
	async fn requests_carry_identity_and_bearer_token() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("")))
			.and(header("authorization", bearer().as_str()))
			.and(header("accept", "application/vnd.github+json"))
			.and(header("x-github-api-version", "2022-11-28"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
			.expect(1)
			.mount(&server)
			.await;

		let client = mock_client(&server);
		let item: Item = client.get_json(&client.repo_path(""), &[]).await.unwrap();
		assert_eq!(item.id, 1);

		let requests = server.received_requests().await.unwrap();
		let user_agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
		assert!(user_agent.starts_with("GitHub Endpoints Client/"));
	}

	#[tokio::test]
	async fn pagination_stops_on_short_page() {
		let server = MockServer::start().await;
		let list = repo_path("tags");
		Mock::given(method("GET"))
			.and(path(list.as_str()))
			.and(query_param("page", "1"))
			.and(query_param("per_page", "2"))
			.respond_with(ResponseTemplate::new(200).set_body_json(items(0..2)))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path(list.as_str()))
			.and(query_param("page", "2"))
			.respond_with(ResponseTemplate::new(200).set_body_json(items(2..3)))
			.expect(1)
			.mount(&server)
			.await;

		let context = mock_client(&server).context().clone();
		let client = GithubEndpointClient::new(mock_config(&server).with_default_per_page(2), context).unwrap();

		let all: Vec<Item> = client.get_all_pages(&client.repo_path("tags"), &[]).await.unwrap();
		assert_eq!(all.iter().map(|i| i.id).collect::<Vec<_>>(), vec![0, 1, 2]);
	}

	#[tokio::test]
	async fn wrapped_pages_extract_named_array() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("actions/workflows")))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"total_count": 2,
				"workflows": [{"id": 10}, {"id": 11}]
			})))
			.expect(1)
			.mount(&server)
			.await;

		let client = mock_client(&server);
		let all: Vec<Item> = client
			.get_all_pages_in(&client.repo_path("actions/workflows"), &[], "workflows")
			.await
			.unwrap();
		assert_eq!(all.len(), 2);
	}

	#[tokio::test]
	async fn uploads_outlast_the_request_timeout() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/uploads/asset"))
			.respond_with(
				ResponseTemplate::new(201)
					.set_body_json(json!({"id": 7}))
					.set_delay(Duration::from_millis(600)),
			)
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path(repo_path("")))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!({"id": 1}))
					.set_delay(Duration::from_millis(600)),
			)
			.expect(1)
			.mount(&server)
			.await;

		let config = mock_config(&server)
			.with_request_timeout(Duration::from_millis(200))
			.with_upload_timeout(Duration::from_secs(10));
		let context = mock_client(&server).context().clone();
		let client = GithubEndpointClient::new(config, context).unwrap();

		let url = Url::parse(&format!("{}/uploads/asset", server.uri())).unwrap();
		let uploaded: Item = client
			.upload(url, "application/octet-stream", vec![0u8; 1024])
			.await
			.unwrap();
		assert_eq!(uploaded.id, 7);

		let err = client
			.get_json::<Item>(&client.repo_path(""), &[])
			.await
			.unwrap_err();
		assert!(matches!(err, GithubEndpointError::Timeout));
	}

	#[tokio::test]
	async fn wrapped_pages_without_named_array_are_invalid() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(repo_path("actions/workflows")))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"total_count": 2,
				"workflows": [{"id": 10}, {"id": 11}]
			})))
			.expect(1)
			.mount(&server)
			.await;

		let client = mock_client(&server);
		let err = client
			.get_all_pages_in::<Item>(&client.repo_path("actions/workflows"), &[], "workflow_runs")
			.await
			.unwrap_err();
		assert!(matches!(err, GithubEndpointError::InvalidResponse(_)));
	}

	#[tokio::test]
	async fn error_status_is_mapped() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Resource not accessible by integration"})))
			.mount(&server)
			.await;

		let client = mock_client(&server);
		let err = client.get_json::<Item>("user", &[]).await.unwrap_err();
		assert_eq!(err.status(), Some(403));
		assert_eq!(
			err.to_string(),
			"GitHub API error: 403 - Resource not accessible by integration"
		);
	}

	#[tokio::test]
	async fn malformed_body_is_invalid_response() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
			.mount(&server)
			.await;

		let client = mock_client(&server);
		let err = client.get_json::<Item>("user", &[]).await.unwrap_err();
		assert!(matches!(err, GithubEndpointError::InvalidResponse(_)));
	}

	#[test]
	fn encode_path_keeps_separators() {
		assert_eq!(encode_path("feature/new thing"), "feature/new%20thing");
		assert_eq!(encode_path("docs/a#b.md"), "docs/a%23b.md");
		assert_eq!(encode_path("main"), "main");
	}

	#[tokio::test]
	async fn for_repository_rebinds_context() {
		let server = MockServer::start().await;
		let client = mock_client(&server);
		let other = client.for_repository("rust-lang", "cargo").unwrap();
		assert_eq!(other.repo_path("pulls"), "repos/rust-lang/cargo/pulls");
		assert!(client.for_repository("", "cargo").is_err());
	}
}
