// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client construction.
//!
//! Every request to GitHub goes out with the same product identity and the
//! same REST media type and API version headers, so they are installed here
//! as client defaults rather than repeated per call.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use tracing::{debug, warn};

/// Product name sent in the `User-Agent` header.
pub const PRODUCT_NAME: &str = "GitHub Endpoints Client";

/// Default `Accept` header for REST calls.
pub const GITHUB_JSON: &str = "application/vnd.github+json";

/// Media type that asks GitHub for raw file bytes.
pub const GITHUB_RAW: &str = "application/vnd.github.raw";

/// Media type that asks GitHub for rendered HTML.
pub const GITHUB_HTML: &str = "application/vnd.github.html";

/// Header carrying the pinned REST API version.
pub const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";

/// REST API version pinned by default.
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Returns the standard User-Agent string.
///
/// Format: `GitHub Endpoints Client/{crate version}`
pub fn user_agent() -> String {
	format!("{PRODUCT_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

/// Build a client with the given identity and timeout.
///
/// A version string that is not a valid header value falls back to
/// [`DEFAULT_API_VERSION`].
pub fn new_client(
	user_agent: impl Into<String>,
	api_version: &str,
	timeout: Duration,
) -> Result<Client, reqwest::Error> {
	let user_agent = user_agent.into();
	let version = HeaderValue::from_str(api_version).unwrap_or_else(|_| {
		warn!(api_version, "Invalid GitHub API version header, using default");
		HeaderValue::from_static(DEFAULT_API_VERSION)
	});

	debug!(user_agent = %user_agent, "Building GitHub HTTP client");

	Client::builder()
		.user_agent(user_agent)
		.default_headers(github_headers(version))
		.timeout(timeout)
		.build()
}

fn github_headers(api_version: HeaderValue) -> HeaderMap {
	let mut headers = HeaderMap::new();
	headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
	headers.insert(API_VERSION_HEADER, api_version);
	headers
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_names_the_product() {
		let ua = user_agent();
		assert!(ua.starts_with("GitHub Endpoints Client/"));
		assert_eq!(ua.split('/').count(), 2);
	}

	#[test]
	fn pinned_version_is_a_valid_header() {
		assert!(HeaderValue::from_str(DEFAULT_API_VERSION).is_ok());
		assert!(HeaderValue::from_str("2022-11-28\n").is_err());
	}

	#[test]
	fn standard_headers_carry_media_type_and_version() {
		let headers = github_headers(HeaderValue::from_static(DEFAULT_API_VERSION));
		assert_eq!(headers.get(ACCEPT).unwrap(), GITHUB_JSON);
		assert_eq!(headers.get(API_VERSION_HEADER).unwrap(), DEFAULT_API_VERSION);
	}

	#[test]
	fn new_client_survives_bad_version() {
		let client = new_client("custom-tool/1.0", "bad\r\nversion", Duration::from_secs(5));
		assert!(client.is_ok());
	}
}
