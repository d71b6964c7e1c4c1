// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for GitHub endpoint operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by every operation in this crate.
///
/// Nothing is retried locally. Local precondition failures
/// ([`InvalidArgument`](Self::InvalidArgument)) are raised before any
/// network call; everything else reflects what GitHub or the transport
/// reported.
#[derive(Debug, Error)]
pub enum GithubEndpointError {
	/// A required input was missing or blank.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Private key decoding, parsing or JWT signing failed.
	#[error("Crypto failure: {0}")]
	Crypto(String),

	/// A referenced entity (pull request, release tag, ...) does not exist.
	#[error("Not found: {0}")]
	NotFound(String),

	/// GitHub answered with a non-success status.
	#[error("GitHub API error: {status} - {message}")]
	ApiError { status: u16, message: String },

	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// GitHub answered successfully but the body could not be understood.
	#[error("Invalid response from GitHub: {0}")]
	InvalidResponse(String),

	/// Invalid client configuration or environment.
	#[error("Configuration error: {0}")]
	Config(String),

	/// The caller cancelled the operation.
	#[error("Operation cancelled")]
	Cancelled,
}

impl GithubEndpointError {
	pub fn api_error(status: u16, message: impl Into<String>) -> Self {
		Self::ApiError {
			status,
			message: message.into(),
		}
	}

	pub fn not_found(what: impl Into<String>) -> Self {
		Self::NotFound(what.into())
	}

	pub fn invalid_argument(what: impl Into<String>) -> Self {
		Self::InvalidArgument(what.into())
	}

	/// Upstream HTTP status, when the error came from GitHub.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::ApiError { status, .. } => Some(*status),
			Self::Network(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}

	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(401)
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_)) || self.status() == Some(404)
	}

	pub fn is_rate_limited(&self) -> bool {
		match self {
			Self::ApiError { status: 429, .. } => true,
			Self::ApiError {
				status: 403,
				message,
			} => is_rate_limit_message(message),
			_ => false,
		}
	}
}

/// Fail with [`GithubEndpointError::InvalidArgument`] when `value` is blank.
pub(crate) fn ensure_not_blank(value: &str, name: &str) -> Result<(), GithubEndpointError> {
	if value.trim().is_empty() {
		return Err(GithubEndpointError::InvalidArgument(format!(
			"{name} must not be empty"
		)));
	}
	Ok(())
}

/// Map a transport error, separating timeouts.
pub(crate) fn map_transport_error(e: reqwest::Error) -> GithubEndpointError {
	if e.is_timeout() {
		error!("GitHub request timed out");
		return GithubEndpointError::Timeout;
	}
	error!(error = %e, "Network error talking to GitHub");
	GithubEndpointError::Network(e)
}

#[derive(Debug, Deserialize)]
struct GithubErrorBody {
	message: String,
}

/// Map a non-success GitHub response to [`GithubEndpointError::ApiError`].
///
/// The message is GitHub's JSON `message` field when present, otherwise the
/// raw body.
pub(crate) fn map_github_error(status: StatusCode, body: &str) -> GithubEndpointError {
	let status_code = status.as_u16();
	let message = serde_json::from_str::<GithubErrorBody>(body)
		.map(|b| b.message)
		.unwrap_or_else(|_| body.to_string());

	match status_code {
		401 => warn!(status = status_code, "Unauthorized request to GitHub"),
		403 if is_rate_limit_message(&message) => {
			warn!(status = status_code, "GitHub rate limit exceeded")
		}
		403 => warn!(status = status_code, "Forbidden request to GitHub"),
		429 => warn!(status = status_code, "GitHub secondary rate limit exceeded"),
		_ => error!(status = status_code, message = %message, "GitHub API error"),
	}

	GithubEndpointError::ApiError {
		status: status_code,
		message,
	}
}

fn is_rate_limit_message(message: &str) -> bool {
	let lower = message.to_lowercase();
	lower.contains("rate limit") || lower.contains("api rate")
}
