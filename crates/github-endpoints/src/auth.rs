// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub App installation token issuance.
//!
//! Each call signs a fresh App JWT and exchanges it for an installation
//! access token. Neither the JWT nor the returned token is cached; the
//! caller owns the token's lifecycle.

use std::collections::HashMap;
use std::env;

use chrono::{DateTime, Utc};
use github_endpoints_secret::{require_secret_env, SecretString};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::config::GithubEndpointsConfig;
use crate::error::{map_github_error, map_transport_error, GithubEndpointError};
use crate::jwt::{generate_app_jwt, AppIdentifier};

/// Credentials of one GitHub App installation.
///
/// `private_key` holds PEM text or its base64 encoding.
#[derive(Debug, Clone)]
pub struct GithubAppCredential {
	pub app_id: AppIdentifier,
	pub installation_id: u64,
	pub private_key: SecretString,
}

impl GithubAppCredential {
	pub fn new(
		app_id: impl Into<AppIdentifier>,
		installation_id: u64,
		private_key: impl Into<SecretString>,
	) -> Self {
		Self {
			app_id: app_id.into(),
			installation_id,
			private_key: private_key.into(),
		}
	}

	/// Load credentials from environment variables.
	///
	/// Required:
	/// - `GITHUB_APP_ID`: numeric App ID or client ID
	/// - `GITHUB_APP_INSTALLATION_ID`
	/// - `GITHUB_APP_PRIVATE_KEY` (or `GITHUB_APP_PRIVATE_KEY_FILE`)
	pub fn from_env() -> Result<Self, GithubEndpointError> {
		let app_id: AppIdentifier = env::var("GITHUB_APP_ID")
			.map_err(|_| GithubEndpointError::Config("GITHUB_APP_ID not set".to_string()))?
			.parse()
			.map_err(|e| GithubEndpointError::Config(format!("Invalid GITHUB_APP_ID: {e}")))?;

		let installation_id: u64 = env::var("GITHUB_APP_INSTALLATION_ID")
			.map_err(|_| GithubEndpointError::Config("GITHUB_APP_INSTALLATION_ID not set".to_string()))?
			.trim()
			.parse()
			.map_err(|_| {
				GithubEndpointError::Config("GITHUB_APP_INSTALLATION_ID must be a number".to_string())
			})?;

		let private_key = require_secret_env("GITHUB_APP_PRIVATE_KEY")
			.map_err(|e| GithubEndpointError::Config(e.to_string()))?;

		Ok(Self {
			app_id,
			installation_id,
			private_key,
		})
	}
}

/// Installation access token as returned by GitHub.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationToken {
	pub token: SecretString,
	pub expires_at: DateTime<Utc>,
	#[serde(default)]
	pub permissions: HashMap<String, String>,
	#[serde(default)]
	pub repository_selection: Option<String>,
}

/// Exchanges App credentials for installation access tokens.
#[derive(Debug, Clone)]
pub struct InstallationTokenIssuer {
	http_client: Client,
	config: GithubEndpointsConfig,
}

impl InstallationTokenIssuer {
	pub fn new(config: GithubEndpointsConfig) -> Result<Self, GithubEndpointError> {
		let http_client = config.http_client()?;
		Ok(Self {
			http_client,
			config,
		})
	}

	/// Issue an installation access token.
	///
	/// Blank key material or a zero installation id fails with
	/// [`GithubEndpointError::InvalidArgument`] before any network call. A key
	/// that cannot be decoded or signed with is
	/// [`GithubEndpointError::Crypto`]. GitHub's rejections come back as
	/// [`GithubEndpointError::ApiError`] with the upstream status.
	#[instrument(
		skip(self, credential),
		fields(app = %credential.app_id, installation_id = credential.installation_id)
	)]
	pub async fn issue(
		&self,
		credential: &GithubAppCredential,
	) -> Result<InstallationToken, GithubEndpointError> {
		if credential.private_key.is_blank() {
			return Err(GithubEndpointError::invalid_argument(
				"private key must not be empty",
			));
		}
		if credential.installation_id == 0 {
			return Err(GithubEndpointError::invalid_argument(
				"installation id must not be empty",
			));
		}

		let jwt = generate_app_jwt(&credential.app_id, &credential.private_key)?;

		let url = self.config.endpoint(&format!(
			"app/installations/{}/access_tokens",
			credential.installation_id
		))?;

		debug!("Requesting installation access token");

		let response = self
			.http_client
			.post(url)
			.bearer_auth(jwt.expose())
			.send()
			.await
			.map_err(map_transport_error)?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(map_github_error(status, &body));
		}

		let token: InstallationToken = response.json().await.map_err(|e| {
			error!(error = %e, "Failed to parse access token response");
			GithubEndpointError::InvalidResponse(format!("JSON parse error: {e}"))
		})?;

		info!(expires_at = %token.expires_at, "Issued installation access token");

		Ok(token)
	}
}
