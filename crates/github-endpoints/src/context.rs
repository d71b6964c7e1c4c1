// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The repository and credential every endpoint call is made against.

use std::env;

use github_endpoints_secret::{require_secret_env, SecretString};

use crate::auth::InstallationToken;
use crate::error::{ensure_not_blank, GithubEndpointError};

/// Owner, repository name and access token for one repository.
///
/// The token is a personal access token, a workflow `GITHUB_TOKEN`, or an
/// installation token issued by [`InstallationTokenIssuer`](crate::InstallationTokenIssuer).
#[derive(Debug, Clone)]
pub struct EndpointContext {
	owner: String,
	repo: String,
	token: SecretString,
}

impl EndpointContext {
	/// Create a context, rejecting blank owner, repository or token.
	pub fn new(
		owner: impl Into<String>,
		repo: impl Into<String>,
		token: impl Into<SecretString>,
	) -> Result<Self, GithubEndpointError> {
		let owner = owner.into();
		let repo = repo.into();
		let token = token.into();

		ensure_not_blank(&owner, "owner")?;
		ensure_not_blank(&repo, "repo")?;
		if token.is_blank() {
			return Err(GithubEndpointError::invalid_argument(
				"token must not be empty",
			));
		}

		Ok(Self { owner, repo, token })
	}

	/// Context authenticated with an installation token.
	pub fn from_installation_token(
		owner: impl Into<String>,
		repo: impl Into<String>,
		token: &InstallationToken,
	) -> Result<Self, GithubEndpointError> {
		Self::new(owner, repo, token.token.clone())
	}

	/// Create a context from the environment.
	///
	/// - `GITHUB_REPOSITORY`: `owner/repo`, as set by GitHub Actions
	/// - `GITHUB_TOKEN` (or `GITHUB_TOKEN_FILE`): access token
	pub fn from_env() -> Result<Self, GithubEndpointError> {
		let repository = env::var("GITHUB_REPOSITORY")
			.map_err(|_| GithubEndpointError::Config("GITHUB_REPOSITORY not set".to_string()))?;

		let (owner, repo) = parse_repository(&repository)?;

		let token = require_secret_env("GITHUB_TOKEN")
			.map_err(|e| GithubEndpointError::Config(e.to_string()))?;

		Self::new(owner, repo, token)
	}

	pub fn owner(&self) -> &str {
		&self.owner
	}

	pub fn repo(&self) -> &str {
		&self.repo
	}

	/// `owner/repo`
	pub fn full_name(&self) -> String {
		format!("{}/{}", self.owner, self.repo)
	}

	pub(crate) fn token(&self) -> &SecretString {
		&self.token
	}

	/// REST path below `repos/{owner}/{repo}`.
	pub(crate) fn repo_path(&self, rest: &str) -> String {
		let owner = urlencoding::encode(&self.owner);
		let repo = urlencoding::encode(&self.repo);
		let rest = rest.trim_start_matches('/');
		if rest.is_empty() {
			format!("repos/{owner}/{repo}")
		} else {
			format!("repos/{owner}/{repo}/{rest}")
		}
	}
}

/// Split `owner/repo`.
pub fn parse_repository(full_name: &str) -> Result<(String, String), GithubEndpointError> {
	match full_name.trim().split_once('/') {
		Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
			Ok((owner.to_string(), repo.to_string()))
		}
		_ => Err(GithubEndpointError::invalid_argument(format!(
			"expected 'owner/repo', got '{full_name}'"
		))),
	}
}
