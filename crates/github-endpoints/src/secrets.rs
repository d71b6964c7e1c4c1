// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub Actions repository secrets.
//!
//! Values are never read back from GitHub. Writes take a value already
//! sealed with the repository public key (libsodium sealed box).

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::GithubEndpointClient;
use crate::error::{ensure_not_blank, GithubEndpointError};

/// Secret metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsSecret {
	pub name: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Public key used to seal secret values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsPublicKey {
	pub key_id: String,
	/// Base64-encoded curve25519 public key.
	pub key: String,
}

impl GithubEndpointClient {
	fn secret_path(&self, name: &str) -> Result<String, GithubEndpointError> {
		ensure_not_blank(name, "secret name")?;
		Ok(self.repo_path(&format!("actions/secrets/{}", urlencoding::encode(name))))
	}

	#[instrument(skip(self))]
	pub async fn list_secrets(&self) -> Result<Vec<ActionsSecret>, GithubEndpointError> {
		self
			.get_all_pages_in(&self.repo_path("actions/secrets"), &[], "secrets")
			.await
	}

	#[instrument(skip(self))]
	pub async fn get_secret(&self, name: &str) -> Result<ActionsSecret, GithubEndpointError> {
		self.get_json(&self.secret_path(name)?, &[]).await
	}

	#[instrument(skip(self))]
	pub async fn get_secrets_public_key(&self) -> Result<ActionsPublicKey, GithubEndpointError> {
		self
			.get_json(&self.repo_path("actions/secrets/public-key"), &[])
			.await
	}

	/// Create or replace a secret with a value sealed for `key_id`.
	#[instrument(skip(self, encrypted_value))]
	pub async fn create_or_update_secret(
		&self,
		name: &str,
		encrypted_value: &str,
		key_id: &str,
	) -> Result<(), GithubEndpointError> {
		ensure_not_blank(encrypted_value, "encrypted_value")?;
		ensure_not_blank(key_id, "key_id")?;

		let body = json!({ "encrypted_value": encrypted_value, "key_id": key_id });
		self
			.send_empty(Method::PUT, &self.secret_path(name)?, Some(&body))
			.await?;
		info!("Stored Actions secret");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn delete_secret(&self, name: &str) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::DELETE, &self.secret_path(name)?)
			.await?;
		info!("Deleted Actions secret");
		Ok(())
	}
}
