// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User profiles.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::client::GithubEndpointClient;
use crate::error::{ensure_not_blank, GithubEndpointError};

/// Public profile of a user or organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
	pub login: String,
	pub id: u64,
	#[serde(default)]
	pub node_id: String,
	#[serde(rename = "type", default)]
	pub kind: String,
	pub name: Option<String>,
	pub company: Option<String>,
	pub blog: Option<String>,
	pub location: Option<String>,
	pub email: Option<String>,
	pub bio: Option<String>,
	pub twitter_username: Option<String>,
	#[serde(default)]
	pub public_repos: u64,
	#[serde(default)]
	pub followers: u64,
	#[serde(default)]
	pub following: u64,
	#[serde(default)]
	pub html_url: String,
	pub created_at: Option<DateTime<Utc>>,
}

/// Profile fields to change on the authenticated user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub blog: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub twitter_username: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub company: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hireable: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bio: Option<String>,
}

impl GithubEndpointClient {
	#[instrument(skip(self))]
	pub async fn get_user(&self, login: &str) -> Result<User, GithubEndpointError> {
		ensure_not_blank(login, "login")?;
		self
			.get_json(&format!("users/{}", urlencoding::encode(login)), &[])
			.await
	}

	/// The user the client's token belongs to.
	#[instrument(skip(self))]
	pub async fn get_authenticated_user(&self) -> Result<User, GithubEndpointError> {
		self.get_json("user", &[]).await
	}

	#[instrument(skip(self, update))]
	pub async fn update_authenticated_user(&self, update: &UserUpdate) -> Result<User, GithubEndpointError> {
		let user: User = self.send_json(Method::PATCH, "user", update).await?;
		info!(login = %user.login, "Updated user profile");
		Ok(user)
	}
}
