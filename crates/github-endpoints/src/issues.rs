// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Issue conversation locking. Pull requests are issues for this purpose.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::client::GithubEndpointClient;
use crate::error::GithubEndpointError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockReason {
	#[serde(rename = "off-topic")]
	OffTopic,
	#[serde(rename = "too heated")]
	TooHeated,
	#[serde(rename = "resolved")]
	Resolved,
	#[serde(rename = "spam")]
	Spam,
}

impl GithubEndpointClient {
	/// Lock the conversation on an issue or pull request.
	#[instrument(skip(self))]
	pub async fn lock_issue(
		&self,
		number: u64,
		reason: Option<LockReason>,
	) -> Result<(), GithubEndpointError> {
		let path = self.repo_path(&format!("issues/{number}/lock"));
		match reason {
			Some(reason) => {
				self
					.send_empty(Method::PUT, &path, Some(&json!({ "lock_reason": reason })))
					.await?
			}
			None => self.send_no_body(Method::PUT, &path).await?,
		}
		info!("Locked conversation");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn unlock_issue(&self, number: u64) -> Result<(), GithubEndpointError> {
		self
			.send_no_body(Method::DELETE, &self.repo_path(&format!("issues/{number}/lock")))
			.await?;
		info!("Unlocked conversation");
		Ok(())
	}
}
