// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Models shared by several endpoint areas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal user or organization record embedded in most responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleUser {
	pub login: String,
	pub id: u64,
	#[serde(default)]
	pub node_id: String,
	#[serde(default)]
	pub avatar_url: String,
	#[serde(default)]
	pub html_url: String,
	/// `User`, `Organization` or `Bot`.
	#[serde(rename = "type", default)]
	pub kind: String,
}

/// Issue or pull request label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
	pub id: u64,
	pub name: String,
	#[serde(default)]
	pub color: String,
	pub description: Option<String>,
}

/// Team as embedded in repository and review-request responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
	pub id: u64,
	pub name: String,
	pub slug: String,
	pub description: Option<String>,
	#[serde(default)]
	pub permission: String,
	#[serde(default)]
	pub html_url: String,
}

/// Author, committer or tagger identity in the git database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitActor {
	pub name: String,
	pub email: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date: Option<DateTime<Utc>>,
}

impl GitActor {
	pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			email: email.into(),
			date: None,
		}
	}

	/// Stamp with an explicit time.
	pub fn at(mut self, date: DateTime<Utc>) -> Self {
		self.date = Some(date);
		self
	}
}

/// Search results envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults<T> {
	pub total_count: u64,
	pub incomplete_results: bool,
	pub items: Vec<T>,
}
