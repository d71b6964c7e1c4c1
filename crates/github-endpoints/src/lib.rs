// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub endpoints for build automation.
//!
//! This crate provides a typed Rust client bound to one repository and one
//! installation token, covering pull requests, releases, git data, Actions,
//! deployments and search, plus GitHub App authentication (JWT signing and
//! installation token exchange) and GraphQL auto-merge.

pub mod actions;
pub mod auth;
pub mod branches;
pub mod client;
pub mod commits;
pub mod config;
pub mod contents;
pub mod context;
pub mod deployments;
pub mod error;
pub mod git;
pub mod graphql;
pub mod issues;
pub mod jwt;
pub mod pulls;
pub mod releases;
pub mod repos;
pub mod search;
pub mod secrets;
pub mod types;
pub mod users;
pub mod variables;

#[cfg(test)]
mod test_support;

pub use actions::WorkflowId;
pub use auth::{GithubAppCredential, InstallationToken, InstallationTokenIssuer};
pub use client::GithubEndpointClient;
pub use config::{ContentDefaults, GithubEndpointsConfig};
pub use context::{parse_repository, EndpointContext};
pub use error::GithubEndpointError;
pub use github_endpoints_secret::SecretString;
pub use graphql::{auto_merge_mutation, MergeMethod};
pub use jwt::{decode_private_key, generate_app_jwt, AppIdentifier};
pub use search::SearchQuery;
