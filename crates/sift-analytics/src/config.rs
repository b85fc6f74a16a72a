// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Analytics SDK configuration.
//!
//! Precedence, lowest to highest: defaults, TOML file, `SIFT_ANALYTICS_*`
//! environment variables, explicit builder calls.

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Env var overriding [`AnalyticsConfig::upload_url`].
pub const ENV_UPLOAD_URL: &str = "SIFT_ANALYTICS_UPLOAD_URL";
/// Env var overriding [`AnalyticsConfig::request_timeout_secs`].
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SIFT_ANALYTICS_REQUEST_TIMEOUT_SECS";
/// Env var overriding [`AnalyticsConfig::log_payloads`].
pub const ENV_LOG_PAYLOADS: &str = "SIFT_ANALYTICS_LOG_PAYLOADS";
/// Env var overriding [`AnalyticsConfig::session_store_path`].
pub const ENV_SESSION_STORE: &str = "SIFT_ANALYTICS_SESSION_STORE";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// I/O error reading config file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Runtime settings for the analytics client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
	/// Endpoint receiving session payloads as `POST application/json`.
	pub upload_url: Option<String>,
	pub request_timeout_secs: u64,
	/// Maximum number of pending upload jobs before new ones are dropped.
	pub queue_capacity: usize,
	/// Log every payload at debug level before upload.
	pub log_payloads: bool,
	/// File holding the previous session id. `None` keeps it in memory only.
	pub session_store_path: Option<PathBuf>,
}

impl Default for AnalyticsConfig {
	fn default() -> Self {
		Self {
			upload_url: None,
			request_timeout_secs: 30,
			queue_capacity: 16,
			log_payloads: false,
			session_store_path: None,
		}
	}
}

impl AnalyticsConfig {
	/// Parses a TOML document. Missing fields take their defaults.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		toml::from_str(source).map_err(|source| ConfigError::TomlParse {
			path: PathBuf::from("<inline>"),
			source,
		})
	}

	/// Loads a TOML file. A missing file yields the defaults.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			tracing::debug!(path = %path.display(), "analytics config file not found, using defaults");
			return Ok(Self::default());
		}

		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Applies `SIFT_ANALYTICS_*` overrides from the process environment.
	pub fn apply_env(self) -> Result<Self, ConfigError> {
		self.apply_env_with(|name| std::env::var(name).ok())
	}

	/// Applies overrides using `lookup` in place of the process environment.
	pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(url) = lookup(ENV_UPLOAD_URL) {
			self.upload_url = Some(url);
		}

		if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
			self.request_timeout_secs = raw
				.trim()
				.parse()
				.map_err(|_| ConfigError::invalid_value(ENV_REQUEST_TIMEOUT_SECS, format!("not a number: {raw}")))?;
		}

		if let Some(raw) = lookup(ENV_LOG_PAYLOADS) {
			self.log_payloads = parse_bool(&raw)
				.ok_or_else(|| ConfigError::invalid_value(ENV_LOG_PAYLOADS, format!("not a boolean: {raw}")))?;
		}

		if let Some(path) = lookup(ENV_SESSION_STORE) {
			self.session_store_path = (!path.is_empty()).then(|| PathBuf::from(path));
		}

		Ok(self)
	}

	/// Checks field values. An absent upload URL is allowed here because a
	/// custom uploader may be supplied to the builder instead.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if let Some(url) = &self.upload_url {
			parse_upload_url(url)?;
		}

		if self.queue_capacity == 0 {
			return Err(ConfigError::invalid_value("queue_capacity", "must be > 0"));
		}

		if self.request_timeout_secs == 0 {
			return Err(ConfigError::invalid_value("request_timeout_secs", "must be > 0"));
		}

		Ok(())
	}
}

/// Parses `raw` as an absolute `http` or `https` URL with a host.
pub(crate) fn parse_upload_url(raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw)
		.map_err(|e| ConfigError::invalid_value("upload_url", format!("{e}: {raw}")))?;
	match url.scheme() {
		"http" | "https" if url.has_host() => Ok(url),
		_ => Err(ConfigError::invalid_value(
			"upload_url",
			format!("must be an http(s) URL: {raw}"),
		)),
	}
}

fn parse_bool(raw: &str) -> Option<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}
