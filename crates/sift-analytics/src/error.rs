// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the analytics SDK.

use thiserror::Error;

use crate::config::ConfigError;

/// Analytics SDK errors.
///
/// Recording calls never return these; they surface only from construction,
/// configuration, upload and session-store operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
	/// Neither an upload URL nor a custom uploader was configured.
	#[error("no upload destination configured: set an upload URL or an uploader")]
	MissingUploader,

	/// Upload URL is not an http(s) URL.
	#[error("invalid upload URL: {0}")]
	InvalidUploadUrl(String),

	/// No tokio runtime was supplied or available to run the upload worker.
	#[error("no tokio runtime available for the upload worker")]
	NoRuntime,

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server returned an error response.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// Client has been shut down.
	#[error("client has been shut down")]
	ClientShutdown,

	/// Reading or writing the previous session id failed.
	#[error("session store error: {0}")]
	SessionStore(#[from] std::io::Error),

	/// Configuration could not be loaded.
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),
}

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
