// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for analytics core values.

use thiserror::Error;

/// Errors raised when converting arbitrary JSON into a [`crate::TrackedValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
	/// The JSON value has no tracked-value counterpart (null, bool).
	#[error("unsupported value type: {0}")]
	Unsupported(&'static str),

	/// A number that fits neither i64 nor a finite f64.
	#[error("number is not representable: {0}")]
	UnrepresentableNumber(String),
}

/// Result type alias for core value conversions.
pub type Result<T> = std::result::Result<T, ValueError>;
