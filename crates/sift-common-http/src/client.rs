// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};

/// Creates a new HTTP client builder with the standard Sift User-Agent header.
///
/// # Example
/// ```ignore
/// let client = sift_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Returns the standard Sift User-Agent string.
///
/// Format: `sift/{version} ({os}-{arch})`
/// Example: `sift/0.1.0 (linux-x86_64)`
pub fn user_agent() -> String {
	format!(
		"sift/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
