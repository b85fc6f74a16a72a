// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grouped diagnostics the search SDK reports about itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sift_analytics_core::{keys, Record};

/// Header carrying the current session id on outgoing search API requests.
pub const WINDOW_ID_HEADER: &str = keys::ANALYTICS_WINDOW_ID;

/// Timing of one search API round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPerformance {
	pub request_id: Option<String>,
	pub status_code: u16,
	/// Milliseconds since the Unix epoch.
	pub start_time: i64,
	pub url: String,
	pub api_type: String,
	/// Milliseconds.
	pub round_trip_time: i64,
}

impl ApiPerformance {
	/// Starts timing a request to `url`.
	pub fn start(url: impl Into<String>, api_type: impl Into<String>) -> ApiTimer {
		ApiTimer {
			started_at: Utc::now(),
			url: url.into(),
			api_type: api_type.into(),
		}
	}

	/// Object stored under `api_performance`. An empty request id is omitted.
	pub fn to_object(&self) -> Map<String, Value> {
		let request_id = self.request_id.as_deref().filter(|id| !id.is_empty());
		Record::new()
			.insert_opt(keys::REQUEST_ID, request_id)
			.insert(keys::STATUS_CODE, self.status_code)
			.insert(keys::START_TIME, self.start_time)
			.insert(keys::URL, self.url.as_str())
			.insert(keys::API_TYPE, self.api_type.as_str())
			.insert(keys::ROUND_TRIP_TIME, self.round_trip_time)
			.into_map()
	}
}

/// An in-flight request started with [`ApiPerformance::start`].
#[derive(Debug, Clone)]
pub struct ApiTimer {
	started_at: DateTime<Utc>,
	url: String,
	api_type: String,
}

impl ApiTimer {
	pub fn finish(self, status_code: u16, request_id: Option<String>) -> ApiPerformance {
		self.finish_at(Utc::now(), status_code, request_id)
	}

	fn finish_at(
		self,
		finished_at: DateTime<Utc>,
		status_code: u16,
		request_id: Option<String>,
	) -> ApiPerformance {
		ApiPerformance {
			request_id,
			status_code,
			start_time: self.started_at.timestamp_millis(),
			url: self.url,
			api_type: self.api_type,
			round_trip_time: (finished_at - self.started_at).num_milliseconds().max(0),
		}
	}
}

/// Object stored under `failure` when a deprecated entry point is called.
pub fn deprecated_use(source: &str, method: &str) -> Map<String, Value> {
	Record::new()
		.insert(keys::SOURCE, source)
		.insert(keys::MESSAGE, format!("Use of deprecated method, {method}()"))
		.into_map()
}
