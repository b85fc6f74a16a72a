// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field names used in analytics payloads and entity records.

/// Session id sentinel reported while the application is in the background.
pub const NO_SESSION: &str = "NO_VALUE";

// Session metadata
pub const ANALYTICS_WINDOW_ID: &str = "analytics_window_id";
pub const PREVIOUS_ANALYTICS_WINDOW_ID: &str = "prev_analytics_window_id";
pub const EMPTY_SESSIONS: &str = "empty_sessions";

// Event arrays
pub const CLICKS: &str = "clicks";
pub const IMPRESSIONS: &str = "impressions";

// Injected event fields
pub const CLICK_TYPE: &str = "click_type";
pub const AREA: &str = "area";
pub const TIMESTAMP: &str = "timestamp";

// Categories
pub const HINTS: &str = "hints";
pub const AUTOSUGGEST: &str = "autosuggest";
pub const SEARCH: &str = "search";

// Entity fields
pub const REQUEST_ID: &str = "request_id";
pub const RESULT_ID: &str = "result_id";
pub const ENTITY_ID: &str = "entity_id";
pub const HINT: &str = "hint";
pub const AUTOSUGGESTION: &str = "autosuggestion";
pub const RANK: &str = "rank";
pub const VIRTUAL_REQUEST: &str = "virtual_request";

// Static values
pub const DEVICE_INFO: &str = "device_info";
pub const CONFIG_INFO: &str = "config_info";

// Grouped reporting
pub const API_PERFORMANCE: &str = "api_performance";
pub const FAILURE: &str = "failure";
pub const SOURCE: &str = "source";
pub const MESSAGE: &str = "message";
pub const URL: &str = "url";
pub const API_TYPE: &str = "api_type";
pub const START_TIME: &str = "start_time";
pub const ROUND_TRIP_TIME: &str = "round_trip_time";
pub const STATUS_CODE: &str = "status_code";

/// Payload key for the click array of a category partition.
pub fn category_clicks(category: &str) -> String {
	format!("{category}_{CLICKS}")
}

/// Payload key for the impression array of a category partition.
pub fn category_impressions(category: &str) -> String {
	format!("{category}_{IMPRESSIONS}")
}
