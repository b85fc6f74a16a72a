// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in trackable entities for search results.

use serde::{Deserialize, Serialize};
use sift_analytics_core::{keys, Record, TrackableEntity};

/// A suggested query shown before the user types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHint {
	pub hint: String,
	pub request_id: Option<String>,
	pub result_id: Option<String>,
}

impl QueryHint {
	pub fn new(hint: impl Into<String>) -> Self {
		Self {
			hint: hint.into(),
			request_id: None,
			result_id: None,
		}
	}

	pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = Some(request_id.into());
		self
	}

	pub fn with_result_id(mut self, result_id: impl Into<String>) -> Self {
		self.result_id = Some(result_id.into());
		self
	}

	fn record(&self) -> Record {
		Record::new()
			.insert(keys::HINT, self.hint.as_str())
			.insert_opt(keys::REQUEST_ID, self.request_id.as_deref())
			.insert_opt(keys::RESULT_ID, self.result_id.as_deref())
	}
}

impl TrackableEntity for QueryHint {
	fn impression_record(&self) -> Option<Record> {
		Some(self.record())
	}

	fn click_record(&self) -> Option<Record> {
		Some(self.record())
	}

	fn category(&self) -> Option<String> {
		Some(keys::HINTS.to_string())
	}
}

/// A query completion offered while the user types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSuggestion {
	pub suggestion: String,
	pub request_id: Option<String>,
	pub result_id: Option<String>,
}

impl AutoSuggestion {
	pub fn new(suggestion: impl Into<String>) -> Self {
		Self {
			suggestion: suggestion.into(),
			request_id: None,
			result_id: None,
		}
	}

	pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = Some(request_id.into());
		self
	}

	pub fn with_result_id(mut self, result_id: impl Into<String>) -> Self {
		self.result_id = Some(result_id.into());
		self
	}

	fn record(&self) -> Record {
		Record::new()
			.insert(keys::AUTOSUGGESTION, self.suggestion.as_str())
			.insert_opt(keys::REQUEST_ID, self.request_id.as_deref())
			.insert_opt(keys::RESULT_ID, self.result_id.as_deref())
	}
}

impl TrackableEntity for AutoSuggestion {
	fn impression_record(&self) -> Option<Record> {
		Some(self.record())
	}

	fn click_record(&self) -> Option<Record> {
		Some(self.record())
	}

	fn category(&self) -> Option<String> {
		Some(keys::AUTOSUGGEST.to_string())
	}
}

/// A deep link or app result returned by a search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
	pub entity_id: String,
	pub request_id: Option<String>,
	pub result_id: Option<String>,
	/// Zero-based position in the result list.
	pub rank: Option<u32>,
	/// Set when the result was served from a locally synthesized request.
	pub virtual_request: Option<bool>,
}

impl LinkResult {
	pub fn new(entity_id: impl Into<String>) -> Self {
		Self {
			entity_id: entity_id.into(),
			request_id: None,
			result_id: None,
			rank: None,
			virtual_request: None,
		}
	}

	pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = Some(request_id.into());
		self
	}

	pub fn with_result_id(mut self, result_id: impl Into<String>) -> Self {
		self.result_id = Some(result_id.into());
		self
	}

	pub fn with_rank(mut self, rank: u32) -> Self {
		self.rank = Some(rank);
		self
	}

	pub fn with_virtual_request(mut self, virtual_request: bool) -> Self {
		self.virtual_request = Some(virtual_request);
		self
	}

	fn record(&self) -> Record {
		Record::new()
			.insert(keys::ENTITY_ID, self.entity_id.as_str())
			.insert_opt(keys::REQUEST_ID, self.request_id.as_deref())
			.insert_opt(keys::RESULT_ID, self.result_id.as_deref())
			.insert_opt(keys::RANK, self.rank)
			.insert_opt(keys::VIRTUAL_REQUEST, self.virtual_request)
	}
}

impl TrackableEntity for LinkResult {
	fn impression_record(&self) -> Option<Record> {
		Some(self.record())
	}

	fn click_record(&self) -> Option<Record> {
		Some(self.record())
	}

	fn category(&self) -> Option<String> {
		Some(keys::SEARCH.to_string())
	}
}
