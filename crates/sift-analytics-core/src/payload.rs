// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Assembly of the session upload document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collector::{CollectedEvents, EventCollector};
use crate::keys;
use crate::store::{Scope, TrackedValues, ValueStore};

/// Session fields carried by every payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
	pub session_id: String,
	pub empty_sessions: u32,
	pub previous_session_id: Option<String>,
}

/// A formatted analytics document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
	inner: Map<String, Value>,
}

impl Payload {
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.inner.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.inner.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn session_id(&self) -> Option<&str> {
		self.inner.get(keys::ANALYTICS_WINDOW_ID).and_then(Value::as_str)
	}

	pub fn empty_sessions(&self) -> Option<u64> {
		self.inner.get(keys::EMPTY_SESSIONS).and_then(Value::as_u64)
	}

	pub fn previous_session_id(&self) -> Option<&str> {
		self
			.inner
			.get(keys::PREVIOUS_ANALYTICS_WINDOW_ID)
			.and_then(Value::as_str)
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.inner
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.inner)
	}

	/// Serialized JSON body for upload.
	pub fn to_json_string(&self) -> String {
		Value::Object(self.inner.clone()).to_string()
	}
}

impl From<Payload> for Value {
	fn from(payload: Payload) -> Self {
		payload.into_value()
	}
}

/// Session-scoped data: tracked values plus clicks and impressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData {
	pub tracked: TrackedValues,
	pub events: CollectedEvents,
}

impl SessionData {
	/// Copies the session data, leaving the containers untouched.
	pub fn snapshot(store: &ValueStore, collector: &EventCollector) -> Self {
		Self {
			tracked: store.tracked_snapshot(),
			events: collector.snapshot(),
		}
	}

	/// Removes the session data from the containers.
	///
	/// Each container is drained in one step under its own lock, so a value
	/// recorded concurrently belongs either to the returned data or to the
	/// next session.
	pub fn drain(store: &ValueStore, collector: &EventCollector) -> Self {
		Self {
			tracked: store.take_tracked(),
			events: collector.take(),
		}
	}

	/// True iff nothing was tracked. Static values never count.
	pub fn is_empty(&self) -> bool {
		self.tracked.is_empty() && self.events.is_empty()
	}
}

/// Builds the session document from current state without modifying it.
pub fn format_payload(
	metadata: &SessionMetadata,
	store: &ValueStore,
	collector: &EventCollector,
) -> Payload {
	format_session(metadata, store, &SessionData::snapshot(store, collector))
}

/// Builds the session document from `session` plus the static values in
/// `store`.
///
/// Write order, later entries replacing earlier ones on key collision:
/// static values, tracked values, category and default event arrays, static
/// grouped arrays, tracked grouped arrays, then session metadata. Tracked data
/// therefore shadows static data, and the metadata keys always hold the
/// session's own values.
pub fn format_session(
	metadata: &SessionMetadata,
	store: &ValueStore,
	session: &SessionData,
) -> Payload {
	let mut payload = Map::new();

	store.write_individual(Scope::Static, &mut payload);
	session.tracked.write_individual(&mut payload);

	session.events.write_into(&mut payload);

	store.write_grouped(Scope::Static, &mut payload);
	session.tracked.write_grouped(&mut payload);

	payload.insert(
		keys::ANALYTICS_WINDOW_ID.to_string(),
		Value::String(metadata.session_id.clone()),
	);
	payload.insert(
		keys::EMPTY_SESSIONS.to_string(),
		Value::Number(metadata.empty_sessions.into()),
	);
	payload.insert(
		keys::PREVIOUS_ANALYTICS_WINDOW_ID.to_string(),
		metadata
			.previous_session_id
			.clone()
			.map_or(Value::Null, Value::String),
	);

	Payload { inner: payload }
}
