// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Keyed value store with tracked (session-scoped) and static (persistent) scopes.
//!
//! Each of the four containers (static/tracked × individual/grouped) is guarded
//! by its own lock. A clear or drain of one container never interleaves with a
//! write to the same container; there is no lock spanning containers.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::value::TrackedValue;

/// Lifetime of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
	/// Cleared at the end of every uploaded session. Counts toward a non-empty session.
	Tracked,
	/// Survives sessions until removed. Never makes a session non-empty.
	Static,
}

impl std::fmt::Display for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Scope::Tracked => write!(f, "tracked"),
			Scope::Static => write!(f, "static"),
		}
	}
}

type IndividualMap = BTreeMap<String, TrackedValue>;
type GroupedMap = BTreeMap<String, Vec<TrackedValue>>;

/// Tracked values detached from a [`ValueStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedValues {
	individual: IndividualMap,
	grouped: GroupedMap,
}

impl TrackedValues {
	pub fn is_empty(&self) -> bool {
		self.individual.is_empty() && self.grouped.values().all(Vec::is_empty)
	}

	pub fn write_individual(&self, payload: &mut Map<String, Value>) {
		write_individual_map(&self.individual, payload);
	}

	pub fn write_grouped(&self, payload: &mut Map<String, Value>) {
		write_grouped_map(&self.grouped, payload);
	}
}

#[derive(Debug, Default)]
pub struct ValueStore {
	static_individual: Mutex<IndividualMap>,
	tracked_individual: Mutex<IndividualMap>,
	static_grouped: Mutex<GroupedMap>,
	tracked_grouped: Mutex<GroupedMap>,
}

impl ValueStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn individual(&self, scope: Scope) -> &Mutex<IndividualMap> {
		match scope {
			Scope::Tracked => &self.tracked_individual,
			Scope::Static => &self.static_individual,
		}
	}

	fn grouped_container(&self, scope: Scope) -> &Mutex<GroupedMap> {
		match scope {
			Scope::Tracked => &self.tracked_grouped,
			Scope::Static => &self.static_grouped,
		}
	}

	/// Sets or removes the single value under `key`.
	///
	/// `None` removes the key; removing a missing key is a no-op. A value JSON
	/// cannot carry is dropped and leaves the key untouched.
	pub fn set_individual(&self, scope: Scope, key: impl Into<String>, value: Option<TrackedValue>) {
		let key = key.into();
		match value {
			Some(value) if !value.is_representable() => {
				warn!(key = %key, kind = %value.kind(), %scope, "Dropping value that cannot be serialized");
			}
			Some(value) => {
				self.individual(scope).lock().insert(key, value);
			}
			None => {
				self.individual(scope).lock().remove(&key);
			}
		}
	}

	/// Appends to the ordered sequence under `key`, creating it if absent.
	///
	/// A value JSON cannot carry is dropped.
	pub fn append_grouped(&self, scope: Scope, key: impl Into<String>, value: TrackedValue) {
		let key = key.into();
		if !value.is_representable() {
			warn!(key = %key, kind = %value.kind(), %scope, "Dropping grouped value that cannot be serialized");
			return;
		}
		self
			.grouped_container(scope)
			.lock()
			.entry(key)
			.or_default()
			.push(value);
	}

	pub fn get(&self, scope: Scope, key: &str) -> Option<TrackedValue> {
		self.individual(scope).lock().get(key).cloned()
	}

	/// Returns the grouped sequence under `key`, empty if none was recorded.
	pub fn grouped(&self, scope: Scope, key: &str) -> Vec<TrackedValue> {
		self
			.grouped_container(scope)
			.lock()
			.get(key)
			.cloned()
			.unwrap_or_default()
	}

	/// Copies the tracked values without removing them.
	pub fn tracked_snapshot(&self) -> TrackedValues {
		TrackedValues {
			individual: self.tracked_individual.lock().clone(),
			grouped: self.tracked_grouped.lock().clone(),
		}
	}

	/// Removes and returns the tracked values.
	///
	/// Each container is emptied in the same critical section that reads it,
	/// so a concurrent write lands either in the returned values or in the
	/// store, never in neither.
	pub fn take_tracked(&self) -> TrackedValues {
		TrackedValues {
			individual: std::mem::take(&mut *self.tracked_individual.lock()),
			grouped: std::mem::take(&mut *self.tracked_grouped.lock()),
		}
	}

	pub fn clear_tracked(&self) {
		self.tracked_individual.lock().clear();
		self.tracked_grouped.lock().clear();
	}

	pub fn clear_static(&self) {
		self.static_individual.lock().clear();
		self.static_grouped.lock().clear();
	}

	/// True iff no tracked value, individual or grouped, is stored.
	pub fn is_tracked_empty(&self) -> bool {
		self.tracked_individual.lock().is_empty()
			&& self.tracked_grouped.lock().values().all(Vec::is_empty)
	}

	/// Writes every individual value of `scope` at the top level of `payload`.
	pub fn write_individual(&self, scope: Scope, payload: &mut Map<String, Value>) {
		write_individual_map(&self.individual(scope).lock(), payload);
	}

	/// Writes every grouped sequence of `scope` as a top-level array in `payload`.
	pub fn write_grouped(&self, scope: Scope, payload: &mut Map<String, Value>) {
		write_grouped_map(&self.grouped_container(scope).lock(), payload);
	}
}

fn write_individual_map(values: &IndividualMap, payload: &mut Map<String, Value>) {
	for (key, value) in values {
		if let Some(json) = value.to_json() {
			payload.insert(key.clone(), json);
		}
	}
}

fn write_grouped_map(groups: &GroupedMap, payload: &mut Map<String, Value>) {
	for (key, items) in groups {
		let array = items.iter().filter_map(TrackedValue::to_json).collect();
		payload.insert(key.clone(), Value::Array(array));
	}
}
