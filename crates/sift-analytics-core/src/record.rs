// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Builder for click and impression records.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A JSON object describing one click or impression.
///
/// # Example
///
/// ```
/// use sift_analytics_core::Record;
///
/// let record = Record::new()
///     .insert("hint", "pizza near me")
///     .insert("request_id", "req_123")
///     .insert("rank", 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
	inner: Map<String, Value>,
}

impl Record {
	pub fn new() -> Self {
		Self { inner: Map::new() }
	}

	/// Inserts a field, replacing any existing value under `key`.
	pub fn insert<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into());
		self
	}

	/// Inserts a field only when `value` is present.
	pub fn insert_opt<K, V>(self, key: K, value: Option<V>) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		match value {
			Some(value) => self.insert(key, value),
			None => self,
		}
	}

	/// Sets a field in place.
	pub fn set<K, V>(&mut self, key: K, value: V)
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into());
	}

	/// Merges another record into this one; `other` wins on shared keys.
	pub fn merge(mut self, other: Record) -> Self {
		for (k, v) in other.inner {
			self.inner.insert(k, v);
		}
		self
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.inner.get(key)
	}

	/// Serialized form with keys in sorted order.
	///
	/// Two records with the same fields produce the same string regardless of
	/// insertion order.
	pub fn canonical_string(&self) -> String {
		let sorted: BTreeMap<&String, &Value> = self.inner.iter().collect();
		serde_json::to_string(&sorted).unwrap_or_default()
	}

	pub fn into_map(self) -> Map<String, Value> {
		self.inner
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.inner)
	}
}

impl From<Record> for Value {
	fn from(record: Record) -> Self {
		record.into_value()
	}
}

impl From<Value> for Record {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(map) => Self { inner: map },
			_ => Self::new(),
		}
	}
}

impl From<Map<String, Value>> for Record {
	fn from(map: Map<String, Value>) -> Self {
		Self { inner: map }
	}
}
