// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The tagged value type stored under caller keys.

use serde_json::{Map, Number, Value};

use crate::error::{Result, ValueError};

/// The five kinds of value a caller may record.
///
/// Declaration order is the fixed serialization order across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
	Object,
	String,
	Integer,
	Double,
	Array,
}

impl std::fmt::Display for ValueKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ValueKind::Object => write!(f, "object"),
			ValueKind::String => write!(f, "string"),
			ValueKind::Integer => write!(f, "integer"),
			ValueKind::Double => write!(f, "double"),
			ValueKind::Array => write!(f, "array"),
		}
	}
}

/// A JSON-compliant value associated with a caller key.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedValue {
	Object(Map<String, Value>),
	String(String),
	Integer(i64),
	Double(f64),
	Array(Vec<Value>),
}

impl TrackedValue {
	pub fn kind(&self) -> ValueKind {
		match self {
			TrackedValue::Object(_) => ValueKind::Object,
			TrackedValue::String(_) => ValueKind::String,
			TrackedValue::Integer(_) => ValueKind::Integer,
			TrackedValue::Double(_) => ValueKind::Double,
			TrackedValue::Array(_) => ValueKind::Array,
		}
	}

	/// False for a non-finite double, which JSON cannot carry.
	pub fn is_representable(&self) -> bool {
		!matches!(self, TrackedValue::Double(d) if !d.is_finite())
	}

	/// Converts into a JSON value.
	///
	/// Returns `None` for a non-finite double, which JSON cannot carry.
	pub fn to_json(&self) -> Option<Value> {
		match self {
			TrackedValue::Object(map) => Some(Value::Object(map.clone())),
			TrackedValue::String(s) => Some(Value::String(s.clone())),
			TrackedValue::Integer(i) => Some(Value::Number((*i).into())),
			TrackedValue::Double(d) => Number::from_f64(*d).map(Value::Number),
			TrackedValue::Array(items) => Some(Value::Array(items.clone())),
		}
	}

	pub fn as_object(&self) -> Option<&Map<String, Value>> {
		match self {
			TrackedValue::Object(map) => Some(map),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			TrackedValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			TrackedValue::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			TrackedValue::Double(d) => Some(*d),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&[Value]> {
		match self {
			TrackedValue::Array(items) => Some(items),
			_ => None,
		}
	}
}

impl From<Map<String, Value>> for TrackedValue {
	fn from(map: Map<String, Value>) -> Self {
		TrackedValue::Object(map)
	}
}

impl From<String> for TrackedValue {
	fn from(s: String) -> Self {
		TrackedValue::String(s)
	}
}

impl From<&str> for TrackedValue {
	fn from(s: &str) -> Self {
		TrackedValue::String(s.to_string())
	}
}

impl From<i64> for TrackedValue {
	fn from(i: i64) -> Self {
		TrackedValue::Integer(i)
	}
}

impl From<i32> for TrackedValue {
	fn from(i: i32) -> Self {
		TrackedValue::Integer(i64::from(i))
	}
}

impl From<f64> for TrackedValue {
	fn from(d: f64) -> Self {
		TrackedValue::Double(d)
	}
}

impl From<Vec<Value>> for TrackedValue {
	fn from(items: Vec<Value>) -> Self {
		TrackedValue::Array(items)
	}
}

impl TryFrom<Value> for TrackedValue {
	type Error = ValueError;

	fn try_from(value: Value) -> Result<Self> {
		match value {
			Value::Object(map) => Ok(TrackedValue::Object(map)),
			Value::String(s) => Ok(TrackedValue::String(s)),
			Value::Array(items) => Ok(TrackedValue::Array(items)),
			Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Ok(TrackedValue::Integer(i))
				} else if n.is_f64() {
					n.as_f64()
						.map(TrackedValue::Double)
						.ok_or_else(|| ValueError::UnrepresentableNumber(n.to_string()))
				} else {
					Err(ValueError::UnrepresentableNumber(n.to_string()))
				}
			}
			Value::Bool(_) => Err(ValueError::Unsupported("bool")),
			Value::Null => Err(ValueError::Unsupported("null")),
		}
	}
}
