// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Click and impression collection, partitioned by category.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::entity::{partition_of, TrackableEntity};
use crate::keys;

type Event = Map<String, Value>;

/// Events of one type detached from the collector.
#[derive(Debug, Clone, Default, PartialEq)]
struct Events {
	default: Vec<Event>,
	by_category: BTreeMap<String, Vec<Event>>,
}

impl Events {
	fn is_empty(&self) -> bool {
		self.default.is_empty() && self.by_category.values().all(Vec::is_empty)
	}

	fn len(&self) -> usize {
		self.default.len() + self.by_category.values().map(Vec::len).sum::<usize>()
	}

	fn write_partitions(&self, payload: &mut Map<String, Value>, key_for: fn(&str) -> String) {
		for (category, events) in &self.by_category {
			if !events.is_empty() {
				payload.insert(key_for(category), to_array(events));
			}
		}
	}

	fn write_default(&self, payload: &mut Map<String, Value>, key: &str) {
		if !self.default.is_empty() {
			payload.insert(key.to_string(), to_array(&self.default));
		}
	}
}

fn to_array(events: &[Event]) -> Value {
	Value::Array(events.iter().cloned().map(Value::Object).collect())
}

/// Events of one type: a default list plus one list per category.
///
/// Writers to existing categories share the map's read lock and serialize on
/// the category's own list. Creating a category, clearing and draining take
/// the write lock, so none of them splits a concurrent append.
#[derive(Debug, Default)]
struct EventLog {
	default: Mutex<Vec<Event>>,
	by_category: RwLock<BTreeMap<String, Mutex<Vec<Event>>>>,
}

impl EventLog {
	fn push(&self, category: Option<&str>, event: Event) {
		let Some(category) = category else {
			self.default.lock().push(event);
			return;
		};

		{
			let partitions = self.by_category.read();
			if let Some(events) = partitions.get(category) {
				events.lock().push(event);
				return;
			}
		}

		self
			.by_category
			.write()
			.entry(category.to_string())
			.or_default()
			.get_mut()
			.push(event);
	}

	fn is_empty(&self) -> bool {
		self.default.lock().is_empty()
			&& self
				.by_category
				.read()
				.values()
				.all(|events| events.lock().is_empty())
	}

	fn clear(&self) {
		self.default.lock().clear();
		self.by_category.write().clear();
	}

	fn snapshot(&self) -> Events {
		let by_category = self
			.by_category
			.read()
			.iter()
			.map(|(category, events)| (category.clone(), events.lock().clone()))
			.collect();
		Events {
			default: self.default.lock().clone(),
			by_category,
		}
	}

	fn take(&self) -> Events {
		let by_category = std::mem::take(&mut *self.by_category.write())
			.into_iter()
			.map(|(category, events)| (category, events.into_inner()))
			.collect();
		Events {
			default: std::mem::take(&mut *self.default.lock()),
			by_category,
		}
	}

	fn category(&self, category: Option<&str>) -> Vec<Event> {
		match category {
			None => self.default.lock().clone(),
			Some(category) => self
				.by_category
				.read()
				.get(category)
				.map(|events| events.lock().clone())
				.unwrap_or_default(),
		}
	}
}

/// Clicks and impressions detached from an [`EventCollector`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedEvents {
	clicks: Events,
	impressions: Events,
}

impl CollectedEvents {
	pub fn is_empty(&self) -> bool {
		self.clicks.is_empty() && self.impressions.is_empty()
	}

	pub fn click_count(&self) -> usize {
		self.clicks.len()
	}

	pub fn impression_count(&self) -> usize {
		self.impressions.len()
	}

	/// Writes non-empty partitions as `<category>_clicks` / `<category>_impressions`
	/// followed by the default `clicks` / `impressions` arrays.
	pub fn write_into(&self, payload: &mut Map<String, Value>) {
		self.clicks.write_partitions(payload, keys::category_clicks);
		self
			.impressions
			.write_partitions(payload, keys::category_impressions);
		self.clicks.write_default(payload, keys::CLICKS);
		self.impressions.write_default(payload, keys::IMPRESSIONS);
	}
}

/// Accumulates clicks and impressions for the current session.
#[derive(Debug, Default)]
pub struct EventCollector {
	clicks: EventLog,
	impressions: EventLog,
}

impl EventCollector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a click on `entity`, tagged with `click_type`.
	///
	/// Returns false when the entity declines click tracking.
	pub fn record_click(&self, entity: &dyn TrackableEntity, click_type: &str) -> bool {
		let Some(mut record) = entity.click_record() else {
			return false;
		};
		record.set(keys::CLICK_TYPE, click_type);

		let category = partition_of(entity);
		debug!(
			category = category.as_deref().unwrap_or(keys::CLICKS),
			click_type,
			"Recorded click"
		);
		self.clicks.push(category.as_deref(), record.into_map());
		true
	}

	/// Records an impression of `entity` with the visible area fraction and the
	/// current time.
	///
	/// `area` is clamped to `[0, 1]`. A non-finite area is dropped from the
	/// record but the impression is kept. Returns false when the entity declines
	/// impression tracking.
	pub fn record_impression(&self, entity: &dyn TrackableEntity, area: f64) -> bool {
		let Some(mut record) = entity.impression_record() else {
			return false;
		};

		match Number::from_f64(area.clamp(0.0, 1.0)) {
			Some(area) => record.set(keys::AREA, area),
			None => warn!(area, "Dropping non-finite impression area"),
		}
		record.set(keys::TIMESTAMP, Utc::now().timestamp_millis());

		let category = partition_of(entity);
		debug!(
			category = category.as_deref().unwrap_or(keys::IMPRESSIONS),
			"Recorded impression"
		);
		self.impressions.push(category.as_deref(), record.into_map());
		true
	}

	/// True iff no click or impression is stored, in any partition.
	pub fn is_empty(&self) -> bool {
		self.clicks.is_empty() && self.impressions.is_empty()
	}

	pub fn clear(&self) {
		self.clicks.clear();
		self.impressions.clear();
	}

	/// Copies every stored event without removing it.
	pub fn snapshot(&self) -> CollectedEvents {
		CollectedEvents {
			clicks: self.clicks.snapshot(),
			impressions: self.impressions.snapshot(),
		}
	}

	/// Removes and returns every stored event.
	///
	/// An event recorded concurrently ends up either in the returned events or
	/// in the collector, never in neither.
	pub fn take(&self) -> CollectedEvents {
		CollectedEvents {
			clicks: self.clicks.take(),
			impressions: self.impressions.take(),
		}
	}

	pub fn click_count(&self) -> usize {
		self.snapshot().click_count()
	}

	pub fn impression_count(&self) -> usize {
		self.snapshot().impression_count()
	}

	/// Clicks stored in `category`, or in the default list for `None`.
	pub fn clicks(&self, category: Option<&str>) -> Vec<Map<String, Value>> {
		self.clicks.category(category)
	}

	/// Impressions stored in `category`, or in the default list for `None`.
	pub fn impressions(&self, category: Option<&str>) -> Vec<Map<String, Value>> {
		self.impressions.category(category)
	}

	pub fn write_into(&self, payload: &mut Map<String, Value>) {
		self.snapshot().write_into(payload);
	}
}
