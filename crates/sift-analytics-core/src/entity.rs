// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Trackable entities and impression identity.

use sha2::{Digest, Sha256};

use crate::record::Record;

/// Anything that can produce click and impression records.
///
/// Each capability may be declined by returning `None`.
pub trait TrackableEntity: Send + Sync {
	/// Record describing an impression of this entity, or `None` to disable
	/// impression tracking.
	///
	/// Must not contain timestamps or other per-frame data: the record's content
	/// is the entity's identity for deduplication. Visible area and capture time
	/// are added by the collector after identity is computed.
	fn impression_record(&self) -> Option<Record>;

	/// Record describing a click on this entity, or `None` to disable click tracking.
	fn click_record(&self) -> Option<Record>;

	/// Category ("API") label that partitions this entity's events in the
	/// payload, e.g. `search` stores clicks under `search_clicks`. `None` or an
	/// empty label uses the default `clicks` / `impressions` arrays.
	fn category(&self) -> Option<String>;
}

/// Category label of `entity`, with empty labels treated as absent.
pub fn partition_of(entity: &dyn TrackableEntity) -> Option<String> {
	entity.category().filter(|c| !c.is_empty())
}

/// Content-derived identity of an impression record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImpressionId(String);

impl ImpressionId {
	/// SHA-256 of the record's canonical string form.
	pub fn of(record: &Record) -> Self {
		let mut hasher = Sha256::new();
		hasher.update(record.canonical_string().as_bytes());
		Self(hex::encode(hasher.finalize()))
	}

	/// Identity of `entity`'s impression record, if it tracks impressions.
	pub fn for_entity(entity: &dyn TrackableEntity) -> Option<Self> {
		entity.impression_record().map(|record| Self::of(&record))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for ImpressionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}
