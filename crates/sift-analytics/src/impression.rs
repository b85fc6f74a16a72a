// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Impression deduplication and view bindings.
//!
//! The host UI owns its views. It binds a view to the entity it displays,
//! reports visibility changes, and detaches the view when it is destroyed.
//! An impression is recorded at most once per entity content per session,
//! and content already recorded in the previous session is suppressed too.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use sift_analytics_core::{ImpressionId, TrackableEntity};
use tracing::debug;

/// Visible fraction of a view's area that qualifies as an impression.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// Host-assigned identifier of an on-screen view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl std::fmt::Display for ViewId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "view#{}", self.0)
	}
}

struct ViewBinding {
	entity: Arc<dyn TrackableEntity>,
	crossed: bool,
}

#[derive(Default)]
struct Identities {
	current: HashSet<ImpressionId>,
	previous: HashSet<ImpressionId>,
}

/// Registry of bound views and recorded impression identities.
#[derive(Default)]
pub struct ImpressionTracker {
	identities: Mutex<Identities>,
	views: Mutex<HashMap<ViewId, ViewBinding>>,
}

impl ImpressionTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Claims `entity`'s impression for this session.
	///
	/// False when the entity declines impressions, or its content was already
	/// recorded this session or in the previous one.
	pub fn should_record(&self, entity: &dyn TrackableEntity) -> bool {
		let Some(id) = ImpressionId::for_entity(entity) else {
			return false;
		};

		let mut identities = self.identities.lock();
		if identities.current.contains(&id) || identities.previous.contains(&id) {
			debug!(impression_id = %id, "Suppressing duplicate impression");
			return false;
		}
		identities.current.insert(id);
		true
	}

	/// Binds `view` to `entity`, replacing any earlier binding of that view.
	pub fn bind(&self, view: ViewId, entity: Arc<dyn TrackableEntity>) {
		let replaced = self
			.views
			.lock()
			.insert(
				view,
				ViewBinding {
					entity,
					crossed: false,
				},
			)
			.is_some();
		debug!(%view, replaced, "Bound view for impression tracking");
	}

	/// Reports the visible fraction of `view`.
	///
	/// Returns the entity to record when the fraction first reaches
	/// [`VISIBILITY_THRESHOLD`] since the last bind and the impression has not
	/// been seen yet. Unbound views are ignored.
	pub fn on_visibility_changed(
		&self,
		view: ViewId,
		fraction: f64,
	) -> Option<Arc<dyn TrackableEntity>> {
		if fraction.is_nan() || fraction < VISIBILITY_THRESHOLD {
			return None;
		}

		let entity = {
			let mut views = self.views.lock();
			let binding = views.get_mut(&view)?;
			if binding.crossed {
				return None;
			}
			binding.crossed = true;
			Arc::clone(&binding.entity)
		};

		self.should_record(entity.as_ref()).then_some(entity)
	}

	/// Drops the binding for a destroyed view. Returns false if it was not bound.
	pub fn detach(&self, view: ViewId) -> bool {
		self.views.lock().remove(&view).is_some()
	}

	/// Rolls the current identities into the previous-session snapshot and
	/// discards every view binding.
	pub fn on_session_boundary(&self) {
		{
			let mut identities = self.identities.lock();
			identities.previous = std::mem::take(&mut identities.current);
		}
		let detached = {
			let mut views = self.views.lock();
			let count = views.len();
			views.clear();
			count
		};
		debug!(detached, "Impression tracker crossed session boundary");
	}

	pub fn bound_views(&self) -> usize {
		self.views.lock().len()
	}

	/// Identities recorded in the current session.
	pub fn recorded_count(&self) -> usize {
		self.identities.lock().current.len()
	}
}
