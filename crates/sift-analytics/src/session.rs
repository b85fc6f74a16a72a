// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session identity and empty-session bookkeeping.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sift_analytics_core::{keys, SessionMetadata};
use uuid::Uuid;

/// Random identifier issued on every foreground transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
	#[must_use]
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for SessionId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for SessionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::str::FromStr for SessionId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

#[derive(Debug, Default)]
struct SessionState {
	current: Option<SessionId>,
	previous: Option<String>,
	empty_sessions: u32,
}

/// Current and previous session ids plus the empty-session counter.
///
/// The previous id lives here in memory; durable persistence is the caller's
/// job so that no transition performs I/O.
#[derive(Debug, Default)]
pub struct SessionTracker {
	state: Mutex<SessionState>,
}

impl SessionTracker {
	pub fn new(previous: Option<String>) -> Self {
		Self {
			state: Mutex::new(SessionState {
				previous,
				..Default::default()
			}),
		}
	}

	/// Issues a fresh id, replacing any active one.
	pub fn start(&self) -> SessionId {
		let id = SessionId::new();
		self.state.lock().current = Some(id);
		id
	}

	/// Resets the current id to the sentinel.
	pub fn end(&self) {
		self.state.lock().current = None;
	}

	/// Current id, or [`keys::NO_SESSION`] while backgrounded.
	pub fn current_id(&self) -> String {
		self
			.state
			.lock()
			.current
			.map_or_else(|| keys::NO_SESSION.to_string(), |id| id.to_string())
	}

	pub fn previous_id(&self) -> Option<String> {
		self.state.lock().previous.clone()
	}

	pub fn empty_sessions(&self) -> u32 {
		self.state.lock().empty_sessions
	}

	/// Metadata for a payload built right now.
	pub fn metadata(&self) -> SessionMetadata {
		let state = self.state.lock();
		SessionMetadata {
			session_id: state
				.current
				.map_or_else(|| keys::NO_SESSION.to_string(), |id| id.to_string()),
			empty_sessions: state.empty_sessions,
			previous_session_id: state.previous.clone(),
		}
	}

	/// Marks the current session as uploaded: it becomes the previous session
	/// and the empty counter restarts. Returns the id to persist, or `None`
	/// when no session was active.
	pub fn complete_upload(&self) -> Option<String> {
		let mut state = self.state.lock();
		state.empty_sessions = 0;
		let id = state.current?.to_string();
		state.previous = Some(id.clone());
		Some(id)
	}

	pub fn increment_empty(&self) -> u32 {
		let mut state = self.state.lock();
		state.empty_sessions = state.empty_sessions.saturating_add(1);
		state.empty_sessions
	}

	pub fn reset_empty(&self) {
		self.state.lock().empty_sessions = 0;
	}
}
