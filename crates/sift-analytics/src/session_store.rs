// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable storage of the previous session id.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};

/// Persists the id of the last session that produced an upload.
#[async_trait]
pub trait SessionIdStore: Send + Sync {
	async fn load(&self) -> Result<Option<String>>;
	async fn save(&self, session_id: &str) -> Result<()>;
}

/// Stores the previous session id in a single file.
///
/// Writes go to a sibling `.tmp` file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileSessionIdStore {
	path: PathBuf,
}

impl FileSessionIdStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Store under the XDG data directory: `~/.local/share/sift/analytics/previous_session`.
	pub fn from_xdg() -> Result<Self> {
		let data_dir = dirs::data_dir().ok_or_else(|| {
			AnalyticsError::SessionStore(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				"could not determine XDG data directory",
			))
		})?;

		let path = data_dir.join("sift").join("analytics").join("previous_session");
		info!(path = %path.display(), "initialized session id store");

		Ok(Self::new(path))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn tmp_path(&self) -> PathBuf {
		let mut name = self
			.path
			.file_name()
			.map(|n| n.to_os_string())
			.unwrap_or_default();
		name.push(".tmp");
		self.path.with_file_name(name)
	}
}

#[async_trait]
impl SessionIdStore for FileSessionIdStore {
	async fn load(&self) -> Result<Option<String>> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "session id file not found");
			return Ok(None);
		}

		let contents = tokio::fs::read_to_string(&self.path).await?;
		let id = contents.trim();
		if id.is_empty() {
			return Ok(None);
		}

		debug!(session_id = id, "loaded previous session id");
		Ok(Some(id.to_string()))
	}

	async fn save(&self, session_id: &str) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}

		let tmp_path = self.tmp_path();
		tokio::fs::write(&tmp_path, session_id).await?;
		tokio::fs::rename(&tmp_path, &self.path).await?;

		debug!(session_id, path = %self.path.display(), "saved previous session id");
		Ok(())
	}
}

/// Keeps the previous session id for the life of the process only.
#[derive(Debug, Default)]
pub struct MemorySessionIdStore {
	id: Mutex<Option<String>>,
}

impl MemorySessionIdStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_id(session_id: impl Into<String>) -> Self {
		Self {
			id: Mutex::new(Some(session_id.into())),
		}
	}
}

#[async_trait]
impl SessionIdStore for MemorySessionIdStore {
	async fn load(&self) -> Result<Option<String>> {
		Ok(self.id.lock().clone())
	}

	async fn save(&self, session_id: &str) -> Result<()> {
		*self.id.lock() = Some(session_id.to_string());
		Ok(())
	}
}
