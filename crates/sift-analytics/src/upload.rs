// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background delivery of session payloads.
//!
//! Lifecycle callbacks never wait on the network or the disk. They hand a
//! [`UploadCommand`] to the [`UploadDispatcher`], whose worker task runs the
//! commands one at a time in submission order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Url};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::parse_upload_url;
use crate::error::{AnalyticsError, Result};
use crate::session_store::SessionIdStore;

/// Characters per debug line when payload logging is enabled.
pub const LOG_CHUNK_CHARS: usize = 1000;

/// Delivers one serialized payload.
#[async_trait]
pub trait PayloadUploader: Send + Sync {
	async fn upload(&self, payload: &str) -> Result<()>;
}

/// Posts payloads as JSON to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpUploader {
	client: Client,
	url: Url,
}

impl HttpUploader {
	pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
		let url = url.into();
		let url = parse_upload_url(&url).map_err(|_| AnalyticsError::InvalidUploadUrl(url))?;

		let client = sift_common_http::builder()
			.timeout(timeout)
			.build()
			.map_err(AnalyticsError::RequestFailed)?;

		Ok(Self { client, url })
	}
}

#[async_trait]
impl PayloadUploader for HttpUploader {
	async fn upload(&self, payload: &str) -> Result<()> {
		let response = self
			.client
			.post(self.url.clone())
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.body(payload.to_string())
			.send()
			.await?;

		if response.status().is_success() {
			debug!(url = %self.url, bytes = payload.len(), "Uploaded session payload");
			Ok(())
		} else {
			let status = response.status().as_u16();
			let message = response.text().await.unwrap_or_default();
			Err(AnalyticsError::ServerError { status, message })
		}
	}
}

/// Work handed to the upload worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadCommand {
	/// Deliver a serialized payload.
	Upload(String),
	/// Record the id of the session that was just uploaded.
	PersistSessionId(String),
}

/// Bounded queue feeding a single background worker.
pub struct UploadDispatcher {
	tx: Mutex<Option<mpsc::Sender<UploadCommand>>>,
	worker: Mutex<Option<JoinHandle<()>>>,
}

impl UploadDispatcher {
	/// Starts the worker on `runtime`, or on the current runtime when `None`.
	pub fn spawn(
		runtime: Option<Handle>,
		capacity: usize,
		uploader: Arc<dyn PayloadUploader>,
		session_store: Arc<dyn SessionIdStore>,
		log_payloads: bool,
	) -> Result<Self> {
		let runtime = match runtime {
			Some(handle) => handle,
			None => Handle::try_current().map_err(|_| AnalyticsError::NoRuntime)?,
		};

		let (tx, rx) = mpsc::channel(capacity.max(1));
		let worker = runtime.spawn(run_worker(rx, uploader, session_store, log_payloads));

		info!(capacity, "Upload worker started");

		Ok(Self {
			tx: Mutex::new(Some(tx)),
			worker: Mutex::new(Some(worker)),
		})
	}

	/// Queues `command` without waiting.
	///
	/// Returns false, logging a warning, when the queue is full or the
	/// dispatcher has shut down.
	pub fn dispatch(&self, command: UploadCommand) -> bool {
		let guard = self.tx.lock();
		let Some(tx) = guard.as_ref() else {
			warn!(error = %AnalyticsError::ClientShutdown, "Dropping upload command");
			return false;
		};

		match tx.try_send(command) {
			Ok(()) => true,
			Err(TrySendError::Full(command)) => {
				warn!(command = command.kind(), "Upload queue full, dropping command");
				false
			}
			Err(TrySendError::Closed(command)) => {
				warn!(command = command.kind(), "Upload worker stopped, dropping command");
				false
			}
		}
	}

	pub fn is_shutdown(&self) -> bool {
		self.tx.lock().is_none()
	}

	/// Closes the queue and waits for every queued command to finish.
	pub async fn shutdown(&self) {
		drop(self.tx.lock().take());

		let worker = self.worker.lock().take();
		if let Some(worker) = worker {
			if let Err(e) = worker.await {
				error!(error = %e, "Upload worker terminated abnormally");
			}
		}
	}
}

impl UploadCommand {
	fn kind(&self) -> &'static str {
		match self {
			Self::Upload(_) => "upload",
			Self::PersistSessionId(_) => "persist_session_id",
		}
	}
}

async fn run_worker(
	mut rx: mpsc::Receiver<UploadCommand>,
	uploader: Arc<dyn PayloadUploader>,
	session_store: Arc<dyn SessionIdStore>,
	log_payloads: bool,
) {
	while let Some(command) = rx.recv().await {
		match command {
			UploadCommand::Upload(body) => {
				if log_payloads {
					log_payload(&body);
				}
				if let Err(e) = uploader.upload(&body).await {
					error!(error = %e, "Failed to upload session payload");
				}
			}
			UploadCommand::PersistSessionId(id) => {
				if let Err(e) = session_store.save(&id).await {
					warn!(error = %e, session_id = %id, "Failed to persist previous session id");
				}
			}
		}
	}

	info!("Upload worker stopped");
}

fn log_payload(body: &str) {
	let chunks = chunk_chars(body, LOG_CHUNK_CHARS);
	let total = chunks.len();
	for (index, chunk) in chunks.into_iter().enumerate() {
		debug!(part = index + 1, total, payload = chunk, "Session payload");
	}
}

/// Splits `s` into pieces of at most `size` characters.
pub(crate) fn chunk_chars(s: &str, size: usize) -> Vec<&str> {
	let size = size.max(1);
	let mut chunks = Vec::new();
	let mut start = 0;
	let mut count = 0;

	for (index, _) in s.char_indices() {
		if count == size {
			chunks.push(&s[start..index]);
			start = index;
			count = 0;
		}
		count += 1;
	}
	if start < s.len() {
		chunks.push(&s[start..]);
	}
	chunks
}
