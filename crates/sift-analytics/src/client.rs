// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The analytics client: recording API and session lifecycle.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use sift_analytics_core::{
	format_payload, format_session, keys, EventCollector, Payload, Scope, SessionData,
	TrackableEntity, TrackedValue, ValueStore,
};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::impression::{ImpressionTracker, ViewId};
use crate::reporting::{self, ApiPerformance, WINDOW_ID_HEADER};
use crate::session::SessionTracker;
use crate::session_store::{FileSessionIdStore, MemorySessionIdStore, SessionIdStore};
use crate::upload::{HttpUploader, PayloadUploader, UploadCommand, UploadDispatcher};

/// Receiver of application visibility transitions.
///
/// The host registers an implementation with its platform's foreground and
/// background signal.
pub trait LifecycleObserver: Send + Sync {
	/// The application became visible.
	fn on_foreground(&self);
	/// The application is no longer visible.
	fn on_background(&self);
}

/// Builder for constructing an [`Analytics`] client.
pub struct AnalyticsBuilder {
	config: AnalyticsConfig,
	uploader: Option<Arc<dyn PayloadUploader>>,
	session_store: Option<Arc<dyn SessionIdStore>>,
	runtime: Option<Handle>,
}

impl AnalyticsBuilder {
	/// Creates a new builder with default settings.
	pub fn new() -> Self {
		Self {
			config: AnalyticsConfig::default(),
			uploader: None,
			session_store: None,
			runtime: None,
		}
	}

	/// Replaces the whole configuration, e.g. one loaded from a file.
	pub fn config(mut self, config: AnalyticsConfig) -> Self {
		self.config = config;
		self
	}

	/// Sets the endpoint receiving session payloads.
	///
	/// Example: `https://api.example.com/v1/analytics`
	pub fn upload_url(mut self, url: impl Into<String>) -> Self {
		self.config.upload_url = Some(url.into());
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout_secs = timeout.as_secs().max(1);
		self
	}

	/// Sets how many uploads may wait in the queue before new ones are dropped.
	pub fn queue_capacity(mut self, capacity: usize) -> Self {
		self.config.queue_capacity = capacity;
		self
	}

	/// Logs each payload at debug level before upload.
	pub fn log_payloads(mut self, enabled: bool) -> Self {
		self.config.log_payloads = enabled;
		self
	}

	/// Persists the previous session id in the file at `path`.
	pub fn session_store_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.config.session_store_path = Some(path.into());
		self
	}

	/// Uses a custom uploader instead of the HTTP one.
	pub fn uploader(mut self, uploader: Arc<dyn PayloadUploader>) -> Self {
		self.uploader = Some(uploader);
		self
	}

	/// Uses a custom previous-session-id store.
	pub fn session_store(mut self, store: Arc<dyn SessionIdStore>) -> Self {
		self.session_store = Some(store);
		self
	}

	/// Runs the upload worker on `runtime` instead of the current one.
	pub fn runtime(mut self, runtime: Handle) -> Self {
		self.runtime = Some(runtime);
		self
	}

	/// Builds the client, loads the previous session id and starts the upload
	/// worker.
	///
	/// The client starts in the background state; call
	/// [`LifecycleObserver::on_foreground`] to open the first session.
	pub async fn build(self) -> Result<Analytics> {
		self.config.validate()?;

		let uploader: Arc<dyn PayloadUploader> = match (self.uploader, &self.config.upload_url) {
			(Some(uploader), _) => uploader,
			(None, Some(url)) => Arc::new(HttpUploader::new(
				url.clone(),
				Duration::from_secs(self.config.request_timeout_secs),
			)?),
			(None, None) => return Err(AnalyticsError::MissingUploader),
		};

		let session_store: Arc<dyn SessionIdStore> =
			match (self.session_store, &self.config.session_store_path) {
				(Some(store), _) => store,
				(None, Some(path)) => Arc::new(FileSessionIdStore::new(path.clone())),
				(None, None) => Arc::new(MemorySessionIdStore::new()),
			};

		let previous = match session_store.load().await {
			Ok(previous) => previous,
			Err(e) => {
				warn!(error = %e, "Failed to load previous session id, starting without one");
				None
			}
		};

		let dispatcher = UploadDispatcher::spawn(
			self.runtime,
			self.config.queue_capacity,
			uploader,
			session_store,
			self.config.log_payloads,
		)?;

		info!(
			previous_session_id = previous.as_deref().unwrap_or(keys::NO_SESSION),
			"Analytics client initialized"
		);

		Ok(Analytics {
			inner: Arc::new(AnalyticsInner {
				store: ValueStore::new(),
				collector: EventCollector::new(),
				impressions: ImpressionTracker::new(),
				session: SessionTracker::new(previous),
				dispatcher,
				transition: Mutex::new(()),
				closed: AtomicBool::new(false),
			}),
		})
	}
}

impl Default for AnalyticsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct AnalyticsInner {
	store: ValueStore,
	collector: EventCollector,
	impressions: ImpressionTracker,
	session: SessionTracker,
	dispatcher: UploadDispatcher,
	/// Serializes lifecycle transitions. Recording calls never take it.
	transition: Mutex<()>,
	closed: AtomicBool,
}

/// Session analytics for the search SDK.
///
/// Recording calls are cheap, never block on I/O and never fail. Payloads are
/// assembled on [`LifecycleObserver::on_background`] and uploaded by a
/// background worker.
///
/// # Example
///
/// ```ignore
/// use sift_analytics::{Analytics, LifecycleObserver, QueryHint};
///
/// let analytics = Analytics::builder()
///     .upload_url("https://api.example.com/v1/analytics")
///     .build()
///     .await?;
///
/// analytics.on_foreground();
/// analytics.track_click(&QueryHint::new("pizza"), "tap");
/// analytics.track_string("search_mode", "local", false);
/// analytics.on_background();
///
/// analytics.shutdown().await;
/// ```
#[derive(Clone)]
pub struct Analytics {
	inner: Arc<AnalyticsInner>,
}

impl Analytics {
	/// Creates a new builder for constructing an Analytics client.
	pub fn builder() -> AnalyticsBuilder {
		AnalyticsBuilder::new()
	}

	// Events

	/// Records a click on `entity`. Returns false when the entity declines
	/// click tracking.
	pub fn track_click(&self, entity: &dyn TrackableEntity, click_type: &str) -> bool {
		self.inner.collector.record_click(entity, click_type)
	}

	/// Binds `view` to the entity it displays so its impression is recorded
	/// once the view becomes visible enough.
	pub fn track_impressions(&self, view: ViewId, entity: Arc<dyn TrackableEntity>) {
		self.inner.impressions.bind(view, entity);
	}

	/// Reports the visible fraction of a bound view. Returns true when an
	/// impression was recorded.
	pub fn on_view_visibility_changed(&self, view: ViewId, fraction: f64) -> bool {
		match self.inner.impressions.on_visibility_changed(view, fraction) {
			Some(entity) => self.inner.collector.record_impression(entity.as_ref(), fraction),
			None => false,
		}
	}

	/// Forgets a destroyed view.
	pub fn detach_view(&self, view: ViewId) -> bool {
		self.inner.impressions.detach(view)
	}

	// Tracked values

	/// Records a session-scoped value. Grouped values accumulate into an array
	/// under `key`; individual values replace the previous one.
	pub fn track(&self, key: impl Into<String>, value: impl Into<TrackedValue>, grouped: bool) {
		let key = key.into();
		let value = value.into();
		debug!(key = %key, kind = %value.kind(), grouped, "Tracked value");
		if grouped {
			self.inner.store.append_grouped(Scope::Tracked, key, value);
		} else {
			self.inner.store.set_individual(Scope::Tracked, key, Some(value));
		}
	}

	pub fn track_object(&self, key: impl Into<String>, value: Map<String, Value>, grouped: bool) {
		self.track(key, value, grouped);
	}

	pub fn track_string(&self, key: impl Into<String>, value: impl Into<String>, grouped: bool) {
		let value: String = value.into();
		self.track(key, value, grouped);
	}

	pub fn track_int(&self, key: impl Into<String>, value: i64, grouped: bool) {
		self.track(key, value, grouped);
	}

	pub fn track_double(&self, key: impl Into<String>, value: f64, grouped: bool) {
		self.track(key, value, grouped);
	}

	pub fn track_array(&self, key: impl Into<String>, value: Vec<Value>, grouped: bool) {
		self.track(key, value, grouped);
	}

	// Static values

	/// Sets a value that survives session boundaries. `None` removes `key`.
	///
	/// Static values alone never make a session worth uploading.
	pub fn add(&self, key: impl Into<String>, value: Option<TrackedValue>) {
		self.inner.store.set_individual(Scope::Static, key, value);
	}

	pub fn add_object(&self, key: impl Into<String>, value: Option<Map<String, Value>>) {
		self.add(key, value.map(TrackedValue::from));
	}

	pub fn add_string(&self, key: impl Into<String>, value: Option<String>) {
		self.add(key, value.map(TrackedValue::from));
	}

	pub fn add_int(&self, key: impl Into<String>, value: Option<i64>) {
		self.add(key, value.map(TrackedValue::from));
	}

	pub fn add_double(&self, key: impl Into<String>, value: Option<f64>) {
		self.add(key, value.map(TrackedValue::from));
	}

	pub fn add_array(&self, key: impl Into<String>, value: Option<Vec<Value>>) {
		self.add(key, value.map(TrackedValue::from));
	}

	// Reporting

	pub fn track_api_performance(&self, performance: &ApiPerformance) {
		self.track_object(keys::API_PERFORMANCE, performance.to_object(), true);
	}

	/// Reports that `source` called the deprecated `method`.
	pub fn report_deprecated_use(&self, source: &str, method: &str) {
		self.track_object(keys::FAILURE, reporting::deprecated_use(source, method), true);
	}

	pub fn set_device_info(&self, info: Option<Map<String, Value>>) {
		self.add_object(keys::DEVICE_INFO, info);
	}

	pub fn set_config_info(&self, info: Option<Map<String, Value>>) {
		self.add_object(keys::CONFIG_INFO, info);
	}

	/// Header name and value to attach to outgoing search API requests.
	pub fn window_id_header(&self) -> (&'static str, String) {
		(WINDOW_ID_HEADER, self.current_session_id())
	}

	// Inspection

	/// The payload that would be uploaded if the session ended now.
	pub fn analytics_data(&self) -> Payload {
		let inner = &self.inner;
		format_payload(&inner.session.metadata(), &inner.store, &inner.collector)
	}

	/// Current session id, or `NO_VALUE` while backgrounded.
	pub fn current_session_id(&self) -> String {
		self.inner.session.current_id()
	}

	pub fn previous_session_id(&self) -> Option<String> {
		self.inner.session.previous_id()
	}

	pub fn empty_sessions(&self) -> u32 {
		self.inner.session.empty_sessions()
	}

	// Clearing

	pub fn clear_static_data(&self) {
		self.inner.store.clear_static();
	}

	/// Discards all session-scoped data without uploading it.
	pub fn clear_tracked_data(&self) {
		let inner = &self.inner;
		let _transition = inner.transition.lock();
		inner.collector.clear();
		inner.store.clear_tracked();
		inner.impressions.on_session_boundary();
		inner.session.reset_empty();
		debug!("Cleared tracked analytics data");
	}

	// Shutdown

	/// Stops accepting uploads and waits for queued ones to finish.
	pub async fn shutdown(&self) {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return;
		}
		info!("Shutting down analytics client");
		self.inner.dispatcher.shutdown().await;
	}

	pub fn is_shutdown(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}
}

impl LifecycleObserver for Analytics {
	fn on_foreground(&self) {
		let _transition = self.inner.transition.lock();
		let id = self.inner.session.start();
		info!(session_id = %id, "Analytics session started");
	}

	fn on_background(&self) {
		let inner = &self.inner;
		let _transition = inner.transition.lock();

		if self.is_shutdown() {
			warn!("Analytics client is shut down, keeping session data unsent");
			inner.session.end();
			return;
		}

		let session = SessionData::drain(&inner.store, &inner.collector);
		if session.is_empty() {
			let empty_sessions = inner.session.increment_empty();
			info!(empty_sessions, "Analytics session ended empty, skipping upload");
		} else {
			let payload = format_session(&inner.session.metadata(), &inner.store, &session);
			let uploaded = payload.session_id().unwrap_or(keys::NO_SESSION).to_string();

			inner
				.dispatcher
				.dispatch(UploadCommand::Upload(payload.to_json_string()));
			if let Some(id) = inner.session.complete_upload() {
				inner.dispatcher.dispatch(UploadCommand::PersistSessionId(id));
			}
			inner.impressions.on_session_boundary();

			info!(session_id = %uploaded, fields = payload.len(), "Analytics session queued for upload");
		}

		inner.session.end();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use serde_json::json;

	#[derive(Default)]
	struct Discard;

	#[async_trait]
	impl PayloadUploader for Discard {
		async fn upload(&self, _payload: &str) -> Result<()> {
			Ok(())
		}
	}

	async fn client() -> Analytics {
		Analytics::builder()
			.uploader(Arc::new(Discard))
			.build()
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn test_build_without_destination_fails() {
		let result = Analytics::builder().build().await;
		assert!(matches!(result, Err(AnalyticsError::MissingUploader)));
	}

	#[tokio::test]
	async fn test_build_rejects_invalid_url() {
		let result = Analytics::builder().upload_url("localhost:8080").build().await;
		assert!(matches!(result, Err(AnalyticsError::Config(_))));
	}

	#[tokio::test]
	async fn test_build_with_http_url() {
		let analytics = Analytics::builder()
			.upload_url("http://127.0.0.1:9/analytics")
			.request_timeout(Duration::from_secs(2))
			.build()
			.await
			.unwrap();
		assert!(!analytics.is_shutdown());
		analytics.shutdown().await;
		assert!(analytics.is_shutdown());
	}

	#[tokio::test]
	async fn test_build_loads_previous_session_id() {
		let analytics = Analytics::builder()
			.uploader(Arc::new(Discard))
			.session_store(Arc::new(MemorySessionIdStore::with_id("from-last-run")))
			.build()
			.await
			.unwrap();

		assert_eq!(analytics.previous_session_id().as_deref(), Some("from-last-run"));
		assert_eq!(
			analytics.analytics_data().previous_session_id(),
			Some("from-last-run")
		);
	}

	#[tokio::test]
	async fn test_starts_in_background() {
		let analytics = client().await;
		assert_eq!(analytics.current_session_id(), keys::NO_SESSION);

		analytics.on_foreground();
		assert_ne!(analytics.current_session_id(), keys::NO_SESSION);
	}

	#[tokio::test]
	async fn test_typed_tracking_lands_in_payload() {
		let analytics = client().await;
		let mut object = Map::new();
		object.insert("a".to_string(), json!(1));

		analytics.track_object("obj", object, false);
		analytics.track_string("str", "v", false);
		analytics.track_int("int", 7, false);
		analytics.track_double("dbl", 1.5, false);
		analytics.track_array("arr", vec![json!(1), json!("x")], false);

		let data = analytics.analytics_data();
		assert_eq!(data.get("obj"), Some(&json!({"a": 1})));
		assert_eq!(data.get("str"), Some(&json!("v")));
		assert_eq!(data.get("int"), Some(&json!(7)));
		assert_eq!(data.get("dbl"), Some(&json!(1.5)));
		assert_eq!(data.get("arr"), Some(&json!([1, "x"])));
	}

	#[tokio::test]
	async fn test_non_finite_double_is_dropped() {
		let analytics = client().await;
		analytics.track_double("bad", f64::INFINITY, false);
		analytics.track_double("bad_grouped", f64::NAN, true);
		let data = analytics.analytics_data();
		assert!(!data.contains_key("bad"));
		assert!(!data.contains_key("bad_grouped"));
	}

	#[tokio::test]
	async fn test_window_id_header_follows_session() {
		let analytics = client().await;
		assert_eq!(
			analytics.window_id_header(),
			("analytics_window_id", keys::NO_SESSION.to_string())
		);

		analytics.on_foreground();
		let (name, value) = analytics.window_id_header();
		assert_eq!(name, "analytics_window_id");
		assert_eq!(value, analytics.current_session_id());
	}

	#[tokio::test]
	async fn test_reporting_helpers() {
		let analytics = client().await;
		analytics.report_deprecated_use("SearchClient", "autosuggest");
		analytics.track_api_performance(&ApiPerformance {
			request_id: None,
			status_code: 200,
			start_time: 1,
			url: "https://api.example.com".into(),
			api_type: "search".into(),
			round_trip_time: 12,
		});
		let mut device = Map::new();
		device.insert("os".to_string(), json!("linux"));
		analytics.set_device_info(Some(device));

		let data = analytics.analytics_data();
		assert_eq!(data.get("failure").unwrap().as_array().unwrap().len(), 1);
		assert_eq!(data.get("api_performance").unwrap()[0]["status_code"], json!(200));
		assert_eq!(data.get("device_info"), Some(&json!({"os": "linux"})));

		analytics.set_device_info(None);
		assert!(!analytics.analytics_data().contains_key("device_info"));
	}

	#[tokio::test]
	async fn test_clear_tracked_data_resets_counter_and_impressions() {
		let analytics = client().await;
		analytics.on_background();
		assert_eq!(analytics.empty_sessions(), 1);

		analytics.track_string("k", "v", false);
		analytics.clear_tracked_data();

		assert_eq!(analytics.empty_sessions(), 0);
		assert!(!analytics.analytics_data().contains_key("k"));
	}

	#[tokio::test]
	async fn test_shutdown_is_idempotent() {
		let analytics = client().await;
		analytics.shutdown().await;
		analytics.shutdown().await;
		assert!(analytics.is_shutdown());
	}
}
