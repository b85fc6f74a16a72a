// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use sift_analytics::{
	keys, Analytics, AutoSuggestion, FileSessionIdStore, LifecycleObserver, LinkResult,
	PayloadUploader, QueryHint, Result, SessionIdStore, ViewId,
};

#[derive(Default)]
struct RecordingUploader {
	payloads: Mutex<Vec<String>>,
}

impl RecordingUploader {
	fn payloads(&self) -> Vec<Value> {
		self
			.payloads
			.lock()
			.iter()
			.map(|p| serde_json::from_str(p).unwrap())
			.collect()
	}
}

#[async_trait]
impl PayloadUploader for RecordingUploader {
	async fn upload(&self, payload: &str) -> Result<()> {
		self.payloads.lock().push(payload.to_string());
		Ok(())
	}
}

async fn setup() -> (Analytics, Arc<RecordingUploader>) {
	let uploader = Arc::new(RecordingUploader::default());
	let analytics = Analytics::builder()
		.uploader(uploader.clone())
		.build()
		.await
		.unwrap();
	(analytics, uploader)
}

fn object(pairs: &[(&str, Value)]) -> Map<String, Value> {
	pairs
		.iter()
		.map(|(k, v)| (k.to_string(), v.clone()))
		.collect()
}

#[tokio::test]
async fn test_static_value_set_then_removed() {
	let (analytics, _) = setup().await;

	analytics.add_int("launches", Some(3));
	assert_eq!(analytics.analytics_data().get("launches"), Some(&json!(3)));

	analytics.add_int("launches", None);
	assert!(!analytics.analytics_data().contains_key("launches"));

	// Removing a missing key is a no-op.
	analytics.add_string("never_set", None);
	assert!(!analytics.analytics_data().contains_key("never_set"));
}

#[tokio::test]
async fn test_static_only_session_is_not_uploaded() {
	let (analytics, uploader) = setup().await;

	analytics.on_foreground();
	analytics.add_string("sdk_key", Some("key_live_123".to_string()));
	analytics.add_object("config_info", Some(object(&[("locale", json!("en-US"))])));
	analytics.on_background();
	analytics.shutdown().await;

	assert!(uploader.payloads().is_empty());
	assert_eq!(analytics.empty_sessions(), 1);
}

#[tokio::test]
async fn test_tracked_value_triggers_upload_and_is_cleared() {
	let (analytics, uploader) = setup().await;

	analytics.on_foreground();
	analytics.track_string("search_mode", "offline", false);
	analytics.on_background();
	analytics.shutdown().await;

	let payloads = uploader.payloads();
	assert_eq!(payloads.len(), 1);
	assert_eq!(payloads[0]["search_mode"], json!("offline"));
	assert!(!analytics.analytics_data().contains_key("search_mode"));
}

#[tokio::test]
async fn test_static_values_survive_upload() {
	let (analytics, uploader) = setup().await;

	analytics.add_string("sdk_key", Some("key_live_123".to_string()));
	analytics.on_foreground();
	analytics.track_int("results", 4, false);
	analytics.on_background();
	analytics.shutdown().await;

	assert_eq!(uploader.payloads()[0]["sdk_key"], json!("key_live_123"));
	assert_eq!(analytics.analytics_data().get("sdk_key"), Some(&json!("key_live_123")));

	analytics.clear_static_data();
	assert!(!analytics.analytics_data().contains_key("sdk_key"));
}

#[tokio::test]
async fn test_grouped_values_preserve_order() {
	let (analytics, uploader) = setup().await;

	analytics.on_foreground();
	analytics.track_object("k", object(&[("n", json!(1))]), true);
	analytics.track_object("k", object(&[("n", json!(2))]), true);
	analytics.on_background();
	analytics.shutdown().await;

	assert_eq!(uploader.payloads()[0]["k"], json!([{"n": 1}, {"n": 2}]));
}

#[tokio::test]
async fn test_individual_value_is_overwritten() {
	let (analytics, _) = setup().await;

	analytics.track_int("count", 1, false);
	analytics.track_int("count", 2, false);
	assert_eq!(analytics.analytics_data().get("count"), Some(&json!(2)));
}

#[tokio::test]
async fn test_impression_recorded_once_per_content() {
	let (analytics, uploader) = setup().await;
	analytics.on_foreground();

	let hint = Arc::new(QueryHint::new("pizza").with_request_id("req_1"));
	analytics.track_impressions(ViewId(1), hint.clone());
	analytics.track_impressions(ViewId(1), hint.clone());
	assert!(!analytics.on_view_visibility_changed(ViewId(1), 0.3));
	assert!(analytics.on_view_visibility_changed(ViewId(1), 0.6));
	assert!(!analytics.on_view_visibility_changed(ViewId(1), 1.0));

	// Another view showing identical content adds nothing.
	analytics.track_impressions(ViewId(2), Arc::new(QueryHint::new("pizza").with_request_id("req_1")));
	assert!(!analytics.on_view_visibility_changed(ViewId(2), 1.0));

	analytics.on_background();
	analytics.shutdown().await;

	let payload = &uploader.payloads()[0];
	let impressions = payload["hints_impressions"].as_array().unwrap();
	assert_eq!(impressions.len(), 1);
	assert_eq!(impressions[0]["hint"], json!("pizza"));
	assert_eq!(impressions[0]["area"], json!(0.6));
	assert!(impressions[0]["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_previous_session_impressions_are_suppressed() {
	let (analytics, uploader) = setup().await;
	let result = Arc::new(LinkResult::new("ent_1").with_request_id("req_1").with_rank(0));

	analytics.on_foreground();
	analytics.track_impressions(ViewId(1), result.clone());
	assert!(analytics.on_view_visibility_changed(ViewId(1), 1.0));
	analytics.on_background();
	analytics.on_foreground();

	// The view still shows the old result before fresh data arrives.
	assert!(!analytics.on_view_visibility_changed(ViewId(1), 1.0));
	analytics.track_impressions(ViewId(1), result.clone());
	assert!(!analytics.on_view_visibility_changed(ViewId(1), 1.0));

	// Fresh content records normally.
	analytics.track_impressions(ViewId(1), Arc::new(LinkResult::new("ent_2").with_request_id("req_2")));
	assert!(analytics.on_view_visibility_changed(ViewId(1), 1.0));

	analytics.on_background();
	analytics.shutdown().await;

	let payloads = uploader.payloads();
	assert_eq!(payloads.len(), 2);
	assert_eq!(payloads[0]["search_impressions"].as_array().unwrap().len(), 1);
	let second = payloads[1]["search_impressions"].as_array().unwrap();
	assert_eq!(second.len(), 1);
	assert_eq!(second[0]["entity_id"], json!("ent_2"));
}

#[tokio::test]
async fn test_detached_view_records_nothing() {
	let (analytics, _) = setup().await;
	analytics.on_foreground();

	analytics.track_impressions(ViewId(5), Arc::new(AutoSuggestion::new("pizza hut")));
	assert!(analytics.detach_view(ViewId(5)));
	assert!(!analytics.on_view_visibility_changed(ViewId(5), 1.0));
	assert!(!analytics.analytics_data().contains_key("autosuggest_impressions"));
}

#[tokio::test]
async fn test_clicks_partition_by_category() {
	let (analytics, uploader) = setup().await;
	analytics.on_foreground();

	analytics.track_click(&QueryHint::new("tacos"), "tap");
	analytics.track_click(&AutoSuggestion::new("taco bell"), "enter");
	analytics.track_click(&LinkResult::new("ent_9").with_rank(3), "deep_link");
	analytics.on_background();
	analytics.shutdown().await;

	let payload = &uploader.payloads()[0];
	assert_eq!(payload["hints_clicks"][0]["click_type"], json!("tap"));
	assert_eq!(payload["autosuggest_clicks"][0]["autosuggestion"], json!("taco bell"));
	assert_eq!(payload["search_clicks"][0]["rank"], json!(3));
	assert!(payload.get("clicks").is_none());
	assert!(payload.get("impressions").is_none());
}

#[tokio::test]
async fn test_payload_metadata_matches_session() {
	let (analytics, _) = setup().await;

	for expected in 1..=3u32 {
		analytics.on_foreground();
		analytics.on_background();
		assert_eq!(analytics.empty_sessions(), expected);
	}

	analytics.on_foreground();
	analytics.track_double("latency", 12.5, false);
	let data = analytics.analytics_data();
	assert_eq!(data.session_id(), Some(analytics.current_session_id().as_str()));
	assert_eq!(data.empty_sessions(), Some(3));
}

#[tokio::test]
async fn test_empty_then_non_empty_cycles() {
	let (analytics, uploader) = setup().await;

	analytics.add_int("empty_sessions_test", Some(1));
	analytics.on_foreground();
	analytics.track_string("k", "v", false);
	analytics.on_background();
	assert_eq!(analytics.empty_sessions(), 0);

	analytics.on_foreground();
	analytics.on_background();
	assert_eq!(analytics.empty_sessions(), 1);

	analytics.shutdown().await;
	let payloads = uploader.payloads();
	assert_eq!(payloads.len(), 1);
	assert_eq!(payloads[0]["empty_sessions"], json!(0));
	assert_eq!(payloads[0]["empty_sessions_test"], json!(1));
}

#[tokio::test]
async fn test_empty_count_carried_into_next_upload() {
	let (analytics, uploader) = setup().await;

	analytics.on_foreground();
	analytics.on_background();
	analytics.on_foreground();
	analytics.on_background();

	analytics.on_foreground();
	analytics.track_click(&QueryHint::new("sushi"), "tap");
	analytics.on_background();
	analytics.shutdown().await;

	let payloads = uploader.payloads();
	assert_eq!(payloads.len(), 1);
	assert_eq!(payloads[0]["empty_sessions"], json!(2));
	assert_eq!(analytics.empty_sessions(), 0);
}

#[tokio::test]
async fn test_session_ids_chain_across_uploads() {
	let (analytics, uploader) = setup().await;

	analytics.on_foreground();
	let first = analytics.current_session_id();
	analytics.track_int("n", 1, false);
	analytics.on_background();
	assert_eq!(analytics.current_session_id(), keys::NO_SESSION);

	analytics.on_foreground();
	let second = analytics.current_session_id();
	assert_ne!(first, second);
	analytics.track_int("n", 2, false);
	analytics.on_background();
	analytics.shutdown().await;

	let payloads = uploader.payloads();
	assert_eq!(payloads[0]["analytics_window_id"], json!(first));
	assert_eq!(payloads[0]["prev_analytics_window_id"], Value::Null);
	assert_eq!(payloads[1]["analytics_window_id"], json!(second));
	assert_eq!(payloads[1]["prev_analytics_window_id"], json!(first));
}

#[tokio::test]
async fn test_previous_session_id_persists_across_clients() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("previous_session");

	let uploader = Arc::new(RecordingUploader::default());
	let analytics = Analytics::builder()
		.uploader(uploader.clone())
		.session_store_path(&path)
		.build()
		.await
		.unwrap();
	analytics.on_foreground();
	let first = analytics.current_session_id();
	analytics.track_string("k", "v", false);
	analytics.on_background();
	analytics.shutdown().await;

	let stored = FileSessionIdStore::new(&path).load().await.unwrap();
	assert_eq!(stored.as_deref(), Some(first.as_str()));

	let restarted = Analytics::builder()
		.uploader(uploader.clone())
		.session_store_path(&path)
		.build()
		.await
		.unwrap();
	restarted.on_foreground();
	restarted.track_string("k", "v2", false);
	restarted.on_background();
	restarted.shutdown().await;

	let payloads = uploader.payloads();
	assert_eq!(payloads[1]["prev_analytics_window_id"], json!(first));
}

#[tokio::test]
async fn test_tracked_wins_over_static_and_metadata_wins_over_both() {
	let (analytics, _) = setup().await;
	analytics.on_foreground();

	analytics.add_string("mode", Some("static".to_string()));
	analytics.track_string("mode", "tracked", false);
	analytics.track_string(keys::ANALYTICS_WINDOW_ID, "spoofed", false);

	let data = analytics.analytics_data();
	assert_eq!(data.get("mode"), Some(&json!("tracked")));
	assert_eq!(data.session_id(), Some(analytics.current_session_id().as_str()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_recording_is_not_lost() {
	let (analytics, uploader) = setup().await;
	analytics.on_foreground();

	let handles: Vec<_> = (0..8i64)
		.map(|thread| {
			let analytics = analytics.clone();
			std::thread::spawn(move || {
				for i in 0..50i64 {
					analytics.track_int("ticks", thread * 100 + i, true);
					analytics.track_click(&LinkResult::new(format!("ent_{thread}_{i}")), "tap");
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	analytics.on_background();
	analytics.shutdown().await;

	let payload = &uploader.payloads()[0];
	assert_eq!(payload["ticks"].as_array().unwrap().len(), 400);
	assert_eq!(payload["search_clicks"].as_array().unwrap().len(), 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_racing_background_land_in_exactly_one_place() {
	let uploader = Arc::new(RecordingUploader::default());
	let analytics = Analytics::builder()
		.uploader(uploader.clone())
		.queue_capacity(256)
		.build()
		.await
		.unwrap();
	analytics.on_foreground();

	let writers: Vec<_> = (0..4i64)
		.map(|thread| {
			let analytics = analytics.clone();
			std::thread::spawn(move || {
				let result = LinkResult::new(format!("ent_{thread}"));
				for _ in 0..5_000 {
					analytics.track_click(&result, "tap");
					analytics.track_int("ticks", thread, true);
				}
			})
		})
		.collect();

	for _ in 0..50 {
		analytics.on_background();
		analytics.on_foreground();
	}
	for writer in writers {
		writer.join().unwrap();
	}

	let count = |payload: &Value, key: &str| payload.get(key).and_then(Value::as_array).map_or(0, Vec::len);

	// Whatever the last cycle left behind goes out with the final upload.
	analytics.on_background();
	analytics.shutdown().await;

	let payloads = uploader.payloads();
	let uploaded_clicks: usize = payloads.iter().map(|p| count(p, "search_clicks")).sum();
	let uploaded_ticks: usize = payloads.iter().map(|p| count(p, "ticks")).sum();
	assert_eq!(uploaded_clicks, 20_000);
	assert_eq!(uploaded_ticks, 20_000);
	assert!(!analytics.analytics_data().contains_key("search_clicks"));
}

#[tokio::test]
async fn test_non_finite_only_session_is_counted_empty() {
	let (analytics, uploader) = setup().await;

	analytics.on_foreground();
	analytics.track_double("x", f64::NAN, false);
	analytics.track_double("y", f64::INFINITY, true);
	analytics.on_background();
	analytics.shutdown().await;

	assert!(uploader.payloads().is_empty());
	assert_eq!(analytics.empty_sessions(), 1);
}

#[tokio::test]
async fn test_background_after_shutdown_keeps_session_data() {
	let (analytics, uploader) = setup().await;
	analytics.on_foreground();
	analytics.track_string("k", "v", false);
	analytics.on_background();
	let previous = analytics.previous_session_id();
	analytics.shutdown().await;

	analytics.on_foreground();
	analytics.track_string("late", "v", false);
	analytics.on_background();

	assert_eq!(uploader.payloads().len(), 1);
	assert_eq!(analytics.previous_session_id(), previous);
	assert_eq!(analytics.current_session_id(), keys::NO_SESSION);
	assert_eq!(analytics.analytics_data().get("late"), Some(&json!("v")));
}
