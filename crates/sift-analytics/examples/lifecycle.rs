// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: Drive a few foreground/background cycles through the analytics SDK.
//!
//! Run with:
//!   SIFT_ANALYTICS_UPLOAD_URL=http://localhost:8080/analytics \
//!   RUST_LOG=sift_analytics=debug cargo run --example lifecycle -p sift-analytics

use std::path::PathBuf;
use std::sync::Arc;

use sift_analytics::{
	Analytics, AnalyticsConfig, ApiPerformance, AutoSuggestion, LifecycleObserver, LinkResult,
	QueryHint, ViewId,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sift_analytics=info")),
		)
		.init();

	let config_path = std::env::var("SIFT_ANALYTICS_CONFIG")
		.map(PathBuf::from)
		.unwrap_or_else(|_| PathBuf::from("analytics.toml"));
	let mut config = AnalyticsConfig::from_file(&config_path)?.apply_env()?;
	if config.upload_url.is_none() {
		config.upload_url = Some("http://localhost:8080/analytics".to_string());
	}
	config.log_payloads = true;

	println!("Initializing analytics client...");
	println!("  Upload URL: {}", config.upload_url.as_deref().unwrap_or_default());

	let analytics = Analytics::builder().config(config).build().await?;

	let mut device = serde_json::Map::new();
	device.insert("os".into(), std::env::consts::OS.into());
	device.insert("arch".into(), std::env::consts::ARCH.into());
	analytics.set_device_info(Some(device));

	// Session 1: the user searches and taps a result.
	analytics.on_foreground();
	println!("Session 1: {}", analytics.current_session_id());

	let timer = ApiPerformance::start("https://api.example.com/v1/search", "search");
	let hint = Arc::new(QueryHint::new("coffee near me").with_request_id("req_1"));
	analytics.track_impressions(ViewId(1), hint.clone());
	analytics.on_view_visibility_changed(ViewId(1), 1.0);
	analytics.track_click(hint.as_ref(), "tap");

	let results: Vec<Arc<LinkResult>> = (0..3)
		.map(|rank| {
			Arc::new(
				LinkResult::new(format!("ent_{rank}"))
					.with_request_id("req_2")
					.with_rank(rank),
			)
		})
		.collect();
	for (view, result) in results.iter().enumerate() {
		analytics.track_impressions(ViewId(10 + view as u64), result.clone());
		analytics.on_view_visibility_changed(ViewId(10 + view as u64), 0.75);
	}
	analytics.track_click(results[1].as_ref(), "deep_link");
	analytics.track_api_performance(&timer.finish(200, Some("req_2".into())));
	analytics.on_background();

	// Session 2: the app opens and closes without activity.
	analytics.on_foreground();
	println!("Session 2: {}", analytics.current_session_id());
	analytics.on_background();
	println!("Empty sessions: {}", analytics.empty_sessions());

	// Session 3: autosuggest only; carries the empty count.
	analytics.on_foreground();
	println!("Session 3: {}", analytics.current_session_id());
	analytics.track_click(&AutoSuggestion::new("coffee beans"), "enter");
	analytics.on_background();

	analytics.shutdown().await;
	println!("Done. Previous session: {:?}", analytics.previous_session_id());

	Ok(())
}
