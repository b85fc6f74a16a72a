// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session analytics SDK for the Sift search client.
//!
//! The [`Analytics`] client collects clicks, impressions and keyed telemetry
//! during a foreground session and uploads one JSON payload per session when
//! the application moves to the background. Sessions with no tracked activity
//! are not uploaded; they are counted and the count rides along with the next
//! payload.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sift_analytics::{Analytics, LifecycleObserver, LinkResult, ViewId};
//!
//! let analytics = Analytics::builder()
//!     .upload_url("https://api.example.com/v1/analytics")
//!     .build()
//!     .await?;
//!
//! analytics.on_foreground();
//!
//! let result = Arc::new(LinkResult::new("ent_1").with_request_id("req_1").with_rank(0));
//! analytics.track_impressions(ViewId(7), result.clone());
//! analytics.on_view_visibility_changed(ViewId(7), 0.9);
//! analytics.track_click(result.as_ref(), "tap");
//!
//! analytics.on_background();
//! analytics.shutdown().await;
//! ```

mod client;
pub mod config;
pub mod entities;
pub mod error;
pub mod impression;
pub mod reporting;
pub mod session;
pub mod session_store;
pub mod upload;

pub use client::{Analytics, AnalyticsBuilder, LifecycleObserver};
pub use config::{AnalyticsConfig, ConfigError};
pub use entities::{AutoSuggestion, LinkResult, QueryHint};
pub use error::{AnalyticsError, Result};
pub use impression::{ImpressionTracker, ViewId, VISIBILITY_THRESHOLD};
pub use reporting::{ApiPerformance, ApiTimer, WINDOW_ID_HEADER};
pub use session::{SessionId, SessionTracker};
pub use session_store::{FileSessionIdStore, MemorySessionIdStore, SessionIdStore};
pub use upload::{HttpUploader, PayloadUploader, UploadCommand, UploadDispatcher};

pub use sift_analytics_core::{keys, Payload, Record, TrackableEntity, TrackedValue, ValueKind};
