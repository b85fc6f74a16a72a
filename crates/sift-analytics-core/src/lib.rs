// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core data model for Sift session analytics.
//!
//! This crate is synchronous and runtime-free. It provides:
//! - [`TrackedValue`]: the tagged value type recorded under caller keys
//! - [`ValueStore`]: tracked and static values, individual or grouped
//! - [`EventCollector`]: clicks and impressions, partitioned by category
//! - [`TrackableEntity`] and [`ImpressionId`]: the entity capability set and
//!   content-derived impression identity
//! - [`SessionData`] and [`format_session`]: draining a session and building
//!   its upload document

pub mod collector;
pub mod entity;
pub mod error;
pub mod keys;
pub mod payload;
pub mod record;
pub mod store;
pub mod value;

pub use collector::{CollectedEvents, EventCollector};
pub use entity::{partition_of, ImpressionId, TrackableEntity};
pub use error::ValueError;
pub use payload::{format_payload, format_session, Payload, SessionData, SessionMetadata};
pub use record::Record;
pub use store::{Scope, TrackedValues, ValueStore};
pub use value::{TrackedValue, ValueKind};
