//! Seawatch - maritime safety monitoring for small craft.
//!
//! # Overview
//!
//! Seawatch periodically evaluates the safety of a vessel at sea. Each
//! refresh acquires the current position, gathers nearby vessel traffic and
//! sea conditions, classifies every contact by collision risk, and publishes
//! one immutable [`SafetySnapshot`](model::SafetySnapshot) with an overall
//! verdict of SAFE, WARNING or CRITICAL.
//!
//! # Degraded operation
//!
//! Every data source may fail. Position falls back to the last known good
//! fix or a documented default; vessel data falls back from a live query to
//! a consolidated report to local synthesis; sea conditions fall back to a
//! benign default reading. A snapshot is always produced, and its
//! `data_source` tag tells consumers how much to trust it.
//!
//! # Modules
//!
//! - [`model`]: Data types for positions, vessels, conditions and snapshots
//! - [`error`]: Error taxonomy of the pipeline
//! - [`geo`]: Distance and offset on the equirectangular approximation
//! - [`geolocation`]: Position sources and fallback
//! - [`data_sources`]: Remote maritime backend client
//! - [`synthesis`]: Seedable local vessel synthesis
//! - [`provider`]: Vessel population resolution chain
//! - [`classifier`]: Collision-risk classification
//! - [`environment`]: Sea-condition risk assessment
//! - [`aggregation`]: Overall safety verdict
//! - [`monitor`]: Refresh controller
//! - [`render`]: Map renderers
//! - [`storage`]: SQLite snapshot log
//! - [`config`]: Configuration
//! - [`api`]: HTTP API handlers

pub mod aggregation;
pub mod api;
pub mod classifier;
pub mod config;
pub mod data_sources;
pub mod environment;
pub mod error;
pub mod geo;
pub mod geolocation;
pub mod model;
pub mod monitor;
pub mod provider;
pub mod render;
pub mod storage;
pub mod synthesis;
