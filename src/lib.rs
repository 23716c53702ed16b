// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Seismo - accelerometer seismometer for a phone or small board
//!
//! Samples a motion sensor at a fixed interval, keeps a sliding window of
//! readings in memory and on disk, and serves the window as JSON and as an
//! SVG trace of the gravity-corrected magnitude.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────┐  acquire  ┌─────────┐  insert/prune  ┌────────────────┐
//! │ Sensor  │ ────────→ │ Sampler │ ─────────────→ │ RetentionStore │
//! └─────────┘           └─────────┘                └────────────────┘
//!                                          flush ↑          │ snapshot
//!                                   ┌───────────┐           ↓
//!                                   │ Scheduler │    ┌────────────┐   render
//!                                   └───────────┘    │ HttpServer │ ─────────→ HTML
//!                                                    └────────────┘
//! ```

#![warn(missing_docs)]

pub mod core;
pub mod sensors;
pub mod db;
pub mod render;
pub mod server;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use config::Config;
pub use self::core::Engine;
pub use db::RetentionStore;
pub use error::{PersistError, SensorError};
pub use render::{render_trace, Canvas, TraceGeometry};
pub use sensors::{Reading, Sampler, Sensor, TermuxSensor};

/// Seismo version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
