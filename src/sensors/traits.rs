// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Sensor traits and common types

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Standard gravity removed from the magnitude, in m/s²
pub const STANDARD_GRAVITY: f64 = 9.81;

/// A single accelerometer observation
///
/// `g` and `a` are always derived from the axes through [`Reading::from_axes`],
/// so a reading never carries a magnitude that disagrees with its vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Acquisition time, Unix milliseconds
    pub t: i64,
    /// Acceleration along x, m/s²
    pub x: f64,
    /// Acceleration along y, m/s²
    pub y: f64,
    /// Acceleration along z, m/s²
    pub z: f64,
    /// Euclidean magnitude of (x, y, z)
    pub g: f64,
    /// Gravity-corrected magnitude, |g - 9.81|
    pub a: f64,
}

impl Reading {
    /// Build a reading from raw axes, deriving `g` and `a`
    pub fn from_axes(t: i64, x: f64, y: f64, z: f64) -> Self {
        let g = (x * x + y * y + z * z).sqrt();
        Self {
            t,
            x,
            y,
            z,
            g,
            a: gravity_corrected(g),
        }
    }

    /// The raw vector as `[x, y, z]`
    pub fn axes(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Absolute deviation of a magnitude from standard gravity
pub fn gravity_corrected(g: f64) -> f64 {
    (g - STANDARD_GRAVITY).abs()
}

/// Wall clock in Unix milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Trait for a motion sensor that can be sampled on demand
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Sensor identifier used in logs
    fn id(&self) -> &str;

    /// Best-effort check that the sensor can be reached at all
    async fn probe(&self) -> bool;

    /// Take exactly one reading
    async fn acquire(&self) -> Result<Reading, SensorError>;
}
