// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Sample history to normalized trace coordinates

use serde::Serialize;

use crate::sensors::Reading;

/// Smallest amplitude scale, keeps a flat trace visible
pub const MIN_AMPLITUDE_SCALE: f64 = 0.5;

/// Shown in place of latest-sample stats when there are no samples
pub const PLACEHOLDER: &str = "–";

/// Fixed drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    /// Canvas width in SVG units
    pub width: f64,
    /// Canvas height in SVG units
    pub height: f64,
    /// Margin kept free on every side
    pub pad: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 220.0,
            pad: 10.0,
        }
    }
}

/// Summary shown next to the trace, already formatted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStats {
    /// Window length in whole minutes
    pub window_minutes: String,
    /// Samples drawn
    pub count: usize,
    /// Newest `a`, or the placeholder
    pub latest_a: String,
    /// Newest vector, or the placeholder
    pub latest_xyz: String,
}

/// One plotted point per sample plus the summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceGeometry {
    /// Canvas coordinates, oldest first
    pub points: Vec<(f64, f64)>,
    /// Vertical scale, never below the floor
    pub max_a: f64,
    /// Text shown under the trace
    pub stats: TraceStats,
}

/// Map samples onto the canvas
///
/// Time runs left to right over `[now_ms - window_ms, now_ms]`. Samples outside
/// that range are not clamped and land off the canvas. Amplitude runs bottom to
/// top over `[0, max_a]`.
pub fn render_trace(samples: &[Reading], window_ms: i64, now_ms: i64, canvas: &Canvas) -> TraceGeometry {
    let window = window_ms.max(1) as f64;
    let min_t = now_ms as f64 - window;
    let max_a = samples.iter().map(|s| s.a).fold(MIN_AMPLITUDE_SCALE, f64::max);

    let inner_w = canvas.width - 2.0 * canvas.pad;
    let inner_h = canvas.height - 2.0 * canvas.pad;

    let points = samples
        .iter()
        .map(|s| {
            let x = canvas.pad + ((s.t as f64 - min_t) / window) * inner_w;
            // Clamped in case a caller hands in a stale scale
            let y = canvas.pad + (1.0 - (s.a / max_a).min(1.0)) * inner_h;
            (x, y)
        })
        .collect();

    let latest = samples.last();
    let stats = TraceStats {
        window_minutes: format!("{:.0}", (window_ms as f64 / 60_000.0).round()),
        count: samples.len(),
        latest_a: latest
            .map(|s| format!("{:.3}", s.a))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        latest_xyz: latest
            .map(|s| format!("{:.3}, {:.3}, {:.3}", s.x, s.y, s.z))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
    };

    TraceGeometry { points, max_a, stats }
}

impl TraceGeometry {
    /// SVG polyline `points` attribute, one decimal per coordinate
    pub fn polyline(&self) -> String {
        self.points
            .iter()
            .map(|(x, y)| format!("{:.1},{:.1}", x, y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
