// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Sampling loop - drives one sensor at a fixed interval

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{Reading, Sensor};

/// Counters describing how the loop has been doing
#[derive(Debug, Clone, Default, Serialize)]
pub struct SamplerHealth {
    /// Cycles started
    pub cycles: u64,
    /// Readings acquired and handed to the callback
    pub readings: u64,
    /// Cycles where the sensor failed
    pub acquisition_errors: u64,
    /// Readings the callback rejected
    pub delivery_errors: u64,
    /// Failed cycles since the last success
    pub consecutive_failures: u64,
    /// Most recent failure message
    pub last_error: Option<String>,
}

/// Repeatedly acquires from a sensor, one acquisition at a time
///
/// The pause between cycles is measured from the end of one cycle (acquisition
/// plus delivery) to the start of the next, so a slow sensor throttles the loop
/// instead of building a backlog.
pub struct Sampler {
    sensor: Arc<dyn Sensor>,
    interval: Duration,
    health: Mutex<SamplerHealth>,
}

impl Sampler {
    /// Sample `sensor`, pausing `interval` after each cycle
    pub fn new(sensor: Arc<dyn Sensor>, interval: Duration) -> Self {
        Self {
            sensor,
            interval,
            health: Mutex::new(SamplerHealth::default()),
        }
    }

    /// Snapshot of the loop counters
    pub fn health(&self) -> SamplerHealth {
        self.health.lock().clone()
    }

    /// Run until `shutdown` fires or its sender is dropped
    ///
    /// Shutdown is only observed between cycles: a cycle that has started always
    /// finishes, including delivery of its reading.
    pub async fn run<F, Fut>(&self, mut on_sample: F, mut shutdown: broadcast::Receiver<()>)
    where
        F: FnMut(Reading) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let id = self.sensor.id().to_string();
        info!("Starting sampler for {} every {:?}", id, self.interval);

        // Only informative: the sensor may show up later, so keep trying either way
        if !self.sensor.probe().await {
            warn!("Sensor {} is not available yet, will keep retrying", id);
        }

        loop {
            self.cycle(&id, &mut on_sample).await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.recv() => {
                    info!("Sampler for {} shutting down...", id);
                    break;
                }
            }
        }
    }

    async fn cycle<F, Fut>(&self, id: &str, on_sample: &mut F)
    where
        F: FnMut(Reading) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.health.lock().cycles += 1;

        let reading = match self.sensor.acquire().await {
            Ok(reading) => reading,
            Err(e) => {
                let mut health = self.health.lock();
                health.acquisition_errors += 1;
                self.record_failure(&mut health, id, e.to_string());
                return;
            }
        };

        let delivered = on_sample(reading).await;

        let mut health = self.health.lock();
        health.readings += 1;
        match delivered {
            Ok(()) => {
                if health.consecutive_failures > 0 {
                    info!(
                        "Sensor {} recovered after {} failed cycles",
                        id, health.consecutive_failures
                    );
                }
                health.consecutive_failures = 0;
            }
            Err(e) => {
                health.delivery_errors += 1;
                self.record_failure(&mut health, id, format!("{:#}", e));
            }
        }
    }

    fn record_failure(&self, health: &mut SamplerHealth, id: &str, message: String) {
        health.consecutive_failures += 1;
        if health.consecutive_failures == 1 {
            warn!("Sample error for {}: {}", id, message);
        } else {
            debug!(
                "Sample error for {} ({} in a row): {}",
                id, health.consecutive_failures, message
            );
        }
        health.last_error = Some(message);
    }
}
