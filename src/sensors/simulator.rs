// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Simulated accelerometer for demo/testing

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::prelude::*;
use rand_distr::StandardNormal;

use super::{now_ms, Reading, Sensor, STANDARD_GRAVITY};
use crate::error::SensorError;

/// Phone lying flat: gravity on Z, sensor noise on every axis, occasional tremors
pub struct SensorSimulator {
    id: String,
    state: Mutex<SimState>,
    tremor_probability: f64,
    noise_level: f64,
}

struct SimState {
    rng: StdRng,
    /// Remaining cycles of the current tremor and its peak amplitude
    tremor: Option<(u32, f64)>,
}

impl SensorSimulator {
    /// Simulator seeded from entropy
    pub fn new(id: &str) -> Self {
        Self::with_rng(id, StdRng::from_entropy())
    }

    /// Deterministic stream, for tests
    pub fn seeded(id: &str, seed: u64) -> Self {
        Self::with_rng(id, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: &str, rng: StdRng) -> Self {
        Self {
            id: id.to_string(),
            state: Mutex::new(SimState { rng, tremor: None }),
            tremor_probability: 0.02,
            noise_level: 0.03,
        }
    }

    fn generate(&self) -> [f64; 3] {
        let mut state = self.state.lock();
        let sigma = self.noise_level;
        let mut noise = || sigma * state.rng.sample::<f64, _>(StandardNormal);

        let mut data = [noise(), noise(), STANDARD_GRAVITY + noise()];

        if state.tremor.is_none() && state.rng.gen::<f64>() < self.tremor_probability {
            let cycles = state.rng.gen_range(5..40);
            let peak = state.rng.gen_range(0.2..2.5);
            state.tremor = Some((cycles, peak));
        }

        if let Some((remaining, peak)) = state.tremor {
            let axis = state.rng.gen_range(0..3);
            data[axis] += peak * state.rng.gen_range(-1.0..1.0);
            // Decays towards the end of the event
            state.tremor = match remaining {
                0 | 1 => None,
                n => Some((n - 1, peak * 0.95)),
            };
        }

        data
    }
}

#[async_trait]
impl Sensor for SensorSimulator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn probe(&self) -> bool {
        true
    }

    async fn acquire(&self) -> Result<Reading, SensorError> {
        let [x, y, z] = self.generate();
        Ok(Reading::from_axes(now_ms(), x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_readings_near_gravity() {
        let sim = SensorSimulator::seeded("sim", 7);
        let mut quiet = 0;

        for _ in 0..500 {
            let r = sim.acquire().await.unwrap();
            assert!(r.g.is_finite());
            assert!((r.a - (r.g - STANDARD_GRAVITY).abs()).abs() < 1e-12);
            if r.a < 0.2 {
                quiet += 1;
            }
        }

        // Most of the time the phone is still
        assert!(quiet > 250, "only {} quiet readings", quiet);
    }
}
