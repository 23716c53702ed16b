//! Sensor module - acquisition sources and the sampling loop

mod traits;
mod termux;
mod sampler;
#[cfg(feature = "demo")]
mod simulator;

pub use traits::{gravity_corrected, now_ms, Reading, Sensor, STANDARD_GRAVITY};
pub use termux::{parse_reading, TermuxSensor};
pub use sampler::{Sampler, SamplerHealth};
#[cfg(feature = "demo")]
pub use simulator::SensorSimulator;
