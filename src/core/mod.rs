//! Core engine module - orchestrates sampling, retention and serving

mod engine;
mod scheduler;

pub use engine::{shutdown_signal, Engine};
pub use scheduler::Scheduler;
