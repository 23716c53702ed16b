// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Error types for acquisition and persistence

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single sensor acquisition cycle
#[derive(Error, Debug)]
pub enum SensorError {
    /// The acquisition program could not be launched
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program that was run
        program: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The acquisition program exited abnormally
    #[error("{program} failed ({status}): {detail}")]
    Exit {
        /// Program that was run
        program: String,
        /// Exit code or signal description
        status: String,
        /// Trimmed stderr, or a summary when stderr was empty
        detail: String,
    },

    /// The acquisition program did not finish in time and was killed
    #[error("{program} timed out after {timeout:?}")]
    Timeout {
        /// Program that was run
        program: String,
        /// Limit that was exceeded
        timeout: Duration,
    },

    /// The output did not contain a usable reading
    #[error("malformed sensor output: {0}")]
    Parse(String),
}

impl SensorError {
    /// True for malformed or empty output, false for process-level failures
    pub fn is_parse(&self) -> bool {
        matches!(self, SensorError::Parse(_))
    }
}

/// Failure of a durable write or read of the sample history
#[derive(Error, Debug)]
pub enum PersistError {
    /// Reading or writing the history file failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The history document could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classification() {
        assert!(SensorError::Parse("empty".into()).is_parse());

        let exit = SensorError::Exit {
            program: "termux-sensor".into(),
            status: "exit status: 1".into(),
            detail: "no such sensor".into(),
        };
        assert!(!exit.is_parse());
        assert_eq!(
            exit.to_string(),
            "termux-sensor failed (exit status: 1): no such sensor"
        );
    }
}
