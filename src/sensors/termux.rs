// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Accelerometer read through an external one-shot acquisition program
//!
//! The default program is `termux-sensor` from the Termux:API package. Each
//! call spawns it with a request for a single sample of one channel and parses
//! whatever JSON it prints.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::debug;

use super::{now_ms, Reading, Sensor};
use crate::config::SensorConfig;
use crate::error::SensorError;

/// Sensor backed by an external acquisition program
pub struct TermuxSensor {
    id: String,
    program: String,
    args: Vec<String>,
    channel: String,
    timeout: Option<Duration>,
}

impl TermuxSensor {
    /// `termux-sensor -n 1 -s <channel>`
    pub fn new(channel: &str) -> Self {
        Self::with_command("termux-sensor", default_args(channel), channel)
    }

    /// Arbitrary program and arguments, parsed as `channel` output
    pub fn with_command(program: &str, args: Vec<String>, channel: &str) -> Self {
        Self {
            id: format!("{}:{}", program, channel),
            program: program.to_string(),
            args,
            channel: channel.to_string(),
            timeout: None,
        }
    }

    /// Build from the `[sensor]` config section; `timeout_ms = 0` disables the timeout
    pub fn from_config(config: &SensorConfig) -> Self {
        let args = config
            .args
            .clone()
            .unwrap_or_else(|| default_args(&config.channel));
        let sensor = Self::with_command(&config.program, args, &config.channel);
        match config.timeout_ms {
            0 => sensor,
            ms => sensor.with_timeout(Duration::from_millis(ms)),
        }
    }

    /// Kill the program if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn default_args(channel: &str) -> Vec<String> {
    vec!["-n".into(), "1".into(), "-s".into(), channel.to_string()]
}

#[async_trait]
impl Sensor for TermuxSensor {
    fn id(&self) -> &str {
        &self.id
    }

    async fn probe(&self) -> bool {
        // The program name goes in as $1 so it is never interpreted by the shell
        let status = Command::new("sh")
            .arg("-c")
            .arg("command -v \"$1\" >/dev/null 2>&1")
            .arg("sh")
            .arg(&self.program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        matches!(status, Ok(s) if s.success())
    }

    async fn acquire(&self) -> Result<Reading, SensorError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| SensorError::Timeout {
                    program: self.program.clone(),
                    timeout,
                })?,
            None => cmd.output().await,
        }
        .map_err(|source| SensorError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let status = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            let detail = if stderr.is_empty() {
                format!("{} exited with {}", self.program, status)
            } else {
                stderr
            };
            return Err(SensorError::Exit {
                program: self.program.clone(),
                status,
                detail,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("{} produced {} bytes", self.program, stdout.len());
        parse_reading(&stdout, &self.channel, now_ms())
    }
}

/// Turn raw program output into a reading stamped with `t`
pub fn parse_reading(output: &str, channel: &str, t: i64) -> Result<Reading, SensorError> {
    let record = last_record(output)
        .ok_or_else(|| SensorError::Parse(format!("no JSON record in {} bytes", output.len())))?;

    let [x, y, z] = extract_vector(&record, channel)?;
    let reading = Reading::from_axes(t, x, y, z);
    if !reading.g.is_finite() {
        return Err(SensorError::Parse(format!(
            "magnitude of [{}, {}, {}] is not finite",
            x, y, z
        )));
    }
    Ok(reading)
}

/// Last JSON object in the output
///
/// Every top-level value is decoded in order, whether it sits on one line or is
/// pretty-printed across several. Anything between values that is not JSON
/// (warmup chatter, stray braces) is skipped.
fn last_record(output: &str) -> Option<Map<String, Value>> {
    let mut last = None;
    let mut rest = output;

    while let Some(start) = rest.find('{') {
        rest = &rest[start..];
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => {
                last = Some(map);
                rest = &rest[stream.byte_offset()..];
            }
            // Not a complete object here, resume after this brace
            _ => rest = &rest[1..],
        }
    }

    last
}

fn extract_vector(record: &Map<String, Value>, channel: &str) -> Result<[f64; 3], SensorError> {
    let needle = channel.to_lowercase();
    let source = record
        .get(channel)
        .and_then(Value::as_object)
        .or_else(|| {
            record
                .iter()
                .find(|(key, value)| value.is_object() && key.to_lowercase().contains(&needle))
                .and_then(|(_, value)| value.as_object())
        })
        .unwrap_or(record);

    let values = match source.get("values") {
        None | Some(Value::Null) => return Ok([0.0; 3]),
        Some(values) => values,
    };

    let axes: Vec<f64> = values
        .as_array()
        .ok_or_else(|| SensorError::Parse(format!("`values` is not an array: {}", values)))?
        .iter()
        .take(3)
        .map(|axis| axis.as_f64().filter(|v| v.is_finite()))
        .collect::<Option<_>>()
        .ok_or_else(|| SensorError::Parse(format!("non-numeric axis in {}", values)))?;

    match axes[..] {
        [x, y, z] => Ok([x, y, z]),
        _ => Err(SensorError::Parse(format!(
            "expected 3 axes, found {}",
            axes.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_channel_object() {
        let out = r#"{"accelerometer": {"values": [0.0, 0.0, 9.81], "timestamp": 1}}"#;
        let r = parse_reading(out, "accelerometer", 1000).unwrap();
        assert_eq!(r.t, 1000);
        assert_eq!(r.axes(), [0.0, 0.0, 9.81]);
        assert!(r.a < 1e-9);
    }

    #[test]
    fn test_vendor_prefixed_channel_key() {
        let out = r#"{"LSM6DSO Accelerometer": {"values": [3.0, 4.0, 0.0]}}"#;
        let r = parse_reading(out, "accelerometer", 0).unwrap();
        assert_eq!(r.g, 5.0);
    }

    #[test]
    fn test_top_level_values() {
        let r = parse_reading(r#"{"values": [1, 2, 2]}"#, "accelerometer", 0).unwrap();
        assert_eq!(r.g, 3.0);
    }

    #[test]
    fn test_last_record_wins_over_noise() {
        let out = "warming up...\n\n{\"values\": [9, 9, 9]}\n{\"values\": [0, 0, 1]}\n\n";
        let r = parse_reading(out, "accelerometer", 0).unwrap();
        assert_eq!(r.axes(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_pretty_printed_output() {
        let out = "{\n  \"BMI160 Accelerometer\": {\n    \"values\": [\n      0.5,\n      0,\n      9.7\n    ]\n  }\n}\n";
        let r = parse_reading(out, "accelerometer", 0).unwrap();
        assert_eq!(r.axes(), [0.5, 0.0, 9.7]);
    }

    #[test]
    fn test_single_line_warmup_before_pretty_printed_reading() {
        let out = "{}\n{\n  \"BMI160 Accelerometer\": {\n    \"values\": [\n      0.5,\n      0,\n      9.7\n    ]\n  }\n}\n";
        let r = parse_reading(out, "accelerometer", 0).unwrap();
        assert_eq!(r.axes(), [0.5, 0.0, 9.7]);
    }

    #[test]
    fn test_noise_between_records_is_skipped() {
        let out = "{\"values\": [9, 9, 9]}\nstatus {busy\n{\n  \"values\": [0, 0, 2]\n}\ndone\n";
        let r = parse_reading(out, "accelerometer", 0).unwrap();
        assert_eq!(r.axes(), [0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_overflowing_magnitude_is_rejected() {
        let err = parse_reading(r#"{"values": [1e200, 0, 0]}"#, "accelerometer", 0).unwrap_err();
        assert!(err.is_parse());

        // serde_json refuses literals beyond f64 range outright
        let err = parse_reading(r#"{"values": [1e400, 0, 0]}"#, "accelerometer", 0).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_missing_values_defaults_to_zero() {
        let r = parse_reading(r#"{"accelerometer": {}}"#, "accelerometer", 7).unwrap();
        assert_eq!(r.axes(), [0.0; 3]);
        assert_eq!(r.g, 0.0);
        assert!((r.a - 9.81).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_output() {
        assert!(parse_reading("", "accelerometer", 0).unwrap_err().is_parse());
        assert!(parse_reading("not json\n", "accelerometer", 0).unwrap_err().is_parse());
        assert!(parse_reading("[1, 2, 3]", "accelerometer", 0).unwrap_err().is_parse());
    }

    #[test]
    fn test_malformed_values() {
        let short = parse_reading(r#"{"values": [1, 2]}"#, "accelerometer", 0);
        assert!(short.unwrap_err().is_parse());

        let text = parse_reading(r#"{"values": ["a", 2, 3]}"#, "accelerometer", 0);
        assert!(text.unwrap_err().is_parse());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_acquire_from_process() {
        let sensor = TermuxSensor::with_command(
            "sh",
            vec![
                "-c".into(),
                r#"echo noise; echo '{"accelerometer":{"values":[0,3,4]}}'"#.into(),
            ],
            "accelerometer",
        );

        let r = sensor.acquire().await.unwrap();
        assert_eq!(r.g, 5.0);
        assert!(sensor.probe().await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let sensor = TermuxSensor::with_command(
            "sh",
            vec!["-c".into(), "echo 'sensor busy' >&2; exit 3".into()],
            "accelerometer",
        );

        match sensor.acquire().await {
            Err(SensorError::Exit { detail, status, .. }) => {
                assert_eq!(detail, "sensor busy");
                assert_eq!(status, "exit code 3");
            }
            other => panic!("expected exit failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_acquisition() {
        let sensor = TermuxSensor::with_command("sleep", vec!["5".into()], "accelerometer")
            .with_timeout(Duration::from_millis(50));

        let err = sensor.acquire().await.unwrap_err();
        assert!(matches!(err, SensorError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let sensor = TermuxSensor::with_command("seismo-no-such-program", vec![], "accelerometer");
        assert!(!sensor.probe().await);
        assert!(matches!(
            sensor.acquire().await,
            Err(SensorError::Spawn { .. })
        ));
    }
}
