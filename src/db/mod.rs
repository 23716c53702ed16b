// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Retention store - windowed sample history with JSON persistence
//!
//! Readings live in memory in insertion order, which is also time order because
//! there is a single producer. The whole sequence is written to a JSON document
//! of the form `{ "samples": [...] }` on demand and loaded back at startup.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PersistError;
use crate::sensors::Reading;

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    samples: Vec<Reading>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    samples: &'a [Reading],
}

struct StoreState {
    samples: Vec<Reading>,
    /// Bumped on every mutation, compared against the last persisted value
    generation: u64,
}

/// Sample history bounded to a sliding time window
pub struct RetentionStore {
    state: Mutex<StoreState>,
    path: Option<PathBuf>,
    /// Serializes writers and remembers the generation that last reached disk
    persisted: Mutex<u64>,
}

impl RetentionStore {
    /// Store with no backing file
    pub fn in_memory() -> Self {
        Self::with_samples(None, Vec::new())
    }

    /// Open a file-backed store, restoring whatever was persisted before
    ///
    /// A missing file starts an empty history. An unreadable one is logged and
    /// also starts empty; it is overwritten on the next persist.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let samples = match Self::load(&path) {
            Ok(samples) => {
                info!("Loaded {} samples from {:?}", samples.len(), path);
                samples
            }
            Err(e) => {
                warn!("Could not load {:?}, starting empty: {}", path, e);
                Vec::new()
            }
        };
        Self::with_samples(Some(path), samples)
    }

    fn with_samples(path: Option<PathBuf>, samples: Vec<Reading>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                samples,
                generation: 0,
            }),
            path,
            persisted: Mutex::new(0),
        }
    }

    /// Read a persisted history, empty if the file does not exist
    pub fn load(path: &Path) -> Result<Vec<Reading>, PersistError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let doc: Document = serde_json::from_reader(BufReader::new(file))?;
        Ok(doc.samples)
    }

    /// Backing file, `None` for an in-memory store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append a reading
    pub fn insert(&self, reading: Reading) {
        let mut state = self.state.lock();
        state.samples.push(reading);
        state.generation += 1;
    }

    /// Drop every reading older than `now_ms - window_ms`, returning how many went
    pub fn prune(&self, now_ms: i64, window_ms: i64) -> usize {
        let cutoff = now_ms.saturating_sub(window_ms);
        let mut state = self.state.lock();

        let before = state.samples.len();
        state.samples.retain(|r| r.t >= cutoff);
        let removed = before - state.samples.len();

        if removed > 0 {
            state.generation += 1;
            debug!("Pruned {} samples older than {}", removed, cutoff);
        }
        removed
    }

    /// Independent copy of the current history
    pub fn snapshot(&self) -> Vec<Reading> {
        self.state.lock().samples.clone()
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.state.lock().samples.len()
    }

    /// True when nothing is retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the whole history to the backing file
    ///
    /// Returns `Ok(false)` when nothing changed since the last successful write
    /// or when the store has no file. On error the in-memory history is left as
    /// is and stays dirty, so the next call retries.
    pub fn persist(&self) -> Result<bool, PersistError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };

        let mut persisted = self.persisted.lock();
        let (samples, generation) = {
            let state = self.state.lock();
            if state.generation == *persisted {
                return Ok(false);
            }
            (state.samples.clone(), state.generation)
        };

        write_document(path, &samples)?;
        *persisted = generation;
        debug!("Persisted {} samples to {:?}", samples.len(), path);
        Ok(true)
    }
}

/// Replace `path` with a fresh document via a sibling temp file
fn write_document(path: &Path, samples: &[Reading]) -> Result<(), PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, &DocumentRef { samples })?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
