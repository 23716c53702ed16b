// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Task scheduler for timed operations

use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

struct ScheduledTask {
    name: String,
    handle: JoinHandle<()>,
}

/// Runs named periodic jobs until shutdown
pub struct Scheduler {
    tasks: Mutex<Vec<ScheduledTask>>,
}

impl Scheduler {
    /// Empty scheduler
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Run `task` every `period`, first run one period from now
    ///
    /// Ticks missed while a run was slow are not made up; the next run is
    /// pushed back instead.
    pub fn spawn_periodic<F>(
        &self,
        name: &str,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
        mut task: F,
    ) where
        F: FnMut() + Send + 'static,
    {
        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => task(),
                    _ = shutdown.recv() => {
                        debug!("Scheduled task '{}' stopping", task_name);
                        break;
                    }
                }
            }
        });

        self.tasks.lock().push(ScheduledTask {
            name: name.to_string(),
            handle,
        });
        debug!("Scheduled task '{}' with interval {:?}", name, period);
    }

    /// Names of tasks spawned so far
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.lock().iter().map(|t| t.name.clone()).collect()
    }

    /// Wait for every task to finish after shutdown has been signalled
    pub async fn join(&self) {
        let tasks: Vec<ScheduledTask> = std::mem::take(&mut *self.tasks.lock());
        let names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
        let results = join_all(tasks.into_iter().map(|t| t.handle)).await;

        for (name, result) in names.iter().zip(results) {
            if let Err(e) = result {
                warn!("Scheduled task '{}' ended abnormally: {}", name, e);
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
