//! Collector engine - wires the sensor, store, flush task and HTTP server

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::Scheduler;
use crate::config::Config;
use crate::db::RetentionStore;
use crate::sensors::{now_ms, Reading, Sampler, Sensor, TermuxSensor};
use crate::server::{AppState, HttpServer};

/// Main collector engine
pub struct Engine {
    /// Validated configuration
    pub config: Arc<Config>,
    store: Arc<RetentionStore>,
    sampler: Arc<Sampler>,
    scheduler: Scheduler,
    shutdown_tx: broadcast::Sender<()>,
}

impl Engine {
    /// Build the engine with the sensor selected by the configuration
    pub fn new(config: Config) -> Result<Self> {
        let sensor = build_sensor(&config)?;
        Self::with_sensor(config, sensor)
    }

    /// Build the engine around an explicit sensor
    pub fn with_sensor(config: Config, sensor: Arc<dyn Sensor>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(RetentionStore::open(&config.storage.path));
        let sampler = Arc::new(Sampler::new(sensor, config.sensor.interval()));
        let (shutdown_tx, _) = broadcast::channel(4);

        Ok(Self {
            config: Arc::new(config),
            store,
            sampler,
            scheduler: Scheduler::new(),
            shutdown_tx,
        })
    }

    /// Shared history, usable after `run` consumes the engine
    pub fn store(&self) -> Arc<RetentionStore> {
        self.store.clone()
    }

    /// Collect and serve until `stop` resolves, then shut down in order
    pub async fn run<S>(self, stop: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let started = Instant::now();
        let history_ms = self.config.history_ms();

        let addr = self.config.server.bind_addr()?;
        let server = HttpServer::bind(addr, AppState::new(self.store.clone(), history_ms))
            .await
            .with_context(|| format!("failed to listen on {}", addr))?;
        info!("Serving trace on http://{}", server.local_addr()?);
        let server_task = tokio::spawn(server.serve(self.shutdown_tx.subscribe()));

        let sampling_task = {
            let sampler = self.sampler.clone();
            let store = self.store.clone();
            let persist = self.config.storage.persist_on_sample;
            let shutdown = self.shutdown_tx.subscribe();
            tokio::spawn(async move {
                sampler
                    .run(
                        move |reading| record(store.clone(), reading, history_ms, persist),
                        shutdown,
                    )
                    .await
            })
        };

        {
            let store = self.store.clone();
            self.scheduler.spawn_periodic(
                "flush",
                self.config.storage.flush_interval(),
                self.shutdown_tx.subscribe(),
                move || {
                    let store = store.clone();
                    tokio::task::spawn_blocking(move || flush(&store, history_ms));
                },
            );
        }

        info!("Collector running, history window {} min", self.config.storage.history_minutes);
        stop.await;

        info!("Shutdown signal received, cleaning up...");
        let _ = self.shutdown_tx.send(());

        match server_task.await {
            Ok(Err(e)) => warn!("HTTP server stopped with error: {:#}", e),
            Err(e) => warn!("HTTP server task failed: {}", e),
            Ok(Ok(())) => {}
        }
        if let Err(e) = sampling_task.await {
            warn!("Sampling task failed: {}", e);
        }
        self.scheduler.join().await;

        let store = self.store.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || flush(&store, history_ms)).await {
            warn!("Final flush failed: {}", e);
        }

        let health = self.sampler.health();
        info!(
            "Collector stopped after {:?}: {} cycles, {} readings, {} acquisition errors, {} delivery errors",
            started.elapsed(),
            health.cycles,
            health.readings,
            health.acquisition_errors,
            health.delivery_errors
        );
        Ok(())
    }
}

fn build_sensor(config: &Config) -> Result<Arc<dyn Sensor>> {
    if config.demo_mode {
        #[cfg(feature = "demo")]
        {
            info!("Demo mode: using simulated accelerometer");
            return Ok(Arc::new(crate::sensors::SensorSimulator::new("sim:accelerometer")));
        }

        #[cfg(not(feature = "demo"))]
        {
            anyhow::bail!("demo feature not enabled. Build with --features demo");
        }
    }

    Ok(Arc::new(TermuxSensor::from_config(&config.sensor)))
}

/// Deliver one reading into the store
async fn record(
    store: Arc<RetentionStore>,
    reading: Reading,
    history_ms: i64,
    persist: bool,
) -> Result<()> {
    store.insert(reading);
    store.prune(now_ms(), history_ms);

    if persist {
        tokio::task::spawn_blocking(move || store.persist())
            .await
            .context("persist task failed")?
            .context("failed to persist history")?;
    }
    Ok(())
}

/// Prune to the window and write the history, logging instead of failing
fn flush(store: &RetentionStore, history_ms: i64) {
    store.prune(now_ms(), history_ms);
    match store.persist() {
        Ok(true) => info!("Flushed {} samples", store.len()),
        Ok(false) => {}
        Err(e) => warn!("Failed to flush history: {}", e),
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
