//! End-to-end tests for the HTTP surface and the collector engine

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use seismo::sensors::now_ms;
use seismo::server::{router, AppState};
use seismo::{Config, Engine, Reading, RetentionStore, Sensor, SensorError};

const HOUR_MS: i64 = 3_600_000;

async fn get(state: AppState, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_data_endpoint_returns_pruned_window() {
    let store = Arc::new(RetentionStore::in_memory());
    let now = now_ms();
    store.insert(Reading::from_axes(now - 2 * HOUR_MS, 0.0, 0.0, 9.81));
    store.insert(Reading::from_axes(now - 1000, 1.0, 0.0, 9.81));
    store.insert(Reading::from_axes(now, 0.0, 0.0, 0.0));

    let (status, _, body) = get(AppState::new(store.clone(), HOUR_MS), "/api/data").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["historyMs"], HOUR_MS);
    let samples = json["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0]["t"], now - 1000);
    assert_eq!(samples[1]["a"], 9.81);

    // The read pruned the stale sample out of the store itself
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_trace_page_with_empty_store() {
    let store = Arc::new(RetentionStore::in_memory());
    let (status, content_type, body) = get(AppState::new(store, HOUR_MS), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.contains("Samples: 0"));
    assert!(body.contains("Window: 60 min"));
    assert!(body.contains("<polyline"));
}

#[tokio::test]
async fn test_trace_page_shows_latest_reading() {
    let store = Arc::new(RetentionStore::in_memory());
    store.insert(Reading::from_axes(now_ms(), 0.5, -0.25, 9.81));

    let (_, _, body) = get(AppState::new(store, HOUR_MS), "/").await;
    assert!(body.contains("Samples: 1"));
    assert!(body.contains("Latest xyz: 0.500, -0.250, 9.810"));
}

/// Sensor that produces a fresh reading every call, with strictly increasing time
struct CountingSensor {
    last_t: AtomicI64,
}

#[async_trait]
impl Sensor for CountingSensor {
    fn id(&self) -> &str {
        "counting"
    }

    async fn probe(&self) -> bool {
        true
    }

    async fn acquire(&self) -> Result<Reading, SensorError> {
        let t = now_ms().max(self.last_t.load(Ordering::SeqCst) + 1);
        self.last_t.store(t, Ordering::SeqCst);
        Ok(Reading::from_axes(t, 0.1, 0.0, 9.81))
    }
}

#[tokio::test]
async fn test_engine_collects_and_persists() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("data").join("seismo.json");

    let mut config = Config::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.sensor.interval_ms = 5;
    config.storage.path = path.clone();
    config.storage.persist_on_sample = false;

    let sensor = Arc::new(CountingSensor {
        last_t: AtomicI64::new(0),
    });
    let engine = Engine::with_sensor(config, sensor).unwrap();
    let store = engine.store();

    engine
        .run(tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap();

    let live = store.snapshot();
    assert!(live.len() >= 3, "only {} samples collected", live.len());
    assert!(live.windows(2).all(|w| w[0].t < w[1].t));

    // The final flush on shutdown wrote exactly the live window
    let persisted = RetentionStore::load(&path).unwrap();
    assert_eq!(persisted, live);

    // A restart picks up where the last run left off
    let reopened = RetentionStore::open(&path);
    assert_eq!(reopened.snapshot(), live);
}
