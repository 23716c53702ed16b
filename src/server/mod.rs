// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! HTTP server for the history API and the trace page

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::RetentionStore;
use crate::render::{render_page, render_trace, Canvas};
use crate::sensors::{now_ms, Reading};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// History shared with the sampler
    pub store: Arc<RetentionStore>,
    /// Retention window applied on every read
    pub history_ms: i64,
    /// Drawing surface for the trace page
    pub canvas: Canvas,
}

impl AppState {
    /// State for `store` with a window of `history_ms`
    pub fn new(store: Arc<RetentionStore>, history_ms: i64) -> Self {
        Self {
            store,
            history_ms,
            canvas: Canvas::default(),
        }
    }

    /// Pruned copy of the history as of `now`
    fn current(&self, now: i64) -> Vec<Reading> {
        self.store.prune(now, self.history_ms);
        self.store.snapshot()
    }
}

/// Body of `GET /api/data`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    /// Retention window in milliseconds
    pub history_ms: i64,
    /// Samples inside the window, oldest first
    pub samples: Vec<Reading>,
}

/// `GET /` trace page and `GET /api/data` history
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(trace_page))
        .route("/api/data", get(history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let samples = state.current(now_ms());
    Json(HistoryResponse {
        history_ms: state.history_ms,
        samples,
    })
}

async fn trace_page(State(state): State<AppState>) -> Html<String> {
    let now = now_ms();
    let samples = state.current(now);
    let geometry = render_trace(&samples, state.history_ms, now, &state.canvas);
    Html(render_page(&geometry, &state.canvas))
}

/// Bound HTTP listener, ready to serve
pub struct HttpServer {
    listener: TcpListener,
    state: AppState,
}

impl HttpServer {
    /// Bind `addr` without serving yet
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, state })
    }

    /// Address actually bound, useful with port 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` fires, then drain in-flight requests
    pub async fn serve(self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let addr = self.local_addr()?;
        info!("Listening on http://{}", addr);

        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        info!("HTTP server on {} stopped", addr);
        Ok(())
    }
}
