// [apps/update-pipeline/src/server.rs]
/*!
 * =================================================================
 * APARATO: SUPERFICIE HTTP DE OBSERVABILIDAD
 * RESPONSABILIDAD: /health Y /metrics DEL PIPELINE
 * =================================================================
 */

use crate::metrics::PipelineMetrics;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Codifica la fase del ciclo actual para exponerla sin tomar un lock sobre
/// el pipeline: el bucle principal la actualiza tras cada transición.
#[derive(Debug, Clone)]
pub struct SharedPipelineStatus {
    last_processed_height: Arc<AtomicU64>,
    state_code: Arc<AtomicU8>,
}

impl SharedPipelineStatus {
    /// Construye el estado compartido, inicialmente en `Idle` y altura cero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_processed_height: Arc::new(AtomicU64::new(0)),
            state_code: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Publica la altura y fase observadas tras el tick más reciente.
    pub fn publish(&self, last_processed_height: u64, state_label: &'static str) {
        self.last_processed_height.store(last_processed_height, Ordering::Relaxed);
        let code = match state_label {
            "idle" => 0,
            "fetching" => 1,
            "applying" => 2,
            "publishing" => 3,
            _ => 255,
        };
        self.state_code.store(code, Ordering::Relaxed);
    }

    fn state_label(&self) -> &'static str {
        match self.state_code.load(Ordering::Relaxed) {
            0 => "idle",
            1 => "fetching",
            2 => "applying",
            3 => "publishing",
            _ => "unknown",
        }
    }
}

impl Default for SharedPipelineStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct AppState {
    metrics: Arc<PipelineMetrics>,
    status: SharedPipelineStatus,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    cycle_state: &'static str,
    last_processed_height: u64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "plinko-update-pipeline",
        cycle_state: state.status.state_label(),
        last_processed_height: state.status.last_processed_height.load(Ordering::Relaxed),
    })
}

async fn metrics(State(state): State<AppState>) -> Json<crate::metrics::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Construye el router de observabilidad del pipeline.
#[must_use]
pub fn build_router(metrics: Arc<PipelineMetrics>, status: SharedPipelineStatus) -> Router {
    let state = AppState { metrics, status };
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
