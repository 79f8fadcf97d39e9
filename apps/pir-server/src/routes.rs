// [apps/pir-server/src/routes.rs]
/*!
 * =================================================================
 * APARATO: ENRUTAMIENTO HTTP
 * RESPONSABILIDAD: LAS CUATRO RUTAS DEL SERVER EVALUATOR
 * =================================================================
 */

use crate::handlers;
use crate::state::ServerState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Construye el `Router` completo, ya inyectado con `ServerState`.
#[must_use]
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/query/plaintext",
            get(handlers::plaintext_get).post(handlers::plaintext_post),
        )
        .route("/query/setparity", post(handlers::setparity))
        .route("/query/fullset", post(handlers::fullset))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
