// [apps/pir-server/src/state.rs]
/*!
 * =================================================================
 * APARATO: ESTADO COMPARTIDO DEL SERVIDOR
 * =================================================================
 */

use crate::mirror::DatabaseMirror;
use plinko_codec::address_map::AddressMap;
use plinko_hint_engine::table::Dims;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Estado inyectado en cada handler vía `axum::extract::State`.
#[derive(Clone)]
pub struct ServerState {
    /// El espejo de la base de datos: un solo escritor (pipeline), muchos lectores.
    pub mirror: Arc<RwLock<DatabaseMirror>>,
    /// Mapeo dirección → índice, inmutable durante la vida del snapshot activo.
    pub address_map: Arc<AddressMap>,
    /// Dimensiones declaradas por el manifiesto del snapshot activo.
    pub dims: Dims,
    /// Deadline aplicado a una consulta que no especifica uno propio.
    pub default_deadline_ms: u64,
    /// Instante de arranque, para calcular `uptime_seconds` en `/health`.
    pub started_at: Instant,
}
