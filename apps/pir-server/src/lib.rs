// [apps/pir-server/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PIR SERVER LIBRARY ROOT
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DEL EVALUADOR
 *
 * El servidor es deliberadamente delgado: un espejo en memoria de la
 * base de datos, cuatro rutas, y ningún estado por consulta. No
 * interpreta direcciones, no persiste sesiones, y nunca registra el
 * contenido de una clave o un índice recibido.
 * =================================================================
 */

/// Configuración del binario vía `clap` + variables de entorno.
pub mod config;
/// Catálogo de errores del servicio y su traducción a respuestas HTTP.
pub mod errors;
/// Adaptadores HTTP: extracción de cuerpo/deadline y construcción de respuestas.
pub mod handlers;
/// El espejo en memoria de la base de datos y sus operaciones de lectura/escritura.
pub mod mirror;
/// La topología de rutas axum.
pub mod routes;
/// Estado compartido entre handlers.
pub mod state;

/// Reexportaciones de conveniencia para `main.rs`.
pub mod prelude {
    pub use crate::config::ServerConfig;
    pub use crate::errors::ServerError;
    pub use crate::mirror::DatabaseMirror;
    pub use crate::routes::build_router;
    pub use crate::state::ServerState;
}
