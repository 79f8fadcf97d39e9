// [apps/pir-server/src/errors.rs]
/*!
 * =================================================================
 * APARATO: ERRORES DEL SERVICIO
 * RESPONSABILIDAD: TRADUCCIÓN DE FALLOS DE DOMINIO A RESPUESTAS HTTP
 *
 * Ningún mensaje de error incluye el índice, la dirección o la clave
 * que originó el fallo (§7 "User-visible behavior"): el cuerpo de
 * respuesta describe la clase de fallo, nunca su contenido.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Catálogo de fallos que un handler puede devolver al llamador.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Un índice o conjunto de índices cayó fuera de `[0, db_size)`.
    #[error("requested index is out of range")]
    InputRange,

    /// El cuerpo de la solicitud no corresponde al esquema esperado.
    #[error("malformed request body")]
    Format,

    /// La clave PRF de una consulta `fullset` no mide exactamente 16 bytes.
    #[error("PRF key must be exactly 16 bytes")]
    BadKey,

    /// El deadline propagado por el llamador expiró antes de completar la consulta.
    #[error("request exceeded its deadline")]
    Timeout,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            ServerError::InputRange => (StatusCode::BAD_REQUEST, "out_of_range"),
            ServerError::Format => (StatusCode::BAD_REQUEST, "malformed_request"),
            ServerError::BadKey => (StatusCode::BAD_REQUEST, "bad_key"),
            ServerError::Timeout => (StatusCode::REQUEST_TIMEOUT, "timeout"),
        };
        (status, Json(ErrorBody { error: code })).into_response()
    }
}
