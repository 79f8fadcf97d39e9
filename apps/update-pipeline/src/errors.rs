// [apps/update-pipeline/src/errors.rs]
/*!
 * =================================================================
 * APARATO: ERRORES DEL PIPELINE
 * RESPONSABILIDAD: CATÁLOGO DE FALLOS DEL CICLO DE ACTUALIZACIÓN
 * =================================================================
 */

use plinko_codec::errors::CodecError;
use plinko_upstream_client::UpstreamRpcError;
use thiserror::Error;

/// Fallos que puede producir un tick del pipeline de actualización.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// El upstream rechazó la solicitud, o el enlace de red falló tras
    /// agotar la política de reintentos (§4.4 "Retry policy").
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamRpcError),

    /// Fallo al codificar o decodificar un artefacto publicado (delta,
    /// bundle o manifiesto).
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Fallo de I/O sobre `database.bin` o el directorio de deltas.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Un error de configuración irrecuperable detectado al arrancar: el
    /// binario sale con código distinto de cero (§6 "Exit codes").
    #[error("fatal configuration error: {0}")]
    ConfigFatal(String),
}

impl PipelineError {
    /// `true` si el fallo es propio de un único bloque y el ciclo debe
    /// simplemente reintentar sin avanzar `last_processed_height`, en vez de
    /// abortar el proceso completo.
    #[must_use]
    pub fn is_block_local(&self) -> bool {
        matches!(self, PipelineError::Upstream(_) | PipelineError::Codec(_))
    }
}
