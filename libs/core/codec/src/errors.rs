// [libs/core/codec/src/errors.rs]
// =================================================================
// APARATO: CODEC ERRORS
// RESPONSABILIDAD: CATÁLOGO DE FALLOS DE FORMATO BINARIO Y JSON
// =================================================================

use thiserror::Error;

/// Catálogo de fallos al codificar o decodificar un artefacto del protocolo.
///
/// Separa los fallos de transporte (I/O) de los fallos de contenido
/// (formato), de forma que la capa de servicio pueda traducir cada
/// variante al código HTTP correcto sin inspeccionar el mensaje.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Error de lectura o escritura del sistema de archivos.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// El buffer es más corto que el encabezado o el tamaño de registro esperado.
    #[error("truncated artifact: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Tamaño mínimo requerido.
        expected: usize,
        /// Tamaño observado.
        actual: usize,
    },

    /// El byte de versión al inicio del artefacto no es soportado.
    #[error("unsupported format version: {0}")]
    BadVersion(u8),

    /// El tamaño total del archivo no es múltiplo del tamaño de registro declarado.
    #[error("misaligned record stream: {len} bytes is not a multiple of {record_size}")]
    Misaligned {
        /// Tamaño total observado.
        len: usize,
        /// Tamaño de registro esperado.
        record_size: usize,
    },

    /// El mapeo de direcciones contiene un índice duplicado, violando la biyección.
    #[error("address map is not a bijection: index {0} appears more than once")]
    DuplicateIndex(u32),

    /// El sobre de consulta comprimido está mal formado.
    #[error("malformed query envelope: {0}")]
    MalformedEnvelope(String),

    /// Fallo de (de)serialización JSON de un manifiesto.
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
