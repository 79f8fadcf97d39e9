// [libs/core/hint-engine/src/errors.rs]
use thiserror::Error;

/// Fallos de la tabla de hints del cliente. La política de propagación (§7)
/// exige que estos errores viajen al llamador y nunca se registren dentro
/// de la capa algorítmica; el servicio que envuelve este crate decide si
/// loguear o degradar a una ruta no privada.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintError {
    /// Ninguna ranura Regular o Promoted cubre el índice solicitado.
    #[error("no hint slot covers the requested index; fall back to a non-private path")]
    HintExhausted,

    /// Un delta o una consulta referenció un índice fuera de `[0, db_size)`.
    #[error("index {index} is out of range [0, {db_size})")]
    OutOfRange {
        /// Índice recibido.
        index: u64,
        /// Cota exclusiva del tamaño de la base de datos.
        db_size: u64,
    },

    /// No quedan ranuras Backup disponibles para promover tras el consumo de una Regular.
    #[error("no backup slot remains available for promotion")]
    BackupsExhausted,
}
