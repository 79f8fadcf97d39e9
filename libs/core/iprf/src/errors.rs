// [libs/core/iprf/src/errors.rs]
use thiserror::Error;

/// Fallos de la construcción iPRF. Al tratarse de funciones totales sobre su
/// dominio/rango declarado, el único modo de fallo es una entrada fuera de rango.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IprfError {
    /// `x` (o `y`) cayó fuera de `[0, bound)`.
    #[error("value {value} is out of range [0, {bound})")]
    InvalidRange {
        /// Valor recibido.
        value: u64,
        /// Cota exclusiva del dominio o rango válido.
        bound: u64,
    },
}
