// [libs/core/hint-engine/src/lib.rs]
//! =================================================================
//! APARATO: PLINKO HINT ENGINE
//! CLASIFICACIÓN: NÚCLEO — ESTADO LOCAL DEL CLIENTE
//! RESPONSABILIDAD: CICLO DE VIDA COMPLETO DE LA TABLA DE HINTS
//!
//! Todo lo que un cliente necesita para sostener consultas privadas
//! contra un snapshot ya descargado vive aquí: la materialización de
//! ranuras Regular/Backup por XOR folding, la selección de ranura con
//! fuente criptográfica en tiempo de consulta, la reconstrucción del
//! valor a partir de la respuesta del servidor, y la aplicación O(1)
//! por ranura de los deltas entrantes. No parsea bytes de red ni de
//! disco — eso es responsabilidad exclusiva de `plinko-codec` — y no
//! sabe nada de HTTP ni de la fuente ascendente de actualizaciones.
#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod pending_query;
pub mod slot;
pub mod table;

/// Reexportaciones de conveniencia para consumidores de este crate.
pub mod prelude {
    pub use crate::errors::HintError;
    pub use crate::pending_query::{FullSetQuery, PendingQuery, QueryVariant};
    pub use crate::slot::{CoverageRoute, HintSlot, SlotId, SlotIprf};
    pub use crate::table::{Dims, HintTable, DEFAULT_LAMBDA};
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;

    /// Certifica que la superficie pública que el servidor y el cliente
    /// esperan importar sigue siendo visible tras cualquier refactor.
    #[test]
    fn certify_hint_engine_public_surface_visibility() {
        fn assert_public<T: 'static>() {
            let _ = TypeId::of::<T>();
        }

        assert_public::<crate::table::HintTable>();
        assert_public::<crate::table::Dims>();
        assert_public::<crate::slot::HintSlot>();
        assert_public::<crate::slot::SlotIprf>();
        assert_public::<crate::pending_query::PendingQuery>();
        assert_public::<crate::pending_query::FullSetQuery>();
        assert_public::<crate::pending_query::QueryVariant>();
        assert_public::<crate::errors::HintError>();
    }
}
