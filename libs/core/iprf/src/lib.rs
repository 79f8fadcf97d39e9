// [libs/core/iprf/src/lib.rs]
//! =================================================================
//! APARATO: PLINKO IPRF
//! CLASIFICACIÓN: NÚCLEO CRIPTOGRÁFICO — DOMINIO PEQUEÑO, FUNCIONES TOTALES
//! RESPONSABILIDAD: LA PRF INVERTIBLE QUE ASIGNA ÍNDICE → RANURA DE HINT
//!
//! La construcción combina dos primitivas, cada una en su propio módulo:
//! un PRP Swap-or-Not (`prp`) sobre `[0, n)`, y un muestreador multinomial
//! pseudoaleatorio (`pmns`) que reparte ese dominio en `m` bins mediante un
//! árbol de bisección nunca materializado. `iprf` compone ambas. Toda la
//! aleatoriedad — claves de ronda, bits de ronda, conteos de bisección —
//! desciende de una única función de bloque keyada (`key_derivation`) con
//! separación de dominio por etiqueta.
#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod binomial;
pub mod errors;
pub mod iprf;
pub mod key_derivation;
pub mod pmns;
pub mod prp;

/// Reexportaciones de conveniencia para consumidores de este crate.
pub mod prelude {
    pub use crate::errors::IprfError;
    pub use crate::iprf::Iprf;
    pub use crate::key_derivation::derive_slot_keys;
    pub use crate::pmns::Pmns;
    pub use crate::prp::Prp;
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;

    /// Certifica que los tipos centrales del iPRF siguen siendo visibles en
    /// las rutas públicas que el motor de hints asume al compilar.
    #[test]
    fn certify_iprf_public_surface_visibility() {
        fn assert_public<T: 'static>() {
            let _ = TypeId::of::<T>();
        }

        assert_public::<crate::prp::Prp>();
        assert_public::<crate::pmns::Pmns>();
        assert_public::<crate::iprf::Iprf>();
        assert_public::<crate::errors::IprfError>();
    }
}
