// [libs/core/codec/src/lib.rs]
//! =================================================================
//! APARATO: PLINKO CODEC
//! CLASIFICACIÓN: NÚCLEO — SIN DEPENDENCIAS DE PROTOCOLO DE RED
//! RESPONSABILIDAD: LA ÚNICA FUENTE DE VERDAD SOBRE LOS BYTES EN DISCO
//!
//! Todo formato binario o JSON que cruza el límite entre procesos —
//! snapshot, mapeo de direcciones, delta, bundle, manifiesto, encabezado
//! de hint local, sobre de consulta comprimido — vive aquí y en ninguna
//! otra parte. Ni el motor de hints ni el servidor ni el pipeline de
//! actualización parsean bytes por su cuenta: todos dependen de este
//! crate como biblioteca compartida.
//!
//! # Convenciones
//! Todo entero multibyte es little-endian. Los archivos binarios que
//! llevan un byte de versión lo colocan como primer byte; las
//! estructuras de este módulo que aún no versionan su formato lo anotan
//! explícitamente en su documentación.
#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod address_map;
pub mod atomic_io;
pub mod bundle;
pub mod delta;
pub mod errors;
pub mod hint_header;
pub mod manifest;
pub mod query_envelope;
pub mod record;

/// Reexportaciones de conveniencia para consumidores de este crate.
pub mod prelude {
    pub use crate::address_map::AddressMap;
    pub use crate::atomic_io::write_atomic;
    pub use crate::bundle::BundleFile;
    pub use crate::delta::{DeltaEntry, DeltaEntryLayout, DeltaFile, DeltaHeader};
    pub use crate::errors::CodecError;
    pub use crate::hint_header::HintFileHeader;
    pub use crate::manifest::{DeltaManifest, SnapshotManifest};
    pub use crate::query_envelope::QueryEnvelope;
    pub use crate::record::{xor_into, xor_record, Address, Record};
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;

    /// Certifica que los tipos centrales del codec siguen siendo visibles en
    /// las rutas públicas que el resto del workspace asume al compilar.
    #[test]
    fn certify_codec_public_surface_visibility() {
        fn assert_public<T: 'static>() {
            let _ = TypeId::of::<T>();
        }

        assert_public::<crate::address_map::AddressMap>();
        assert_public::<crate::delta::DeltaFile>();
        assert_public::<crate::bundle::BundleFile>();
        assert_public::<crate::manifest::SnapshotManifest>();
        assert_public::<crate::manifest::DeltaManifest>();
        assert_public::<crate::hint_header::HintFileHeader>();
        assert_public::<crate::query_envelope::QueryEnvelope>();
        assert_public::<crate::errors::CodecError>();
    }
}
