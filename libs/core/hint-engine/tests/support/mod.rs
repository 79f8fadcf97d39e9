// [libs/core/hint-engine/tests/support/mod.rs]
//! Soporte compartido entre los escenarios de integración: una base de
//! datos de juguete y una emulación del servidor evaluador que reproduce
//! exactamente `apps/pir-server/src/handlers.rs::expand_query_set` a partir
//! de la sola clave pública que viaja en el sobre `FullSetQuery`. Si el
//! servidor real cambia su expansión, este helper debe cambiar con él.

use plinko_hint_engine::pending_query::{FullSetQuery, QueryVariant};
use plinko_hint_engine::slot::{derive_chunk_subset, SlotIprf};
use plinko_hint_engine::table::{Dims, HintTable};
use plinko_codec::record::{xor_record, Record};
use std::collections::HashSet;

/// Dimensiones pequeñas pero realistas para escenarios deterministas.
pub fn toy_dims(db_size: u64) -> Dims {
    let chunk_size = 8u64;
    let set_size = db_size.div_ceil(chunk_size).max(4);
    Dims {
        db_size,
        chunk_size,
        set_size,
    }
}

/// Base de datos cuyo registro `i` contiene `i` en sus 8 bytes bajos.
pub fn toy_database(dims: Dims) -> Vec<Record> {
    (0..dims.padded_capacity())
        .map(|i| {
            let mut record = [0u8; 32];
            record[0..8].copy_from_slice(&i.to_le_bytes());
            record
        })
        .collect()
}

/// Emula `POST /query/fullset`: expande el mismo conjunto que el servidor
/// real reconstruiría a partir de `envelope`, y devuelve su paridad XOR.
pub fn fake_server_parity(envelope: &FullSetQuery, dims: Dims, database: &[Record]) -> Record {
    let subset_size = match envelope.variant {
        QueryVariant::Regular => dims.chunk_size / 2 + 1,
        QueryVariant::PromotedInside | QueryVariant::PromotedComplement => dims.chunk_size / 2,
    };

    let derived = derive_chunk_subset(&envelope.prf_key, dims.set_size, subset_size);
    let chunks: Vec<u32> = match envelope.variant {
        QueryVariant::PromotedComplement => {
            let inside: HashSet<u32> = derived.iter().copied().collect();
            (0..dims.set_size as u32).filter(|chunk| !inside.contains(chunk)).collect()
        }
        QueryVariant::Regular | QueryVariant::PromotedInside => derived,
    };

    let iprf = SlotIprf::new(envelope.prf_key);
    let mut indices: Vec<u64> = chunks
        .into_iter()
        .filter(|&chunk| chunk != envelope.excluded_chunk)
        .map(|chunk| iprf.global_index_for_chunk(chunk, dims.chunk_size))
        .collect();

    if let Some(chunk) = envelope.promoted_chunk {
        if chunk != envelope.excluded_chunk {
            indices.push(iprf.global_index_for_chunk(chunk, dims.chunk_size));
        }
    }

    indices.into_iter().fold([0u8; 32], |acc, index| match database.get(index as usize) {
        Some(value) => xor_record(&acc, value),
        None => acc,
    })
}

/// Consulta `index` contra `table` y reconstruye el valor recuperado,
/// emulando el servidor contra `database`.
pub fn query_and_reconstruct(table: &mut HintTable, database: &[Record], dims: Dims, index: u64) -> Record {
    let pending = table.query(index).expect("index must be covered for this helper to be used");
    let server_parity = fake_server_parity(&pending.envelope(), dims, database);
    pending.reconstruct(table, &server_parity)
}
