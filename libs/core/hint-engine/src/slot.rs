// [libs/core/hint-engine/src/slot.rs]
/*!
 * =================================================================
 * APARATO: RANURAS DE HINT (Regular / Backup / Promoted / Dead)
 * RESPONSABILIDAD: REPRESENTACIÓN Y SELECCIÓN DE CONJUNTOS CUBIERTOS
 *
 * Cada ranura guarda un conjunto de chunks (no de índices globales) más
 * un selector de offset determinístico por chunk: el índice global que
 * realmente contribuye a la paridad es `chunk * chunkSize + offset`,
 * donde `offset` proviene de la misma clave que identifica la ranura.
 * Esto es lo que el servidor reproduce en `/query/fullset`: dada la
 * clave, expande exactamente el mismo conjunto sin coordinación fuera
 * de banda.
 * =================================================================
 */

use plinko_codec::record::Record;
use plinko_iprf::iprf::Iprf;
use plinko_iprf::key_derivation::{derive_slot_keys, derive_u64, keyed_block};
use std::collections::HashSet;

const TAG_CHUNK_SUBSET: &[u8] = b"PLNK-CHUNK-SUBSET";
const TAG_SLOT_KEY: &[u8] = b"PLNK-SLOT-KEY";

/// Deriva la clave de 16 bytes de una ranura a partir de la clave maestra del
/// cliente y el identificador de la ranura.
#[must_use]
pub fn derive_slot_key(master_key: &[u8; 16], slot_id: u64) -> [u8; 16] {
    let block = keyed_block(master_key, TAG_SLOT_KEY, &[slot_id]);
    let mut key = [0u8; 16];
    key.copy_from_slice(&block[0..16]);
    key
}

/// Selector de offset-por-chunk derivado de la clave de una ranura, respaldado
/// por el iPRF compuesto (PRP∘PMNS) de `plinko-iprf`: para cada chunk se
/// deriva un par `(K1, K2)` propio vía `derive_slot_keys` y se evalúa
/// `Iprf::new(K1, K2, chunk_size, chunk_size).forward(0)`, tratando la
/// evaluación en `0` como "el único offset que esta ranura señala dentro del
/// chunk". El servidor reproduce exactamente el mismo cómputo a partir de la
/// misma clave de 16 bytes, sin coordinación fuera de banda.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotIprf {
    key: [u8; 16],
}

impl SlotIprf {
    /// Construye el selector a partir de la clave de 16 bytes de la ranura.
    #[must_use]
    pub fn new(key: [u8; 16]) -> Self {
        Self { key }
    }

    /// Clave subyacente, transmitida al servidor en una consulta `fullset`.
    #[must_use]
    pub fn key(&self) -> [u8; 16] {
        self.key
    }

    /// Offset seleccionado dentro de `chunk`, en `[0, chunk_size)`.
    #[must_use]
    pub fn offset_for_chunk(&self, chunk: u32, chunk_size: u64) -> u64 {
        let (k1, k2) = derive_slot_keys(&self.key, chunk as u64);
        Iprf::new(k1, k2, chunk_size, chunk_size)
            .forward(0)
            .expect("0 is in-domain for any non-empty chunk")
    }

    /// Índice global seleccionado por esta ranura dentro de `chunk`.
    #[must_use]
    pub fn global_index_for_chunk(&self, chunk: u32, chunk_size: u64) -> u64 {
        chunk as u64 * chunk_size + self.offset_for_chunk(chunk, chunk_size)
    }
}

/// Elige, por muestreo con rechazo sembrado por `key`, un subconjunto de
/// `subset_size` chunks distintos de `[0, m)`, en orden ascendente.
#[must_use]
pub fn derive_chunk_subset(key: &[u8; 16], m: u64, subset_size: u64) -> Vec<u32> {
    debug_assert!(subset_size <= m, "subset cannot exceed the chunk universe");

    let mut chosen: HashSet<u32> = HashSet::with_capacity(subset_size as usize);
    let mut counter = 0u64;
    while (chosen.len() as u64) < subset_size {
        let candidate = (derive_u64(key, TAG_CHUNK_SUBSET, &[counter]) % m) as u32;
        chosen.insert(candidate);
        counter += 1;
    }

    let mut result: Vec<u32> = chosen.into_iter().collect();
    result.sort_unstable();
    result
}

/// Identificador estable de una ranura dentro de `HintTable::slots`.
pub type SlotId = u32;

/// Cómo un índice cubierto por una ranura debe enrutarse al aplicar un delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageRoute {
    /// Ranura Regular o Promoted: el delta se XOR-ea directamente en `parity`.
    Direct,
    /// Ranura Backup, índice dentro de `B`: el delta se XOR-ea en `parity_in`.
    Inside,
    /// Ranura Backup, índice fuera de `B`: el delta se XOR-ea en `parity_out`.
    Outside,
}

/// Una ranura del estado local del cliente, en una de cuatro variantes
/// mutuamente excluyentes (invariante: una ranura está en exactamente una
/// variante en todo momento).
#[derive(Debug, Clone)]
pub enum HintSlot {
    /// Cubre `|P| = c/2 + 1` chunks; se destruye (pasa a `Dead`) al ser consumida.
    Regular {
        /// Chunks cubiertos, en orden ascendente.
        set: Vec<u32>,
        /// Paridad acumulada: XOR de los valores en los índices seleccionados de `set`.
        parity: Record,
        /// Selector de offset por chunk.
        iprf: SlotIprf,
    },
    /// Cubre la totalidad de `[0, m)` chunks, partidos en `inside`/`outside`.
    Backup {
        /// Chunks "dentro" de `B`, tamaño `c/2`.
        inside: Vec<u32>,
        /// Paridad sobre los índices seleccionados dentro de `B`.
        parity_in: Record,
        /// Paridad sobre los índices seleccionados fuera de `B`.
        parity_out: Record,
        /// Selector de offset por chunk.
        iprf: SlotIprf,
    },
    /// Resultado de promover una ranura Backup tras el consumo de una Regular.
    ///
    /// La paridad almacenada cubre exactamente `set` (vía `iprf`) más el
    /// punto fijo `queried_index` — nunca `set` solo. El chunk de
    /// `queried_index` (`promoted_chunk`) queda deliberadamente fuera de
    /// `set`: su contribución ya no se deriva de `iprf`, sino del valor
    /// recién revelado, así que `set` y `parity` quedan self-consistentes
    /// sin que el servidor necesite reproducir `queried_index` por su
    /// cuenta.
    Promoted {
        /// El conjunto de chunks cubierto vía `iprf` — `B` o su complemento,
        /// según cuál de las dos paridades de la Backup original ya incluía
        /// al chunk recién aprendido. Nunca incluye `promoted_chunk`.
        set: Vec<u32>,
        /// El chunk fijado por la promoción: su representante ya no es
        /// `iprf.global_index_for_chunk(promoted_chunk, _)` sino
        /// `queried_index` directamente.
        promoted_chunk: u32,
        /// El índice global contra el que se promovió esta ranura.
        queried_index: u64,
        /// Paridad de la ranura promovida: XOR sobre `set` (vía `iprf`) y
        /// `queried_index`.
        parity: Record,
        /// Selector de offset por chunk, heredado de la ranura Backup original:
        /// el servidor lo necesita para reexpandir `set` en una consulta `fullset`
        /// futura contra esta ranura ya promovida.
        iprf: SlotIprf,
        /// `true` si `set` es el complemento de `B` (la ranura se promovió fuera
        /// de `B`); `false` si `set` es `B` mismo.
        complement: bool,
    },
    /// Ranura consumida; sus entradas residuales en `coverage_index` se ignoran
    /// al consultar y al aplicar deltas.
    Dead,
}

impl HintSlot {
    /// `true` si la ranura puede servir una consulta directamente (Regular o Promoted).
    #[must_use]
    pub fn is_queryable(&self) -> bool {
        matches!(self, HintSlot::Regular { .. } | HintSlot::Promoted { .. })
    }
}
