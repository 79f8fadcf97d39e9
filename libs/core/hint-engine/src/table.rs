// [libs/core/hint-engine/src/table.rs]
/*!
 * =================================================================
 * APARATO: TABLA DE HINTS
 * RESPONSABILIDAD: CICLO DE VIDA COMPLETO DEL ESTADO LOCAL DEL CLIENTE
 * =================================================================
 */

use crate::errors::HintError;
use crate::pending_query::PendingQuery;
use crate::slot::{derive_chunk_subset, derive_slot_key, CoverageRoute, HintSlot, SlotId, SlotIprf};
use plinko_codec::record::{xor_into, xor_record, Record};
use rand::rngs::OsRng;
use rand::Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::instrument;

/// Parámetro de seguridad λ por defecto: cantidad de ranuras Regular (y,
/// por separado, Backup) asignadas por chunk del rango.
pub const DEFAULT_LAMBDA: u64 = 64;

/// Dimensiones de la base de datos subyacente, publicadas en el manifiesto
/// del snapshot y necesarias para reconstruir cualquier selección de chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    /// `N`: cantidad real de registros.
    pub db_size: u64,
    /// `c`: tamaño de chunk, menor potencia de dos ≥ 2√N.
    pub chunk_size: u64,
    /// `m`: cantidad de chunks, ⌈N / c⌉ redondeado a múltiplo de 4.
    pub set_size: u64,
}

impl Dims {
    /// Cota exclusiva del espacio de índices acolchado: `c · m`.
    #[must_use]
    pub fn padded_capacity(&self) -> u64 {
        self.chunk_size * self.set_size
    }
}

/// Estado local completo del cliente: el vector de ranuras y el índice de
/// cobertura invertido construido una única vez en `initialize`.
pub struct HintTable {
    slots: Vec<HintSlot>,
    coverage_index: HashMap<u64, Vec<(SlotId, CoverageRoute)>>,
    dims: Dims,
}

impl HintTable {
    /// Construye la tabla de hints completa a partir de una base de datos en
    /// memoria (el snapshot recién descargado), las dimensiones declaradas en
    /// el manifiesto y la clave maestra del cliente.
    ///
    /// Asigna `lambda * set_size` ranuras Regular y otras tantas Backup. La
    /// construcción por ranura es independiente, así que se paraleliza con
    /// `rayon`: cada tarea produce su propia ranura, y una pasada de
    /// reducción secuencial ensambla el índice de cobertura invertido.
    #[instrument(skip(database, master_key), fields(db_size = dims.db_size, chunk_size = dims.chunk_size, set_size = dims.set_size))]
    pub fn initialize(database: &[Record], dims: Dims, master_key: &[u8; 16], lambda: u64) -> Self {
        let regular_count = lambda * dims.set_size;
        let backup_count = lambda * dims.set_size;
        let regular_subset_size = dims.chunk_size / 2 + 1;
        let backup_subset_size = dims.chunk_size / 2;

        let regular_slots: Vec<HintSlot> = (0..regular_count)
            .into_par_iter()
            .map(|slot_offset| {
                let slot_id = slot_offset;
                let key = derive_slot_key(master_key, slot_id);
                build_regular_slot(key, dims, regular_subset_size, database)
            })
            .collect();

        let backup_slots: Vec<HintSlot> = (0..backup_count)
            .into_par_iter()
            .map(|slot_offset| {
                let slot_id = regular_count + slot_offset;
                let key = derive_slot_key(master_key, slot_id);
                build_backup_slot(key, dims, backup_subset_size, database)
            })
            .collect();

        let mut slots = Vec::with_capacity((regular_count + backup_count) as usize);
        slots.extend(regular_slots);
        slots.extend(backup_slots);

        let coverage_index = build_coverage_index(&slots, dims);

        Self {
            slots,
            coverage_index,
            dims,
        }
    }

    /// Dimensiones declaradas de la base de datos que respalda esta tabla.
    #[must_use]
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Estimación de cobertura: fracción de índices `[0, db_size)` cubiertos
    /// por al menos una ranura consultable (Regular o Promoted). Sirve como
    /// señal para decidir si el cliente debe re-descargar un snapshot fresco
    /// en lugar de seguir operando con una tabla degradada.
    #[must_use]
    pub fn coverage_estimate(&self) -> f64 {
        if self.dims.db_size == 0 {
            return 1.0;
        }
        let covered = self
            .coverage_index
            .iter()
            .filter(|(index, routes)| {
                **index < self.dims.db_size
                    && routes
                        .iter()
                        .any(|(slot_id, _route)| self.slots[*slot_id as usize].is_queryable())
            })
            .count();
        covered as f64 / self.dims.db_size as f64
    }

    /// Resuelve una consulta sobre el índice `index`, eligiendo entre las
    /// ranuras candidatas con una fuente aleatoria criptográficamente segura
    /// (§4.2 "Slot selection shuffle") para no filtrar patrones de uso.
    ///
    /// # Errors
    /// `HintError::OutOfRange` si `index >= db_size`; `HintError::HintExhausted`
    /// si ninguna ranura consultable cubre el índice.
    pub fn query(&mut self, index: u64) -> Result<PendingQuery, HintError> {
        if index >= self.dims.db_size {
            return Err(HintError::OutOfRange {
                index,
                db_size: self.dims.db_size,
            });
        }

        // Route tags (`Direct`/`Inside`/`Outside`) only disambiguate which parity
        // field a delta lands in; once a slot is queryable (Regular or promoted
        // from Backup) any route pointing at it is a valid query candidate.
        // `promote_next_backup` re-tags a promoted slot's surviving coverage
        // entries to `Direct` and prunes the rest, so a stale `Inside`/`Outside`
        // tag never points at a slot that no longer covers that index.
        let candidates: Vec<SlotId> = self
            .coverage_index
            .get(&index)
            .into_iter()
            .flatten()
            .filter(|(slot_id, _route)| self.slots[*slot_id as usize].is_queryable())
            .map(|(slot_id, _)| *slot_id)
            .collect();

        if candidates.is_empty() {
            return Err(HintError::HintExhausted);
        }

        let mut csprng = OsRng;
        let chosen_slot_id = candidates[csprng.gen_range(0..candidates.len())];
        PendingQuery::build(self, chosen_slot_id, index, self.dims.chunk_size)
    }

    /// Ejecuta la contabilidad posterior a una consulta exitosa: mata la
    /// ranura consumida y, si hay una Backup disponible, la promueve contra
    /// el mismo índice (§4.2 "Post-query bookkeeping").
    pub(crate) fn finalize_query(&mut self, consumed_slot_id: SlotId, queried_index: u64, recovered_value: Record) {
        self.slots[consumed_slot_id as usize] = HintSlot::Dead;
        if let Err(error) = self.promote_next_backup(queried_index, recovered_value) {
            tracing::debug!(?error, "no backup slot available for promotion");
        }
    }

    /// Promueve una ranura Backup cuyo propio representante para el chunk de
    /// `queried_index` coincide exactamente con `queried_index` — nunca una
    /// elegida al azar entre las Backup disponibles. Esa coincidencia es lo
    /// que permite que el valor recién revelado reemplace, sin coordinación
    /// externa, la contribución que esa Backup ya tenía planeada para ese
    /// chunk: el servidor reproduce la misma igualdad reconstruyendo
    /// `iprf.global_index_for_chunk(chunk, _)` con la clave de la propia
    /// ranura, así que no hay ningún valor "aprendido externamente" que
    /// transmitir aparte del chunk y el índice recién revelado.
    fn promote_next_backup(&mut self, queried_index: u64, recovered_value: Record) -> Result<(), HintError> {
        let chunk = (queried_index / self.dims.chunk_size) as u32;

        let candidates: Vec<(SlotId, bool)> = self
            .coverage_index
            .get(&queried_index)
            .into_iter()
            .flatten()
            .filter_map(|(slot_id, route)| match (route, &self.slots[*slot_id as usize]) {
                (CoverageRoute::Inside, HintSlot::Backup { .. }) => Some((*slot_id, true)),
                (CoverageRoute::Outside, HintSlot::Backup { .. }) => Some((*slot_id, false)),
                _ => None,
            })
            .collect();

        if candidates.is_empty() {
            return Err(HintError::BackupsExhausted);
        }

        let mut csprng = OsRng;
        let (slot_id, inside_membership) = candidates[csprng.gen_range(0..candidates.len())];

        let HintSlot::Backup {
            inside,
            parity_in,
            parity_out,
            iprf,
        } = self.slots[slot_id as usize].clone()
        else {
            unreachable!("coverage_index only tags Backup slots with Inside/Outside routes");
        };

        // `chunk` belongs to whichever of `inside`/its complement already
        // folded its own representative into one parity half; the
        // self-consistent promoted set is the OTHER half (which never
        // touched this chunk), paired with that half's unmodified parity
        // XORed with the value just learned for `chunk` itself.
        let (set, complement, parity) = if inside_membership {
            (complement_of(&inside, self.dims.set_size), true, xor_record(&parity_out, &recovered_value))
        } else {
            (inside.clone(), false, xor_record(&parity_in, &recovered_value))
        };

        retag_promoted_coverage(&mut self.coverage_index, slot_id, &iprf, self.dims, &set, chunk);

        self.slots[slot_id as usize] = HintSlot::Promoted {
            set,
            promoted_chunk: chunk,
            queried_index,
            parity,
            iprf,
            complement,
        };

        Ok(())
    }

    /// Aplica un único delta `(index, xor)` a toda ranura cuyo índice de
    /// cobertura lo incluya, en O(cobertura) vía el índice invertido.
    ///
    /// # Errors
    /// `HintError::OutOfRange` si `index >= db_size`.
    pub fn apply_delta(&mut self, index: u64, xor: &Record) -> Result<(), HintError> {
        if index >= self.dims.db_size {
            return Err(HintError::OutOfRange {
                index,
                db_size: self.dims.db_size,
            });
        }

        if let Some(routes) = self.coverage_index.get(&index) {
            for (slot_id, route) in routes {
                // `promote_next_backup` retags every surviving entry for a
                // promoted slot to `Direct` and prunes the rest, so a
                // Promoted slot is only ever reached here via `Direct`; the
                // `Inside`/`Outside` tags below apply exclusively to slots
                // still in `Backup` form.
                match &mut self.slots[*slot_id as usize] {
                    HintSlot::Regular { parity, .. } | HintSlot::Promoted { parity, .. } => {
                        xor_into(parity, xor);
                    }
                    HintSlot::Backup { parity_in, parity_out, .. } => match route {
                        CoverageRoute::Inside => xor_into(parity_in, xor),
                        CoverageRoute::Outside => xor_into(parity_out, xor),
                        CoverageRoute::Direct => {}
                    },
                    HintSlot::Dead => {}
                }
            }
        }

        Ok(())
    }

    /// Aplica una secuencia ordenada de deltas, en el orden recibido.
    ///
    /// # Errors
    /// Se detiene y propaga en el primer `OutOfRange`.
    pub fn apply_deltas(&mut self, deltas: &[(u64, Record)]) -> Result<(), HintError> {
        for (index, xor) in deltas {
            self.apply_delta(*index, xor)?;
        }
        Ok(())
    }

    pub(crate) fn slot(&self, slot_id: SlotId) -> &HintSlot {
        &self.slots[slot_id as usize]
    }
}

fn build_regular_slot(key: [u8; 16], dims: Dims, subset_size: u64, database: &[Record]) -> HintSlot {
    let set = derive_chunk_subset(&key, dims.set_size, subset_size);
    let iprf = SlotIprf::new(key);
    let mut parity: Record = [0u8; 32];
    for &chunk in &set {
        let global_index = iprf.global_index_for_chunk(chunk, dims.chunk_size);
        if let Some(value) = database.get(global_index as usize) {
            xor_into(&mut parity, value);
        }
    }
    HintSlot::Regular { set, parity, iprf }
}

fn build_backup_slot(key: [u8; 16], dims: Dims, backup_subset_size: u64, database: &[Record]) -> HintSlot {
    let inside = derive_chunk_subset(&key, dims.set_size, backup_subset_size);
    let iprf = SlotIprf::new(key);
    let mut parity_in: Record = [0u8; 32];
    let mut parity_out: Record = [0u8; 32];

    for chunk in 0..dims.set_size as u32 {
        let global_index = iprf.global_index_for_chunk(chunk, dims.chunk_size);
        let Some(value) = database.get(global_index as usize) else {
            continue;
        };
        if inside.binary_search(&chunk).is_ok() {
            xor_into(&mut parity_in, value);
        } else {
            xor_into(&mut parity_out, value);
        }
    }

    HintSlot::Backup {
        inside,
        parity_in,
        parity_out,
        iprf,
    }
}

fn build_coverage_index(slots: &[HintSlot], dims: Dims) -> HashMap<u64, Vec<(SlotId, CoverageRoute)>> {
    let mut index: HashMap<u64, Vec<(SlotId, CoverageRoute)>> = HashMap::new();

    for (slot_id, slot) in slots.iter().enumerate() {
        let slot_id = slot_id as SlotId;
        match slot {
            HintSlot::Regular { set, iprf, .. } => {
                for &chunk in set {
                    let global_index = iprf.global_index_for_chunk(chunk, dims.chunk_size);
                    index
                        .entry(global_index)
                        .or_default()
                        .push((slot_id, CoverageRoute::Direct));
                }
            }
            HintSlot::Backup { inside, iprf, .. } => {
                let inside_set: std::collections::HashSet<u32> = inside.iter().copied().collect();
                for chunk in 0..dims.set_size as u32 {
                    let global_index = iprf.global_index_for_chunk(chunk, dims.chunk_size);
                    let route = if inside_set.contains(&chunk) {
                        CoverageRoute::Inside
                    } else {
                        CoverageRoute::Outside
                    };
                    index.entry(global_index).or_default().push((slot_id, route));
                }
            }
            HintSlot::Promoted { .. } | HintSlot::Dead => {}
        }
    }

    index
}

fn complement_of(inside: &[u32], set_size: u64) -> Vec<u32> {
    let inside_set: std::collections::HashSet<u32> = inside.iter().copied().collect();
    (0..set_size as u32).filter(|chunk| !inside_set.contains(chunk)).collect()
}

/// Tras promover `slot_id`, recorta sus `set_size` entradas originales en
/// `coverage_index` (una por chunk, heredadas de cuando era Backup) a sólo
/// las que el nuevo `set` promovido — más el `promoted_chunk` fijado —
/// sigue cubriendo, y las reetiqueta `Direct`. El resto se elimina: la
/// ranura ya no contribuye a esos índices ni en consultas ni en deltas.
fn retag_promoted_coverage(
    coverage_index: &mut HashMap<u64, Vec<(SlotId, CoverageRoute)>>,
    slot_id: SlotId,
    iprf: &SlotIprf,
    dims: Dims,
    set: &[u32],
    promoted_chunk: u32,
) {
    let keep: std::collections::HashSet<u32> = set.iter().copied().collect();

    for chunk in 0..dims.set_size as u32 {
        let global_index = iprf.global_index_for_chunk(chunk, dims.chunk_size);
        let Some(routes) = coverage_index.get_mut(&global_index) else {
            continue;
        };

        if chunk == promoted_chunk || keep.contains(&chunk) {
            if let Some(entry) = routes.iter_mut().find(|(id, _)| *id == slot_id) {
                entry.1 = CoverageRoute::Direct;
            }
        } else {
            routes.retain(|(id, _)| *id != slot_id);
            if routes.is_empty() {
                coverage_index.remove(&global_index);
            }
        }
    }
}
