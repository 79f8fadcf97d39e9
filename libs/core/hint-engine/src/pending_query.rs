// [libs/core/hint-engine/src/pending_query.rs]
/*!
 * =================================================================
 * APARATO: CONSULTA PENDIENTE (FULL-SET PERFORADO POR CHUNK)
 * RESPONSABILIDAD: SOBRE DE RED Y RECONSTRUCCIÓN LOCAL DEL "AGUJERO"
 *
 * La ranura elegida ya cubre `j`: su paridad almacenada es el XOR de
 * database[j] junto con el resto de los puntos representativos de su
 * conjunto. Pedirle al servidor que reexpanda la clave completa no
 * enseña nada nuevo — es la misma paridad que el cliente ya tiene.
 * En cambio, el cliente pide la paridad del conjunto SIN el chunk que
 * contiene a `j` (perforado a nivel de chunk, no de índice): el
 * servidor nunca ve `j`, sólo el número de chunk excluido, y expande
 * el resto exactamente como lo hizo el cliente al construir la ranura.
 * El cliente recupera database[j] XOR-eando esa respuesta contra su
 * propia paridad completa, que ya incluía la contribución del chunk
 * excluido.
 * =================================================================
 */

use crate::errors::HintError;
use crate::slot::{HintSlot, SlotId};
use crate::table::HintTable;
use plinko_codec::record::{xor_record, Record};
use serde::{Deserialize, Serialize};

/// Qué regla de derivación de conjunto debe reproducir el servidor al
/// expandir `prf_key`. El servidor nunca recibe el conjunto en sí, sólo
/// esta etiqueta más la clave, y lo reconstruye con la misma función que
/// usó el cliente al materializar la ranura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryVariant {
    /// Conjunto de `chunk_size/2 + 1` chunks derivado directamente de la clave.
    Regular,
    /// Conjunto `B` (tamaño `chunk_size/2`) de una ranura Backup promovida.
    PromotedInside,
    /// Complemento de `B` de una ranura Backup promovida.
    PromotedComplement,
}

/// El sobre exacto enviado a `POST /query/fullset`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FullSetQuery {
    /// Clave de 16 bytes de la ranura elegida, transmitida en claro: no
    /// revela el índice consultado, sólo la estructura del conjunto.
    pub prf_key: [u8; 16],
    /// Chunk excluido de la expansión del servidor.
    pub excluded_chunk: u32,
    /// Regla de derivación que el servidor debe reproducir.
    pub variant: QueryVariant,
    /// Para una ranura `Promoted`, el chunk fijado en la promoción: el
    /// servidor debe excluirlo de la expansión vía `prf_key` igual que
    /// `excluded_chunk` (su contribución ya no viene de la clave, sino del
    /// valor revelado que el cliente conserva localmente). `None` para
    /// `QueryVariant::Regular`, que no tiene chunk fijado.
    pub promoted_chunk: Option<u32>,
}

/// Una consulta en vuelo: conserva localmente lo que el servidor nunca ve
/// (la paridad completa de la ranura, de la que el chunk excluido ya forma
/// parte) hasta que llega la respuesta de red.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    slot_id: SlotId,
    queried_index: u64,
    envelope: FullSetQuery,
    stored_parity: Record,
}

impl PendingQuery {
    /// Construye la consulta perforada a partir de la ranura que
    /// `HintTable::query` ya eligió como candidata consultable.
    ///
    /// # Errors
    /// `HintError::HintExhausted` si la ranura resultara no consultable;
    /// no debería ocurrir porque `HintTable::query` sólo elige entre
    /// candidatas ya filtradas por `HintSlot::is_queryable`.
    pub(crate) fn build(
        table: &HintTable,
        slot_id: SlotId,
        queried_index: u64,
        chunk_size: u64,
    ) -> Result<Self, HintError> {
        let chunk = (queried_index / chunk_size) as u32;

        let (envelope, stored_parity) = match table.slot(slot_id) {
            HintSlot::Regular { parity, iprf, .. } => (
                FullSetQuery {
                    prf_key: iprf.key(),
                    excluded_chunk: chunk,
                    variant: QueryVariant::Regular,
                    promoted_chunk: None,
                },
                *parity,
            ),
            HintSlot::Promoted {
                parity,
                iprf,
                complement,
                promoted_chunk,
                ..
            } => (
                FullSetQuery {
                    prf_key: iprf.key(),
                    excluded_chunk: chunk,
                    variant: if *complement {
                        QueryVariant::PromotedComplement
                    } else {
                        QueryVariant::PromotedInside
                    },
                    promoted_chunk: Some(*promoted_chunk),
                },
                *parity,
            ),
            HintSlot::Backup { .. } | HintSlot::Dead => return Err(HintError::HintExhausted),
        };

        Ok(Self {
            slot_id,
            queried_index,
            envelope,
            stored_parity,
        })
    }

    /// El sobre a serializar y enviar a `/query/fullset`.
    #[must_use]
    pub fn envelope(&self) -> FullSetQuery {
        self.envelope
    }

    /// El índice global que esta consulta resolverá, para que el llamador
    /// pueda correlacionar la respuesta con su propio seguimiento de alto
    /// nivel sin que la tabla lo exponga.
    #[must_use]
    pub fn queried_index(&self) -> u64 {
        self.queried_index
    }

    /// Combina la paridad devuelta por el servidor (sobre el conjunto sin
    /// el chunk excluido) con la paridad local completa para recuperar
    /// `database[queried_index]`, y dispara la contabilidad post-consulta
    /// de la tabla: mata la ranura consumida y promueve el siguiente
    /// Backup disponible contra este índice.
    pub fn reconstruct(self, table: &mut HintTable, server_parity: &Record) -> Record {
        let recovered = xor_record(&self.stored_parity, server_parity);
        table.finalize_query(self.slot_id, self.queried_index, recovered);
        recovered
    }
}
