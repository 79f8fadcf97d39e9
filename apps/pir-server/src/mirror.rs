// [apps/pir-server/src/mirror.rs]
/*!
 * =================================================================
 * APARATO: ESPEJO DE BASE DE DATOS
 * RESPONSABILIDAD: VECTOR DENSO DE REGISTROS EN MEMORIA
 *
 * Un `Vec<Record>` plano de longitud `db_size`. El pipeline de
 * actualización es el único escritor; los handlers HTTP son lectores
 * concurrentes. El `RwLock` que envuelve esta estructura (ver
 * `state.rs`) se retiene únicamente durante una escritura de celda o
 * un recorrido de paridad, nunca durante la espera de red (§5
 * "Locking discipline").
 * =================================================================
 */

use plinko_codec::record::{xor_into, xor_record, Record};
use std::path::Path;

/// El espejo denso de la base de datos: `database.bin` cargado en memoria.
#[derive(Debug, Clone)]
pub struct DatabaseMirror {
    records: Vec<Record>,
}

impl DatabaseMirror {
    /// Carga `database.bin` desde disco, validando que su tamaño sea
    /// exactamente `db_size * 32` bytes.
    ///
    /// # Errors
    /// Propaga fallos de I/O; devuelve un error descriptivo si el archivo
    /// no corresponde al `db_size` declarado en el manifiesto.
    pub fn load(path: impl AsRef<Path>, db_size: u64) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let expected = db_size as usize * 32;
        anyhow::ensure!(
            bytes.len() == expected,
            "database file is {} bytes, expected {} for db_size={}",
            bytes.len(),
            expected,
            db_size
        );

        let records = bytes
            .chunks_exact(32)
            .map(|chunk| {
                let mut record: Record = [0u8; 32];
                record.copy_from_slice(chunk);
                record
            })
            .collect();

        Ok(Self { records })
    }

    /// Construye un espejo vacío de `db_size` registros nulos, útil para
    /// pruebas y para el modo simulado del pipeline de actualización.
    #[must_use]
    pub fn zeroed(db_size: u64) -> Self {
        Self {
            records: vec![[0u8; 32]; db_size as usize],
        }
    }

    /// Cantidad de registros que contiene el espejo.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` si el espejo no contiene registros.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lectura directa de un índice, diagnóstica (§4.3 "Plaintext lookup").
    #[must_use]
    pub fn get(&self, index: u64) -> Option<Record> {
        self.records.get(index as usize).copied()
    }

    /// XOR de los registros en `indices`, ignorando los que caen fuera de rango.
    #[must_use]
    pub fn xor_over(&self, indices: impl IntoIterator<Item = u64>) -> Record {
        indices.into_iter().fold([0u8; 32], |acc, index| match self.records.get(index as usize) {
            Some(value) => xor_record(&acc, value),
            None => acc,
        })
    }

    /// Aplica un único delta `(index, xor)` directamente sobre el espejo.
    pub fn apply_delta(&mut self, index: u64, xor: &Record) {
        if let Some(slot) = self.records.get_mut(index as usize) {
            xor_into(slot, xor);
        }
    }
}
