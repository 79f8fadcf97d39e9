// [apps/update-pipeline/src/live_database.rs]
/*!
 * =================================================================
 * APARATO: BASE DE DATOS VIVA
 * RESPONSABILIDAD: ÚNICO ESCRITOR DE `database.bin`
 *
 * A diferencia de `DatabaseMirror` (servidor, lector concurrente de un
 * `Vec<Record>` completamente cargado en memoria), este aparato es el
 * único escritor del archivo subyacente: actualiza registros individuales
 * con escrituras posicionales de 32 bytes en vez de reescribir el
 * archivo completo en cada bloque, lo que mantiene el costo de un tick
 * proporcional a la cantidad de índices tocados, no a `db_size` (§4.4
 * "Update pipeline").
 * =================================================================
 */

use plinko_codec::record::{xor_record, Record};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

const RECORD_SIZE: u64 = 32;

/// El archivo `database.bin` abierto para lectura y escritura posicional.
pub struct LiveDatabase {
    file: File,
    db_size: u64,
}

impl LiveDatabase {
    /// Abre (o crea, si faltara) `database.bin` y lo dimensiona a
    /// `db_size * 32` bytes, acolchando con ceros cualquier registro nuevo.
    ///
    /// # Errors
    /// Propaga fallos de I/O al abrir, dimensionar o leer el archivo.
    pub fn open(path: impl AsRef<Path>, db_size: u64) -> std::io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).create(true).open(path)?;
        file.set_len(db_size * RECORD_SIZE)?;
        Ok(Self { file, db_size })
    }

    /// Cantidad de registros que respalda este archivo.
    #[must_use]
    pub fn db_size(&self) -> u64 {
        self.db_size
    }

    /// Lee el registro en `index`.
    ///
    /// # Errors
    /// Propaga fallos de I/O al posicionar o leer el archivo subyacente.
    pub fn read_record(&mut self, index: u64) -> std::io::Result<Record> {
        self.file.seek(SeekFrom::Start(index * RECORD_SIZE))?;
        let mut record: Record = [0u8; 32];
        self.file.read_exact(&mut record)?;
        Ok(record)
    }

    /// Escribe `record` en `index`.
    ///
    /// # Errors
    /// Propaga fallos de I/O al posicionar o escribir el archivo subyacente.
    pub fn write_record(&mut self, index: u64, record: &Record) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(index * RECORD_SIZE))?;
        self.file.write_all(record)
    }

    /// Aplica `new_value` en `index`, devolviendo el XOR entre el valor
    /// anterior y el nuevo: exactamente el delta que el pipeline publica.
    ///
    /// # Errors
    /// Propaga fallos de I/O de la lectura o la escritura subyacentes.
    pub fn apply_change(&mut self, index: u64, new_value: &Record) -> std::io::Result<Record> {
        let previous = self.read_record(index)?;
        self.write_record(index, new_value)?;
        Ok(xor_record(&previous, new_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn apply_change_reports_the_xor_and_persists_the_new_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database.bin");
        let mut db = LiveDatabase::open(&path, 4).unwrap();

        let new_value = [0xAB; 32];
        let xor = db.apply_change(2, &new_value).unwrap();
        assert_eq!(xor, new_value, "a freshly zeroed record XORs to the new value itself");
        assert_eq!(db.read_record(2).unwrap(), new_value);

        let second_value = [0x11; 32];
        let second_xor = db.apply_change(2, &second_value).unwrap();
        assert_eq!(second_xor, xor_record(&new_value, &second_value));
    }

    #[test]
    fn open_pads_a_fresh_file_with_zeros() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("database.bin");
        let mut db = LiveDatabase::open(&path, 8).unwrap();
        assert_eq!(db.read_record(7).unwrap(), [0u8; 32]);
    }
}
