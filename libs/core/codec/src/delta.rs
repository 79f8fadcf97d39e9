// [libs/core/codec/src/delta.rs]
/*!
 * =================================================================
 * APARATO: DELTA FILE CODEC
 * RESPONSABILIDAD: SERIALIZACIÓN DE ACTUALIZACIONES INCREMENTALES XOR
 *
 * Un archivo `delta-NNNNNN.bin` es la unidad atómica que el pipeline de
 * actualización publica tras cada altura procesada. El cliente lo aplica
 * a su tabla de hints sin volver a descargar el snapshot completo.
 * =================================================================
 */

use crate::errors::CodecError;
use crate::record::Record;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

/// Tamaño del encabezado de un archivo de delta: `deltaCount || reserved`.
pub const DELTA_HEADER_SIZE: usize = 16;

/// Tamaño de una entrada en el formato simple (sin bandera de posición).
pub const SIMPLE_ENTRY_SIZE: usize = 40;

/// Tamaño de una entrada en el formato con bandera de posición.
pub const FLAGGED_ENTRY_SIZE: usize = 48;

/// Encabezado de 16 bytes al inicio de todo archivo de delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaHeader {
    /// Número de entradas que siguen al encabezado.
    pub delta_count: u64,
}

impl DeltaHeader {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.write_u64::<LittleEndian>(self.delta_count)?;
        out.write_u64::<LittleEndian>(0)?; // reserved
        Ok(())
    }

    fn decode(cursor: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let delta_count = cursor.read_u64::<LittleEndian>()?;
        let _reserved = cursor.read_u64::<LittleEndian>()?;
        Ok(Self { delta_count })
    }
}

/// Una entrada de delta: el nuevo valor XOR-combinado de un índice de base de datos,
/// con indicación opcional de si el índice cayó dentro o fuera del conjunto local
/// de un cliente particular en el momento de la emisión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaEntry {
    /// Índice de base de datos afectado.
    pub index: u64,
    /// Bandera de posición: `Some(false)` = dentro, `Some(true)` = fuera, `None` en el formato simple.
    pub position_flag: Option<bool>,
    /// Valor XOR a aplicar sobre la paridad existente.
    pub xor: Record,
}

/// Distingue los dos anchos de entrada que coexisten en el ecosistema: el
/// formato simple de 40 bytes y el formato de 48 bytes con bandera de
/// posición. El emisor siempre produce `PositionFlagged`; la decodificación
/// infiere el ancho a partir de `deltaCount` y el tamaño total del archivo,
/// de modo que ambos productores pueden coexistir sin un campo de versión
/// adicional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaEntryLayout {
    /// `uint64 index || 32-byte XOR`.
    Simple,
    /// `uint64 index || uint64 position_flag || 32-byte XOR`.
    PositionFlagged,
}

impl DeltaEntryLayout {
    fn entry_size(self) -> usize {
        match self {
            DeltaEntryLayout::Simple => SIMPLE_ENTRY_SIZE,
            DeltaEntryLayout::PositionFlagged => FLAGGED_ENTRY_SIZE,
        }
    }
}

/// Un archivo de delta completo: encabezado más entradas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaFile {
    /// Encabezado con el conteo de entradas.
    pub header: DeltaHeader,
    /// Entradas XOR, en el orden de serialización fijado por el emisor.
    pub entries: Vec<DeltaEntry>,
}

impl DeltaFile {
    /// Construye un delta a partir de entradas con bandera de posición, que es
    /// el único formato que este pipeline emite.
    #[must_use]
    pub fn new(entries: Vec<DeltaEntry>) -> Self {
        Self {
            header: DeltaHeader {
                delta_count: entries.len() as u64,
            },
            entries,
        }
    }

    /// Serializa siempre en el formato con bandera de posición.
    ///
    /// # Errors
    /// Propaga fallos de escritura del buffer subyacente (nunca en la práctica
    /// para un `Vec<u8>`, pero el tipo de retorno se mantiene uniforme con `decode`).
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(DELTA_HEADER_SIZE + self.entries.len() * FLAGGED_ENTRY_SIZE);
        self.header.encode(&mut out)?;
        for entry in &self.entries {
            out.write_u64::<LittleEndian>(entry.index)?;
            let flag = match entry.position_flag {
                Some(false) => 0u64,
                Some(true) => 1u64,
                None => 0u64,
            };
            out.write_u64::<LittleEndian>(flag)?;
            out.write_all(&entry.xor)?;
        }
        Ok(out)
    }

    /// Decodifica un archivo de delta, infiriendo si las entradas llevan
    /// bandera de posición a partir del conteo declarado y el tamaño total.
    ///
    /// # Errors
    /// `CodecError::Truncated` si el buffer es más corto que el encabezado;
    /// `CodecError::Misaligned` si ni el ancho simple ni el con bandera
    /// explican el tamaño del cuerpo para el `deltaCount` declarado.
    pub fn decode(buffer: &[u8]) -> Result<Self, CodecError> {
        if buffer.len() < DELTA_HEADER_SIZE {
            return Err(CodecError::Truncated {
                expected: DELTA_HEADER_SIZE,
                actual: buffer.len(),
            });
        }

        let mut cursor = Cursor::new(buffer);
        let header = DeltaHeader::decode(&mut cursor)?;
        let body = &buffer[DELTA_HEADER_SIZE..];

        let layout = Self::infer_layout(header.delta_count, body.len())?;
        let entry_size = layout.entry_size();

        let mut entries = Vec::with_capacity(header.delta_count as usize);
        let mut body_cursor = Cursor::new(body);

        for _ in 0..header.delta_count {
            let index = body_cursor.read_u64::<LittleEndian>()?;
            let position_flag = match layout {
                DeltaEntryLayout::Simple => None,
                DeltaEntryLayout::PositionFlagged => {
                    Some(body_cursor.read_u64::<LittleEndian>()? != 0)
                }
            };
            let mut xor: Record = [0u8; 32];
            std::io::Read::read_exact(&mut body_cursor, &mut xor)?;
            entries.push(DeltaEntry {
                index,
                position_flag,
                xor,
            });
        }

        let _ = entry_size;
        Ok(Self { header, entries })
    }

    fn infer_layout(delta_count: u64, body_len: usize) -> Result<DeltaEntryLayout, CodecError> {
        if delta_count == 0 {
            return Ok(DeltaEntryLayout::PositionFlagged);
        }
        let simple_total = delta_count as usize * SIMPLE_ENTRY_SIZE;
        let flagged_total = delta_count as usize * FLAGGED_ENTRY_SIZE;

        match (body_len == simple_total, body_len == flagged_total) {
            (true, false) => Ok(DeltaEntryLayout::Simple),
            (false, true) => Ok(DeltaEntryLayout::PositionFlagged),
            _ => Err(CodecError::Misaligned {
                len: body_len,
                record_size: FLAGGED_ENTRY_SIZE,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: u64, inside: bool) -> DeltaEntry {
        DeltaEntry {
            index,
            position_flag: Some(inside),
            xor: [index as u8; 32],
        }
    }

    #[test]
    fn round_trip_flagged_layout() {
        let file = DeltaFile::new(vec![entry(1, false), entry(2, true)]);
        let encoded = file.encode().unwrap();
        let decoded = DeltaFile::decode(&encoded).unwrap();
        assert_eq!(decoded, file);
    }

    #[test]
    fn decodes_simple_layout_from_third_party_emitters() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&2u64.to_le_bytes());
        buffer.extend_from_slice(&0u64.to_le_bytes());
        buffer.extend_from_slice(&7u64.to_le_bytes());
        buffer.extend_from_slice(&[0xAAu8; 32]);
        buffer.extend_from_slice(&9u64.to_le_bytes());
        buffer.extend_from_slice(&[0xBBu8; 32]);

        let decoded = DeltaFile::decode(&buffer).unwrap();
        assert_eq!(decoded.entries.len(), 2);
        assert_eq!(decoded.entries[0].position_flag, None);
        assert_eq!(decoded.entries[0].index, 7);
    }

    #[test]
    fn rejects_ambiguous_body_length() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&1u64.to_le_bytes());
        buffer.extend_from_slice(&0u64.to_le_bytes());
        buffer.extend_from_slice(&[0u8; 10]);
        let err = DeltaFile::decode(&buffer).unwrap_err();
        assert!(matches!(err, CodecError::Misaligned { .. }));
    }
}
