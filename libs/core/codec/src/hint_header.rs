// [libs/core/codec/src/hint_header.rs]
/*!
 * =================================================================
 * APARATO: ENCABEZADO DEL ARTEFACTO LOCAL DE HINTS
 * =================================================================
 */

use crate::errors::CodecError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Tamaño fijo del encabezado de `hint.bin`.
pub const HINT_HEADER_SIZE: usize = 32;

/// Encabezado de 32 bytes que precede a los chunks acolchados de la base de
/// datos dentro del artefacto local `hint.bin` de un cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintFileHeader {
    /// Cantidad de registros de la base de datos original.
    pub db_size: u64,
    /// Tamaño de chunk usado por este hint table.
    pub chunk_size: u64,
    /// Tamaño de conjunto usado por este hint table.
    pub set_size: u64,
}

impl HintFileHeader {
    /// Serializa el encabezado, con el campo reservado fijado a cero.
    ///
    /// # Errors
    /// Propaga fallos de escritura del buffer subyacente.
    pub fn encode(&self) -> Result<[u8; HINT_HEADER_SIZE], CodecError> {
        let mut out = [0u8; HINT_HEADER_SIZE];
        {
            let mut cursor = Cursor::new(&mut out[..]);
            cursor.write_u64::<LittleEndian>(self.db_size)?;
            cursor.write_u64::<LittleEndian>(self.chunk_size)?;
            cursor.write_u64::<LittleEndian>(self.set_size)?;
            cursor.write_u64::<LittleEndian>(0)?;
        }
        Ok(out)
    }

    /// Decodifica el encabezado desde los primeros 32 bytes de `hint.bin`.
    ///
    /// # Errors
    /// `CodecError::Truncated` si el buffer es más corto que 32 bytes.
    pub fn decode(buffer: &[u8]) -> Result<Self, CodecError> {
        if buffer.len() < HINT_HEADER_SIZE {
            return Err(CodecError::Truncated {
                expected: HINT_HEADER_SIZE,
                actual: buffer.len(),
            });
        }
        let mut cursor = Cursor::new(buffer);
        let db_size = cursor.read_u64::<LittleEndian>()?;
        let chunk_size = cursor.read_u64::<LittleEndian>()?;
        let set_size = cursor.read_u64::<LittleEndian>()?;
        let _reserved = cursor.read_u64::<LittleEndian>()?;
        Ok(Self {
            db_size,
            chunk_size,
            set_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_identity() {
        let header = HintFileHeader {
            db_size: 1_048_576,
            chunk_size: 2048,
            set_size: 512,
        };
        let encoded = header.encode().unwrap();
        let decoded = HintFileHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn rejects_short_buffer() {
        let err = HintFileHeader::decode(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }
}
