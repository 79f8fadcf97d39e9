// [libs/core/codec/src/query_envelope.rs]
/*!
 * =================================================================
 * APARATO: SOBRE DE CONSULTA COMPRIMIDO (X-Query-Encoding: plinko-v1)
 * RESPONSABILIDAD: EMPAQUETADO BITMAP+OFFSETS DE UN CONJUNTO DE CONSULTA
 * =================================================================
 */

use crate::errors::CodecError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Valor de la cabecera HTTP `X-Query-Encoding` que identifica este formato.
pub const QUERY_ENCODING_HEADER_VALUE: &str = "plinko-v1";

/// Sobre comprimido de un conjunto de consulta: un bitmap que marca los
/// chunks tocados y los desplazamientos (offsets) dentro de cada chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEnvelope {
    /// Bitmap de longitud variable; el bit `i` indica si el chunk `i` participa.
    pub bitmap: Vec<u8>,
    /// Desplazamiento dentro de cada chunk marcado, en el mismo orden que los
    /// bits puestos en `bitmap` (de menor a mayor índice).
    pub offsets: Vec<u16>,
}

impl QueryEnvelope {
    /// Serializa el sobre: `uint16 bitmapLen || bitmap || offsets (2 bytes LE cada uno)`.
    ///
    /// # Errors
    /// `CodecError::MalformedEnvelope` si el bitmap excede `u16::MAX` bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.bitmap.len() > u16::MAX as usize {
            return Err(CodecError::MalformedEnvelope(format!(
                "bitmap of {} bytes exceeds the 16-bit length prefix",
                self.bitmap.len()
            )));
        }

        let mut out = Vec::with_capacity(2 + self.bitmap.len() + self.offsets.len() * 2);
        out.write_u16::<LittleEndian>(self.bitmap.len() as u16)?;
        out.extend_from_slice(&self.bitmap);
        for offset in &self.offsets {
            out.write_u16::<LittleEndian>(*offset)?;
        }
        Ok(out)
    }

    /// Decodifica un sobre comprimido desde el cuerpo crudo de la solicitud.
    ///
    /// # Errors
    /// `CodecError::Truncated` si el buffer termina antes del bitmap declarado;
    /// `CodecError::MalformedEnvelope` si sobran bytes sueltos que no completan
    /// un offset de 2 bytes.
    pub fn decode(buffer: &[u8]) -> Result<Self, CodecError> {
        if buffer.len() < 2 {
            return Err(CodecError::Truncated {
                expected: 2,
                actual: buffer.len(),
            });
        }

        let mut cursor = Cursor::new(buffer);
        let bitmap_len = cursor.read_u16::<LittleEndian>()? as usize;

        let header_end = 2 + bitmap_len;
        if buffer.len() < header_end {
            return Err(CodecError::Truncated {
                expected: header_end,
                actual: buffer.len(),
            });
        }
        let bitmap = buffer[2..header_end].to_vec();

        let offsets_bytes = &buffer[header_end..];
        if offsets_bytes.len() % 2 != 0 {
            return Err(CodecError::MalformedEnvelope(format!(
                "trailing offsets region of {} bytes is not a multiple of 2",
                offsets_bytes.len()
            )));
        }

        let mut offsets = Vec::with_capacity(offsets_bytes.len() / 2);
        let mut offsets_cursor = Cursor::new(offsets_bytes);
        for _ in 0..(offsets_bytes.len() / 2) {
            offsets.push(offsets_cursor.read_u16::<LittleEndian>()?);
        }

        Ok(Self { bitmap, offsets })
    }

    /// Cantidad de chunks marcados en el bitmap (cuenta de bits en uno).
    #[must_use]
    pub fn set_chunk_count(&self) -> u32 {
        self.bitmap.iter().map(|byte| byte.count_ones()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_byte_for_byte() {
        let envelope = QueryEnvelope {
            bitmap: vec![0b1010_0001, 0b0000_0011],
            offsets: vec![42, 1337, 0, u16::MAX],
        };
        let encoded = envelope.encode().unwrap();
        let decoded = QueryEnvelope::decode(&encoded).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn set_chunk_count_matches_popcount() {
        let envelope = QueryEnvelope {
            bitmap: vec![0b1111_0000],
            offsets: vec![],
        };
        assert_eq!(envelope.set_chunk_count(), 4);
    }

    #[test]
    fn rejects_dangling_offset_byte() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&0u16.to_le_bytes());
        buffer.push(0xFF);
        let err = QueryEnvelope::decode(&buffer).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEnvelope(_)));
    }
}
