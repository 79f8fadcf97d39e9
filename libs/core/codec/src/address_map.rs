// [libs/core/codec/src/address_map.rs]
/*!
 * =================================================================
 * APARATO: ADDRESS-INDEX BIJECTION (§3, §6)
 * RESPONSABILIDAD: TRADUCCIÓN DE IDENTIFICADORES DE 20 BYTES A ÍNDICES
 *
 * El mapeo es inmutable durante la vida de un snapshot: se carga una vez
 * desde `address-mapping.bin` y se consulta concurrentemente sin bloqueo.
 * =================================================================
 */

use crate::errors::CodecError;
use crate::record::Address;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::path::Path;

/// Tamaño de un registro individual del mapeo: 20 bytes de identidad + 4 bytes de índice.
pub const ADDRESS_MAP_RECORD_SIZE: usize = 24;

/// Mapeo biyectivo entre identificadores de 20 bytes e índices de base de datos.
///
/// `entries` conserva el orden de inserción (el orden de aparición en
/// `address-mapping.bin`) por separado de `forward`/`used_indices`, que sólo
/// existen para resolver una dirección y rechazar índices duplicados en
/// O(1). `encode` serializa desde `entries`, nunca desde el `HashMap`, para
/// que cargar y volver a volcar un mapeo sea una identidad byte a byte
/// (invariante 9), cosa que iterar un `HashMap` no garantiza.
#[derive(Debug, Clone, Default)]
pub struct AddressMap {
    entries: Vec<(Address, u32)>,
    forward: HashMap<Address, u32>,
    used_indices: HashSet<u32>,
}

impl AddressMap {
    /// Construye un mapeo vacío.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            forward: HashMap::new(),
            used_indices: HashSet::new(),
        }
    }

    /// Inserta una entrada, rechazando un índice que ya está en uso.
    ///
    /// # Errors
    /// `CodecError::DuplicateIndex` si `index` ya tiene una dirección asignada.
    pub fn insert(&mut self, address: Address, index: u32) -> Result<(), CodecError> {
        if !self.used_indices.insert(index) {
            return Err(CodecError::DuplicateIndex(index));
        }
        self.forward.insert(address, index);
        self.entries.push((address, index));
        Ok(())
    }

    /// Resuelve una dirección a su índice de base de datos.
    #[must_use]
    pub fn resolve(&self, address: &Address) -> Option<u32> {
        self.forward.get(address).copied()
    }

    /// Cantidad de entradas registradas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// `true` si el mapeo no contiene entradas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Decodifica `address-mapping.bin` desde un buffer en memoria.
    ///
    /// # Errors
    /// `CodecError::Misaligned` si el buffer no es múltiplo de 24 bytes;
    /// `CodecError::DuplicateIndex` si dos identificadores comparten índice.
    pub fn decode(buffer: &[u8]) -> Result<Self, CodecError> {
        if buffer.len() % ADDRESS_MAP_RECORD_SIZE != 0 {
            return Err(CodecError::Misaligned {
                len: buffer.len(),
                record_size: ADDRESS_MAP_RECORD_SIZE,
            });
        }

        let mut map = Self::new();
        let mut cursor = Cursor::new(buffer);
        let record_count = buffer.len() / ADDRESS_MAP_RECORD_SIZE;

        for _ in 0..record_count {
            let mut address: Address = [0u8; 20];
            std::io::Read::read_exact(&mut cursor, &mut address)?;
            let index = cursor.read_u32::<LittleEndian>()?;
            map.insert(address, index)?;
        }

        Ok(map)
    }

    /// Serializa el mapeo en el orden en que fue insertado, en el formato de §6.
    ///
    /// # Errors
    /// Propaga fallos de I/O del escritor subyacente.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.entries.len() * ADDRESS_MAP_RECORD_SIZE);
        for (address, index) in &self.entries {
            out.write_all(address)?;
            out.write_u32::<LittleEndian>(*index)?;
        }
        Ok(out)
    }

    /// Carga el mapeo desde un archivo en disco.
    ///
    /// # Errors
    /// Propaga fallos de I/O y de formato de `decode`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CodecError> {
        let buffer = std::fs::read(path)?;
        Self::decode(&buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        [byte; 20]
    }

    #[test]
    fn round_trip_is_identity() {
        let mut map = AddressMap::new();
        map.insert(addr(1), 10).unwrap();
        map.insert(addr(2), 20).unwrap();
        map.insert(addr(3), 30).unwrap();

        let encoded = map.encode().unwrap();
        let decoded = AddressMap::decode(&encoded).unwrap();

        assert_eq!(decoded.resolve(&addr(1)), Some(10));
        assert_eq!(decoded.resolve(&addr(2)), Some(20));
        assert_eq!(decoded.resolve(&addr(3)), Some(30));
        assert_eq!(decoded.len(), 3);
    }

    #[test]
    fn rejects_duplicate_index() {
        let mut map = AddressMap::new();
        map.insert(addr(1), 10).unwrap();
        let err = map.insert(addr(2), 10).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateIndex(10)));
    }

    #[test]
    fn rejects_misaligned_buffer() {
        let buffer = vec![0u8; 23];
        let err = AddressMap::decode(&buffer).unwrap_err();
        assert!(matches!(err, CodecError::Misaligned { .. }));
    }

    #[test]
    fn encode_reproduces_the_exact_input_bytes() {
        let mut original = Vec::new();
        original.extend_from_slice(&addr(3));
        original.extend_from_slice(&30u32.to_le_bytes());
        original.extend_from_slice(&addr(1));
        original.extend_from_slice(&10u32.to_le_bytes());
        original.extend_from_slice(&addr(2));
        original.extend_from_slice(&20u32.to_le_bytes());

        let decoded = AddressMap::decode(&original).unwrap();
        let encoded = decoded.encode().unwrap();

        assert_eq!(encoded, original);
    }
}
