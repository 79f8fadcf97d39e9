// [libs/core/codec/src/bundle.rs]
/*!
 * =================================================================
 * APARATO: BUNDLE FILE
 * RESPONSABILIDAD: EMPAQUETADO DE RANGOS DE DELTAS CONTIGUOS
 *
 * Un bundle es, deliberadamente, la concatenación byte a byte de los
 * archivos de delta que cubre — no hay encabezado propio. Esto hace que
 * un cliente pueda recuperar las fronteras internas simplemente
 * decodificando deltas sucesivos del buffer hasta agotarlo.
 * =================================================================
 */

use crate::delta::DeltaFile;
use crate::errors::CodecError;

/// Un bundle reconstruido: la secuencia ordenada de archivos de delta que contenía.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    /// Deltas en el orden en que aparecían dentro del bundle.
    pub deltas: Vec<DeltaFile>,
}

impl BundleFile {
    /// Concatena los bytes de cada delta en el orden dado, produciendo el
    /// contenido exacto de `bundle-START-END.bin`.
    ///
    /// # Errors
    /// Propaga cualquier fallo de codificación de un delta individual.
    pub fn write(deltas: &[DeltaFile]) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        for delta in deltas {
            out.extend_from_slice(&delta.encode()?);
        }
        Ok(out)
    }

    /// Reconstruye un bundle decodificando deltas sucesivos hasta consumir el
    /// buffer completo. Cada delta declara su propio `deltaCount`, así que el
    /// tamaño de cada entrada en el flujo se infiere localmente sin necesidad
    /// de un índice externo.
    ///
    /// # Errors
    /// `CodecError::Truncated` si el buffer termina a mitad de un delta.
    pub fn read(buffer: &[u8]) -> Result<Self, CodecError> {
        let mut deltas = Vec::new();
        let mut offset = 0usize;

        while offset < buffer.len() {
            let remaining = &buffer[offset..];
            let delta = DeltaFile::decode(remaining)?;
            let consumed = delta.encode()?.len();
            if consumed > remaining.len() {
                return Err(CodecError::Truncated {
                    expected: consumed,
                    actual: remaining.len(),
                });
            }
            offset += consumed;
            deltas.push(delta);
        }

        Ok(Self { deltas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::DeltaEntry;

    fn sample_delta(seed: u8) -> DeltaFile {
        DeltaFile::new(vec![DeltaEntry {
            index: seed as u64,
            position_flag: Some(false),
            xor: [seed; 32],
        }])
    }

    #[test]
    fn write_then_read_recovers_constituent_deltas() {
        let deltas = vec![sample_delta(1), sample_delta(2), sample_delta(3)];
        let bundled = BundleFile::write(&deltas).unwrap();
        let recovered = BundleFile::read(&bundled).unwrap();
        assert_eq!(recovered.deltas, deltas);
    }

    #[test]
    fn empty_bundle_round_trips() {
        let bundled = BundleFile::write(&[]).unwrap();
        assert!(bundled.is_empty());
        let recovered = BundleFile::read(&bundled).unwrap();
        assert!(recovered.deltas.is_empty());
    }
}
