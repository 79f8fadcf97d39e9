// [libs/core/codec/src/manifest.rs]
/*!
 * =================================================================
 * APARATO: MANIFIESTOS JSON
 * RESPONSABILIDAD: DESCRIPCIÓN DECLARATIVA DE SNAPSHOTS Y DELTAS
 * =================================================================
 */

use crate::errors::CodecError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Una entrada de archivo dentro del manifiesto de un snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFileEntry {
    /// Ruta relativa al directorio del snapshot.
    pub path: String,
    /// Tamaño en bytes.
    pub size: u64,
    /// Digesto SHA-256 en hexadecimal minúscula.
    pub sha256: String,
}

/// `manifest.json` de un directorio `snapshots/<version>/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotManifest {
    /// Versión del snapshot (también el nombre del directorio).
    pub version: String,
    /// Instante de generación en UTC.
    pub generated_at: DateTime<Utc>,
    /// Cantidad de registros en `database.bin`.
    pub db_size: u64,
    /// Tamaño de chunk derivado: menor potencia de dos ≥ 2√N.
    pub chunk_size: u64,
    /// Tamaño de conjunto: ⌈N / chunk_size⌉ redondeado a múltiplo de 4.
    pub set_size: u64,
    /// Archivos que componen el snapshot, con su digesto de integridad.
    pub files: Vec<ManifestFileEntry>,
}

impl SnapshotManifest {
    /// Deserializa un manifiesto de snapshot desde JSON.
    ///
    /// # Errors
    /// `CodecError::Json` si el contenido no corresponde al esquema esperado.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serializa el manifiesto a JSON indentado, legible por humanos.
    ///
    /// # Errors
    /// `CodecError::Json` si la serialización falla (no ocurre en la práctica
    /// para este tipo, pero se propaga por uniformidad con `from_json`).
    pub fn to_json(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Un bundle publicado: el rango de alturas que cubre y su ubicación opcional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleManifestEntry {
    /// Primera altura cubierta por el bundle, inclusive.
    pub start_block: u64,
    /// Última altura cubierta por el bundle, inclusive.
    pub end_block: u64,
    /// Identificador de contenido opcional (por ejemplo, un CID de IPFS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    /// URL de descarga directa opcional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Un delta individual publicado fuera de cualquier bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeltaManifestEntry {
    /// Altura cubierta por el delta.
    pub block: u64,
    /// Identificador de contenido opcional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

/// `manifest.json` del directorio de deltas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeltaManifest {
    /// Altura más reciente procesada y publicada.
    pub latest_block: u64,
    /// Bundles disponibles, ordenados por rango ascendente.
    pub bundles: Vec<BundleManifestEntry>,
    /// Deltas individuales no agrupados en bundle.
    pub deltas: Vec<DeltaManifestEntry>,
}

impl DeltaManifest {
    /// Deserializa un manifiesto de deltas desde JSON.
    ///
    /// # Errors
    /// `CodecError::Json` si el contenido no corresponde al esquema esperado.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serializa el manifiesto de deltas a JSON indentado.
    ///
    /// # Errors
    /// `CodecError::Json` si la serialización falla.
    pub fn to_json(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Construye un manifiesto vacío para una instancia recién inicializada.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            latest_block: 0,
            bundles: Vec::new(),
            deltas: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_manifest_round_trips_through_json() {
        let manifest = SnapshotManifest {
            version: "v7".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            db_size: 1_000_000,
            chunk_size: 2048,
            set_size: 512,
            files: vec![ManifestFileEntry {
                path: "database.bin".to_string(),
                size: 32_000_000,
                sha256: "a".repeat(64),
            }],
        };

        let json = manifest.to_json().unwrap();
        let parsed = SnapshotManifest::from_json(&json).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn delta_manifest_empty_has_no_entries() {
        let manifest = DeltaManifest::empty();
        assert_eq!(manifest.latest_block, 0);
        assert!(manifest.bundles.is_empty());
        assert!(manifest.deltas.is_empty());
    }

    #[test]
    fn delta_manifest_omits_absent_optional_fields() {
        let manifest = DeltaManifest {
            latest_block: 10,
            bundles: vec![BundleManifestEntry {
                start_block: 1,
                end_block: 10,
                cid: None,
                url: None,
            }],
            deltas: vec![],
        };
        let json = String::from_utf8(manifest.to_json().unwrap()).unwrap();
        assert!(!json.contains("\"cid\""));
        assert!(!json.contains("\"url\""));
    }
}
