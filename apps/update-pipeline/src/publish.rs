// [apps/update-pipeline/src/publish.rs]
/*!
 * =================================================================
 * APARATO: PUBLICACIÓN DE DELTAS Y BUNDLES
 * RESPONSABILIDAD: ESCRITURA ATÓMICA DE `delta-NNNNNN.bin`,
 * `bundle-START-END.bin` Y EL MANIFIESTO DE DELTAS
 *
 * El manifiesto se actualiza atómicamente al final, sólo después de que
 * el `rename` del archivo de delta (o del bundle) haya tenido éxito
 * (§4.4 "Atomic file writes"): ningún lector observa un manifiesto que
 * referencia un artefacto todavía no presente en disco.
 * =================================================================
 */

use crate::errors::PipelineError;
use plinko_codec::atomic_io::write_atomic;
use plinko_codec::bundle::BundleFile;
use plinko_codec::delta::{DeltaEntry, DeltaFile};
use plinko_codec::manifest::{BundleManifestEntry, DeltaManifest, DeltaManifestEntry};
use std::path::{Path, PathBuf};

fn delta_path(delta_dir: &Path, height: u64) -> PathBuf {
    delta_dir.join(format!("delta-{:06}.bin", height))
}

fn bundle_path(delta_dir: &Path, start: u64, end: u64) -> PathBuf {
    delta_dir.join(format!("bundle-{:06}-{:06}.bin", start, end))
}

fn manifest_path(delta_dir: &Path) -> PathBuf {
    delta_dir.join("manifest.json")
}

/// Publica los artefactos de un único bloque: el delta, su entrada en el
/// manifiesto y, si `height` cae en una frontera de bundle, el bundle que
/// empaqueta los últimos `bundle_size` deltas.
///
/// # Errors
/// Propaga fallos de I/O o de codificación de cualquiera de los artefactos.
pub fn publish_block(
    delta_dir: &Path,
    bundle_size: u64,
    height: u64,
    entries: Vec<DeltaEntry>,
    manifest: &mut DeltaManifest,
) -> Result<(), PipelineError> {
    let file = DeltaFile::new(entries);
    let encoded = file.encode()?;
    write_atomic(delta_path(delta_dir, height), &encoded)?;

    manifest.latest_block = height;
    manifest.deltas.push(DeltaManifestEntry { block: height, cid: None });

    if bundle_size > 0 && height % bundle_size == 0 {
        bundle_recent(delta_dir, bundle_size, height, manifest)?;
    }

    write_atomic(manifest_path(delta_dir), &manifest.to_json()?)?;
    Ok(())
}

fn bundle_recent(
    delta_dir: &Path,
    bundle_size: u64,
    end_height: u64,
    manifest: &mut DeltaManifest,
) -> Result<(), PipelineError> {
    let start_height = end_height - bundle_size + 1;

    let mut deltas = Vec::with_capacity(bundle_size as usize);
    for height in start_height..=end_height {
        let bytes = std::fs::read(delta_path(delta_dir, height))?;
        deltas.push(DeltaFile::decode(&bytes)?);
    }

    let bundled = BundleFile::write(&deltas)?;
    write_atomic(bundle_path(delta_dir, start_height, end_height), &bundled)?;

    manifest.bundles.push(BundleManifestEntry {
        start_block: start_height,
        end_block: end_height,
        cid: None,
        url: None,
    });
    manifest
        .deltas
        .retain(|entry| entry.block < start_height || entry.block > end_height);

    Ok(())
}

/// Carga el manifiesto de deltas existente, o uno vacío si `delta_dir` aún
/// no tiene publicaciones.
///
/// # Errors
/// Propaga fallos de I/O distintos de "archivo no encontrado", y fallos de
/// formato si el archivo existe pero no decodifica.
pub fn load_or_init_manifest(delta_dir: &Path) -> Result<DeltaManifest, PipelineError> {
    match std::fs::read(manifest_path(delta_dir)) {
        Ok(bytes) => Ok(DeltaManifest::from_json(&bytes)?),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(DeltaManifest::empty()),
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(index: u64) -> DeltaEntry {
        DeltaEntry {
            index,
            position_flag: Some(false),
            xor: [index as u8; 32],
        }
    }

    #[test]
    fn publish_block_writes_a_readable_delta_and_updates_the_manifest() {
        let dir = tempdir().unwrap();
        let mut manifest = DeltaManifest::empty();

        publish_block(dir.path(), 100, 1, vec![entry(7)], &mut manifest).unwrap();

        assert_eq!(manifest.latest_block, 1);
        assert_eq!(manifest.deltas.len(), 1);
        assert!(manifest.bundles.is_empty());

        let on_disk = std::fs::read(delta_path(dir.path(), 1)).unwrap();
        let decoded = DeltaFile::decode(&on_disk).unwrap();
        assert_eq!(decoded.entries[0].index, 7);
    }

    #[test]
    fn publish_block_bundles_on_the_configured_boundary() {
        let dir = tempdir().unwrap();
        let mut manifest = DeltaManifest::empty();

        for height in 1..=4 {
            publish_block(dir.path(), 4, height, vec![entry(height)], &mut manifest).unwrap();
        }

        assert_eq!(manifest.bundles.len(), 1);
        assert_eq!(manifest.bundles[0].start_block, 1);
        assert_eq!(manifest.bundles[0].end_block, 4);
        assert!(manifest.deltas.is_empty(), "bundled heights are removed from the loose-delta list");

        let bundled_bytes = std::fs::read(bundle_path(dir.path(), 1, 4)).unwrap();
        let bundle = BundleFile::read(&bundled_bytes).unwrap();
        assert_eq!(bundle.deltas.len(), 4);
    }

    #[test]
    fn load_or_init_manifest_returns_empty_when_absent() {
        let dir = tempdir().unwrap();
        let manifest = load_or_init_manifest(dir.path()).unwrap();
        assert_eq!(manifest.latest_block, 0);
    }

    #[test]
    fn load_or_init_manifest_round_trips_a_published_manifest() {
        let dir = tempdir().unwrap();
        let mut manifest = DeltaManifest::empty();
        publish_block(dir.path(), 100, 5, vec![entry(1)], &mut manifest).unwrap();

        let reloaded = load_or_init_manifest(dir.path()).unwrap();
        assert_eq!(reloaded.latest_block, 5);
    }
}
