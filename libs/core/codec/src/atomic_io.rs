// [libs/core/codec/src/atomic_io.rs]
/*!
 * =================================================================
 * APARATO: ESCRITURA ATÓMICA DE ARTEFACTOS PUBLICADOS
 * RESPONSABILIDAD: NINGÚN LECTOR OBSERVA UN ARCHIVO A MEDIO ESCRIBIR
 *
 * Todo publicador (snapshot, delta, bundle, manifiesto) pasa por aquí:
 * se escribe a un hermano temporal en el mismo directorio y se promueve
 * con un `rename`, que en los sistemas de archivos POSIX relevantes es
 * atómico frente a lectores concurrentes.
 * =================================================================
 */

use crate::errors::CodecError;
use std::path::Path;

/// Escribe `bytes` en `path` sin que un lector concurrente pueda observar un
/// contenido parcial: escribe primero a `path.tmp-<pid>` y promueve con `rename`.
///
/// # Errors
/// Propaga cualquier fallo de I/O al crear, escribir o renombrar el temporal.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), CodecError> {
    let path = path.as_ref();
    let tmp_path = sibling_tmp_path(path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Actualiza el enlace simbólico `latest` dentro de `parent_dir` para que
/// apunte a `target_name`, sustituyéndolo atómicamente si ya existe.
///
/// # Errors
/// Propaga fallos de I/O al crear el symlink temporal o al renombrarlo.
#[cfg(unix)]
pub fn update_latest_symlink<P: AsRef<Path>>(
    parent_dir: P,
    target_name: &str,
) -> Result<(), CodecError> {
    let parent_dir = parent_dir.as_ref();
    let link_path = parent_dir.join("latest");
    let tmp_link_path = parent_dir.join(format!("latest.tmp-{}", std::process::id()));

    if tmp_link_path.exists() {
        std::fs::remove_file(&tmp_link_path)?;
    }

    std::os::unix::fs::symlink(target_name, &tmp_link_path)?;
    std::fs::rename(&tmp_link_path, &link_path)?;
    Ok(())
}

fn sibling_tmp_path(path: &Path) -> std::path::PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_name = format!(".{}.tmp-{}", file_name, std::process::id());
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => std::path::PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_produces_final_content_with_no_leftover_tmp() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("manifest.json");

        write_atomic(&target, b"{\"ok\":true}").unwrap();

        let contents = std::fs::read(&target).unwrap();
        assert_eq!(contents, b"{\"ok\":true}");

        let leftover_tmp = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .any(|entry| entry.file_name().to_string_lossy().contains(".tmp-"));
        assert!(!leftover_tmp);
    }

    #[cfg(unix)]
    #[test]
    fn update_latest_symlink_points_at_target() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("v1")).unwrap();
        update_latest_symlink(dir.path(), "v1").unwrap();

        let resolved = std::fs::read_link(dir.path().join("latest")).unwrap();
        assert_eq!(resolved, Path::new("v1"));
    }
}
