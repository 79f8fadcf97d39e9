// [apps/update-pipeline/src/source.rs]
/*!
 * =================================================================
 * APARATO: FUENTE DE BLOQUES UPSTREAM
 * RESPONSABILIDAD: ABSTRAER EL ORIGEN DE LOS CAMBIOS POR ALTURA
 *
 * Dos implementaciones comparten la misma interfaz: un cliente RPC real
 * que delega en `plinko-upstream-client`, y una fuente simulada que no
 * requiere upstream alguno (§4.4 "Simulated mode"), útil para levantar
 * el resto de la pila en un entorno de desarrollo o demostración.
 * =================================================================
 */

use plinko_codec::record::Record;
use plinko_upstream_client::{BlockChanges, IndexChange, UpstreamRpcClient, UpstreamRpcError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cantidad de índices sintéticos generados por altura en modo simulado.
pub const SIMULATED_INDICES_PER_HEIGHT: u64 = 2000;

/// Lo que el pipeline necesita de un upstream: la altura más reciente
/// conocida, y los cambios reportados para una altura dada.
pub trait UpstreamSource: Send + Sync {
    /// Altura más reciente que el upstream está dispuesto a reportar.
    ///
    /// # Errors
    /// Cualquier variante de [`UpstreamRpcError`]; las transitorias se
    /// reintentan en la capa que llama a esta fuente.
    async fn latest_height(&self) -> Result<u64, UpstreamRpcError>;

    /// Cambios reportados para el bloque en `height`.
    ///
    /// # Errors
    /// Igual que [`Self::latest_height`].
    async fn fetch_block(&self, height: u64) -> Result<BlockChanges, UpstreamRpcError>;
}

/// Fuente respaldada por un endpoint RPC real, vía `plinko-upstream-client`.
pub struct RpcUpstreamSource {
    client: UpstreamRpcClient,
}

impl RpcUpstreamSource {
    /// Construye la fuente sobre `base_url`, con el timeout por request de
    /// §4.4/§7 (10 segundos por defecto).
    #[must_use]
    pub fn new(base_url: String, token: Option<String>, request_timeout: Duration) -> Self {
        Self {
            client: UpstreamRpcClient::new(base_url, token, request_timeout),
        }
    }
}

impl UpstreamSource for RpcUpstreamSource {
    async fn latest_height(&self) -> Result<u64, UpstreamRpcError> {
        self.client.latest_height().await
    }

    async fn fetch_block(&self, height: u64) -> Result<BlockChanges, UpstreamRpcError> {
        self.client.fetch_block(height).await
    }
}

/// Fuente sintética: cada sondeo de `latest_height` adelanta la altura en
/// uno, y cada bloque simulado toca `SIMULATED_INDICES_PER_HEIGHT` índices
/// determinísticos, exactamente como describe §4.4 "Simulated mode":
/// `index = (h * 2000 + k) mod N`, `value = h * 1000 + k`.
pub struct SimulatedUpstreamSource {
    db_size: u64,
    height: AtomicU64,
}

impl SimulatedUpstreamSource {
    /// Construye la fuente simulada sobre una base de datos de `db_size` registros.
    #[must_use]
    pub fn new(db_size: u64) -> Self {
        Self {
            db_size,
            height: AtomicU64::new(0),
        }
    }
}

impl UpstreamSource for SimulatedUpstreamSource {
    async fn latest_height(&self) -> Result<u64, UpstreamRpcError> {
        Ok(self.height.fetch_add(1, Ordering::Relaxed) + 1)
    }

    async fn fetch_block(&self, height: u64) -> Result<BlockChanges, UpstreamRpcError> {
        if self.db_size == 0 {
            return Ok(BlockChanges { height, changes: Vec::new() });
        }

        let changes = (0..SIMULATED_INDICES_PER_HEIGHT)
            .map(|k| {
                let index = (height * SIMULATED_INDICES_PER_HEIGHT + k) % self.db_size;
                let value = height * 1000 + k;
                IndexChange {
                    index,
                    new_value: record_from_u64(value),
                }
            })
            .collect();

        Ok(BlockChanges { height, changes })
    }
}

fn record_from_u64(value: u64) -> Record {
    let mut record: Record = [0u8; 32];
    record[0..8].copy_from_slice(&value.to_le_bytes());
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_source_advances_height_on_each_poll() {
        let source = SimulatedUpstreamSource::new(1_000_000);
        let first = source.latest_height().await.unwrap();
        let second = source.latest_height().await.unwrap();
        assert_eq!(second, first + 1);
    }

    #[tokio::test]
    async fn simulated_source_produces_the_documented_index_formula() {
        let source = SimulatedUpstreamSource::new(1_000_000);
        let block = source.fetch_block(3).await.unwrap();
        assert_eq!(block.changes.len(), SIMULATED_INDICES_PER_HEIGHT as usize);
        assert_eq!(block.changes[5].index, (3 * SIMULATED_INDICES_PER_HEIGHT + 5) % 1_000_000);
    }

    #[tokio::test]
    async fn simulated_source_wraps_indices_around_db_size() {
        let source = SimulatedUpstreamSource::new(10);
        let block = source.fetch_block(1).await.unwrap();
        for change in &block.changes {
            assert!(change.index < 10);
        }
    }
}
