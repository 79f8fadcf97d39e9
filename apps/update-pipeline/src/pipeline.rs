// [apps/update-pipeline/src/pipeline.rs]
/*!
 * =================================================================
 * APARATO: CICLO DE BLOQUES DEL PIPELINE DE ACTUALIZACIÓN
 * RESPONSABILIDAD: SONDEO, APLICACIÓN DE CAMBIOS Y PUBLICACIÓN
 *
 * Un tick recorre todas las alturas nuevas desde `last_processed_height`
 * hasta la altura reportada por la fuente. Cada altura pasa por las
 * cuatro fases de §4.4 "State machine per block": un fallo en cualquiera
 * de ellas devuelve el ciclo a `Idle` sin avanzar `last_processed_height`,
 * de modo que la siguiente llamada a `run_tick` reintenta la misma altura.
 * =================================================================
 */

use crate::errors::PipelineError;
use crate::live_database::LiveDatabase;
use crate::metrics::PipelineMetrics;
use crate::publish;
use crate::source::UpstreamSource;
use plinko_codec::delta::DeltaEntry;
use plinko_codec::manifest::DeltaManifest;
use plinko_upstream_client::UpstreamRpcError;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// La fase del ciclo de procesamiento de un único bloque, usada únicamente
/// para el rastro de observabilidad: ninguna de estas variantes persiste
/// entre ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCycleState {
    /// Sin trabajo en curso; esperando el próximo sondeo.
    Idle,
    /// Obteniendo la altura más reciente o los cambios de una altura.
    Fetching,
    /// Aplicando los cambios recibidos sobre `database.bin`.
    Applying,
    /// Escribiendo el delta, el bundle eventual y el manifiesto.
    Publishing,
}

/// Orquesta el sondeo continuo de un [`UpstreamSource`] y la publicación de
/// los deltas resultantes.
pub struct UpdatePipeline<S: UpstreamSource> {
    source: S,
    database: LiveDatabase,
    delta_dir: PathBuf,
    bundle_size: u64,
    retry_ceiling: u32,
    metrics: Arc<PipelineMetrics>,
    manifest: DeltaManifest,
    last_processed_height: u64,
    state: BlockCycleState,
}

impl<S: UpstreamSource> UpdatePipeline<S> {
    /// Construye el pipeline a partir de una fuente ya conectada, la base de
    /// datos viva y el directorio donde se publican los deltas.
    ///
    /// # Errors
    /// Propaga fallos de I/O al cargar el manifiesto de deltas existente.
    pub fn new(
        source: S,
        database: LiveDatabase,
        delta_dir: PathBuf,
        bundle_size: u64,
        retry_ceiling: u32,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, PipelineError> {
        let manifest = publish::load_or_init_manifest(&delta_dir)?;
        let last_processed_height = manifest.latest_block;
        metrics.set_last_processed_height(last_processed_height);

        Ok(Self {
            source,
            database,
            delta_dir,
            bundle_size,
            retry_ceiling,
            metrics,
            manifest,
            last_processed_height,
            state: BlockCycleState::Idle,
        })
    }

    /// La fase actual del ciclo, para exponer en `/health`.
    #[must_use]
    pub fn state(&self) -> BlockCycleState {
        self.state
    }

    /// La última altura aplicada y publicada con éxito.
    #[must_use]
    pub fn last_processed_height(&self) -> u64 {
        self.last_processed_height
    }

    /// Ejecuta un sondeo completo: obtiene la altura más reciente y procesa
    /// toda altura nueva en orden ascendente. Un fallo al procesar una
    /// altura particular detiene el avance en esa altura; las alturas ya
    /// procesadas antes del fallo quedan publicadas.
    ///
    /// # Errors
    /// `PipelineError::Upstream` si ni siquiera `latest_height` responde tras
    /// agotar los reintentos; los fallos al procesar una altura individual se
    /// registran y hacen que `run_tick` retorne, sin abortar el proceso.
    #[instrument(skip(self))]
    pub async fn run_tick(&mut self) -> Result<(), PipelineError> {
        self.state = BlockCycleState::Fetching;
        let latest = with_retry(self.retry_ceiling, || self.source.latest_height()).await?;

        if latest <= self.last_processed_height {
            self.state = BlockCycleState::Idle;
            return Ok(());
        }

        for height in (self.last_processed_height + 1)..=latest {
            if let Err(error) = self.process_height(height).await {
                warn!(height, error = %error, "block processing failed; will retry on the next tick");
                self.state = BlockCycleState::Idle;
                return Ok(());
            }
        }

        self.state = BlockCycleState::Idle;
        Ok(())
    }

    async fn process_height(&mut self, height: u64) -> Result<(), PipelineError> {
        let started = Instant::now();

        self.state = BlockCycleState::Fetching;
        let block = with_retry(self.retry_ceiling, || self.source.fetch_block(height)).await?;

        self.state = BlockCycleState::Applying;
        let mut entries = Vec::with_capacity(block.changes.len());
        for change in &block.changes {
            let xor = self.database.apply_change(change.index, &change.new_value)?;
            entries.push(DeltaEntry {
                index: change.index,
                position_flag: Some(false),
                xor,
            });
        }

        self.state = BlockCycleState::Publishing;
        publish::publish_block(&self.delta_dir, self.bundle_size, height, entries, &mut self.manifest)?;

        self.last_processed_height = height;
        self.metrics.set_last_processed_height(height);
        self.metrics.record_block(block.changes.len() as u64, started.elapsed());

        info!(height, applied = block.changes.len(), "block published");
        Ok(())
    }
}

async fn with_retry<F, Fut, T>(ceiling: u32, mut attempt: F) -> Result<T, UpstreamRpcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamRpcError>>,
{
    let mut tries = 0u32;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && tries < ceiling => {
                let backoff = Duration::from_millis(200 * 2u64.saturating_pow(tries));
                warn!(attempt = tries, backoff_ms = backoff.as_millis() as u64, error = %error, "transient upstream error, retrying");
                tokio::time::sleep(backoff).await;
                tries += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SimulatedUpstreamSource;
    use tempfile::tempdir;

    #[tokio::test]
    async fn run_tick_advances_and_publishes_at_least_one_height() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("database.bin");
        let delta_dir = dir.path().join("deltas");
        std::fs::create_dir_all(&delta_dir).unwrap();

        let db_size = 10_000;
        let database = LiveDatabase::open(&db_path, db_size).unwrap();
        let source = SimulatedUpstreamSource::new(db_size);
        let metrics = Arc::new(PipelineMetrics::new());

        let mut pipeline = UpdatePipeline::new(source, database, delta_dir.clone(), 100, 3, metrics).unwrap();
        pipeline.run_tick().await.unwrap();

        assert_eq!(pipeline.last_processed_height(), 1);
        assert!(delta_dir.join("delta-000001.bin").exists());
        assert!(delta_dir.join("manifest.json").exists());
    }

    #[tokio::test]
    async fn run_tick_is_a_no_op_when_no_new_height_is_available() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("database.bin");
        let delta_dir = dir.path().join("deltas");
        std::fs::create_dir_all(&delta_dir).unwrap();

        let database = LiveDatabase::open(&db_path, 100).unwrap();
        let source = SimulatedUpstreamSource::new(100);
        let metrics = Arc::new(PipelineMetrics::new());
        let mut pipeline = UpdatePipeline::new(source, database, delta_dir, 100, 3, metrics).unwrap();

        pipeline.run_tick().await.unwrap();
        assert_eq!(pipeline.last_processed_height(), 1);
        assert_eq!(pipeline.state(), BlockCycleState::Idle);
    }
}
