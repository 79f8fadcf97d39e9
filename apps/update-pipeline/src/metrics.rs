// [apps/update-pipeline/src/metrics.rs]
/*!
 * =================================================================
 * APARATO: MÉTRICAS DEL PIPELINE
 * RESPONSABILIDAD: CONTADORES ATÓMICOS EXPUESTOS EN /metrics
 * =================================================================
 */

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Contadores de proceso acumulados a lo largo de la vida del pipeline.
/// Cada campo es independiente: no hay invariante que relacione
/// `total_updates` con `batch_count` más allá de lo que el propio
/// `record_block` mantiene al actualizarlos juntos.
pub struct PipelineMetrics {
    total_updates: AtomicU64,
    last_processed_height: AtomicU64,
    batch_count: AtomicU64,
    total_batch_duration_nanos: AtomicU64,
    last_batch_duration_nanos: AtomicU64,
    started_at: Instant,
}

impl PipelineMetrics {
    /// Construye el contador en cero, con el reloj de `uptime` arrancando ahora.
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_updates: AtomicU64::new(0),
            last_processed_height: AtomicU64::new(0),
            batch_count: AtomicU64::new(0),
            total_batch_duration_nanos: AtomicU64::new(0),
            last_batch_duration_nanos: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Registra el procesamiento de un bloque: `updates` índices tocados en
    /// `duration`. Se acumula para la media móvil expuesta en `/metrics`.
    pub fn record_block(&self, updates: u64, duration: Duration) {
        self.total_updates.fetch_add(updates, Ordering::Relaxed);
        self.batch_count.fetch_add(1, Ordering::Relaxed);
        self.total_batch_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        self.last_batch_duration_nanos
            .store(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Registra la altura más reciente efectivamente aplicada y publicada.
    pub fn set_last_processed_height(&self, height: u64) {
        self.last_processed_height.store(height, Ordering::Relaxed);
    }

    /// Una fotografía serializable del estado actual de los contadores.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let batch_count = self.batch_count.load(Ordering::Relaxed);
        let total_nanos = self.total_batch_duration_nanos.load(Ordering::Relaxed);
        let average_batch_duration_nanos = if batch_count == 0 { 0 } else { total_nanos / batch_count };
        let last_batch_duration_nanos = self.last_batch_duration_nanos.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_updates: self.total_updates.load(Ordering::Relaxed),
            last_processed_height: self.last_processed_height.load(Ordering::Relaxed),
            batch_count,
            average_batch_duration_nanos,
            update_latency_ms: last_batch_duration_nanos / 1_000_000,
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Forma serializada de `PipelineMetrics::snapshot`, expuesta tal cual en
/// `GET /metrics` como JSON plano (§6).
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    /// Latencia del bloque procesado más recientemente, en milisegundos.
    pub update_latency_ms: u64,
    /// Última altura que completó aplicación y publicación con éxito.
    #[serde(rename = "last_processed_block")]
    pub last_processed_height: u64,
    /// Suma de índices individuales aplicados a lo largo de la vida del proceso.
    pub total_updates: u64,
    /// Cantidad de bloques procesados; no forma parte del contrato externo de
    /// `/metrics` pero se conserva para depuración interna.
    #[serde(skip)]
    pub batch_count: u64,
    /// Media móvil de la duración de un bloque, en nanosegundos internamente,
    /// expuesta en milisegundos.
    #[serde(rename = "average_batch_duration_ms", serialize_with = "nanos_as_millis")]
    pub average_batch_duration_nanos: u64,
    /// Segundos transcurridos desde que el proceso arrancó.
    pub uptime_seconds: u64,
}

fn nanos_as_millis<S: serde::Serializer>(nanos: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(nanos / 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_duration_is_zero_before_any_block() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot().average_batch_duration_nanos, 0);
    }

    #[test]
    fn record_block_accumulates_across_calls() {
        let metrics = PipelineMetrics::new();
        metrics.record_block(2_000, Duration::from_millis(10));
        metrics.record_block(2_000, Duration::from_millis(30));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_updates, 4_000);
        assert_eq!(snapshot.batch_count, 2);
        assert_eq!(snapshot.average_batch_duration_nanos, Duration::from_millis(20).as_nanos() as u64);
    }
}
