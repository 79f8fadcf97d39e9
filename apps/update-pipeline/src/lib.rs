// [apps/update-pipeline/src/lib.rs]
/*!
 * =================================================================
 * APARATO: UPDATE PIPELINE LIBRARY ROOT
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DEL PIPELINE
 *
 * El pipeline es el único escritor de `database.bin` y del directorio
 * de deltas: sondea el upstream, aplica cambios y publica los artefactos
 * que `pir-server` y los clientes consumen.
 * =================================================================
 */

#![deny(missing_docs)]

/// Configuración del binario vía `clap` + variables de entorno.
pub mod config;
/// Catálogo de errores del pipeline.
pub mod errors;
/// El archivo `database.bin` como único escritor posicional.
pub mod live_database;
/// Contadores atómicos expuestos en `/metrics`.
pub mod metrics;
/// El ciclo de bloques: sondeo, aplicación y publicación.
pub mod pipeline;
/// Publicación atómica de deltas, bundles y el manifiesto de deltas.
pub mod publish;
/// Superficie HTTP de observabilidad (`/health`, `/metrics`).
pub mod server;
/// La fuente de bloques upstream: RPC real o simulada.
pub mod source;

/// Reexportaciones de conveniencia para `main.rs`.
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::errors::PipelineError;
    pub use crate::live_database::LiveDatabase;
    pub use crate::metrics::PipelineMetrics;
    pub use crate::pipeline::{BlockCycleState, UpdatePipeline};
    pub use crate::server::SharedPipelineStatus;
    pub use crate::source::{RpcUpstreamSource, SimulatedUpstreamSource, UpstreamSource};
}
