// [apps/pir-server/src/config.rs]
/*!
 * =================================================================
 * APARATO: CONFIGURACIÓN DEL SERVIDOR
 * RESPONSABILIDAD: SUPERFICIE CLI/ENV DE ARRANQUE
 *
 * Todo campo acepta tanto un flag largo como su variable de entorno
 * equivalente, de modo que el binario pueda operar sin argumentos en
 * un contenedor, igual que `census-taker` lee sus rutas de ingesta.
 * =================================================================
 */

use clap::Parser;
use std::path::PathBuf;

/// Superficie de arranque del Servidor Evaluador.
#[derive(Debug, Clone, Parser)]
#[command(name = "pir-server", about = "Plinko Server Evaluator: private single-index lookups over an in-memory database mirror")]
pub struct ServerConfig {
    /// Ruta a `database.bin`: N registros densos de 32 bytes.
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: PathBuf,

    /// Ruta a `address-mapping.bin`.
    #[arg(long, env = "ADDRESS_MAPPING_PATH")]
    pub address_mapping_path: PathBuf,

    /// Ruta al `manifest.json` del snapshot activo, de donde se leen
    /// `db_size`, `chunk_size` y `set_size`.
    #[arg(long, env = "SNAPSHOT_MANIFEST_PATH")]
    pub snapshot_manifest_path: PathBuf,

    /// Puerto de escucha HTTP.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Dirección de bind.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// Tiempo máximo, en segundos, que el arranque espera a que
    /// `database_path` exista antes de fallar con `ConfigFatal`.
    #[arg(long, env = "DATABASE_TIMEOUT_SECONDS", default_value_t = 30)]
    pub database_timeout_seconds: u64,

    /// Deadline por defecto, en milisegundos, aplicado a una consulta que
    /// no especifica `?deadline_ms=` ni la cabecera `X-Deadline-Ms`.
    #[arg(long, env = "DEFAULT_DEADLINE_MS", default_value_t = 250)]
    pub default_deadline_ms: u64,
}

impl ServerConfig {
    /// Parsea la configuración desde argumentos de proceso y entorno,
    /// habiendo cargado previamente un `.env` si está presente.
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
