// [apps/update-pipeline/src/config.rs]
/*!
 * =================================================================
 * APARATO: CONFIGURACIÓN DEL PIPELINE
 * RESPONSABILIDAD: SUPERFICIE CLI/ENV DE ARRANQUE
 *
 * Todo campo acepta un flag largo y su variable de entorno equivalente
 * (§6), de modo que el binario pueda operar puramente desde el entorno
 * de un contenedor, igual que `pir-server::ServerConfig`.
 * =================================================================
 */

use clap::Parser;
use std::path::PathBuf;

/// Superficie de arranque del pipeline de actualización.
#[derive(Debug, Clone, Parser)]
#[command(name = "update-pipeline", about = "Plinko Update Pipeline: continuous block-cycle polling, XOR delta computation and atomic snapshot publication")]
pub struct PipelineConfig {
    /// Ruta a `database.bin`: el único escritor de este archivo es este proceso.
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: PathBuf,

    /// Ruta a `address-mapping.bin`, verificada al arrancar por consistencia
    /// con `db_size` pero no mutada por este binario.
    #[arg(long, env = "ADDRESS_MAPPING_PATH")]
    pub address_mapping_path: PathBuf,

    /// Raíz pública de snapshots: `PUBLIC_ROOT/snapshots/<version>/manifest.json`.
    #[arg(long, env = "PUBLIC_ROOT")]
    pub public_root: PathBuf,

    /// Directorio donde se publican `delta-NNNNNN.bin`, `bundle-START-END.bin`
    /// y el `manifest.json` de deltas.
    #[arg(long, env = "DELTA_DIR")]
    pub delta_dir: PathBuf,

    /// Versión del snapshot activo (también el nombre de su directorio).
    #[arg(long, env = "SNAPSHOT_VERSION")]
    pub snapshot_version: String,

    /// Puerto de escucha de `/health` y `/metrics`.
    #[arg(long, env = "HEALTH_PORT", default_value_t = 9090)]
    pub health_port: u16,

    /// Tiempo máximo, en segundos, que el arranque espera a que el snapshot
    /// declarado en `SNAPSHOT_VERSION` exista antes de fallar con `ConfigFatal`.
    #[arg(long, env = "DATABASE_TIMEOUT_SECONDS", default_value_t = 30)]
    pub database_timeout_seconds: u64,

    /// URL base del endpoint RPC del upstream. Requerido salvo en modo simulado.
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Token opcional `Bearer` para el endpoint RPC del upstream.
    #[arg(long, env = "RPC_TOKEN")]
    pub rpc_token: Option<String>,

    /// Activa `SimulatedUpstreamSource` en vez de un cliente RPC real (§4.4
    /// "Simulated mode"): útil para levantar el resto de la pila sin un
    /// upstream disponible.
    #[arg(long, env = "SIMULATED_UPDATES", default_value_t = false)]
    pub simulated_updates: bool,

    /// Cantidad de alturas procesadas por bundle (§4.4 "Bundling").
    #[arg(long, env = "BUNDLE_SIZE", default_value_t = 100)]
    pub bundle_size: u64,

    /// Techo de reintentos con backoff exponencial ante fallos transitorios
    /// del upstream antes de declarar fatal el bloque en curso.
    #[arg(long, env = "RPC_RETRY_CEILING", default_value_t = 5)]
    pub retry_ceiling: u32,

    /// Intervalo, en milisegundos, entre dos sondeos sucesivos de `latest_height`.
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 5_000)]
    pub poll_interval_ms: u64,
}

impl PipelineConfig {
    /// Parsea la configuración desde argumentos de proceso y entorno.
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }

    /// Directorio del snapshot activo: `PUBLIC_ROOT/snapshots/<version>`.
    #[must_use]
    pub fn snapshot_dir(&self) -> PathBuf {
        self.public_root.join("snapshots").join(&self.snapshot_version)
    }

    /// Ruta del `manifest.json` del snapshot activo.
    #[must_use]
    pub fn snapshot_manifest_path(&self) -> PathBuf {
        self.snapshot_dir().join("manifest.json")
    }
}
