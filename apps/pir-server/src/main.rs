// [apps/pir-server/src/main.rs]
/*!
 * =================================================================
 * APARATO: PUNTO DE ENTRADA DEL SERVER EVALUATOR
 * RESPONSABILIDAD: CARGA DE SNAPSHOT Y ARRANQUE DEL SERVIDOR HTTP
 * =================================================================
 */

use dotenvy::dotenv;
use plinko_codec::address_map::AddressMap;
use plinko_codec::manifest::SnapshotManifest;
use plinko_hint_engine::table::Dims;
use plinko_pir_server::prelude::*;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    plinko_heimdall::init_tracing("plinko_pir_server");

    let config = ServerConfig::load();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        if let Err(fault) = wait_for_database(&config).await {
            error!("database did not become available within the startup deadline: {}", fault);
            std::process::exit(1);
        }

        let manifest = match SnapshotManifest::from_json(&std::fs::read(&config.snapshot_manifest_path)?) {
            Ok(manifest) => manifest,
            Err(fault) => {
                error!("failed to parse snapshot manifest: {}", fault);
                std::process::exit(1);
            }
        };

        let dims = Dims {
            db_size: manifest.db_size,
            chunk_size: manifest.chunk_size,
            set_size: manifest.set_size,
        };

        let mirror = DatabaseMirror::load(&config.database_path, dims.db_size)?;
        let address_map = AddressMap::load_from_file(&config.address_mapping_path)?;

        let state = ServerState {
            mirror: Arc::new(RwLock::new(mirror)),
            address_map: Arc::new(address_map),
            dims,
            default_deadline_ms: config.default_deadline_ms,
            started_at: Instant::now(),
        };

        let router = plinko_pir_server::routes::build_router(state);
        let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.bind_addr, config.port)).await?;

        info!(
            port = config.port,
            db_size = dims.db_size,
            chunk_size = dims.chunk_size,
            "plinko-pir-server listening"
        );

        axum::serve(listener, router).await?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Espera hasta `database_timeout_seconds` a que `database_path` aparezca en
/// disco, sondeando cada segundo. El pipeline de actualización publica el
/// snapshot inicial de forma asíncrona; el servidor puede arrancar primero.
async fn wait_for_database(config: &ServerConfig) -> Result<(), ServerError> {
    let deadline = Instant::now() + Duration::from_secs(config.database_timeout_seconds);
    loop {
        if config.database_path.exists() && config.snapshot_manifest_path.exists() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ServerError::Timeout);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
