// [apps/update-pipeline/src/main.rs]
/*!
 * =================================================================
 * APARATO: PUNTO DE ENTRADA DEL PIPELINE DE ACTUALIZACIÓN
 * RESPONSABILIDAD: ARRANQUE, BUCLE DE SONDEO Y SUPERFICIE HTTP
 * =================================================================
 */

use dotenvy::dotenv;
use plinko_codec::address_map::AddressMap;
use plinko_codec::manifest::SnapshotManifest;
use plinko_update_pipeline::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    plinko_heimdall::init_tracing("plinko_update_pipeline");

    let config = PipelineConfig::load();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(config))
}

async fn run(config: PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(fault) = wait_for_snapshot(&config).await {
        error!("snapshot did not become available within the startup deadline: {}", fault);
        std::process::exit(1);
    }

    let manifest_bytes = std::fs::read(config.snapshot_manifest_path())?;
    let manifest = match SnapshotManifest::from_json(&manifest_bytes) {
        Ok(manifest) => manifest,
        Err(fault) => {
            error!("failed to parse snapshot manifest: {}", fault);
            std::process::exit(1);
        }
    };

    if let Ok(address_map) = AddressMap::load_from_file(&config.address_mapping_path) {
        if address_map.len() as u64 != manifest.db_size {
            warn!(
                mapping_len = address_map.len(),
                db_size = manifest.db_size,
                "address mapping entry count does not match the snapshot's declared db_size"
            );
        }
    } else {
        error!("failed to load address mapping at startup");
        std::process::exit(1);
    }

    std::fs::create_dir_all(&config.delta_dir)?;

    let database = LiveDatabase::open(&config.database_path, manifest.db_size)?;
    let metrics = Arc::new(PipelineMetrics::new());
    let status = SharedPipelineStatus::new();

    let health_router = plinko_update_pipeline::server::build_router(metrics.clone(), status.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.health_port)).await?;
    tokio::spawn(async move {
        if let Err(fault) = axum::serve(listener, health_router).await {
            error!("observability server terminated: {}", fault);
        }
    });

    info!(
        port = config.health_port,
        db_size = manifest.db_size,
        simulated = config.simulated_updates,
        "plinko-update-pipeline starting the block cycle"
    );

    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    if config.simulated_updates {
        let source = SimulatedUpstreamSource::new(manifest.db_size);
        let mut pipeline = UpdatePipeline::new(
            source,
            database,
            config.delta_dir.clone(),
            config.bundle_size,
            config.retry_ceiling,
            metrics,
        )?;
        run_loop(&mut pipeline, &status, poll_interval).await;
    } else {
        let rpc_url = config.rpc_url.clone().ok_or("RPC_URL is required unless SIMULATED_UPDATES is set")?;
        let source = RpcUpstreamSource::new(rpc_url, config.rpc_token.clone(), Duration::from_secs(10));
        let mut pipeline = UpdatePipeline::new(
            source,
            database,
            config.delta_dir.clone(),
            config.bundle_size,
            config.retry_ceiling,
            metrics,
        )?;
        run_loop(&mut pipeline, &status, poll_interval).await;
    }

    Ok(())
}

async fn run_loop<S: UpstreamSource>(
    pipeline: &mut UpdatePipeline<S>,
    status: &SharedPipelineStatus,
    poll_interval: Duration,
) {
    loop {
        if let Err(fault) = pipeline.run_tick().await {
            error!("tick failed: {}", fault);
        }

        let state_label = match pipeline.state() {
            BlockCycleState::Idle => "idle",
            BlockCycleState::Fetching => "fetching",
            BlockCycleState::Applying => "applying",
            BlockCycleState::Publishing => "publishing",
        };
        status.publish(pipeline.last_processed_height(), state_label);

        tokio::time::sleep(poll_interval).await;
    }
}

/// Espera hasta `database_timeout_seconds` a que el `manifest.json` del
/// snapshot declarado en `SNAPSHOT_VERSION` aparezca en disco, sondeando
/// cada segundo. Un proceso externo de empaquetado publica el snapshot
/// inicial antes de que este pipeline pueda empezar a aplicar deltas.
async fn wait_for_snapshot(config: &PipelineConfig) -> Result<(), PipelineError> {
    let deadline = Instant::now() + Duration::from_secs(config.database_timeout_seconds);
    loop {
        if config.snapshot_manifest_path().exists() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(PipelineError::ConfigFatal(format!(
                "snapshot manifest not found at {}",
                config.snapshot_manifest_path().display()
            )));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
