// [apps/pir-server/src/handlers.rs]
/*!
 * =================================================================
 * APARATO: HANDLERS HTTP DEL EVALUADOR
 * RESPONSABILIDAD: LAS CUATRO OPERACIONES DEL SERVER EVALUATOR
 *
 * Cada handler retiene el `RwLock` del espejo sólo durante su propio
 * cómputo (una lectura de celda o un recorrido de paridad) y nunca
 * durante la espera de red: el `tokio::time::timeout` que propaga el
 * deadline del llamador envuelve el cómputo completo, no al revés.
 * =================================================================
 */

use crate::errors::ServerError;
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use plinko_codec::record::Record;
use plinko_hint_engine::pending_query::QueryVariant;
use plinko_hint_engine::slot::{derive_chunk_subset, SlotIprf};
use plinko_hint_engine::table::Dims;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Interpreta un registro de 32 bytes como el `uint64` little-endian de sus
/// primeros 8 bytes — el contrato numérico de `value`/`parity` en §6.
fn record_as_u64(record: &Record) -> u64 {
    u64::from_le_bytes(record[0..8].try_into().expect("record is at least 8 bytes"))
}

/// Parámetro opcional `?deadline_ms=` común a toda ruta de consulta.
#[derive(Debug, Deserialize)]
pub struct DeadlineQuery {
    deadline_ms: Option<u64>,
}

fn resolve_deadline(query: &DeadlineQuery, headers: &HeaderMap, default_ms: u64) -> Duration {
    let from_header = headers
        .get("x-deadline-ms")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let millis = query.deadline_ms.or(from_header).unwrap_or(default_ms);
    Duration::from_millis(millis)
}

/// `GET /health` → `{status, service, db_size, chunk_size, set_size}`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    db_size: u64,
    chunk_size: u64,
    set_size: u64,
    uptime_seconds: u64,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "plinko-pir-server",
        db_size: state.dims.db_size,
        chunk_size: state.dims.chunk_size,
        set_size: state.dims.set_size,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

#[derive(Debug, Serialize)]
pub struct ValueResponse {
    /// Los 8 bytes bajos del registro de 32 bytes, little-endian (§6).
    value: u64,
    server_time_nanos: u64,
}

#[derive(Debug, Deserialize)]
pub struct PlaintextParams {
    index: u64,
}

/// `GET /query/plaintext?index=` — diagnóstico, nunca usado por un cliente privado.
pub async fn plaintext_get(
    State(state): State<ServerState>,
    Query(params): Query<PlaintextParams>,
    Query(deadline): Query<DeadlineQuery>,
    headers: HeaderMap,
) -> Result<Json<ValueResponse>, ServerError> {
    plaintext(state, params, deadline, headers).await
}

/// `POST /query/plaintext` con el mismo esquema en el cuerpo JSON.
pub async fn plaintext_post(
    State(state): State<ServerState>,
    Query(deadline): Query<DeadlineQuery>,
    headers: HeaderMap,
    Json(params): Json<PlaintextParams>,
) -> Result<Json<ValueResponse>, ServerError> {
    plaintext(state, params, deadline, headers).await
}

async fn plaintext(
    state: ServerState,
    params: PlaintextParams,
    deadline: DeadlineQuery,
    headers: HeaderMap,
) -> Result<Json<ValueResponse>, ServerError> {
    let budget = resolve_deadline(&deadline, &headers, state.default_deadline_ms);
    let started = Instant::now();

    let outcome = tokio::time::timeout(budget, async {
        let mirror = state.mirror.read().expect("mirror lock poisoned");
        mirror.get(params.index)
    })
    .await
    .map_err(|_| ServerError::Timeout)?;

    let value = outcome.ok_or(ServerError::InputRange)?;

    Ok(Json(ValueResponse {
        value: record_as_u64(&value),
        server_time_nanos: started.elapsed().as_nanos() as u64,
    }))
}

#[derive(Debug, Serialize)]
pub struct ParityResponse {
    /// Los 8 bytes bajos de la paridad XOR de 32 bytes, little-endian (§6).
    parity: u64,
    server_time_nanos: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetParityRequest {
    indices: Vec<u64>,
}

/// `POST /query/setparity` → XOR explícito sobre un conjunto de índices dado.
///
/// Acepta además el sobre comprimido `X-Query-Encoding: plinko-v1` cuando el
/// `Content-Type` es `application/octet-stream`: el bitmap+offsets se expande
/// a índices globales antes de computar la paridad.
pub async fn setparity(
    State(state): State<ServerState>,
    Query(deadline): Query<DeadlineQuery>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<ParityResponse>, ServerError> {
    let budget = resolve_deadline(&deadline, &headers, state.default_deadline_ms);
    let started = Instant::now();

    let uses_compressed_envelope = headers
        .get("x-query-encoding")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == plinko_codec::query_envelope::QUERY_ENCODING_HEADER_VALUE)
        .unwrap_or(false);

    let indices = if uses_compressed_envelope {
        decode_envelope_indices(&body, state.dims.chunk_size)?
    } else {
        let request: SetParityRequest = serde_json::from_slice(&body).map_err(|_| ServerError::Format)?;
        request.indices
    };

    let outcome = tokio::time::timeout(budget, async {
        let mirror = state.mirror.read().expect("mirror lock poisoned");
        mirror.xor_over(indices)
    })
    .await
    .map_err(|_| ServerError::Timeout)?;

    Ok(Json(ParityResponse {
        parity: record_as_u64(&outcome),
        server_time_nanos: started.elapsed().as_nanos() as u64,
    }))
}

fn decode_envelope_indices(body: &[u8], chunk_size: u64) -> Result<Vec<u64>, ServerError> {
    let envelope = plinko_codec::query_envelope::QueryEnvelope::decode(body).map_err(|_| ServerError::Format)?;

    if envelope.offsets.len() != envelope.set_chunk_count() as usize {
        return Err(ServerError::Format);
    }

    let marked_chunks = envelope.bitmap.iter().enumerate().flat_map(|(byte_index, byte)| {
        (0..8u32).filter_map(move |bit| {
            if byte & (1 << bit) != 0 {
                Some(byte_index as u32 * 8 + bit)
            } else {
                None
            }
        })
    });

    Ok(marked_chunks
        .zip(envelope.offsets.iter())
        .map(|(chunk, &offset)| chunk as u64 * chunk_size + offset as u64)
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct FullSetRequest {
    /// Clave de 16 bytes, codificada en base64 estándar.
    prf_key: String,
    /// Chunk excluido de la expansión.
    excluded_chunk: u32,
    /// Regla de derivación del conjunto completo.
    variant: QueryVariant,
    /// Para una ranura `Promoted`, el chunk fijado en la promoción: su
    /// representante (vía la misma `prf_key`) se incluye siempre en la
    /// expansión, sin importar `excluded_chunk`. `None` para `Regular`.
    #[serde(default)]
    promoted_chunk: Option<u32>,
}

/// `POST /query/fullset` — la operación privada: expande `prf_key` en el
/// mismo conjunto que el cliente derivó al materializar la ranura, omite el
/// chunk excluido, y devuelve la paridad del resto.
pub async fn fullset(
    State(state): State<ServerState>,
    Query(deadline): Query<DeadlineQuery>,
    headers: HeaderMap,
    Json(request): Json<FullSetRequest>,
) -> Result<Json<ParityResponse>, ServerError> {
    use base64::Engine;

    let budget = resolve_deadline(&deadline, &headers, state.default_deadline_ms);
    let started = Instant::now();

    let key_bytes = base64::engine::general_purpose::STANDARD
        .decode(request.prf_key.as_bytes())
        .map_err(|_| ServerError::BadKey)?;
    if key_bytes.len() != 16 {
        return Err(ServerError::BadKey);
    }
    let mut key = [0u8; 16];
    key.copy_from_slice(&key_bytes);

    let dims = state.dims;
    let indices = expand_query_set(dims, key, request.variant, request.excluded_chunk, request.promoted_chunk);

    let outcome = tokio::time::timeout(budget, async {
        let mirror = state.mirror.read().expect("mirror lock poisoned");
        mirror.xor_over(indices)
    })
    .await
    .map_err(|_| ServerError::Timeout)?;

    Ok(Json(ParityResponse {
        parity: record_as_u64(&outcome),
        server_time_nanos: started.elapsed().as_nanos() as u64,
    }))
}

/// Reproduce, del lado del servidor, la misma expansión de conjunto que el
/// cliente usó al construir la ranura que origina esta consulta (§4.3
/// "Constraints": misma construcción iPRF, mismas etiquetas de separación
/// de dominio), omitiendo el chunk excluido.
///
/// Para una ranura `Promoted`, `promoted_chunk` identifica el chunk fijado
/// en la promoción: su representante (vía la misma clave) es el punto extra
/// que la paridad local del cliente ya incorporó permanentemente, así que
/// el servidor debe sumarlo siempre — nunca está entre los chunks que
/// `derive_chunk_subset` deriva, y no se filtra por `excluded_chunk` salvo
/// que coincidan, en cuyo caso ya quedó fuera por construcción.
fn expand_query_set(
    dims: Dims,
    key: [u8; 16],
    variant: QueryVariant,
    excluded_chunk: u32,
    promoted_chunk: Option<u32>,
) -> Vec<u64> {
    let subset_size = match variant {
        QueryVariant::Regular => dims.chunk_size / 2 + 1,
        QueryVariant::PromotedInside | QueryVariant::PromotedComplement => dims.chunk_size / 2,
    };

    let derived = derive_chunk_subset(&key, dims.set_size, subset_size);
    let chunks: Vec<u32> = match variant {
        QueryVariant::PromotedComplement => {
            let inside: HashSet<u32> = derived.iter().copied().collect();
            (0..dims.set_size as u32).filter(|chunk| !inside.contains(chunk)).collect()
        }
        QueryVariant::Regular | QueryVariant::PromotedInside => derived,
    };

    let iprf = SlotIprf::new(key);
    let mut indices: Vec<u64> = chunks
        .into_iter()
        .filter(|&chunk| chunk != excluded_chunk)
        .map(|chunk| iprf.global_index_for_chunk(chunk, dims.chunk_size))
        .collect();

    if let Some(chunk) = promoted_chunk {
        if chunk != excluded_chunk {
            indices.push(iprf.global_index_for_chunk(chunk, dims.chunk_size));
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_query_set_never_includes_the_excluded_chunk() {
        let dims = Dims {
            db_size: 4096,
            chunk_size: 64,
            set_size: 64,
        };
        let key = [9u8; 16];
        let excluded = 3u32;
        let indices = expand_query_set(dims, key, QueryVariant::Regular, excluded, None);
        for index in indices {
            assert_ne!(index / dims.chunk_size, excluded as u64);
        }
    }

    #[test]
    fn promoted_chunk_representative_is_always_included() {
        let dims = Dims {
            db_size: 4096,
            chunk_size: 64,
            set_size: 64,
        };
        let key = [9u8; 16];
        let excluded = 3u32;
        let promoted_chunk = 40u32;
        let iprf = SlotIprf::new(key);
        let promoted_index = iprf.global_index_for_chunk(promoted_chunk, dims.chunk_size);

        let indices = expand_query_set(dims, key, QueryVariant::PromotedInside, excluded, Some(promoted_chunk));
        assert!(indices.contains(&promoted_index));
    }

    #[test]
    fn promoted_chunk_coinciding_with_excluded_chunk_is_not_duplicated() {
        let dims = Dims {
            db_size: 4096,
            chunk_size: 64,
            set_size: 64,
        };
        let key = [9u8; 16];
        let excluded = 40u32;

        let indices = expand_query_set(dims, key, QueryVariant::PromotedComplement, excluded, Some(excluded));
        let iprf = SlotIprf::new(key);
        let excluded_index = iprf.global_index_for_chunk(excluded, dims.chunk_size);
        assert!(!indices.contains(&excluded_index));
    }
}
