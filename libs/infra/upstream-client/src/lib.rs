// [libs/infra/upstream-client/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CLIENTE RPC DEL UPSTREAM
 * RESPONSABILIDAD: SONDEO DE ALTURA Y OBTENCIÓN DE CAMBIOS POR BLOQUE
 *
 * Adaptador delgado: no construye una base de datos a partir de
 * registros fuente, ni interpreta direcciones. Expone únicamente la
 * altura más reciente conocida por el proveedor y, para una altura
 * dada, el conjunto de índices cuyo valor cambió en ese bloque. El
 * pipeline de actualización decide qué hacer con esos cambios.
 * =================================================================
 */

use plinko_codec::record::Record;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Fallos del enlace con el endpoint RPC.
#[derive(Error, Debug)]
pub enum UpstreamRpcError {
    #[error("failed to reach upstream endpoint: {0}")]
    Connection(#[from] reqwest::Error),
    #[error("upstream endpoint rejected the request with status {status}")]
    Rejected { status: u16 },
    #[error("upstream payload did not match the expected schema: {0}")]
    Malformed(String),
}

impl UpstreamRpcError {
    /// `true` si el fallo amerita reintento con backoff exponencial en vez
    /// de abortar el bloque en curso.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamRpcError::Connection(_) => true,
            UpstreamRpcError::Rejected { status } => *status >= 500,
            UpstreamRpcError::Malformed(_) => false,
        }
    }
}

/// Un único índice cuyo valor cambió dentro de un bloque.
#[derive(Debug, Clone, Copy)]
pub struct IndexChange {
    pub index: u64,
    pub new_value: Record,
}

/// El conjunto de cambios reportados por el upstream para una altura dada.
#[derive(Debug, Clone)]
pub struct BlockChanges {
    pub height: u64,
    pub changes: Vec<IndexChange>,
}

#[derive(Deserialize)]
struct HeightResponse {
    height: u64,
}

#[derive(Deserialize)]
struct BlockResponseEntry {
    index: u64,
    value: String,
}

#[derive(Deserialize)]
struct BlockResponse {
    height: u64,
    changes: Vec<BlockResponseEntry>,
}

/// Cliente HTTP hacia el endpoint RPC configurado en `RPC_URL`/`RPC_TOKEN`.
pub struct UpstreamRpcClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl UpstreamRpcClient {
    /// Construye el cliente con un timeout de request acotado.
    ///
    /// # Panics
    /// Si el `Client` interno no puede construirse (configuración TLS rota).
    #[must_use]
    pub fn new(base_url: String, token: Option<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("plinko-upstream-client/0.1")
            .build()
            .expect("failed to initialize the upstream HTTP client");
        Self { http, base_url, token }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Altura más reciente conocida por el upstream.
    ///
    /// # Errors
    /// `UpstreamRpcError::Connection` en fallas de red; `Rejected` en
    /// respuestas no exitosas; `Malformed` si el cuerpo no calza el esquema.
    pub async fn latest_height(&self) -> Result<u64, UpstreamRpcError> {
        let request = self.authorize(self.http.get(format!("{}/height", self.base_url)));
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(UpstreamRpcError::Rejected {
                status: response.status().as_u16(),
            });
        }

        let body: HeightResponse = response
            .json()
            .await
            .map_err(|fault| UpstreamRpcError::Malformed(fault.to_string()))?;

        Ok(body.height)
    }

    /// Cambios reportados para el bloque en `height`.
    ///
    /// # Errors
    /// Igual que [`Self::latest_height`]; además `Malformed` si algún valor
    /// reportado no decodifica como 32 bytes hexadecimales.
    pub async fn fetch_block(&self, height: u64) -> Result<BlockChanges, UpstreamRpcError> {
        let request = self.authorize(self.http.get(format!("{}/block/{}", self.base_url, height)));
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(UpstreamRpcError::Rejected {
                status: response.status().as_u16(),
            });
        }

        let body: BlockResponse = response
            .json()
            .await
            .map_err(|fault| UpstreamRpcError::Malformed(fault.to_string()))?;

        let changes = body
            .changes
            .into_iter()
            .map(|entry| decode_change(entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BlockChanges {
            height: body.height,
            changes,
        })
    }
}

fn decode_change(entry: BlockResponseEntry) -> Result<IndexChange, UpstreamRpcError> {
    let bytes = hex::decode(&entry.value).map_err(|fault| UpstreamRpcError::Malformed(fault.to_string()))?;
    if bytes.len() != 32 {
        return Err(UpstreamRpcError::Malformed(format!(
            "value for index {} is {} bytes, expected 32",
            entry.index,
            bytes.len()
        )));
    }
    let mut new_value: Record = [0u8; 32];
    new_value.copy_from_slice(&bytes);
    Ok(IndexChange {
        index: entry.index,
        new_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_change_rejects_short_values() {
        let entry = BlockResponseEntry {
            index: 7,
            value: "ab".to_string(),
        };
        let error = decode_change(entry).unwrap_err();
        assert!(matches!(error, UpstreamRpcError::Malformed(_)));
    }

    #[test]
    fn decode_change_accepts_a_full_record() {
        let entry = BlockResponseEntry {
            index: 7,
            value: "ab".repeat(32),
        };
        let change = decode_change(entry).unwrap();
        assert_eq!(change.index, 7);
        assert_eq!(change.new_value, [0xabu8; 32]);
    }

    #[test]
    fn rejected_status_above_500_is_transient() {
        let error = UpstreamRpcError::Rejected { status: 503 };
        assert!(error.is_transient());
    }

    #[test]
    fn rejected_status_below_500_is_not_transient() {
        let error = UpstreamRpcError::Rejected { status: 404 };
        assert!(!error.is_transient());
    }
}
