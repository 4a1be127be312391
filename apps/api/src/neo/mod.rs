//! Neo N3 JSON-RPC client and the blockchain status endpoints.

pub mod handlers;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const RPC_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("connection error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("node returned error: {0}")]
    Rpc(Value),
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: &'a [Value],
    id: u32,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Clone)]
pub struct NeoRpcClient {
    client: Client,
    url: String,
}

impl NeoRpcClient {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(RPC_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one JSON-RPC 2.0 call. A missing `result` reads as an empty object.
    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(RpcError::Rpc(error));
        }
        debug!("Neo RPC {method} succeeded");
        Ok(response
            .result
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    /// Current block height. Accepts a bare integer or a `{count}` object.
    pub async fn get_block_count(&self) -> Result<u64, RpcError> {
        let result = self.call("getblockcount", &[]).await?;
        Ok(block_height_of(&result))
    }

    pub async fn get_version(&self) -> Result<Value, RpcError> {
        self.call("getversion", &[]).await
    }
}

fn block_height_of(result: &Value) -> u64 {
    result
        .as_u64()
        .or_else(|| result.get("count").and_then(Value::as_u64))
        .unwrap_or(0)
}
