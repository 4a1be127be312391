use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::contract::models::ContractSpec;
use crate::errors::AppError;
use crate::state::AppState;

const NETWORK_NAME: &str = "Neo N3 TestNet";

#[derive(Debug, Serialize)]
pub struct NeoStatusResponse {
    pub network: String,
    pub block_height: u64,
    pub rpc_url: String,
}

/// The deployment is simulated; the payload is logged and echoed but not submitted.
#[derive(Debug, Default, Deserialize)]
pub struct SimulateDeployRequest {
    #[serde(default)]
    pub spec: Option<ContractSpec>,
    #[serde(default)]
    pub code: Option<String>,
}

impl SimulateDeployRequest {
    /// Name of the contract being deployed, if a spec was sent.
    fn contract_name(&self) -> Option<&str> {
        self.spec.as_ref().map(|spec| spec.metadata.name.as_str())
    }

    fn code_len(&self) -> usize {
        self.code.as_deref().map_or(0, str::len)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateDeployResponse {
    pub ok: bool,
    pub action: String,
    pub neo_response: Value,
}

/// GET /api/neo/status
pub async fn handle_neo_status(
    State(state): State<AppState>,
) -> Result<Json<NeoStatusResponse>, AppError> {
    let block_height = state.neo.get_block_count().await?;
    Ok(Json(NeoStatusResponse {
        network: NETWORK_NAME.to_string(),
        block_height,
        rpc_url: state.neo.url().to_string(),
    }))
}

/// POST /api/neo/simulate_deploy
///
/// Proves connectivity with a real RPC round-trip. RPC failures are reported in
/// the body with `ok: false` rather than as an HTTP error.
pub async fn handle_simulate_deploy(
    State(state): State<AppState>,
    Json(request): Json<SimulateDeployRequest>,
) -> Json<SimulateDeployResponse> {
    let contract = request.contract_name();
    info!(
        contract = contract.unwrap_or("<none>"),
        code_bytes = request.code_len(),
        "Simulating deploy"
    );

    let block_height = match state.neo.get_block_count().await {
        Ok(height) => height,
        Err(e) => {
            warn!("Simulated deploy failed: {e}");
            return Json(SimulateDeployResponse {
                ok: false,
                action: "simulate_deploy".to_string(),
                neo_response: json!({ "error": e.to_string(), "contract": contract }),
            });
        }
    };

    let version = match state.neo.get_version().await {
        Ok(version @ Value::Object(_)) => version,
        _ => json!({}),
    };

    Json(SimulateDeployResponse {
        ok: true,
        action: "simulated_deploy_via_blockcount".to_string(),
        neo_response: json!({
            "block_height": block_height,
            "version": version,
            "contract": contract,
            "message": "Successfully connected to Neo N3 TestNet",
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_summary() {
        let request: SimulateDeployRequest = serde_json::from_value(json!({
            "spec": {"id": "c1", "metadata": {"name": "Token"}},
            "code": "x = 1"
        }))
        .unwrap();
        assert_eq!(request.contract_name(), Some("Token"));
        assert_eq!(request.code_len(), 5);

        let empty = SimulateDeployRequest::default();
        assert_eq!(empty.contract_name(), None);
        assert_eq!(empty.code_len(), 0);
    }
}
