//! Axum route handlers for contract generation and chat.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agents::coding::CodeAnalysis;
use crate::contract::models::{ContractLanguage, ContractSpec};
use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::models::ConversationUpdate;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSpecRequest {
    pub user_prompt: String,
    #[serde(default)]
    pub existing_spec: Option<ContractSpec>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSpecResponse {
    pub spec: ContractSpec,
    /// Raw generator output, shown to the user as the agent's reply.
    pub agent_message: String,
}

#[derive(Debug, Deserialize)]
pub struct ContractCodeRequest {
    pub spec: ContractSpec,
}

#[derive(Debug, Serialize)]
pub struct ContractCodeResponse {
    pub code: String,
    pub language: ContractLanguage,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeCodeRequest {
    pub code: String,
    #[serde(default)]
    pub language: ContractLanguage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub existing_spec: Option<ContractSpec>,
    #[serde(default)]
    pub existing_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub agent_message: String,
    pub spec: Option<ContractSpec>,
    pub code: Option<String>,
    pub language: ContractLanguage,
    /// Id the exchange was saved under, when it was saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyGenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyGenerateResponse {
    pub status: String,
    pub contract_code: String,
    pub contract_hash: Option<String>,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/contract/spec
pub async fn handle_contract_spec(
    State(state): State<AppState>,
    Json(request): Json<ContractSpecRequest>,
) -> Result<Json<ContractSpecResponse>, AppError> {
    require_text(&request.user_prompt, "userPrompt")?;

    let draft = state
        .agent
        .generate_spec(&request.user_prompt, request.existing_spec.as_ref())
        .await?;

    Ok(Json(ContractSpecResponse {
        spec: draft.spec,
        agent_message: draft.raw_response,
    }))
}

/// POST /api/contract/code
///
/// Generates code in the language recorded on the spec.
pub async fn handle_contract_code(
    State(state): State<AppState>,
    Json(request): Json<ContractCodeRequest>,
) -> Result<Json<ContractCodeResponse>, AppError> {
    let language = request.spec.language;
    let code = state
        .agent
        .coding()
        .generate_code(&request.spec, language)
        .await?;
    Ok(Json(ContractCodeResponse { code, language }))
}

/// POST /api/contract/analyze
pub async fn handle_analyze_code(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeCodeRequest>,
) -> Result<Json<CodeAnalysis>, AppError> {
    require_text(&request.code, "code")?;
    let analysis = state
        .agent
        .coding()
        .analyze_code(&request.code, request.language)
        .await?;
    Ok(Json(analysis))
}

/// POST /api/chat/message
///
/// Runs the tasking agent, then saves spec, code and language onto the conversation
/// when a conversation id was given or a spec exists. Saving is best-effort and never
/// fails the response.
pub async fn handle_chat_message(
    State(state): State<AppState>,
    Json(request): Json<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, AppError> {
    require_text(&request.message, "message")?;

    let outcome = state
        .agent
        .process_message(&request.message, request.existing_spec, request.existing_code)
        .await?;

    let mut conversation_id = None;
    if request.conversation_id.is_some() || outcome.spec.is_some() {
        let saved = state
            .store
            .save(ConversationUpdate {
                id: request.conversation_id,
                title: outcome.spec.as_ref().map(|spec| spec.metadata.name.clone()),
                messages: None,
                spec: outcome.spec.clone(),
                code: outcome.code.clone(),
                language: Some(outcome.language),
            })
            .await;
        if saved.persisted {
            info!(
                "Chat exchange recorded on conversation {}",
                saved.conversation.id
            );
            conversation_id = Some(saved.conversation.id);
        } else {
            warn!("Chat exchange was not persisted");
        }
    }

    Ok(Json(ChatMessageResponse {
        agent_message: outcome.agent_message,
        spec: outcome.spec,
        code: outcome.code,
        language: outcome.language,
        conversation_id,
    }))
}

/// POST /generate-contract
///
/// Legacy single-shot endpoint: spec, then code, from one prompt.
pub async fn handle_generate_contract(
    State(state): State<AppState>,
    Json(request): Json<LegacyGenerateRequest>,
) -> Result<Json<LegacyGenerateResponse>, AppError> {
    require_text(&request.prompt, "prompt")?;

    let draft = state.agent.generate_spec(&request.prompt, None).await?;
    let contract_code = state
        .agent
        .coding()
        .generate_code(&draft.spec, draft.spec.language)
        .await?;

    Ok(Json(LegacyGenerateResponse {
        status: "success".to_string(),
        contract_code,
        contract_hash: None,
        message: "Contract generated successfully".to_string(),
    }))
}

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
