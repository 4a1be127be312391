use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::models::{Conversation, ConversationSummary, ConversationUpdate};

#[derive(Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Serialize)]
pub struct ConversationResponse {
    pub conversation: Conversation,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// GET /api/conversations
pub async fn handle_list_conversations(
    State(state): State<AppState>,
) -> Json<ConversationListResponse> {
    Json(ConversationListResponse {
        conversations: state.store.list().await,
    })
}

/// GET /api/conversations/:id
pub async fn handle_get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, AppError> {
    let conversation = state
        .store
        .load(&id)
        .await
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;
    Ok(Json(ConversationResponse { conversation }))
}

/// POST /api/conversations
pub async fn handle_save_conversation(
    State(state): State<AppState>,
    Json(update): Json<ConversationUpdate>,
) -> Json<ConversationResponse> {
    let conversation = state.store.create_or_update(update).await;
    Json(ConversationResponse { conversation })
}

/// DELETE /api/conversations/:id
pub async fn handle_delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    if !state.store.delete(&id).await {
        return Err(AppError::NotFound(
            "Conversation not found or failed to delete".to_string(),
        ));
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: "Conversation deleted successfully".to_string(),
    }))
}
