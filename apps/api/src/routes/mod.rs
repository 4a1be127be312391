pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::agents::handlers as agents;
use crate::neo::handlers as neo;
use crate::speech::handlers as speech;
use crate::state::AppState;
use crate::storage::handlers as conversations;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Conversations
        .route(
            "/api/conversations",
            get(conversations::handle_list_conversations)
                .post(conversations::handle_save_conversation),
        )
        .route(
            "/api/conversations/:id",
            get(conversations::handle_get_conversation)
                .delete(conversations::handle_delete_conversation),
        )
        // Contract generation
        .route("/api/contract/spec", post(agents::handle_contract_spec))
        .route("/api/contract/code", post(agents::handle_contract_code))
        .route("/api/contract/analyze", post(agents::handle_analyze_code))
        .route("/api/chat/message", post(agents::handle_chat_message))
        .route("/generate-contract", post(agents::handle_generate_contract))
        // Neo N3
        .route("/api/neo/status", get(neo::handle_neo_status))
        .route(
            "/api/neo/simulate_deploy",
            post(neo::handle_simulate_deploy),
        )
        // Speech
        .route("/api/speech-to-text", post(speech::handle_speech_to_text))
        .with_state(state)
}
