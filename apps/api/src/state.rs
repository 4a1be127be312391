use std::sync::Arc;

use crate::agents::tasking::TaskingAgent;
use crate::config::Config;
use crate::neo::NeoRpcClient;
use crate::speech::SpeechToTextClient;
use crate::storage::store::ConversationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConversationStore>,
    /// Orchestrator; also owns the coding agent. Both run on the shared `Generator`.
    pub agent: TaskingAgent,
    pub neo: NeoRpcClient,
    pub speech: SpeechToTextClient,
    pub config: Config,
}
