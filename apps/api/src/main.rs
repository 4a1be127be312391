mod agents;
mod config;
mod contract;
mod errors;
mod llm_client;
mod neo;
mod routes;
mod speech;
mod state;
mod storage;

use anyhow::Result;
use axum::http::HeaderValue;
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::agents::tasking::TaskingAgent;
use crate::config::{Config, StorageKind};
use crate::llm_client::LlmClient;
use crate::neo::NeoRpcClient;
use crate::routes::build_router;
use crate::speech::{SpeechToTextClient, ELEVENLABS_STT_URL};
use crate::state::AppState;
use crate::storage::backend::{MemoryBackend, ObjectBackend, S3Backend, UnavailableBackend};
use crate::storage::store::ConversationStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting NeoStudio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the conversation store
    let backend = build_backend(&config).await;
    let store = Arc::new(ConversationStore::new(backend, config.s3_bucket.clone()));
    info!("Conversation store initialized (bucket: {})", store.bucket());

    // Initialize LLM client and agents
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let agent = TaskingAgent::new(Arc::new(llm));

    let neo = NeoRpcClient::new(config.neo_rpc_url.clone());
    info!("Neo RPC endpoint: {}", neo.url());

    if config.elevenlabs_api_key.is_none() {
        warn!("ELEVENLABS_API_KEY not set; speech-to-text requests will fail");
    }
    let speech = SpeechToTextClient::new(
        config.elevenlabs_api_key.clone(),
        ELEVENLABS_STT_URL.to_string(),
    );

    // Build app state
    let state = AppState {
        store,
        agent,
        neo,
        speech,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config.cors_origins));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Picks the object backend. An S3 backend without endpoint or credentials degrades
/// to one that fails every call, so the API still starts and reads come back empty.
async fn build_backend(config: &Config) -> Arc<dyn ObjectBackend> {
    match config.storage_backend {
        StorageKind::S3 => match config.s3_settings() {
            Some(settings) => Arc::new(S3Backend::connect(&settings).await),
            None => {
                warn!(
                    "S3 storage selected but S3_ENDPOINT, AWS_ACCESS_KEY_ID or \
                     AWS_SECRET_ACCESS_KEY is missing; conversations will not be persisted"
                );
                Arc::new(UnavailableBackend)
            }
        },
        StorageKind::Memory => {
            warn!("Using in-memory storage; conversations are lost on restart");
            Arc::new(MemoryBackend::new())
        }
        StorageKind::None => {
            info!("Storage disabled; conversations will not be persisted");
            Arc::new(UnavailableBackend)
        }
    }
}

/// CORS for the configured origins, with credentials. Unparseable origins are skipped.
fn build_cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
