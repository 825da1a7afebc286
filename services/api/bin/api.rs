//! Main Entrypoint for the Kaiwa API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Initializing shared collaborator clients (reply generation, voice API).
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use kaiwa_api::{
    classify::NumberMatchClassifier,
    config::Config,
    guard::GuardRegistry,
    router::create_router,
    state::AppState,
};
use kaiwa_core::{
    llm_client::{OpenAICompatibleClient, OpenAIConfig, ReplyGenerator},
    voice::{VoiceApi, VonageVoiceClient},
};
use std::{fs, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Collaborators ---
    let openai_config = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());
    let responder: Arc<dyn ReplyGenerator> = Arc::new(OpenAICompatibleClient::new(
        openai_config,
        config.chat_model.clone(),
        config.reply_system_prompt.clone(),
    ));

    let private_key = fs::read(&config.vonage_private_key_path).with_context(|| {
        format!(
            "Failed to read voice API private key from {}",
            config.vonage_private_key_path.display()
        )
    })?;
    let mut voice_client =
        VonageVoiceClient::new(config.vonage_application_id.clone(), &private_key)
            .context("Failed to initialize voice API client")?;
    if let Some(api_url) = &config.vonage_api_url {
        voice_client = voice_client.with_api_url(api_url.clone());
    }
    let voice: Arc<dyn VoiceApi> = Arc::new(voice_client);

    let classifier = Arc::new(NumberMatchClassifier::from_config(&config));

    let app_state = Arc::new(AppState {
        config: Arc::new(config.clone()),
        responder,
        voice,
        classifier,
        guards: GuardRegistry::new(),
        conversation_name: format!("kaiwa-{}", Uuid::new_v4()),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        model = %config.chat_model,
        recognizer = %config.recognizer_url,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
