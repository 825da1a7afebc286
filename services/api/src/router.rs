//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application: the
//! voice API's webhook endpoints, the call-audio WebSocket endpoint, and the
//! OpenAPI documentation.

use crate::{
    handlers,
    models::{AnswerPayload, CallEventPayload, ErrorResponse},
    state::AppState,
    ws::ws_handler,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::answer,
        handlers::answer_bot_event,
        handlers::call_event,
    ),
    components(
        schemas(AnswerPayload, CallEventPayload, ErrorResponse)
    ),
    tags(
        (name = "Kaiwa API", description = "Webhook and call-audio surface of the Kaiwa answering service")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
///
/// The webhook routes are called by the voice API and carry no
/// authentication of their own; they are expected to be reachable only
/// through the platform's configured callback URLs.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/answer", post(handlers::answer))
        .route("/answer-bot/event", post(handlers::answer_bot_event))
        .route("/event", post(handlers::call_event))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        // Apply the state ONLY to this group of routes.
        .with_state(app_state);

    // Merge the stateful routes with the stateless Swagger UI routes.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
