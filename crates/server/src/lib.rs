pub mod config;
pub mod directory;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dossier Engine API",
        version = "0.1.0",
        description = "Research orchestration engine: company dossiers over WebSocket, \
                       static company data and dossier chat over REST"
    ),
    paths(
        routes::health::health_check,
        routes::company::get_company_data,
        routes::chat::chat_dossier,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::company::CompanyDataRequest,
        routes::chat::ChatRequest,
        routes::chat::ChatResponse,
        dossier_core::CompanyRecord,
        dossier_core::FundingRound,
    )),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "company", description = "Static company-data lookup"),
        (name = "chat", description = "Question answering over a composed dossier"),
    )
)]
pub struct ApiDoc;

/// Build the application router. The WebSocket route at `/ws` carries
/// the research sessions; everything else is auxiliary REST surface.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/company", post(routes::company::get_company_data))
        .route("/api/chat", post(routes::chat::chat_dossier))
        .route("/ws", get(routes::ws::websocket_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
