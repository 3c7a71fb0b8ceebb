pub mod credentials;
pub mod health;
pub mod openapi;
pub mod scan;
pub mod schemas;
pub mod techniques;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use reclaim_gateway::{CredentialStore, Sweeper};
use reclaim_optimizer::IdentityVerifier;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use self::openapi::ApiDoc;

/// Shared state handed to every handler.
///
/// `credentials` is the same store the sweeper loads from; the credential
/// endpoints write to it.
#[derive(Clone)]
pub struct AppState {
    pub sweeper: Arc<Sweeper>,
    pub credentials: Arc<dyn CredentialStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

/// Build the HTTP router. All endpoints live under `/api`; the OpenAPI
/// document and Swagger UI are served alongside.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route("/techniques", get(techniques::list_techniques))
        .route("/analyze/{technique}", post(scan::analyze))
        .route("/optimize/{technique}", post(scan::optimize))
        .route("/credentials/validate", post(credentials::validate))
        .route("/credentials/check", get(credentials::check))
        .route("/credentials/clear", post(credentials::clear));

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
