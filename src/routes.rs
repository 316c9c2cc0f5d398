use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::translate::{HealthResponse, TranslateRequest, TranslateResponse};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/translate", post(translate))
}

/// Full application: routes, HTTP layers and state
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.gateway.model_id().to_string(),
    })
}

// The body is taken as raw bytes so that a missing or malformed body maps to
// our own 400 message; a body axum cannot buffer (e.g. over the size limit)
// keeps axum's status but still gets a JSON error.
async fn translate(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let body = body?;
    let request = TranslateRequest::from_body(&body)?;
    debug!(
        "Translate request: {} -> {} ({} chars)",
        request.source_lang,
        request.target_lang,
        request.text.chars().count()
    );

    let translation = state.gateway.clone().translate_detached(request).await?;
    Ok(Json(translation.into()))
}
