//! Thin HTTP surface over the hub: one endpoint to think, one to reflect,
//! one to check liveness.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use noesis_core::{CycleId, Error};
use noesis_hub::Hub;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/think", post(think_handler))
        .route("/reflect", post(reflect_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(hub)
}

pub async fn serve(hub: Arc<Hub>, port: u16) -> anyhow::Result<()> {
    let app = router(hub);
    let bind_addr = format!("0.0.0.0:{}", port);
    info!("Noesis gateway listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct ThinkRequest {
    input: String,
}

#[derive(Serialize)]
struct ThinkResponse {
    response: String,
    thoughts: Vec<noesis_core::AgentThought>,
    diagnostics: String,
    cycle_id: Option<String>,
}

#[derive(Deserialize, Default)]
struct ReflectRequest {
    /// Cycle to reflect on; the most recent record when omitted.
    cycle_id: Option<Uuid>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

async fn think_handler(
    State(hub): State<Arc<Hub>>,
    Json(request): Json<ThinkRequest>,
) -> impl IntoResponse {
    match hub.run_cycle(&request.input).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ThinkResponse {
                response: outcome.response,
                thoughts: outcome.thoughts,
                diagnostics: outcome.diagnostics,
                cycle_id: outcome.cycle_id.map(|id| id.to_string()),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn reflect_handler(
    State(hub): State<Arc<Hub>>,
    body: Option<Json<ReflectRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let target = match request.cycle_id {
        Some(id) => Some(id),
        None => hub.store().latest_id().await,
    };
    let Some(target) = target else {
        return error_response(Error::TraceNotFound("store is empty".to_string()));
    };

    match hub.reflector().reflect(&CycleId::from(target)).await {
        Ok(reflection) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "cycle_id": target.to_string(),
                "insight": reflection.insight,
                "behavioral_adjustment": reflection.behavioral_adjustment,
                "tags": reflection.tags,
                "key_points": reflection.key_points,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn error_response(error: Error) -> axum::response::Response {
    let status = match &error {
        Error::TraceNotFound(_) => StatusCode::NOT_FOUND,
        Error::ReflectionParse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Generation(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
        .into_response()
}
