use crate::api::{success_response, ApiError};
use crate::auth::{current_user, require_admin, Claims};
use crate::error::AppError;
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Component status for administrators
#[derive(Serialize, ToSchema)]
struct SystemStatus {
    /// `mock`, `online` or `offline`
    ai_status: String,
    /// Always `online` when this endpoint answers
    api_status: String,
    /// `online` or `offline`
    database_status: String,
}

/// `mock` when no model is configured, otherwise the result of a probe
/// against the model endpoint.
pub(crate) async fn ai_status(state: &AppState) -> &'static str {
    match &state.analyzer {
        None => "mock",
        Some(analyzer) => match analyzer.health_check().await {
            Ok(()) => "online",
            Err(e) => {
                tracing::warn!(provider = %analyzer.provider(), error = %e, "Vision model health check failed");
                "offline"
            }
        },
    }
}

async fn collect_status(state: &AppState, claims: &Claims) -> Result<SystemStatus, AppError> {
    let user = current_user(state, claims).await?;
    require_admin(&user)?;

    let database_status = match state.store.ping().await {
        Ok(()) => "online",
        Err(e) => {
            tracing::error!(error = %e, "Database ping failed");
            "offline"
        }
    };
    Ok(SystemStatus {
        ai_status: ai_status(state).await.to_string(),
        api_status: "online".to_string(),
        database_status: database_status.to_string(),
    })
}

/// Status of the vision model, the API and the database. Admin only.
#[utoipa::path(
    get,
    path = "/admin/system-status",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Component status", body = SystemStatus),
        (status = 401, description = "Unauthenticated", body = ApiError),
        (status = 403, description = "Not an administrator", body = ApiError)
    )
)]
async fn system_status(
    Extension(trace_id): Extension<TraceId>,
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match collect_status(&state, &claims).await {
        Ok(status) => success_response(StatusCode::OK, &trace_id, status),
        Err(e) => e.into_response(&trace_id),
    }
}

pub fn system_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(system_status))
}
