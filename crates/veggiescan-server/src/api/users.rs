use crate::api::{success_response, ApiError};
use crate::auth::{current_user, Claims};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use utoipa_axum::{router::OpenApiRouter, routes};
use veggiescan_common::types::User;

/// Profile of the authenticated user. The password hash is never returned.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthenticated", body = ApiError)
    )
)]
async fn me(
    Extension(trace_id): Extension<TraceId>,
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match current_user(&state, &claims).await {
        Ok(user) => success_response(StatusCode::OK, &trace_id, user),
        Err(e) => e.into_response(&trace_id),
    }
}

pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(me))
}
