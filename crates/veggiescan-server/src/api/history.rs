use crate::api::pagination::PaginationParams;
use crate::api::{error_response, success_paginated_response, ApiError, PaginatedData};
use crate::auth::{current_user, Claims};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use utoipa_axum::{router::OpenApiRouter, routes};
use veggiescan_common::types::ScanRecord;

/// Scan history, newest first.
/// Administrators see every user's scans; everyone else sees their own.
#[utoipa::path(
    get,
    path = "/history",
    tag = "History",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated scan records", body = PaginatedData<ScanRecord>),
        (status = 401, description = "Unauthenticated", body = ApiError)
    )
)]
async fn history(
    Extension(trace_id): Extension<TraceId>,
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> impl IntoResponse {
    let user = match current_user(&state, &claims).await {
        Ok(user) => user,
        Err(e) => return e.into_response(&trace_id),
    };
    let owner = (!user.is_admin).then_some(user.id.as_str());
    let limit = pagination.limit();
    let offset = pagination.offset();

    let total = match state.store.count_scan_records(owner, None).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count scan records");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Failed to load scan history",
            );
        }
    };
    let items = match state.store.list_scan_records(owner, limit, offset).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list scan records");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Failed to load scan history",
            );
        }
    };
    success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
}

pub fn history_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(history))
}
