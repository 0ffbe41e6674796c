use crate::api::{error_response, success_response, ApiError};
use crate::auth::{current_user, Claims};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use veggiescan_common::types::{ScanRecord, User};
use veggiescan_storage::VeggieStore;

const RECENT_SCANS: usize = 5;

/// Scan counters and the latest scans
#[derive(Serialize, ToSchema)]
struct DashboardStats {
    /// Scans judged safe to eat
    total_good: u64,
    /// Scans judged unsafe
    total_bad: u64,
    total_scans: u64,
    /// Registered users (1 for non-admins)
    total_users: u64,
    recent_scans: Vec<ScanRecord>,
}

async fn collect_stats(store: &VeggieStore, user: &User) -> anyhow::Result<DashboardStats> {
    let owner = (!user.is_admin).then_some(user.id.as_str());
    let total_good = store.count_scan_records(owner, Some(true)).await?;
    let total_bad = store.count_scan_records(owner, Some(false)).await?;
    let total_users = if user.is_admin {
        store.count_users().await?
    } else {
        1
    };
    let recent_scans = store.list_scan_records(owner, RECENT_SCANS, 0).await?;
    Ok(DashboardStats {
        total_good,
        total_bad,
        total_scans: total_good + total_bad,
        total_users,
        recent_scans,
    })
}

/// Dashboard overview. Administrators get system-wide numbers.
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Unauthenticated", body = ApiError)
    )
)]
async fn dashboard(
    Extension(trace_id): Extension<TraceId>,
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Response {
    let user = match current_user(&state, &claims).await {
        Ok(user) => user,
        Err(e) => return e.into_response(&trace_id),
    };
    match collect_stats(&state.store, &user).await {
        Ok(stats) => success_response(StatusCode::OK, &trace_id, stats),
        Err(e) => {
            tracing::error!(error = %e, "Failed to collect dashboard stats");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Failed to load dashboard",
            )
        }
    }
}

pub fn dashboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(dashboard))
}
