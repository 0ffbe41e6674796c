use axum::extract::multipart::MultipartRejection;
use axum::extract::{Extension, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use veggiescan_common::types::ScanResult;

use crate::api::{success_response, ApiError};
use crate::auth::{current_user, Claims};
use crate::error::AppError;
use crate::logging::TraceId;
use crate::state::AppState;

/// Multipart form accepted by `POST /scan`
#[derive(ToSchema)]
#[allow(dead_code)]
struct ScanUpload {
    /// Photo of a single vegetable
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

/// Pull the `image` field out of the form. Other fields are ignored.
async fn read_image(multipart: Result<Multipart, MultipartRejection>) -> Result<Vec<u8>, AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::InvalidInput(format!("Invalid upload: {e}")))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Could not read image: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::InvalidInput("Uploaded image is empty".to_string()));
        }
        return Ok(bytes.to_vec());
    }
    Err(AppError::InvalidInput("No image uploaded".to_string()))
}

async fn scan_for_user(
    state: &AppState,
    claims: &Claims,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ScanResult, AppError> {
    let user = current_user(state, claims).await?;
    let image = read_image(multipart).await?;
    let outcome = state.pipeline.run(&user, &image).await?;
    Ok(outcome.result)
}

/// Analyze an uploaded vegetable photo.
///
/// Identical bytes are answered from the scan history (confidence 90). When
/// the vision model is unreachable or unconfigured a deterministic fallback
/// verdict is returned instead of an error.
#[utoipa::path(
    post,
    path = "/scan",
    tag = "Scan",
    security(("bearer_auth" = [])),
    request_body(content = ScanUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Scan result", body = ScanResult),
        (status = 400, description = "Missing or empty image", body = ApiError),
        (status = 401, description = "Unauthenticated", body = ApiError),
        (status = 500, description = "Error processing image", body = ApiError)
    )
)]
async fn scan_image(
    Extension(trace_id): Extension<TraceId>,
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    match scan_for_user(&state, &claims, multipart).await {
        Ok(result) => success_response(StatusCode::OK, &trace_id, result),
        Err(e) => e.into_response(&trace_id),
    }
}

pub fn scan_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(scan_image))
}
