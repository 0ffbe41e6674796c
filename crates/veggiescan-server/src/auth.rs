use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use veggiescan_common::types::{AuthResponse, LoginRequest, RegisterRequest, User};
use veggiescan_storage::auth::{hash_password, verify_password};
use veggiescan_storage::{StorageError, VeggieStore};

use crate::api::{error_response, success_response, ApiError};
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::logging::TraceId;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
}

pub fn create_token(
    secret: &str,
    user_id: &str,
    email: &str,
    expire_secs: u64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + expire_secs,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn validate_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Bearer token check for protected routes. Valid claims are placed in the
/// request extensions.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let trace_id = req
        .extensions()
        .get::<TraceId>()
        .map(|t| t.0.clone())
        .unwrap_or_default();

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if !token.is_empty() => token,
        Some(_) | None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                &trace_id,
                "unauthorized",
                "Could not validate credentials",
            );
        }
    };

    match validate_token(&state.jwt_secret, token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature) => {
            error_response(
                StatusCode::UNAUTHORIZED,
                &trace_id,
                "token_expired",
                "Token expired",
            )
        }
        Err(_) => error_response(
            StatusCode::UNAUTHORIZED,
            &trace_id,
            "unauthorized",
            "Could not validate credentials",
        ),
    }
}

/// Resolve the token subject to a stored user.
pub async fn current_user(state: &AppState, claims: &Claims) -> Result<User, AppError> {
    match state.store.get_user_by_id(&claims.sub).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AppError::Unauthenticated(
            "Could not validate credentials".to_string(),
        )),
        Err(e) => Err(AppError::Internal(format!("Failed to load user: {e}"))),
    }
}

pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin privileges required".to_string()))
    }
}

/// Seed the configured administrator when the users table is empty.
/// Returns whether an account was created.
pub async fn ensure_default_admin(store: &VeggieStore, auth: &AuthConfig) -> anyhow::Result<bool> {
    let count = store.count_users().await?;
    if count > 0 {
        tracing::info!(
            count,
            "Users table already has accounts, skipping default admin creation"
        );
        return Ok(false);
    }
    let password_hash = hash_password(&auth.default_admin_password)?;
    store
        .create_user(
            &auth.default_admin_email,
            &auth.default_admin_username,
            &password_hash,
            true,
        )
        .await?;
    tracing::info!(
        email = %auth.default_admin_email,
        "Created default admin account"
    );
    Ok(true)
}

fn issue_token(state: &AppState, user: &User) -> Result<AuthResponse, AppError> {
    let token = create_token(
        &state.jwt_secret,
        &user.id,
        &user.email,
        state.token_expire_secs,
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {e}")))?;
    Ok(AuthResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user_id: user.id.clone(),
    })
}

async fn register_user(state: &AppState, req: RegisterRequest) -> Result<AuthResponse, AppError> {
    let email = req.email.trim();
    let username = req.username.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput("A valid email is required".to_string()));
    }
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "username and password are required".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    // Self-service accounts are never administrators
    let user = match state
        .store
        .create_user(email, username, &password_hash, false)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            if let Some(StorageError::Conflict { .. }) = e.downcast_ref::<StorageError>() {
                return Err(AppError::InvalidInput("Email already registered".to_string()));
            }
            return Err(AppError::Internal(format!("Failed to create user: {e}")));
        }
    };
    tracing::info!(user_id = %user.id, "Registered user");
    issue_token(state, &user)
}

async fn login_user(state: &AppState, req: LoginRequest) -> Result<AuthResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "email and password are required".to_string(),
        ));
    }
    let invalid = || AppError::Unauthenticated("Incorrect email or password".to_string());

    let user = state
        .store
        .get_user_by_email(req.email.trim())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to query user: {e}")))?
        .ok_or_else(invalid)?;

    match verify_password(&req.password, &user.password_hash) {
        Ok(true) => issue_token(state, &user),
        _ => Err(invalid()),
    }
}

/// Create an account and return a bearer token for it.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered", body = ApiError)
    )
)]
pub async fn register(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    match register_user(&state, req).await {
        Ok(auth) => success_response(StatusCode::OK, &trace_id, auth),
        Err(e) => e.into_response(&trace_id),
    }
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields", body = ApiError),
        (status = 401, description = "Incorrect email or password", body = ApiError)
    )
)]
pub async fn login(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    match login_user(&state, req).await {
        Ok(auth) => success_response(StatusCode::OK, &trace_id, auth),
        Err(e) => e.into_response(&trace_id),
    }
}
