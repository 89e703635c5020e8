use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::jwt::create_token;
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::domain::account::{Account, Email};
use crate::domain::error::StoreError;

/// Request body for account registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub account_id: Uuid,
    pub message: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response from successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account_id: Uuid,
    pub team_id: Option<Uuid>,
}

/// Register a new account
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = Email::new(&req.email).map_err(ApiError::bad_request)?;
    validate_password(&req.password).map_err(ApiError::bad_request)?;

    let password_hash = hash_password(&req.password, state.bcrypt_cost)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to hash password: {}", e)))?;

    let account = Account::register(email, req.first_name, req.last_name, password_hash)
        .map_err(ApiError::bad_request)?;

    let account_id = state.accounts.create(&account).await.map_err(|e| match e {
        StoreError::Conflict(_) => ApiError::bad_request("Email already registered"),
        other => ApiError::from(other),
    })?;

    info!(account_id = %account_id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account_id,
            message: "Account registered successfully".to_string(),
        }),
    ))
}

/// Login with email and password
///
/// A wrong password counts towards the lockout allowance. The first
/// successful login provisions the account's team.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = Email::new(&req.email).map_err(ApiError::bad_request)?;

    let mut account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    account
        .ensure_active()
        .map_err(|rejection| ApiError::unauthorized(rejection.message()))?;

    let valid = verify_password(&req.password, &account.password_hash).map_err(|e| {
        ApiError::internal_server_error(format!("Password verification failed: {}", e))
    })?;

    if !valid {
        let rejection = account.record_failed_login();
        state.accounts.save(&account).await?;
        warn!(
            account_id = %account.id,
            attempts = account.login_attempt_count,
            active = account.is_active,
            "Failed login"
        );
        return Err(ApiError::unauthorized(rejection.message()));
    }

    let events = account.record_successful_login();
    state.accounts.save(&account).await?;

    let mut team_id = None;
    for event in &events {
        let team = state.provisioning.handle(event).await?;
        team_id = Some(team.id());
    }

    let token = create_token(account.id, &state.jwt_secret)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        account_id: account.id,
        team_id,
    }))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
