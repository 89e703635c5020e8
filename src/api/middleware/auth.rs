use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::jwt::verify_token;
use crate::domain::account::Account;
use crate::domain::policy::Actor;

/// Account id taken from a verified bearer token
pub struct JwtAuth(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for JwtAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>")
        })?;

        let claims = verify_token(token, &state.jwt_secret)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(JwtAuth(claims.sub))
    }
}

/// The authenticated, still-active account behind the request
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(current: CurrentActor) -> Result<String, ApiError> {
///     Ok(format!("Hello {}", current.account.first_name))
/// }
/// ```
pub struct CurrentActor {
    pub account: Account,
}

impl CurrentActor {
    pub fn actor(&self) -> Actor {
        self.account.actor()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(account_id) = JwtAuth::from_request_parts(parts, state).await?;

        let account = state
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

        if !account.is_active {
            return Err(ApiError::unauthorized("Account is disabled"));
        }

        Ok(CurrentActor { account })
    }
}
