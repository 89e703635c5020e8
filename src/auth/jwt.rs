// JWT access tokens for authenticated accounts
// HS256, 8-hour expiry, subject is the account id

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_TTL_HOURS: i64 = 8;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account ID (subject)
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch)
    pub iat: usize,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
}

/// Issues an access token for an account
///
/// # Example
/// ```
/// use transfer_market_api::auth::jwt::{create_token, verify_token};
/// use uuid::Uuid;
///
/// let account_id = Uuid::new_v4();
/// let token = create_token(account_id, "secret").expect("valid token");
/// assert_eq!(verify_token(&token, "secret").unwrap().sub, account_id);
/// ```
pub fn create_token(account_id: Uuid, secret: &str) -> Result<String, String> {
    let now = Utc::now();
    let claims = Claims {
        sub: account_id,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies signature and expiry, returning the decoded claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
