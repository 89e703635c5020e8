// Row decoding and error mapping shared by the PostgreSQL adapters

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row};

use crate::domain::account::{Account, Email};
use crate::domain::error::StoreError;
use crate::domain::market::MarketListing;
use crate::domain::player::{Player, Position};
use crate::domain::team::{Country, Team};

pub(crate) const ACCOUNT_COLUMNS: &str = "id, email, first_name, last_name, password_hash, \
     is_active, is_admin, login_attempt_count, last_login, created_at";

pub(crate) const TEAM_COLUMNS: &str = "id, owner_id, name, country, budget, value, created_at";

pub(crate) const PLAYER_COLUMNS: &str = "id, team_id, first_name, last_name, country, age, \
     position, market_value, asked_price, created_at";

/// Serialization failures, deadlocks and unique violations are all lost races
const CONFLICT_STATES: [&str; 3] = ["40001", "40P01", "23505"];

pub(crate) fn store_error(context: &str, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if let Some(code) = db.code() {
            let code: &str = &code;
            if CONFLICT_STATES.contains(&code) {
                return StoreError::Conflict(format!("{}: {}", context, db.message()));
            }
        }
    }
    StoreError::Backend(format!("{}: {}", context, e))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Corrupt(format!("column {}: {}", name, e)))
}

fn country(row: &PgRow) -> Result<Country, StoreError> {
    let code: String = column(row, "country")?;
    Country::new(code.trim()).map_err(StoreError::Corrupt)
}

pub(crate) fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let email: String = column(row, "email")?;
    Ok(Account {
        id: column(row, "id")?,
        email: Email::new(email).map_err(StoreError::Corrupt)?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        password_hash: column(row, "password_hash")?,
        is_active: column(row, "is_active")?,
        is_admin: column(row, "is_admin")?,
        login_attempt_count: column(row, "login_attempt_count")?,
        last_login: column(row, "last_login")?,
        created_at: column(row, "created_at")?,
    })
}

pub(crate) fn team_from_row(row: &PgRow) -> Result<Team, StoreError> {
    Ok(Team::from_persistence(
        column(row, "id")?,
        column(row, "owner_id")?,
        column(row, "name")?,
        country(row)?,
        column(row, "budget")?,
        column(row, "value")?,
        column(row, "created_at")?,
    ))
}

pub(crate) fn player_from_row(row: &PgRow) -> Result<Player, StoreError> {
    let position: String = column(row, "position")?;
    Ok(Player::from_persistence(
        column(row, "id")?,
        column(row, "team_id")?,
        column(row, "first_name")?,
        column(row, "last_name")?,
        country(row)?,
        column(row, "age")?,
        position.parse::<Position>().map_err(StoreError::Corrupt)?,
        column(row, "market_value")?,
        column(row, "asked_price")?,
        column(row, "created_at")?,
    ))
}

/// Expects the listing columns aliased as `listing_id`, `player_id`, `listed_at`
pub(crate) fn listing_from_row(row: &PgRow) -> Result<MarketListing, StoreError> {
    Ok(MarketListing::from_persistence(
        column(row, "listing_id")?,
        column(row, "player_id")?,
        column(row, "listed_at")?,
    ))
}

/// Escapes `LIKE` metacharacters so user input only ever matches literally
pub(crate) fn like_prefix(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_prefix_escapes_wildcards() {
        assert_eq!(like_prefix("Jo"), "Jo%");
        assert_eq!(like_prefix("50%_off"), "50\\%\\_off%");
        assert_eq!(like_prefix("a\\b"), "a\\\\b%");
    }

    #[test]
    fn non_database_errors_are_backend_failures() {
        let err = store_error("find player", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(msg) if msg.starts_with("find player")));
    }
}
