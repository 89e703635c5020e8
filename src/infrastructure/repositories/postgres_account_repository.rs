use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::rows::{account_from_row, store_error, ACCOUNT_COLUMNS};
use crate::domain::account::{Account, Email};
use crate::domain::error::StoreError;
use crate::domain::repositories::AccountRepository;

/// PostgreSQL implementation of AccountRepository
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: &Account) -> Result<Uuid, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, first_name, last_name, password_hash,
                is_active, is_admin, login_attempt_count, last_login, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.id)
        .bind(account.email.as_str())
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.password_hash)
        .bind(account.is_active)
        .bind(account.is_admin)
        .bind(account.login_attempt_count)
        .bind(account.last_login)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to create account", e))?;

        Ok(account.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find account by id", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find account by email", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                first_name = $2,
                last_name = $3,
                password_hash = $4,
                is_active = $5,
                is_admin = $6,
                login_attempt_count = $7,
                last_login = $8
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.password_hash)
        .bind(account.is_active)
        .bind(account.is_admin)
        .bind(account.login_attempt_count)
        .bind(account.last_login)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to save account", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!(
                "account not found: {}",
                account.id
            )));
        }
        Ok(())
    }
}
