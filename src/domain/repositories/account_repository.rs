use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::account::{Account, Email};
use crate::domain::error::StoreError;

/// Repository trait for the Account aggregate
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create a new account; `StoreError::Conflict` if the email is taken
    async fn create(&self, account: &Account) -> Result<Uuid, StoreError>;

    /// Find an account by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Find an account by email address
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError>;

    /// Persist login bookkeeping and activation flags
    async fn save(&self, account: &Account) -> Result<(), StoreError>;
}
