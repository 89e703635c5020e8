use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the persistence collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A concurrent write invalidated this transaction; safe to retry
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    /// Stored data could not be mapped back onto a domain type
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Errors surfaced by the market core (catalog, transfer engine, provisioning)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("Player {0} is not on the market list")]
    NotListed(Uuid),

    #[error("Player {0} is already on the market list")]
    AlreadyListed(Uuid),

    #[error("Team cannot buy a player it already owns")]
    SelfPurchase,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Team {team_id} doesn't have budget to buy this player")]
    InsufficientFunds { team_id: Uuid },

    #[error("Account {0} doesn't have a team")]
    NoTeamForActor(Uuid),

    #[error("Transfer lost a concurrent race: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl MarketError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => MarketError::Conflict(message),
            other => MarketError::Storage(other.to_string()),
        }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
