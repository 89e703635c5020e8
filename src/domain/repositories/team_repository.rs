use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::StoreError;
use crate::domain::player::Player;
use crate::domain::team::Team;

/// Repository trait for Team aggregate
///
/// Budget and value are written only through `MarketStore` transactions;
/// this repository never overwrites them.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Find a team by its ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, StoreError>;

    /// Find the team owned by an account
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Team>, StoreError>;

    /// Every team, oldest first
    async fn list_all(&self) -> Result<Vec<Team>, StoreError>;

    /// Insert a team together with its initial roster, atomically
    ///
    /// Fails with `StoreError::Conflict` if the owner already has a team.
    async fn create_with_roster(&self, team: &Team, roster: &[Player]) -> Result<(), StoreError>;

    /// Persist the client-editable fields (name, country)
    async fn update_profile(&self, team: &Team) -> Result<(), StoreError>;
}
