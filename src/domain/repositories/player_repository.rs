use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::StoreError;
use crate::domain::player::Player;

/// Read/edit access to players outside of transfers
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Player>, StoreError>;

    /// Roster of a team, oldest first
    async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Player>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Player>, StoreError>;

    /// Persist the client-editable fields (names, country)
    async fn update_profile(&self, player: &Player) -> Result<(), StoreError>;
}
