use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::StoreError;
use crate::domain::market::{ListingFilter, MarketEntry, MarketListing, Page};
use crate::domain::player::Player;
use crate::domain::team::Team;

/// Transactional persistence for listings and transfers
///
/// Everything that must change together (listing, player, both team
/// ledgers, roster membership) goes through one `MarketTransaction`.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Open a read-modify-write transaction
    async fn begin(&self) -> Result<Box<dyn MarketTransaction>, StoreError>;

    /// Filtered, paged view of the market list ordered by listing time
    async fn list_listings(&self, filter: &ListingFilter) -> Result<Page<MarketEntry>, StoreError>;

    async fn find_listing(&self, player_id: Uuid) -> Result<Option<MarketListing>, StoreError>;
}

/// A unit of work against the market tables
///
/// `lock_*` reads hold the record exclusively (or are validated at commit)
/// until the transaction ends. Dropping a transaction without `commit`
/// discards every write made through it.
#[async_trait]
pub trait MarketTransaction: Send {
    async fn lock_player(&mut self, id: Uuid) -> Result<Option<Player>, StoreError>;

    async fn lock_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError>;

    async fn listing_for(&mut self, player_id: Uuid) -> Result<Option<MarketListing>, StoreError>;

    async fn insert_listing(&mut self, listing: &MarketListing) -> Result<(), StoreError>;

    /// Returns whether a listing was removed
    async fn delete_listing(&mut self, player_id: Uuid) -> Result<bool, StoreError>;

    async fn save_player(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Writes ledger and valuation fields
    async fn save_team(&mut self, team: &Team) -> Result<(), StoreError>;

    async fn insert_player(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Returns whether a player was removed
    async fn delete_player(&mut self, id: Uuid) -> Result<bool, StoreError>;

    /// Removes the team row; its roster and listings must already be gone
    async fn delete_team(&mut self, id: Uuid) -> Result<bool, StoreError>;

    /// Current roster of a team, including writes made in this transaction
    async fn roster(&mut self, team_id: Uuid) -> Result<Vec<Player>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
