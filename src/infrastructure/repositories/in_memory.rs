use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::account::{Account, Email};
use crate::domain::error::StoreError;
use crate::domain::market::{ListingFilter, MarketEntry, MarketListing, Page};
use crate::domain::player::Player;
use crate::domain::repositories::{
    AccountRepository, MarketStore, MarketTransaction, PlayerRepository, TeamRepository,
};
use crate::domain::team::Team;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RecordKey {
    Player(Uuid),
    Team(Uuid),
    /// Keyed by player id: there is at most one listing per player
    Listing(Uuid),
}

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    teams: HashMap<Uuid, Team>,
    players: HashMap<Uuid, Player>,
    listings: HashMap<Uuid, MarketListing>,
    /// Bumped on every write, deletes included; absent means never written
    versions: HashMap<RecordKey, u64>,
}

impl Tables {
    fn version(&self, key: RecordKey) -> u64 {
        self.versions.get(&key).copied().unwrap_or(0)
    }

    fn bump(&mut self, key: RecordKey) {
        *self.versions.entry(key).or_insert(0) += 1;
    }

    fn team_name(&self, team_id: Uuid) -> String {
        self.teams
            .get(&team_id)
            .map(|t| t.name().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct FaultInjection {
    conflicts: AtomicU32,
    failures: AtomicU32,
    rollbacks: AtomicU32,
}

impl FaultInjection {
    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Process-local storage implementing every repository port
///
/// Transactions are optimistic: they read through to the shared tables,
/// buffer their writes, and at commit verify that no record they read has
/// been written since. A stale read fails the commit with
/// `StoreError::Conflict` and nothing is applied.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<FaultInjection>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` commits fail with a retryable conflict
    pub fn inject_conflicts(&self, n: u32) {
        self.faults.conflicts.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` commits fail as if the backend died mid-commit
    pub fn inject_failures(&self, n: u32) {
        self.faults.failures.store(n, Ordering::SeqCst);
    }

    /// Inserts or replaces a team without touching its roster
    /// Makes the next `n` rollbacks report a backend error
    pub fn inject_rollback_failures(&self, n: u32) {
        self.faults.rollbacks.store(n, Ordering::SeqCst);
    }

    pub async fn put_team(&self, team: Team) {
        let mut tables = self.tables.write().await;
        tables.bump(RecordKey::Team(team.id()));
        tables.teams.insert(team.id(), team);
    }

    /// Inserts or replaces a player
    pub async fn put_player(&self, player: Player) {
        let mut tables = self.tables.write().await;
        tables.bump(RecordKey::Player(player.id()));
        tables.players.insert(player.id(), player);
    }

    pub async fn listing_count(&self) -> usize {
        self.tables.read().await.listings.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryDatabase {
    async fn create(&self, account: &Account) -> Result<Uuid, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                account.email
            )));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(account.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| &a.email == email).cloned())
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.accounts.get_mut(&account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(StoreError::Backend(format!(
                "account not found: {}",
                account.id
            ))),
        }
    }
}

#[async_trait]
impl TeamRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, StoreError> {
        Ok(self.tables.read().await.teams.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Team>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .teams
            .values()
            .find(|t| t.owner_id() == owner_id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Team>, StoreError> {
        let tables = self.tables.read().await;
        let mut teams: Vec<Team> = tables.teams.values().cloned().collect();
        teams.sort_by_key(|t| (t.created_at(), t.id()));
        Ok(teams)
    }

    async fn create_with_roster(&self, team: &Team, roster: &[Player]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.teams.values().any(|t| t.owner_id() == team.owner_id()) {
            return Err(StoreError::Conflict(format!(
                "account {} already owns a team",
                team.owner_id()
            )));
        }

        tables.bump(RecordKey::Team(team.id()));
        tables.teams.insert(team.id(), team.clone());
        for player in roster {
            tables.bump(RecordKey::Player(player.id()));
            tables.players.insert(player.id(), player.clone());
        }
        Ok(())
    }

    async fn update_profile(&self, team: &Team) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .teams
            .get(&team.id())
            .ok_or_else(|| StoreError::Backend(format!("team not found: {}", team.id())))?;

        let updated = Team::from_persistence(
            stored.id(),
            stored.owner_id(),
            team.name().to_string(),
            team.country().clone(),
            stored.budget(),
            stored.value(),
            stored.created_at(),
        );
        tables.bump(RecordKey::Team(team.id()));
        tables.teams.insert(team.id(), updated);
        Ok(())
    }
}

#[async_trait]
impl PlayerRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Player>, StoreError> {
        Ok(self.tables.read().await.players.get(&id).cloned())
    }

    async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Player>, StoreError> {
        let tables = self.tables.read().await;
        let mut roster: Vec<Player> = tables
            .players
            .values()
            .filter(|p| p.team_id() == team_id)
            .cloned()
            .collect();
        roster.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(roster)
    }

    async fn list_all(&self) -> Result<Vec<Player>, StoreError> {
        let tables = self.tables.read().await;
        let mut players: Vec<Player> = tables.players.values().cloned().collect();
        players.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(players)
    }

    async fn update_profile(&self, player: &Player) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .players
            .get(&player.id())
            .ok_or_else(|| StoreError::Backend(format!("player not found: {}", player.id())))?;

        let updated = Player::from_persistence(
            stored.id(),
            stored.team_id(),
            player.first_name().to_string(),
            player.last_name().to_string(),
            player.country().clone(),
            stored.age(),
            stored.position(),
            stored.market_value(),
            stored.asked_price(),
            stored.created_at(),
        );
        tables.bump(RecordKey::Player(player.id()));
        tables.players.insert(player.id(), updated);
        Ok(())
    }
}

#[async_trait]
impl MarketStore for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn MarketTransaction>, StoreError> {
        Ok(Box::new(InMemoryTransaction {
            db: self.clone(),
            reads: HashMap::new(),
            players: HashMap::new(),
            teams: HashMap::new(),
            listings: HashMap::new(),
        }))
    }

    async fn list_listings(&self, filter: &ListingFilter) -> Result<Page<MarketEntry>, StoreError> {
        let tables = self.tables.read().await;

        let mut matches = Vec::new();
        for listing in tables.listings.values() {
            let player = tables.players.get(&listing.player_id()).ok_or_else(|| {
                StoreError::Corrupt(format!("listing for missing player {}", listing.player_id()))
            })?;
            let team_name = tables.team_name(player.team_id());
            if filter.matches(player, &team_name) {
                matches.push(MarketEntry {
                    listing: listing.clone(),
                    player: player.clone(),
                    team_name,
                });
            }
        }
        matches.sort_by_key(|e| (e.listing.created_at(), e.listing.id()));

        Ok(Page::from_matches(matches, filter.offset(), filter.limit()))
    }

    async fn find_listing(&self, player_id: Uuid) -> Result<Option<MarketListing>, StoreError> {
        Ok(self.tables.read().await.listings.get(&player_id).cloned())
    }
}

/// Buffered unit of work over `InMemoryDatabase`
struct InMemoryTransaction {
    db: InMemoryDatabase,
    /// Version of every record read from the shared tables
    reads: HashMap<RecordKey, u64>,
    /// In all three maps `None` marks a pending delete
    players: HashMap<Uuid, Option<Player>>,
    teams: HashMap<Uuid, Option<Team>>,
    listings: HashMap<Uuid, Option<MarketListing>>,
}

impl InMemoryTransaction {
    fn observe(&mut self, tables: &Tables, key: RecordKey) {
        self.reads.entry(key).or_insert_with(|| tables.version(key));
    }
}

#[async_trait]
impl MarketTransaction for InMemoryTransaction {
    async fn lock_player(&mut self, id: Uuid) -> Result<Option<Player>, StoreError> {
        if let Some(pending) = self.players.get(&id) {
            return Ok(pending.clone());
        }
        let db = self.db.clone();
        let tables = db.tables.read().await;
        self.observe(&tables, RecordKey::Player(id));
        Ok(tables.players.get(&id).cloned())
    }

    async fn lock_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError> {
        if let Some(pending) = self.teams.get(&id) {
            return Ok(pending.clone());
        }
        let db = self.db.clone();
        let tables = db.tables.read().await;
        self.observe(&tables, RecordKey::Team(id));
        Ok(tables.teams.get(&id).cloned())
    }

    async fn listing_for(&mut self, player_id: Uuid) -> Result<Option<MarketListing>, StoreError> {
        if let Some(pending) = self.listings.get(&player_id) {
            return Ok(pending.clone());
        }
        let db = self.db.clone();
        let tables = db.tables.read().await;
        self.observe(&tables, RecordKey::Listing(player_id));
        Ok(tables.listings.get(&player_id).cloned())
    }

    async fn insert_listing(&mut self, listing: &MarketListing) -> Result<(), StoreError> {
        if self.listing_for(listing.player_id()).await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "player {} is already listed",
                listing.player_id()
            )));
        }
        self.listings
            .insert(listing.player_id(), Some(listing.clone()));
        Ok(())
    }

    async fn delete_listing(&mut self, player_id: Uuid) -> Result<bool, StoreError> {
        let existed = self.listing_for(player_id).await?.is_some();
        self.listings.insert(player_id, None);
        Ok(existed)
    }

    async fn save_player(&mut self, player: &Player) -> Result<(), StoreError> {
        self.players.insert(player.id(), Some(player.clone()));
        Ok(())
    }

    async fn save_team(&mut self, team: &Team) -> Result<(), StoreError> {
        self.teams.insert(team.id(), Some(team.clone()));
        Ok(())
    }

    async fn insert_player(&mut self, player: &Player) -> Result<(), StoreError> {
        if self.lock_player(player.id()).await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "player {} already exists",
                player.id()
            )));
        }
        self.players.insert(player.id(), Some(player.clone()));
        Ok(())
    }

    async fn delete_player(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let existed = self.lock_player(id).await?.is_some();
        self.players.insert(id, None);
        Ok(existed)
    }

    async fn delete_team(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let existed = self.lock_team(id).await?.is_some();
        self.teams.insert(id, None);
        Ok(existed)
    }

    async fn roster(&mut self, team_id: Uuid) -> Result<Vec<Player>, StoreError> {
        let db = self.db.clone();
        let tables = db.tables.read().await;
        self.observe(&tables, RecordKey::Team(team_id));

        let mut seen = HashSet::new();
        let mut roster = Vec::new();
        for (id, pending) in &self.players {
            seen.insert(*id);
            if let Some(player) = pending {
                if player.team_id() == team_id {
                    roster.push(player.clone());
                }
            }
        }
        for player in tables.players.values() {
            if player.team_id() == team_id && !seen.contains(&player.id()) {
                roster.push(player.clone());
            }
        }
        Ok(roster)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let db = self.db.clone();
        let mut tables = db.tables.write().await;

        if FaultInjection::take(&db.faults.failures) {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }
        if FaultInjection::take(&db.faults.conflicts) {
            return Err(StoreError::Conflict("injected write conflict".to_string()));
        }

        for (key, version) in &self.reads {
            if tables.version(*key) != *version {
                return Err(StoreError::Conflict(format!(
                    "{:?} changed since it was read",
                    key
                )));
            }
        }

        let InMemoryTransaction {
            players,
            teams,
            listings,
            ..
        } = *self;

        for (id, player) in players {
            tables.bump(RecordKey::Player(id));
            match player {
                Some(player) => {
                    tables.players.insert(id, player);
                }
                None => {
                    tables.players.remove(&id);
                }
            }
        }
        for (id, team) in teams {
            tables.bump(RecordKey::Team(id));
            match team {
                Some(team) => {
                    tables.teams.insert(id, team);
                }
                None => {
                    tables.teams.remove(&id);
                }
            }
        }
        for (player_id, listing) in listings {
            tables.bump(RecordKey::Listing(player_id));
            match listing {
                Some(listing) => {
                    tables.listings.insert(player_id, listing);
                }
                None => {
                    tables.listings.remove(&player_id);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        if FaultInjection::take(&self.db.faults.rollbacks) {
            return Err(StoreError::Backend("injected rollback failure".to_string()));
        }
        Ok(())
    }
}
