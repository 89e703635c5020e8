use rand::RngCore;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::repositories::{
    AccountRepository, MarketStore, PlayerRepository, TeamRepository,
};
use crate::infrastructure::repositories::{
    InMemoryDatabase, PostgresAccountRepository, PostgresMarketStore, PostgresPlayerRepository,
    PostgresTeamRepository,
};
use crate::services::{
    AppreciationSource, MarketCatalog, PlayerLocks, RandomAppreciation, RetryPolicy,
    RosterAdmin, TeamProvisioning, TransferEngine,
};

/// The repository ports the application runs against
#[derive(Clone)]
pub struct Storage {
    pub accounts: Arc<dyn AccountRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub players: Arc<dyn PlayerRepository>,
    pub market: Arc<dyn MarketStore>,
}

impl Storage {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(PostgresAccountRepository::new(pool.clone())),
            teams: Arc::new(PostgresTeamRepository::new(pool.clone())),
            players: Arc::new(PostgresPlayerRepository::new(pool.clone())),
            market: Arc::new(PostgresMarketStore::new(pool)),
        }
    }

    pub fn in_memory(db: &InMemoryDatabase) -> Self {
        Self {
            accounts: Arc::new(db.clone()),
            teams: Arc::new(db.clone()),
            players: Arc::new(db.clone()),
            market: Arc::new(db.clone()),
        }
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub players: Arc<dyn PlayerRepository>,
    pub catalog: Arc<MarketCatalog>,
    pub engine: Arc<TransferEngine>,
    pub roster: Arc<RosterAdmin>,
    pub provisioning: Arc<TeamProvisioning>,
    pub jwt_secret: Arc<str>,
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Production wiring: thread-local RNG appreciation, entropy-seeded rosters
    pub fn new(storage: Storage, config: &AppConfig) -> Self {
        let provisioning = TeamProvisioning::new(storage.teams.clone());
        Self::assemble(storage, config, Arc::new(RandomAppreciation), provisioning)
    }

    /// Wiring with caller-supplied randomness
    pub fn with_sources(
        storage: Storage,
        config: &AppConfig,
        appreciation: Arc<dyn AppreciationSource>,
        roster_rng: Box<dyn RngCore + Send>,
    ) -> Self {
        let provisioning = TeamProvisioning::with_rng(storage.teams.clone(), roster_rng);
        Self::assemble(storage, config, appreciation, provisioning)
    }

    fn assemble(
        storage: Storage,
        config: &AppConfig,
        appreciation: Arc<dyn AppreciationSource>,
        provisioning: TeamProvisioning,
    ) -> Self {
        let locks = Arc::new(PlayerLocks::new(config.player_lock_timeout));
        let retry = RetryPolicy::new(config.transfer_max_attempts);

        Self {
            catalog: Arc::new(MarketCatalog::new(
                storage.market.clone(),
                locks.clone(),
                retry,
            )),
            roster: Arc::new(RosterAdmin::new(
                storage.market.clone(),
                locks.clone(),
                retry,
            )),
            engine: Arc::new(TransferEngine::new(
                storage.market,
                locks,
                appreciation,
                retry,
            )),
            provisioning: Arc::new(provisioning),
            accounts: storage.accounts,
            teams: storage.teams,
            players: storage.players,
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}
