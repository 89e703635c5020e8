// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory;
pub mod postgres_account_repository;
pub mod postgres_market_store;
pub mod postgres_player_repository;
pub mod postgres_team_repository;
mod rows;

pub use in_memory::InMemoryDatabase;
pub use postgres_account_repository::PostgresAccountRepository;
pub use postgres_market_store::PostgresMarketStore;
pub use postgres_player_repository::PostgresPlayerRepository;
pub use postgres_team_repository::PostgresTeamRepository;
