// Repository traits (ports)
// Implemented by adapters in the infrastructure layer

pub mod account_repository;
pub mod market_store;
pub mod player_repository;
pub mod team_repository;

pub use account_repository::AccountRepository;
pub use market_store::{MarketStore, MarketTransaction};
pub use player_repository::PlayerRepository;
pub use team_repository::TeamRepository;
