// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod account;
pub mod error;
pub mod market;
pub mod player;
pub mod policy;
pub mod repositories;
pub mod team;

pub use error::{MarketError, MarketResult, StoreError};
