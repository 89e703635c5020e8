// Player domain module

#![allow(clippy::module_inception)]

pub mod player;
pub mod value_objects;

pub use player::{Player, DEFAULT_MARKET_VALUE};
pub use value_objects::Position;
