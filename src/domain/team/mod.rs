// Team domain module
// Contains the team aggregate root, its budget ledger, value objects, and domain events

#![allow(clippy::module_inception)]

pub mod account;
pub mod events;
pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use account::settle_transfer;
pub use events::TeamEvent;
pub use team::{Team, INITIAL_BUDGET};
pub use value_objects::Country;
