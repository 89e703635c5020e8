// Application services
// Orchestrate domain objects against the repository ports

pub mod appreciation;
pub mod catalog;
pub mod locks;
pub mod provisioning;
pub mod retry;
pub mod roster;
pub mod transfer;
pub mod valuation;

pub use appreciation::{AppreciationSource, RandomAppreciation, SeededAppreciation, SequenceAppreciation};
pub use catalog::{ListingOutcome, MarketCatalog};
pub use locks::PlayerLocks;
pub use provisioning::TeamProvisioning;
pub use retry::RetryPolicy;
pub use roster::{PlayerAmendment, RosterAdmin};
pub use transfer::{TransferEngine, TransferReceipt, TransferState};
pub use valuation::ValuationService;
