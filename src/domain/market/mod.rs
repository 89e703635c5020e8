// Market domain module
// Listings, listing filters, and paged results

pub mod filter;
pub mod listing;

pub use filter::ListingFilter;
pub use listing::{MarketEntry, MarketListing, Page};
