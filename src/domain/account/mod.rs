// Account domain module
// Authenticated identities, login-lockout bookkeeping, and login events

#![allow(clippy::module_inception)]

pub mod account;
pub mod events;
pub mod value_objects;

pub use account::{Account, LoginRejection, MAX_LOGIN_ATTEMPTS};
pub use events::AccountEvent;
pub use value_objects::Email;
