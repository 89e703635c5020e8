// Request extractors shared by protected routes

pub mod auth;

pub use auth::{CurrentActor, JwtAuth};
