// HTTP handlers, one module per resource

pub mod auth;
pub mod market;
pub mod players;
pub mod teams;
