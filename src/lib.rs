//! Transfer Market API Library
//!
//! Team accounts, the market list, and the transfer engine that moves
//! players between teams, plus the HTTP surface and storage adapters.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
