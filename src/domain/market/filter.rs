use crate::domain::error::{MarketError, MarketResult};
use crate::domain::player::Player;
use rust_decimal::Decimal;
use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;
/// Largest offset every backend can represent (Postgres `OFFSET` is a bigint)
pub const MAX_OFFSET: usize = i64::MAX as usize;

/// Predicates for browsing the market list
///
/// All set predicates must hold. String matches are case-sensitive
/// prefix matches. `name` is free text: every whitespace-separated token
/// must prefix either the first or the last name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListingFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub team_name: Option<String>,
    pub min_value: Option<Decimal>,
    pub max_value: Option<Decimal>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> MarketResult<()> {
        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_PAGE_SIZE {
                return Err(MarketError::validation(format!(
                    "limit must be between 1 and {}",
                    MAX_PAGE_SIZE
                )));
            }
        }
        if self.offset() > MAX_OFFSET {
            return Err(MarketError::validation(format!(
                "offset must not exceed {}",
                MAX_OFFSET
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }

    /// Tokens of the free-text `name` predicate
    pub fn name_tokens(&self) -> Vec<&str> {
        self.name
            .as_deref()
            .map(|n| n.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Country predicate normalised the way codes are stored
    pub fn country_code(&self) -> Option<String> {
        self.country.as_ref().map(|c| c.trim().to_ascii_uppercase())
    }

    /// Evaluates the predicates against a listed player and its team's name
    pub fn matches(&self, player: &Player, team_name: &str) -> bool {
        if let Some(ref prefix) = self.first_name {
            if !player.first_name().starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(ref prefix) = self.last_name {
            if !player.last_name().starts_with(prefix.as_str()) {
                return false;
            }
        }
        let all_tokens_match = self.name_tokens().into_iter().all(|token| {
            player.first_name().starts_with(token) || player.last_name().starts_with(token)
        });
        if !all_tokens_match {
            return false;
        }
        if let Some(code) = self.country_code() {
            if player.country().as_str() != code {
                return false;
            }
        }
        if let Some(ref prefix) = self.team_name {
            if !team_name.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.min_value {
            if player.market_value() < min {
                return false;
            }
        }
        if let Some(max) = self.max_value {
            if player.market_value() > max {
                return false;
            }
        }
        true
    }
}
