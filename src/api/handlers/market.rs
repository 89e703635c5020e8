use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::CurrentActor;
use crate::api::state::AppState;
use crate::domain::error::MarketError;
use crate::domain::market::{ListingFilter, MarketEntry, MarketListing};
use crate::domain::player::{Player, Position};

#[derive(Debug, Deserialize)]
pub struct ListPlayerRequest {
    pub player_id: Uuid,
    pub asked_price: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct BuyRequest {
    /// Defaults to the caller's own team
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub id: Uuid,
    pub player_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&MarketListing> for ListingResponse {
    fn from(listing: &MarketListing) -> Self {
        Self {
            id: listing.id(),
            player_id: listing.player_id(),
            created_at: listing.created_at(),
        }
    }
}

/// One row of the market list, as buyers see it (no market value)
#[derive(Debug, Serialize)]
pub struct MarketEntryResponse {
    pub id: Uuid,
    pub player_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub age: i32,
    pub position: Position,
    pub team_id: Uuid,
    pub team_name: String,
    pub asked_price: Decimal,
    pub listed_at: DateTime<Utc>,
}

impl From<&MarketEntry> for MarketEntryResponse {
    fn from(entry: &MarketEntry) -> Self {
        Self {
            id: entry.listing.id(),
            player_id: entry.player.id(),
            first_name: entry.player.first_name().to_string(),
            last_name: entry.player.last_name().to_string(),
            country: entry.player.country().to_string(),
            age: entry.player.age(),
            position: entry.player.position(),
            team_id: entry.player.team_id(),
            team_name: entry.team_name.clone(),
            asked_price: entry.player.asked_price(),
            listed_at: entry.listing.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarketPageResponse {
    pub count: usize,
    pub results: Vec<MarketEntryResponse>,
}

/// What the buyer sees of a freshly bought player; excludes market value
#[derive(Debug, Serialize)]
pub struct BoughtPlayerResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub age: i32,
    pub position: Position,
    pub asked_price: Decimal,
}

impl From<&Player> for BoughtPlayerResponse {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id(),
            team_id: player.team_id(),
            first_name: player.first_name().to_string(),
            last_name: player.last_name().to_string(),
            country: player.country().to_string(),
            age: player.age(),
            position: player.position(),
            asked_price: player.asked_price(),
        }
    }
}

/// Browse the market list
///
/// GET /api/market
pub async fn list_market(
    State(state): State<AppState>,
    _current: CurrentActor,
    Query(filter): Query<ListingFilter>,
) -> Result<Json<MarketPageResponse>, ApiError> {
    let page = state.catalog.list(&filter).await?;

    Ok(Json(MarketPageResponse {
        count: page.count,
        results: page.iter().map(MarketEntryResponse::from).collect(),
    }))
}

/// Put a player on the market list
///
/// 201 when a listing was created, 200 when the player was already listed.
///
/// POST /api/market
pub async fn add_listing(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(req): Json<ListPlayerRequest>,
) -> Result<(StatusCode, Json<ListingResponse>), ApiError> {
    let outcome = state
        .catalog
        .add(req.player_id, req.asked_price, &current.actor())
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ListingResponse::from(&outcome.listing))))
}

/// Take a player off the market list
///
/// DELETE /api/market/:player_id
pub async fn remove_listing(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(player_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delist(player_id, &current.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Only a blank body means "buy for my own team"; anything else must parse
fn parse_buy_request(body: &[u8]) -> Result<BuyRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BuyRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid buy request: {}", e)))
}

/// Buy a listed player
///
/// POST /api/market/:player_id/buy
pub async fn buy_player(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(player_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<BoughtPlayerResponse>, ApiError> {
    let actor = current.actor();
    let request = parse_buy_request(&body)?;

    let buyer_team_id = match request.team_id {
        Some(team_id) => team_id,
        None => state
            .teams
            .find_by_owner(actor.account_id)
            .await?
            .map(|team| team.id())
            .ok_or(MarketError::NoTeamForActor(actor.account_id))?,
    };

    let receipt = state.engine.buy(player_id, buyer_team_id, &actor).await?;

    Ok(Json(BoughtPlayerResponse::from(&receipt.player)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_buy_body_means_own_team() {
        assert_eq!(parse_buy_request(b"").unwrap().team_id, None);
        assert_eq!(parse_buy_request(b" \n").unwrap().team_id, None);
        assert_eq!(parse_buy_request(b"{}").unwrap().team_id, None);
    }

    #[test]
    fn malformed_buy_body_is_rejected() {
        assert!(parse_buy_request(br#"{"team_id":"not-a-uuid"}"#).is_err());
        assert!(parse_buy_request(b"null").is_err());
        assert!(parse_buy_request(b"{").is_err());
    }
}
