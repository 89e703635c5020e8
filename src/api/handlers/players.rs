use axum::{
    extract::{Path, State},
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
use crate::domain::player::{Player, Position};
use crate::domain::policy::{self, Action, Resource};
use crate::domain::team::Country;
use crate::services::PlayerAmendment;

/// Profile fields for owners; `age`, `position`, and `market_value` are honoured
/// for administrators only
#[derive(Debug, Deserialize)]
pub struct UpdatePlayerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub age: Option<i32>,
    pub position: Option<Position>,
    pub market_value: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    pub team_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub age: i32,
    pub position: Position,
}

#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub age: i32,
    pub position: Position,
    pub market_value: Decimal,
    pub asked_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Player> for PlayerResponse {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id(),
            team_id: player.team_id(),
            first_name: player.first_name().to_string(),
            last_name: player.last_name().to_string(),
            country: player.country().to_string(),
            age: player.age(),
            position: player.position(),
            market_value: player.market_value(),
            asked_price: player.asked_price(),
            created_at: player.created_at(),
        }
    }
}

/// Loads a player and checks `action` against its owning team
async fn authorized_player(
    state: &AppState,
    current: &CurrentActor,
    id: Uuid,
    action: Action,
) -> Result<Player, ApiError> {
    let player = state
        .players
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Player not found: {}", id)))?;

    let team = state.teams.find_by_id(player.team_id()).await?.ok_or_else(|| {
        MarketError::Storage(format!("player {} belongs to a missing team", id))
    })?;

    policy::check(&current.actor(), &Resource::player(&player, &team), action)?;
    Ok(player)
}

/// The caller's roster; administrators see every player
///
/// GET /api/players
pub async fn list_players(
    State(state): State<AppState>,
    current: CurrentActor,
) -> Result<Json<Vec<PlayerResponse>>, ApiError> {
    let players = if current.account.is_admin {
        state.players.list_all().await?
    } else {
        match state.teams.find_by_owner(current.account.id).await? {
            Some(team) => state.players.find_by_team(team.id()).await?,
            None => Vec::new(),
        }
    };

    Ok(Json(players.iter().map(PlayerResponse::from).collect()))
}

/// Add a player to a team's roster (administrators only)
///
/// POST /api/players
pub async fn create_player(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(req): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<PlayerResponse>), ApiError> {
    let country = Country::new(req.country).map_err(MarketError::validation)?;
    let player = Player::new(
        req.team_id,
        req.first_name,
        req.last_name,
        country,
        req.age,
        req.position,
    )?;

    let player = state.roster.create_player(player, &current.actor()).await?;

    Ok((StatusCode::CREATED, Json(PlayerResponse::from(&player))))
}

/// Delete a player and its listing, then revalue its former team (administrators only)
///
/// DELETE /api/players/:id
pub async fn delete_player(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.roster.delete_player(id, &current.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/players/:id
pub async fn get_player(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player = authorized_player(&state, &current, id, Action::View).await?;
    Ok(Json(PlayerResponse::from(&player)))
}

/// PATCH /api/players/:id
pub async fn update_player(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePlayerRequest>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let mut player = authorized_player(&state, &current, id, Action::Edit).await?;

    let actor = current.actor();
    let amendment = PlayerAmendment {
        age: req.age,
        position: req.position,
        market_value: req.market_value,
    };
    let amend = actor.is_admin && !amendment.is_empty();
    if amend {
        player
            .clone()
            .amend(amendment.age, amendment.position, amendment.market_value)?;
    }

    let country = req
        .country
        .map(Country::new)
        .transpose()
        .map_err(MarketError::validation)?;
    player.update_profile(req.first_name, req.last_name, country)?;

    state.players.update_profile(&player).await?;

    if amend {
        player = state.roster.amend_player(id, amendment, &actor).await?;
    }

    Ok(Json(PlayerResponse::from(&player)))
}
