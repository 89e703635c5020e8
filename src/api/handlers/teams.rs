use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::CurrentActor;
use crate::api::state::AppState;
use crate::domain::error::MarketError;
use crate::domain::policy::{self, Action, Resource};
use crate::domain::team::{Country, Team};

/// Editable team fields; `budget` is honoured for administrators only
#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub country: Option<String>,
    pub budget: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub owner_id: Uuid,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub country: String,
    pub budget: Decimal,
    pub value: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            owner_id: team.owner_id(),
            name: team.name().to_string(),
            country: team.country().to_string(),
            budget: team.budget(),
            value: team.value(),
            created_at: team.created_at(),
        }
    }
}

async fn load_team(state: &AppState, id: Uuid) -> Result<Team, ApiError> {
    state
        .teams
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Team not found: {}", id)))
}

/// Every team for administrators, the caller's own team for everyone else
///
/// GET /api/teams
pub async fn list_teams(
    State(state): State<AppState>,
    current: CurrentActor,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let teams = if current.account.is_admin {
        state.teams.list_all().await?
    } else {
        state
            .teams
            .find_by_owner(current.account.id)
            .await?
            .into_iter()
            .collect()
    };

    Ok(Json(teams.iter().map(TeamResponse::from).collect()))
}

/// Create an empty team for an existing account (administrators only)
///
/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let country = Country::new(req.country).map_err(MarketError::validation)?;
    let (team, _events) = Team::new(req.owner_id, req.name, country)?;
    policy::check(&current.actor(), &Resource::team(&team), Action::Create)?;

    if state.accounts.find_by_id(req.owner_id).await?.is_none() {
        return Err(ApiError::not_found(format!(
            "Account not found: {}",
            req.owner_id
        )));
    }
    state.teams.create_with_roster(&team, &[]).await?;

    info!(team_id = %team.id(), owner_id = %team.owner_id(), "Team created");
    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// Delete a team together with its players and their listings (administrators only)
///
/// DELETE /api/teams/:id
pub async fn delete_team(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.roster.delete_team(id, &current.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own team
///
/// GET /api/teams/me
pub async fn get_my_team(
    State(state): State<AppState>,
    current: CurrentActor,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state
        .teams
        .find_by_owner(current.account.id)
        .await?
        .ok_or_else(|| ApiError::not_found("You don't have a team yet"))?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Get a team by ID
///
/// GET /api/teams/:id
pub async fn get_team(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = load_team(&state, id).await?;
    policy::check(&current.actor(), &Resource::team(&team), Action::View)?;

    Ok(Json(TeamResponse::from(&team)))
}

/// Rename a team or change its country; administrators may also set the budget
///
/// PATCH /api/teams/:id
pub async fn update_team(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let mut team = load_team(&state, id).await?;
    policy::check(&current.actor(), &Resource::team(&team), Action::Edit)?;

    let actor = current.actor();
    let budget = req.budget.filter(|_| actor.is_admin);
    if let Some(budget) = budget {
        team.clone().set_budget(budget)?;
    }

    let country = req
        .country
        .map(Country::new)
        .transpose()
        .map_err(MarketError::validation)?;
    if let Some(name) = req.name {
        team.rename(name)?;
    }
    if let Some(country) = country {
        team.set_country(country);
    }

    state.teams.update_profile(&team).await?;

    if let Some(budget) = budget {
        team = state.roster.set_budget(team.id(), budget, &actor).await?;
    }

    Ok(Json(TeamResponse::from(&team)))
}
