use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::rows::{store_error, team_from_row, TEAM_COLUMNS};
use crate::domain::error::StoreError;
use crate::domain::player::Player;
use crate::domain::repositories::TeamRepository;
use crate::domain::team::Team;

/// PostgreSQL implementation of TeamRepository
///
/// Only creation and profile edits live here. Budget and value columns
/// are written by `PostgresMarketStore` transactions.
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Creates a new PostgresTeamRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, StoreError> {
        let query = format!("SELECT {} FROM teams WHERE id = $1", TEAM_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find team by id", e))?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Team>, StoreError> {
        let query = format!("SELECT {} FROM teams WHERE owner_id = $1", TEAM_COLUMNS);
        let row = sqlx::query(&query)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find team by owner", e))?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Team>, StoreError> {
        let query = format!("SELECT {} FROM teams ORDER BY created_at, id", TEAM_COLUMNS);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to list teams", e))?;

        rows.iter().map(team_from_row).collect()
    }

    async fn create_with_roster(&self, team: &Team, roster: &[Player]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin team creation", e))?;

        // owner_id is UNIQUE; a concurrent first login surfaces as 23505
        sqlx::query(
            r#"
            INSERT INTO teams (id, owner_id, name, country, budget, value, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(team.id())
        .bind(team.owner_id())
        .bind(team.name())
        .bind(team.country().as_str())
        .bind(team.budget())
        .bind(team.value())
        .bind(team.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to create team", e))?;

        for player in roster {
            sqlx::query(
                r#"
                INSERT INTO players (
                    id, team_id, first_name, last_name, country, age,
                    position, market_value, asked_price, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(player.id())
            .bind(player.team_id())
            .bind(player.first_name())
            .bind(player.last_name())
            .bind(player.country().as_str())
            .bind(player.age())
            .bind(player.position().as_str())
            .bind(player.market_value())
            .bind(player.asked_price())
            .bind(player.created_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("Failed to create roster player", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to commit team creation", e))
    }

    async fn update_profile(&self, team: &Team) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE teams SET name = $2, country = $3 WHERE id = $1")
            .bind(team.id())
            .bind(team.name())
            .bind(team.country().as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to update team", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!("team not found: {}", team.id())));
        }
        Ok(())
    }
}
