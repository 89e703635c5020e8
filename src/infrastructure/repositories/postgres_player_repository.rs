use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::rows::{player_from_row, store_error, PLAYER_COLUMNS};
use crate::domain::error::StoreError;
use crate::domain::player::Player;
use crate::domain::repositories::PlayerRepository;

/// PostgreSQL implementation of PlayerRepository
pub struct PostgresPlayerRepository {
    pool: PgPool,
}

impl PostgresPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerRepository for PostgresPlayerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Player>, StoreError> {
        let query = format!("SELECT {} FROM players WHERE id = $1", PLAYER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find player by id", e))?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Player>, StoreError> {
        let query = format!(
            "SELECT {} FROM players WHERE team_id = $1 ORDER BY created_at, id",
            PLAYER_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(team_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find players by team", e))?;

        rows.iter().map(player_from_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<Player>, StoreError> {
        let query = format!("SELECT {} FROM players ORDER BY created_at, id", PLAYER_COLUMNS);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to list players", e))?;

        rows.iter().map(player_from_row).collect()
    }

    async fn update_profile(&self, player: &Player) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE players SET first_name = $2, last_name = $3, country = $4 WHERE id = $1",
        )
        .bind(player.id())
        .bind(player.first_name())
        .bind(player.last_name())
        .bind(player.country().as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to update player", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!(
                "player not found: {}",
                player.id()
            )));
        }
        Ok(())
    }
}
