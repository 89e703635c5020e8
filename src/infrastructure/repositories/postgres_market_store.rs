use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::rows::{
    like_prefix, listing_from_row, player_from_row, store_error, team_from_row, PLAYER_COLUMNS,
    TEAM_COLUMNS,
};
use crate::domain::error::StoreError;
use crate::domain::market::{ListingFilter, MarketEntry, MarketListing, Page};
use crate::domain::player::Player;
use crate::domain::repositories::{MarketStore, MarketTransaction};
use crate::domain::team::Team;

/// PostgreSQL implementation of MarketStore
///
/// Transactions take row locks with `SELECT ... FOR UPDATE`, so two
/// transfers touching the same player or team serialize in the database.
pub struct PostgresMarketStore {
    pool: PgPool,
}

impl PostgresMarketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ListingFilter) {
    if let Some(ref prefix) = filter.first_name {
        builder
            .push(" AND p.first_name LIKE ")
            .push_bind(like_prefix(prefix));
    }
    if let Some(ref prefix) = filter.last_name {
        builder
            .push(" AND p.last_name LIKE ")
            .push_bind(like_prefix(prefix));
    }
    for token in filter.name_tokens() {
        let pattern = like_prefix(token);
        builder
            .push(" AND (p.first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.last_name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(code) = filter.country_code() {
        builder.push(" AND p.country = ").push_bind(code);
    }
    if let Some(ref prefix) = filter.team_name {
        builder.push(" AND t.name LIKE ").push_bind(like_prefix(prefix));
    }
    if let Some(min) = filter.min_value {
        builder.push(" AND p.market_value >= ").push_bind(min);
    }
    if let Some(max) = filter.max_value {
        builder.push(" AND p.market_value <= ").push_bind(max);
    }
}

const LISTING_JOIN: &str = " FROM market_listings l \
     JOIN players p ON p.id = l.player_id \
     JOIN teams t ON t.id = p.team_id \
     WHERE TRUE";

#[async_trait]
impl MarketStore for PostgresMarketStore {
    async fn begin(&self) -> Result<Box<dyn MarketTransaction>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin market transaction", e))?;
        Ok(Box::new(PostgresMarketTransaction { tx }))
    }

    async fn list_listings(&self, filter: &ListingFilter) -> Result<Page<MarketEntry>, StoreError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_query.push(LISTING_JOIN);
        push_filters(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("Failed to count listings", e))?;

        let mut page_query = QueryBuilder::<Postgres>::new(
            "SELECT l.id AS listing_id, l.created_at AS listed_at, t.name AS team_name, \
             p.id, p.team_id, p.first_name, p.last_name, p.country, p.age, p.position, \
             p.market_value, p.asked_price, p.created_at, p.id AS player_id",
        );
        page_query.push(LISTING_JOIN);
        push_filters(&mut page_query, filter);
        page_query
            .push(" ORDER BY l.created_at, l.id LIMIT ")
            .push_bind(i64::try_from(filter.limit()).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));

        let rows = page_query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to list listings", e))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            results.push(MarketEntry {
                listing: listing_from_row(row)?,
                player: player_from_row(row)?,
                team_name: sqlx::Row::try_get(row, "team_name")
                    .map_err(|e| StoreError::Corrupt(format!("column team_name: {}", e)))?,
            });
        }

        Ok(Page {
            count: count as usize,
            results,
        })
    }

    async fn find_listing(&self, player_id: Uuid) -> Result<Option<MarketListing>, StoreError> {
        let row = sqlx::query(
            "SELECT id AS listing_id, player_id, created_at AS listed_at \
             FROM market_listings WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to find listing", e))?;

        row.as_ref().map(listing_from_row).transpose()
    }
}

/// Database transaction behind `MarketTransaction`
///
/// Dropping it without `commit` rolls everything back.
struct PostgresMarketTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MarketTransaction for PostgresMarketTransaction {
    async fn lock_player(&mut self, id: Uuid) -> Result<Option<Player>, StoreError> {
        let query = format!(
            "SELECT {} FROM players WHERE id = $1 FOR UPDATE",
            PLAYER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to lock player", e))?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn lock_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError> {
        let query = format!("SELECT {} FROM teams WHERE id = $1 FOR UPDATE", TEAM_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to lock team", e))?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn listing_for(&mut self, player_id: Uuid) -> Result<Option<MarketListing>, StoreError> {
        let row = sqlx::query(
            "SELECT id AS listing_id, player_id, created_at AS listed_at \
             FROM market_listings WHERE player_id = $1 FOR UPDATE",
        )
        .bind(player_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to read listing", e))?;

        row.as_ref().map(listing_from_row).transpose()
    }

    async fn insert_listing(&mut self, listing: &MarketListing) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO market_listings (id, player_id, created_at) VALUES ($1, $2, $3)")
            .bind(listing.id())
            .bind(listing.player_id())
            .bind(listing.created_at())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to insert listing", e))?;
        Ok(())
    }

    async fn delete_listing(&mut self, player_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM market_listings WHERE player_id = $1")
            .bind(player_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to delete listing", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_player(&mut self, player: &Player) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE players SET
                team_id = $2,
                first_name = $3,
                last_name = $4,
                country = $5,
                market_value = $6,
                asked_price = $7,
                age = $8,
                position = $9
            WHERE id = $1
            "#,
        )
        .bind(player.id())
        .bind(player.team_id())
        .bind(player.first_name())
        .bind(player.last_name())
        .bind(player.country().as_str())
        .bind(player.market_value())
        .bind(player.asked_price())
        .bind(player.age())
        .bind(player.position().as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to save player", e))?;
        Ok(())
    }

    async fn save_team(&mut self, team: &Team) -> Result<(), StoreError> {
        sqlx::query("UPDATE teams SET name = $2, country = $3, budget = $4, value = $5 WHERE id = $1")
            .bind(team.id())
            .bind(team.name())
            .bind(team.country().as_str())
            .bind(team.budget())
            .bind(team.value())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to save team", e))?;
        Ok(())
    }

    async fn insert_player(&mut self, player: &Player) -> Result<(), StoreError> {
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
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to insert player", e))?;
        Ok(())
    }

    async fn delete_player(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to delete player", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_team(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to delete team", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn roster(&mut self, team_id: Uuid) -> Result<Vec<Player>, StoreError> {
        let query = format!(
            "SELECT {} FROM players WHERE team_id = $1 ORDER BY created_at, id",
            PLAYER_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(team_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to read roster", e))?;

        rows.iter().map(player_from_row).collect()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| store_error("Failed to commit market transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| store_error("Failed to roll back market transaction", e))
    }
}
