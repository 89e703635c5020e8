use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::locks::PlayerLocks;
use super::retry::RetryPolicy;
use crate::domain::error::{MarketError, MarketResult};
use crate::domain::market::{ListingFilter, MarketEntry, MarketListing, Page};
use crate::domain::policy::{self, Action, Actor, Resource};
use crate::domain::repositories::{MarketStore, MarketTransaction};

/// Result of putting a player on the market list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingOutcome {
    pub listing: MarketListing,
    /// False when the player was already listed and the existing listing was returned
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnExisting {
    ReturnExisting,
    Fail,
}

/// Tracks which players are listed and at what asking price
pub struct MarketCatalog {
    store: Arc<dyn MarketStore>,
    locks: Arc<PlayerLocks>,
    retry: RetryPolicy,
}

impl MarketCatalog {
    pub fn new(store: Arc<dyn MarketStore>, locks: Arc<PlayerLocks>, retry: RetryPolicy) -> Self {
        Self {
            store,
            locks,
            retry,
        }
    }

    /// Filtered page of the market list
    pub async fn list(&self, filter: &ListingFilter) -> MarketResult<Page<MarketEntry>> {
        filter.validate()?;
        Ok(self.store.list_listings(filter).await?)
    }

    /// Lists a player; returns the existing listing unchanged if already listed
    pub async fn add(
        &self,
        player_id: Uuid,
        asked_price: Decimal,
        actor: &Actor,
    ) -> MarketResult<ListingOutcome> {
        self.insert(player_id, asked_price, actor, OnExisting::ReturnExisting)
            .await
    }

    /// Lists a player; fails with `AlreadyListed` if it is already listed
    pub async fn create(
        &self,
        player_id: Uuid,
        asked_price: Decimal,
        actor: &Actor,
    ) -> MarketResult<MarketListing> {
        self.insert(player_id, asked_price, actor, OnExisting::Fail)
            .await
            .map(|outcome| outcome.listing)
    }

    /// Removes a listing without authorisation checks; no-op if absent
    pub async fn remove(&self, player_id: Uuid) -> MarketResult<bool> {
        let _scope = self.locks.acquire(player_id).await?;
        let mut tx = self.store.begin().await?;
        let removed = tx.delete_listing(player_id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// Owner- or admin-initiated removal; resets the asked price
    pub async fn delist(&self, player_id: Uuid, actor: &Actor) -> MarketResult<bool> {
        let _scope = self.locks.acquire(player_id).await?;

        let mut attempt = 1;
        loop {
            let mut tx = self.store.begin().await?;
            let result = Self::delist_in(tx.as_mut(), player_id, actor).await;
            let result = match result {
                Ok(removed) => tx.commit().await.map(|_| removed).map_err(MarketError::from),
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(player_id = %player_id, error = %rollback_err, "Rollback failed");
                    }
                    Err(err)
                }
            };

            match result {
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    debug!(player_id = %player_id, attempt, "Retrying delist after conflict");
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                Ok(removed) => {
                    if removed {
                        info!(player_id = %player_id, actor = %actor.account_id, "Player removed from market list");
                    }
                    return Ok(removed);
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn contains(&self, player_id: Uuid) -> MarketResult<bool> {
        Ok(self.store.find_listing(player_id).await?.is_some())
    }

    async fn insert(
        &self,
        player_id: Uuid,
        asked_price: Decimal,
        actor: &Actor,
        on_existing: OnExisting,
    ) -> MarketResult<ListingOutcome> {
        if asked_price < Decimal::ZERO {
            return Err(MarketError::validation("Asked price cannot be negative"));
        }

        // Check-then-insert happens inside the player's exclusive scope.
        let _scope = self.locks.acquire(player_id).await?;

        let mut attempt = 1;
        loop {
            let mut tx = self.store.begin().await?;
            let result =
                Self::insert_in(tx.as_mut(), player_id, asked_price, actor, on_existing).await;
            let result = match result {
                Ok(outcome) if outcome.created => tx
                    .commit()
                    .await
                    .map(|_| outcome)
                    .map_err(MarketError::from),
                Ok(outcome) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(player_id = %player_id, error = %rollback_err, "Rollback failed");
                    }
                    Ok(outcome)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(player_id = %player_id, error = %rollback_err, "Rollback failed");
                    }
                    Err(err)
                }
            };

            match result {
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    debug!(player_id = %player_id, attempt, "Retrying listing after conflict");
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                Ok(outcome) => {
                    if outcome.created {
                        info!(
                            player_id = %player_id,
                            asked_price = %asked_price,
                            actor = %actor.account_id,
                            "Player put on market list"
                        );
                    }
                    return Ok(outcome);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn insert_in(
        tx: &mut dyn MarketTransaction,
        player_id: Uuid,
        asked_price: Decimal,
        actor: &Actor,
        on_existing: OnExisting,
    ) -> MarketResult<ListingOutcome> {
        let mut player = tx
            .lock_player(player_id)
            .await?
            .ok_or_else(|| MarketError::not_found(format!("Player not found: {}", player_id)))?;
        let team = tx.lock_team(player.team_id()).await?.ok_or_else(|| {
            MarketError::not_found(format!("Team not found: {}", player.team_id()))
        })?;

        policy::check(actor, &Resource::player(&player, &team), Action::ListForSale)?;

        if let Some(existing) = tx.listing_for(player_id).await? {
            return match on_existing {
                OnExisting::ReturnExisting => Ok(ListingOutcome {
                    listing: existing,
                    created: false,
                }),
                OnExisting::Fail => Err(MarketError::AlreadyListed(player_id)),
            };
        }

        player.set_asked_price(asked_price)?;
        let listing = MarketListing::new(player_id);
        tx.save_player(&player).await?;
        tx.insert_listing(&listing).await?;

        Ok(ListingOutcome {
            listing,
            created: true,
        })
    }

    async fn delist_in(
        tx: &mut dyn MarketTransaction,
        player_id: Uuid,
        actor: &Actor,
    ) -> MarketResult<bool> {
        let mut player = tx
            .lock_player(player_id)
            .await?
            .ok_or_else(|| MarketError::not_found(format!("Player not found: {}", player_id)))?;
        let team = tx.lock_team(player.team_id()).await?.ok_or_else(|| {
            MarketError::not_found(format!("Team not found: {}", player.team_id()))
        })?;

        policy::check(actor, &Resource::player(&player, &team), Action::Delist)?;

        let removed = tx.delete_listing(player_id).await?;
        if removed {
            player.clear_asked_price();
            tx.save_player(&player).await?;
        }
        Ok(removed)
    }
}
