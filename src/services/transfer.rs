use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::appreciation::{
    appreciate, AppreciationSource, MAX_APPRECIATION_PERCENT, MIN_APPRECIATION_PERCENT,
};
use super::locks::PlayerLocks;
use super::retry::RetryPolicy;
use super::valuation::ValuationService;
use crate::domain::error::{MarketError, MarketResult};
use crate::domain::player::Player;
use crate::domain::policy::{self, Action, Actor, Resource};
use crate::domain::repositories::{MarketStore, MarketTransaction};
use crate::domain::team::{settle_transfer, Team, TeamEvent};

/// Lifecycle of a single buy request
///
/// ```text
/// Requested -> Validated -> Committed
///     |            |
///     +------------+------> Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Requested,
    Validated,
    Committed,
    Rejected,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferState::Requested => "requested",
            TransferState::Validated => "validated",
            TransferState::Committed => "committed",
            TransferState::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Everything a committed transfer changed
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub player: Player,
    pub seller: Team,
    pub buyer: Team,
    pub price: Decimal,
    pub appreciation_percent: u32,
    pub events: Vec<TeamEvent>,
}

/// Orchestrates validation and atomic commit of a purchase
///
/// Each `buy` runs under the player's exclusive scope. Inside it, a store
/// transaction locks the player and then both teams in ascending id order,
/// validates, and writes listing, player, and both ledgers in one commit.
/// A storage conflict re-runs the whole resolve/validate/commit cycle up to
/// the retry limit.
pub struct TransferEngine {
    store: Arc<dyn MarketStore>,
    locks: Arc<PlayerLocks>,
    appreciation: Arc<dyn AppreciationSource>,
    retry: RetryPolicy,
}

impl TransferEngine {
    pub fn new(
        store: Arc<dyn MarketStore>,
        locks: Arc<PlayerLocks>,
        appreciation: Arc<dyn AppreciationSource>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            locks,
            appreciation,
            retry,
        }
    }

    /// Buys a listed player into `buyer_team_id` on behalf of `actor`
    ///
    /// # Errors
    /// Checked in order: `NotListed`, `SelfPurchase`, `Forbidden`,
    /// `InsufficientFunds`. `NotFound` if the player or buyer team does not
    /// exist, `Conflict` once retries are exhausted. On any error nothing
    /// was written.
    pub async fn buy(
        &self,
        player_id: Uuid,
        buyer_team_id: Uuid,
        actor: &Actor,
    ) -> MarketResult<TransferReceipt> {
        debug!(
            player_id = %player_id,
            buyer_team_id = %buyer_team_id,
            state = %TransferState::Requested,
            "Transfer requested"
        );

        let result = self.buy_in_scope(player_id, buyer_team_id, actor).await;

        match &result {
            Ok(receipt) => info!(
                player_id = %player_id,
                seller_team_id = %receipt.seller.id(),
                buyer_team_id = %receipt.buyer.id(),
                price = %receipt.price,
                market_value = %receipt.player.market_value(),
                state = %TransferState::Committed,
                "Transfer committed"
            ),
            Err(err) => info!(
                player_id = %player_id,
                buyer_team_id = %buyer_team_id,
                state = %TransferState::Rejected,
                reason = %err,
                "Transfer rejected"
            ),
        }

        result
    }

    async fn buy_in_scope(
        &self,
        player_id: Uuid,
        buyer_team_id: Uuid,
        actor: &Actor,
    ) -> MarketResult<TransferReceipt> {
        let _scope = self.locks.acquire(player_id).await?;

        let mut attempt = 1;
        loop {
            match self.attempt(player_id, buyer_team_id, actor).await {
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    warn!(
                        player_id = %player_id,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        reason = %err,
                        "Transfer hit a write conflict, retrying"
                    );
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn attempt(
        &self,
        player_id: Uuid,
        buyer_team_id: Uuid,
        actor: &Actor,
    ) -> MarketResult<TransferReceipt> {
        let mut tx = self.store.begin().await?;

        match self.run(tx.as_mut(), player_id, buyer_team_id, actor).await {
            Ok(receipt) => {
                tx.commit().await?;
                Ok(receipt)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(player_id = %player_id, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        tx: &mut dyn MarketTransaction,
        player_id: Uuid,
        buyer_team_id: Uuid,
        actor: &Actor,
    ) -> MarketResult<TransferReceipt> {
        // Resolve
        let mut player = tx
            .lock_player(player_id)
            .await?
            .ok_or_else(|| MarketError::not_found(format!("Player not found: {}", player_id)))?;
        let seller_team_id = player.team_id();
        let (mut seller, mut buyer) = lock_teams(tx, seller_team_id, buyer_team_id).await?;

        // Validate
        if tx.listing_for(player_id).await?.is_none() {
            return Err(MarketError::NotListed(player_id));
        }
        if buyer.id() == seller.id() {
            return Err(MarketError::SelfPurchase);
        }
        policy::check(actor, &Resource::team(&buyer), Action::BuyInto)?;
        let price = player.asked_price();
        if !buyer.can_afford(price) {
            return Err(MarketError::InsufficientFunds {
                team_id: buyer.id(),
            });
        }
        debug!(player_id = %player_id, state = %TransferState::Validated, "Transfer validated");

        // Commit
        settle_transfer(&mut buyer, &mut seller, price)?;
        let appreciation_percent = self
            .appreciation
            .next_percent()
            .clamp(MIN_APPRECIATION_PERCENT, MAX_APPRECIATION_PERCENT);
        player.transfer_to(buyer.id(), appreciate(price, appreciation_percent));

        tx.save_player(&player).await?;
        tx.delete_listing(player_id).await?;
        ValuationService::revalue(tx, &mut seller).await?;
        ValuationService::revalue(tx, &mut buyer).await?;
        tx.save_team(&seller).await?;
        tx.save_team(&buyer).await?;

        let events = vec![
            TeamEvent::PlayerSold {
                team_id: seller.id(),
                player_id,
                price,
            },
            TeamEvent::PlayerBought {
                team_id: buyer.id(),
                player_id,
                price,
            },
        ];

        Ok(TransferReceipt {
            player,
            seller,
            buyer,
            price,
            appreciation_percent,
            events,
        })
    }
}

/// Locks seller and buyer in ascending id order; one lock when they coincide
async fn lock_teams(
    tx: &mut dyn MarketTransaction,
    seller_team_id: Uuid,
    buyer_team_id: Uuid,
) -> MarketResult<(Team, Team)> {
    if seller_team_id == buyer_team_id {
        let team = lock_team(tx, seller_team_id).await?;
        return Ok((team.clone(), team));
    }

    if seller_team_id < buyer_team_id {
        let seller = lock_team(tx, seller_team_id).await?;
        let buyer = lock_team(tx, buyer_team_id).await?;
        Ok((seller, buyer))
    } else {
        let buyer = lock_team(tx, buyer_team_id).await?;
        let seller = lock_team(tx, seller_team_id).await?;
        Ok((seller, buyer))
    }
}

async fn lock_team(tx: &mut dyn MarketTransaction, team_id: Uuid) -> MarketResult<Team> {
    tx.lock_team(team_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("Team not found: {}", team_id)))
}
