use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::locks::PlayerLocks;
use super::retry::RetryPolicy;
use super::valuation::ValuationService;
use crate::domain::error::{MarketError, MarketResult};
use crate::domain::player::{Player, Position};
use crate::domain::policy::{self, Action, Actor, Resource};
use crate::domain::repositories::{MarketStore, MarketTransaction};
use crate::domain::team::Team;

/// Administrator edits of a player's protected fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerAmendment {
    pub age: Option<i32>,
    pub position: Option<Position>,
    pub market_value: Option<Decimal>,
}

impl PlayerAmendment {
    pub fn is_empty(&self) -> bool {
        self.age.is_none() && self.position.is_none() && self.market_value.is_none()
    }
}

/// Administrator-only roster and ledger changes
///
/// Each change runs in one market transaction and re-runs valuation for
/// every team whose roster or member values it touched, so a team's value
/// always equals the sum over its roster. Player-scoped changes share the
/// per-player scope with the catalog and the transfer engine.
pub struct RosterAdmin {
    store: Arc<dyn MarketStore>,
    locks: Arc<PlayerLocks>,
    retry: RetryPolicy,
}

impl RosterAdmin {
    pub fn new(store: Arc<dyn MarketStore>, locks: Arc<PlayerLocks>, retry: RetryPolicy) -> Self {
        Self {
            store,
            locks,
            retry,
        }
    }

    /// Adds `player` to the roster of the team it names
    pub async fn create_player(&self, player: Player, actor: &Actor) -> MarketResult<Player> {
        let player_id = player.id();
        let created = self
            .execute(Some(player_id), &AddPlayer { player }, actor)
            .await?;
        info!(player_id = %player_id, team_id = %created.team_id(), actor = %actor.account_id, "Player created");
        Ok(created)
    }

    /// Deletes a player and its listing; returns the revalued former team
    pub async fn delete_player(&self, player_id: Uuid, actor: &Actor) -> MarketResult<Team> {
        let team = self
            .execute(Some(player_id), &RemovePlayer { player_id }, actor)
            .await?;
        info!(player_id = %player_id, team_id = %team.id(), actor = %actor.account_id, "Player deleted");
        Ok(team)
    }

    /// Deletes a team with its whole roster; returns how many players went with it
    pub async fn delete_team(&self, team_id: Uuid, actor: &Actor) -> MarketResult<usize> {
        let removed = self.execute(None, &RemoveTeam { team_id }, actor).await?;
        info!(team_id = %team_id, players = removed, actor = %actor.account_id, "Team deleted");
        Ok(removed)
    }

    pub async fn amend_player(
        &self,
        player_id: Uuid,
        amendment: PlayerAmendment,
        actor: &Actor,
    ) -> MarketResult<Player> {
        let player = self
            .execute(
                Some(player_id),
                &AmendPlayer {
                    player_id,
                    amendment,
                },
                actor,
            )
            .await?;
        info!(player_id = %player_id, amendment = ?amendment, actor = %actor.account_id, "Player amended");
        Ok(player)
    }

    /// Overrides a team's budget
    pub async fn set_budget(
        &self,
        team_id: Uuid,
        budget: Decimal,
        actor: &Actor,
    ) -> MarketResult<Team> {
        let team = self
            .execute(None, &SetBudget { team_id, budget }, actor)
            .await?;
        info!(team_id = %team_id, budget = %budget, actor = %actor.account_id, "Team budget set");
        Ok(team)
    }

    async fn execute<C: RosterChange>(
        &self,
        player_scope: Option<Uuid>,
        change: &C,
        actor: &Actor,
    ) -> MarketResult<C::Output> {
        let _scope = match player_scope {
            Some(player_id) => Some(self.locks.acquire(player_id).await?),
            None => None,
        };

        let mut attempt = 1;
        loop {
            match self.attempt(change, actor).await {
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    warn!(attempt, reason = %err, "Roster change hit a write conflict, retrying");
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn attempt<C: RosterChange>(&self, change: &C, actor: &Actor) -> MarketResult<C::Output> {
        let mut tx = self.store.begin().await?;

        match change.apply(tx.as_mut(), actor).await {
            Ok(output) => {
                tx.commit().await?;
                Ok(output)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
trait RosterChange: Send + Sync {
    type Output: Send;

    async fn apply(
        &self,
        tx: &mut dyn MarketTransaction,
        actor: &Actor,
    ) -> MarketResult<Self::Output>;
}

struct AddPlayer {
    player: Player,
}

struct RemovePlayer {
    player_id: Uuid,
}

struct RemoveTeam {
    team_id: Uuid,
}

struct AmendPlayer {
    player_id: Uuid,
    amendment: PlayerAmendment,
}

struct SetBudget {
    team_id: Uuid,
    budget: Decimal,
}

#[async_trait]
impl RosterChange for AddPlayer {
    type Output = Player;

    async fn apply(&self, tx: &mut dyn MarketTransaction, actor: &Actor) -> MarketResult<Player> {
        let mut team = lock_team(tx, self.player.team_id()).await?;
        policy::check(actor, &Resource::team(&team), Action::Create)?;

        tx.insert_player(&self.player).await?;
        ValuationService::revalue(tx, &mut team).await?;
        tx.save_team(&team).await?;
        Ok(self.player.clone())
    }
}

#[async_trait]
impl RosterChange for RemovePlayer {
    type Output = Team;

    async fn apply(&self, tx: &mut dyn MarketTransaction, actor: &Actor) -> MarketResult<Team> {
        let (player, mut team) = lock_player_and_team(tx, self.player_id).await?;
        policy::check(actor, &Resource::player(&player, &team), Action::Delete)?;

        tx.delete_listing(player.id()).await?;
        tx.delete_player(player.id()).await?;
        ValuationService::revalue(tx, &mut team).await?;
        tx.save_team(&team).await?;
        Ok(team)
    }
}

#[async_trait]
impl RosterChange for RemoveTeam {
    type Output = usize;

    async fn apply(&self, tx: &mut dyn MarketTransaction, actor: &Actor) -> MarketResult<usize> {
        let team = lock_team(tx, self.team_id).await?;
        policy::check(actor, &Resource::team(&team), Action::Delete)?;

        let roster = tx.roster(team.id()).await?;
        for player in &roster {
            tx.delete_listing(player.id()).await?;
            tx.delete_player(player.id()).await?;
        }
        tx.delete_team(team.id()).await?;
        Ok(roster.len())
    }
}

#[async_trait]
impl RosterChange for AmendPlayer {
    type Output = Player;

    async fn apply(&self, tx: &mut dyn MarketTransaction, actor: &Actor) -> MarketResult<Player> {
        let (mut player, mut team) = lock_player_and_team(tx, self.player_id).await?;
        policy::check(actor, &Resource::player(&player, &team), Action::Administer)?;

        let amendment = self.amendment;
        player.amend(amendment.age, amendment.position, amendment.market_value)?;
        tx.save_player(&player).await?;
        if amendment.market_value.is_some() {
            ValuationService::revalue(tx, &mut team).await?;
            tx.save_team(&team).await?;
        }
        Ok(player)
    }
}

#[async_trait]
impl RosterChange for SetBudget {
    type Output = Team;

    async fn apply(&self, tx: &mut dyn MarketTransaction, actor: &Actor) -> MarketResult<Team> {
        let mut team = lock_team(tx, self.team_id).await?;
        policy::check(actor, &Resource::team(&team), Action::Administer)?;

        team.set_budget(self.budget)?;
        tx.save_team(&team).await?;
        Ok(team)
    }
}

async fn lock_team(tx: &mut dyn MarketTransaction, team_id: Uuid) -> MarketResult<Team> {
    tx.lock_team(team_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("Team not found: {}", team_id)))
}

/// Player first, then its team: the order the transfer engine locks in
async fn lock_player_and_team(
    tx: &mut dyn MarketTransaction,
    player_id: Uuid,
) -> MarketResult<(Player, Team)> {
    let player = tx
        .lock_player(player_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("Player not found: {}", player_id)))?;
    let team = lock_team(tx, player.team_id()).await?;
    Ok((player, team))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::MarketListing;
    use crate::domain::repositories::{PlayerRepository, TeamRepository};
    use crate::domain::team::Country;
    use crate::infrastructure::repositories::InMemoryDatabase;
    use std::time::Duration;

    fn admin() -> Actor {
        Actor::admin(Uuid::new_v4())
    }

    async fn setup() -> (InMemoryDatabase, RosterAdmin, Team) {
        let db = InMemoryDatabase::new();
        let admin = RosterAdmin::new(
            Arc::new(db.clone()),
            Arc::new(PlayerLocks::new(Duration::from_secs(1))),
            RetryPolicy::default(),
        );
        let (team, _) =
            Team::new(Uuid::new_v4(), "Admin FC".to_string(), Country::new("ES").unwrap()).unwrap();
        db.create_with_roster(&team, &[]).await.unwrap();
        (db, admin, team)
    }

    fn player_on(team: &Team, last_name: &str) -> Player {
        Player::new(
            team.id(),
            "Pedri".to_string(),
            last_name.to_string(),
            Country::new("ES").unwrap(),
            21,
            Position::Midfielder,
        )
        .unwrap()
    }

    async fn stored_team(db: &InMemoryDatabase, id: Uuid) -> Option<Team> {
        TeamRepository::find_by_id(db, id).await.unwrap()
    }

    #[tokio::test]
    async fn created_player_joins_roster_value() {
        let (db, admin_service, team) = setup().await;

        admin_service
            .create_player(player_on(&team, "Gonzalez"), &admin())
            .await
            .unwrap();
        admin_service
            .create_player(player_on(&team, "Lopez"), &admin())
            .await
            .unwrap();

        let stored = stored_team(&db, team.id()).await.unwrap();
        assert_eq!(db.find_by_team(team.id()).await.unwrap().len(), 2);
        assert_eq!(stored.value(), Decimal::from(2_000_000));
        assert_eq!(stored.budget(), team.budget());
    }

    #[tokio::test]
    async fn owner_cannot_create_or_delete() {
        let (db, admin_service, team) = setup().await;
        let owner = Actor::user(team.owner_id());

        let err = admin_service
            .create_player(player_on(&team, "Gonzalez"), &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));

        let err = admin_service.delete_team(team.id(), &owner).await.unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));

        assert!(db.find_by_team(team.id()).await.unwrap().is_empty());
        assert!(stored_team(&db, team.id()).await.is_some());
    }

    #[tokio::test]
    async fn deleting_listed_player_drops_listing_and_revalues() {
        let (db, admin_service, team) = setup().await;
        let keep = admin_service
            .create_player(player_on(&team, "Keep"), &admin())
            .await
            .unwrap();
        let doomed = admin_service
            .create_player(player_on(&team, "Gone"), &admin())
            .await
            .unwrap();

        let mut tx = db.begin().await.unwrap();
        tx.insert_listing(&MarketListing::new(doomed.id())).await.unwrap();
        tx.commit().await.unwrap();

        let revalued = admin_service.delete_player(doomed.id(), &admin()).await.unwrap();

        assert_eq!(revalued.value(), keep.market_value());
        assert_eq!(stored_team(&db, team.id()).await.unwrap().value(), keep.market_value());
        assert_eq!(db.listing_count().await, 0);
        assert!(PlayerRepository::find_by_id(&db, doomed.id())
            .await
            .unwrap()
            .is_none());

        let err = admin_service.delete_player(doomed.id(), &admin()).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_team_removes_roster_and_listings() {
        let (db, admin_service, team) = setup().await;
        for name in ["One", "Two", "Three"] {
            let player = admin_service
                .create_player(player_on(&team, name), &admin())
                .await
                .unwrap();
            let mut tx = db.begin().await.unwrap();
            tx.insert_listing(&MarketListing::new(player.id())).await.unwrap();
            tx.commit().await.unwrap();
        }

        let removed = admin_service.delete_team(team.id(), &admin()).await.unwrap();

        assert_eq!(removed, 3);
        assert!(stored_team(&db, team.id()).await.is_none());
        assert!(PlayerRepository::list_all(&db).await.unwrap().is_empty());
        assert_eq!(db.listing_count().await, 0);
    }

    #[tokio::test]
    async fn market_value_amendment_revalues_team() {
        let (db, admin_service, team) = setup().await;
        let player = admin_service
            .create_player(player_on(&team, "Olmo"), &admin())
            .await
            .unwrap();

        let amended = admin_service
            .amend_player(
                player.id(),
                PlayerAmendment {
                    position: Some(Position::Attacker),
                    market_value: Some(Decimal::from(3_250_000)),
                    ..PlayerAmendment::default()
                },
                &admin(),
            )
            .await
            .unwrap();

        assert_eq!(amended.position(), Position::Attacker);
        assert_eq!(amended.age(), 21);
        assert_eq!(
            stored_team(&db, team.id()).await.unwrap().value(),
            Decimal::from(3_250_000)
        );

        let err = admin_service
            .amend_player(
                player.id(),
                PlayerAmendment {
                    age: Some(40),
                    ..PlayerAmendment::default()
                },
                &Actor::user(team.owner_id()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
    }

    #[tokio::test]
    async fn budget_override_is_validated() {
        let (db, admin_service, team) = setup().await;

        let err = admin_service
            .set_budget(team.id(), Decimal::from(-10), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        admin_service
            .set_budget(team.id(), Decimal::from(42), &admin())
            .await
            .unwrap();
        assert_eq!(stored_team(&db, team.id()).await.unwrap().budget(), Decimal::from(42));
    }
}
