//! Market core tests against the in-memory store
//!
//! Covers listing, buying, budget conservation, valuation consistency,
//! and concurrent buyers racing for one player.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use transfer_market_api::domain::error::MarketError;
use transfer_market_api::domain::player::{Player, Position};
use transfer_market_api::domain::policy::Actor;
use transfer_market_api::domain::repositories::{MarketStore, PlayerRepository, TeamRepository};
use transfer_market_api::domain::team::{Country, Team};
use transfer_market_api::infrastructure::repositories::InMemoryDatabase;
use transfer_market_api::services::{
    AppreciationSource, MarketCatalog, PlayerLocks, RetryPolicy, SeededAppreciation,
    SequenceAppreciation, TransferEngine, ValuationService,
};

struct Market {
    db: InMemoryDatabase,
    catalog: MarketCatalog,
    engine: Arc<TransferEngine>,
}

fn market_with(appreciation: Arc<dyn AppreciationSource>, max_attempts: u32) -> Market {
    let db = InMemoryDatabase::new();
    let store: Arc<dyn MarketStore> = Arc::new(db.clone());
    let locks = Arc::new(PlayerLocks::new(Duration::from_secs(5)));
    let retry = RetryPolicy::new(max_attempts);

    Market {
        catalog: MarketCatalog::new(store.clone(), locks.clone(), retry),
        engine: Arc::new(TransferEngine::new(store, locks, appreciation, retry)),
        db,
    }
}

fn market() -> Market {
    market_with(Arc::new(SeededAppreciation::new(7)), 3)
}

async fn team_with_budget(db: &InMemoryDatabase, budget: i64) -> (Team, Actor) {
    let owner = Uuid::new_v4();
    let team = Team::from_persistence(
        Uuid::new_v4(),
        owner,
        "Test FC".to_string(),
        Country::new("GB").unwrap(),
        Decimal::from(budget),
        Decimal::ZERO,
        Utc::now(),
    );
    db.create_with_roster(&team, &[]).await.unwrap();
    (team, Actor::user(owner))
}

async fn player_for(db: &InMemoryDatabase, team: &Team) -> Player {
    let player = Player::new(
        team.id(),
        "Bukayo".to_string(),
        "Saka".to_string(),
        Country::new("GB").unwrap(),
        22,
        Position::Attacker,
    )
    .unwrap();
    db.put_player(player.clone()).await;
    player
}

async fn team(db: &InMemoryDatabase, id: Uuid) -> Team {
    TeamRepository::find_by_id(db, id).await.unwrap().unwrap()
}

async fn player(db: &InMemoryDatabase, id: Uuid) -> Player {
    PlayerRepository::find_by_id(db, id).await.unwrap().unwrap()
}

async fn roster_value(db: &InMemoryDatabase, team_id: Uuid) -> Decimal {
    let roster = db.find_by_team(team_id).await.unwrap();
    ValuationService::recompute(&roster)
}

#[tokio::test]
async fn concrete_transfer_scenario() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 1_000_000).await;
    let (buyer, buyer_actor) = team_with_budget(&m.db, 500_000).await;
    let listed = player_for(&m.db, &seller).await;

    m.catalog
        .add(listed.id(), Decimal::from(100_000), &seller_actor)
        .await
        .unwrap();

    let receipt = m
        .engine
        .buy(listed.id(), buyer.id(), &buyer_actor)
        .await
        .unwrap();

    assert_eq!(team(&m.db, buyer.id()).await.budget(), Decimal::from(400_000));
    assert_eq!(team(&m.db, seller.id()).await.budget(), Decimal::from(1_100_000));

    let bought = player(&m.db, listed.id()).await;
    assert_eq!(bought.team_id(), buyer.id());
    assert_eq!(bought.asked_price(), Decimal::ZERO);
    assert!(bought.market_value() >= Decimal::from(110_000));
    assert!(bought.market_value() <= Decimal::from(199_000));
    assert_eq!(bought, receipt.player);

    assert!(!m.catalog.contains(listed.id()).await.unwrap());
    assert_eq!(receipt.events.len(), 2);
}

#[tokio::test]
async fn appreciation_bounds_are_exact() {
    for (percent, expected) in [(10, 110_000), (99, 199_000)] {
        let m = market_with(Arc::new(SequenceAppreciation::constant(percent)), 3);
        let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
        let (buyer, buyer_actor) = team_with_budget(&m.db, 100_000).await;
        let listed = player_for(&m.db, &seller).await;

        m.catalog
            .add(listed.id(), Decimal::from(100_000), &seller_actor)
            .await
            .unwrap();
        let receipt = m
            .engine
            .buy(listed.id(), buyer.id(), &buyer_actor)
            .await
            .unwrap();

        assert_eq!(receipt.appreciation_percent, percent);
        assert_eq!(receipt.player.market_value(), Decimal::from(expected));
        assert_eq!(team(&m.db, buyer.id()).await.budget(), Decimal::ZERO);
    }
}

#[tokio::test]
async fn budgets_are_conserved_and_values_recomputed() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 2_000_000).await;
    let (buyer, buyer_actor) = team_with_budget(&m.db, 3_000_000).await;
    let listed = player_for(&m.db, &seller).await;
    let kept = player_for(&m.db, &seller).await;
    player_for(&m.db, &buyer).await;

    m.catalog
        .add(listed.id(), Decimal::new(1_234_567, 2), &seller_actor)
        .await
        .unwrap();
    m.engine
        .buy(listed.id(), buyer.id(), &buyer_actor)
        .await
        .unwrap();

    let seller_after = team(&m.db, seller.id()).await;
    let buyer_after = team(&m.db, buyer.id()).await;

    assert_eq!(
        seller_after.budget() + buyer_after.budget(),
        seller.budget() + buyer.budget()
    );
    assert_eq!(
        seller_after.budget() - seller.budget(),
        Decimal::new(1_234_567, 2)
    );

    assert_eq!(seller_after.value(), roster_value(&m.db, seller.id()).await);
    assert_eq!(seller_after.value(), kept.market_value());
    assert_eq!(buyer_after.value(), roster_value(&m.db, buyer.id()).await);
}

#[tokio::test]
async fn second_buy_without_relisting_is_not_listed() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let (buyer, buyer_actor) = team_with_budget(&m.db, 1_000_000).await;
    let (other, other_actor) = team_with_budget(&m.db, 1_000_000).await;
    let listed = player_for(&m.db, &seller).await;

    m.catalog
        .add(listed.id(), Decimal::from(10), &seller_actor)
        .await
        .unwrap();
    m.engine
        .buy(listed.id(), buyer.id(), &buyer_actor)
        .await
        .unwrap();

    let err = m
        .engine
        .buy(listed.id(), other.id(), &other_actor)
        .await
        .unwrap_err();
    assert_eq!(err, MarketError::NotListed(listed.id()));
    assert_eq!(team(&m.db, other.id()).await.budget(), Decimal::from(1_000_000));
}

#[tokio::test]
async fn self_purchase_leaves_state_unchanged() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 1_000_000).await;
    let listed = player_for(&m.db, &seller).await;
    m.catalog
        .add(listed.id(), Decimal::from(100), &seller_actor)
        .await
        .unwrap();

    let err = m
        .engine
        .buy(listed.id(), seller.id(), &seller_actor)
        .await
        .unwrap_err();

    assert_eq!(err, MarketError::SelfPurchase);
    assert!(m.catalog.contains(listed.id()).await.unwrap());
    assert_eq!(team(&m.db, seller.id()).await, seller);
}

#[tokio::test]
async fn insufficient_funds_leaves_state_unchanged() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let (buyer, buyer_actor) = team_with_budget(&m.db, 99_999).await;
    let listed = player_for(&m.db, &seller).await;
    m.catalog
        .add(listed.id(), Decimal::from(100_000), &seller_actor)
        .await
        .unwrap();

    let err = m
        .engine
        .buy(listed.id(), buyer.id(), &buyer_actor)
        .await
        .unwrap_err();

    assert_eq!(err, MarketError::InsufficientFunds { team_id: buyer.id() });
    assert_eq!(player(&m.db, listed.id()).await.team_id(), seller.id());
    assert_eq!(team(&m.db, buyer.id()).await.budget(), Decimal::from(99_999));
    assert!(m.catalog.contains(listed.id()).await.unwrap());
}

#[tokio::test]
async fn buying_for_someone_elses_team_is_forbidden() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let (buyer, _) = team_with_budget(&m.db, 1_000_000).await;
    let (_, stranger) = team_with_budget(&m.db, 1_000_000).await;
    let listed = player_for(&m.db, &seller).await;
    m.catalog
        .add(listed.id(), Decimal::from(100), &seller_actor)
        .await
        .unwrap();

    let err = m
        .engine
        .buy(listed.id(), buyer.id(), &stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Forbidden(_)));

    // Administrators may buy on any team's behalf
    let admin = Actor::admin(Uuid::new_v4());
    m.engine.buy(listed.id(), buyer.id(), &admin).await.unwrap();
    assert_eq!(player(&m.db, listed.id()).await.team_id(), buyer.id());
}

#[tokio::test]
async fn not_listed_is_checked_before_self_purchase() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let unlisted = player_for(&m.db, &seller).await;

    let err = m
        .engine
        .buy(unlisted.id(), seller.id(), &seller_actor)
        .await
        .unwrap_err();
    assert_eq!(err, MarketError::NotListed(unlisted.id()));
}

#[tokio::test]
async fn add_is_idempotent_and_keeps_price() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let listed = player_for(&m.db, &seller).await;

    let first = m
        .catalog
        .add(listed.id(), Decimal::from(500), &seller_actor)
        .await
        .unwrap();
    let second = m
        .catalog
        .add(listed.id(), Decimal::from(900), &seller_actor)
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.listing, second.listing);
    assert_eq!(m.db.listing_count().await, 1);
    assert_eq!(player(&m.db, listed.id()).await.asked_price(), Decimal::from(500));

    let err = m
        .catalog
        .create(listed.id(), Decimal::from(900), &seller_actor)
        .await
        .unwrap_err();
    assert_eq!(err, MarketError::AlreadyListed(listed.id()));
}

#[tokio::test]
async fn failed_rollback_does_not_break_idempotent_add() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let listed = player_for(&m.db, &seller).await;

    let first = m
        .catalog
        .add(listed.id(), Decimal::from(500), &seller_actor)
        .await
        .unwrap();

    m.db.inject_rollback_failures(1);
    let second = m
        .catalog
        .add(listed.id(), Decimal::from(900), &seller_actor)
        .await
        .unwrap();

    assert!(!second.created);
    assert_eq!(second.listing, first.listing);
    assert_eq!(m.db.listing_count().await, 1);
    assert_eq!(player(&m.db, listed.id()).await.asked_price(), Decimal::from(500));
}

#[tokio::test]
async fn listing_rules() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let (_, stranger) = team_with_budget(&m.db, 0).await;
    let listed = player_for(&m.db, &seller).await;

    let err = m
        .catalog
        .add(listed.id(), Decimal::from(-1), &seller_actor)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Validation(_)));

    let err = m
        .catalog
        .add(listed.id(), Decimal::from(1), &stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Forbidden(_)));
    assert_eq!(m.db.listing_count().await, 0);
}

#[tokio::test]
async fn delist_and_remove_are_idempotent() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let listed = player_for(&m.db, &seller).await;
    m.catalog
        .add(listed.id(), Decimal::from(500), &seller_actor)
        .await
        .unwrap();

    assert!(m.catalog.delist(listed.id(), &seller_actor).await.unwrap());
    assert!(!m.catalog.delist(listed.id(), &seller_actor).await.unwrap());
    assert_eq!(player(&m.db, listed.id()).await.asked_price(), Decimal::ZERO);

    m.catalog
        .add(listed.id(), Decimal::from(500), &seller_actor)
        .await
        .unwrap();
    assert!(m.catalog.remove(listed.id()).await.unwrap());
    assert!(!m.catalog.remove(listed.id()).await.unwrap());
    assert!(!m.catalog.contains(listed.id()).await.unwrap());
}

#[tokio::test]
async fn concurrent_buyers_yield_exactly_one_winner() {
    const BUYERS: usize = 8;

    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let listed = player_for(&m.db, &seller).await;
    m.catalog
        .add(listed.id(), Decimal::from(250_000), &seller_actor)
        .await
        .unwrap();

    let mut buyers = Vec::new();
    for _ in 0..BUYERS {
        buyers.push(team_with_budget(&m.db, 1_000_000).await);
    }

    let handles: Vec<_> = buyers
        .iter()
        .map(|(team, actor)| {
            let engine = m.engine.clone();
            let (team_id, actor, player_id) = (team.id(), *actor, listed.id());
            tokio::spawn(async move { engine.buy(player_id, team_id, &actor).await })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => winners.push(receipt.buyer.id()),
            Err(MarketError::NotListed(_)) | Err(MarketError::Conflict(_)) => {}
            Err(other) => panic!("Unexpected rejection: {:?}", other),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(player(&m.db, listed.id()).await.team_id(), winners[0]);

    let mut total = team(&m.db, seller.id()).await.budget();
    for (buyer, _) in &buyers {
        total += team(&m.db, buyer.id()).await.budget();
    }
    assert_eq!(total, Decimal::from(1_000_000 * BUYERS as i64));
    assert_eq!(team(&m.db, seller.id()).await.budget(), Decimal::from(250_000));
}

#[tokio::test]
async fn engines_without_shared_locks_still_serialize_on_commit() {
    // Two engines model two processes: only the store arbitrates
    let db = InMemoryDatabase::new();
    let store: Arc<dyn MarketStore> = Arc::new(db.clone());
    let engine = |seed| {
        Arc::new(TransferEngine::new(
            store.clone(),
            Arc::new(PlayerLocks::new(Duration::from_secs(5))),
            Arc::new(SeededAppreciation::new(seed)),
            RetryPolicy::new(5),
        ))
    };
    let engines = [engine(1), engine(2)];
    let catalog = MarketCatalog::new(
        store.clone(),
        Arc::new(PlayerLocks::new(Duration::from_secs(5))),
        RetryPolicy::default(),
    );

    let (seller, seller_actor) = team_with_budget(&db, 0).await;
    let listed = player_for(&db, &seller).await;
    catalog
        .add(listed.id(), Decimal::from(1_000), &seller_actor)
        .await
        .unwrap();

    let mut handles = Vec::new();
    let mut buyer_ids = Vec::new();
    for i in 0..6 {
        let (buyer, actor) = team_with_budget(&db, 5_000).await;
        buyer_ids.push(buyer.id());
        let engine = engines[i % 2].clone();
        let player_id = listed.id();
        handles.push(tokio::spawn(async move {
            engine.buy(player_id, buyer.id(), &actor).await
        }));
    }

    let committed = count_commits(handles).await;
    assert_eq!(committed, 1);

    let mut total = team(&db, seller.id()).await.budget();
    for id in buyer_ids {
        total += team(&db, id).await.budget();
    }
    assert_eq!(total, Decimal::from(6 * 5_000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn team_buying_and_selling_concurrently_loses_no_budget() {
    const PARTNERS: usize = 8;

    // Every loss to a concurrent commit means another transfer committed,
    // so PARTNERS * 2 attempts always suffice.
    let m = market_with(Arc::new(SeededAppreciation::new(11)), (PARTNERS * 2) as u32 + 1);
    let (hub, hub_actor) = team_with_budget(&m.db, 10_000_000).await;

    let mut partners = Vec::new();
    let mut transfers = Vec::new();
    for i in 0..PARTNERS {
        let (partner, partner_actor) = team_with_budget(&m.db, 1_000_000).await;

        let outbound = player_for(&m.db, &partner).await;
        m.catalog
            .add(outbound.id(), Decimal::from(100_000 + i as i64 * 1_000), &partner_actor)
            .await
            .unwrap();
        transfers.push((outbound.id(), hub.id(), hub_actor));

        let inbound = player_for(&m.db, &hub).await;
        m.catalog
            .add(inbound.id(), Decimal::from(50_000 + i as i64 * 500), &hub_actor)
            .await
            .unwrap();
        transfers.push((inbound.id(), partner.id(), partner_actor));

        partners.push(partner);
    }

    let mut all_teams = vec![hub.id()];
    all_teams.extend(partners.iter().map(|t| t.id()));

    let mut expected = std::collections::HashMap::new();
    let mut total_before = Decimal::ZERO;
    for id in &all_teams {
        let budget = team(&m.db, *id).await.budget();
        total_before += budget;
        expected.insert(*id, budget);
    }

    let handles: Vec<_> = transfers
        .into_iter()
        .map(|(player_id, buyer_id, actor)| {
            let engine = m.engine.clone();
            tokio::spawn(async move { engine.buy(player_id, buyer_id, &actor).await })
        })
        .collect();

    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        *expected.get_mut(&receipt.buyer.id()).unwrap() -= receipt.price;
        *expected.get_mut(&receipt.seller.id()).unwrap() += receipt.price;
    }

    let mut total_after = Decimal::ZERO;
    for id in &all_teams {
        let stored = team(&m.db, *id).await;
        assert_eq!(stored.budget(), expected[id], "budget of team {}", id);
        assert_eq!(stored.value(), roster_value(&m.db, *id).await, "value of team {}", id);
        total_after += stored.budget();
    }
    assert_eq!(total_after, total_before);

    assert_eq!(m.db.find_by_team(hub.id()).await.unwrap().len(), PARTNERS);
    for partner in &partners {
        assert_eq!(m.db.find_by_team(partner.id()).await.unwrap().len(), 1);
    }
    assert_eq!(m.db.listing_count().await, 0);
}

async fn count_commits(
    handles: Vec<tokio::task::JoinHandle<Result<transfer_market_api::services::TransferReceipt, MarketError>>>,
) -> usize {
    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(MarketError::NotListed(_)) | Err(MarketError::Conflict(_)) => {}
            Err(other) => panic!("Unexpected rejection: {:?}", other),
        }
    }
    committed
}

#[tokio::test]
async fn transient_conflicts_are_retried() {
    let m = market_with(Arc::new(SequenceAppreciation::constant(50)), 3);
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let (buyer, buyer_actor) = team_with_budget(&m.db, 1_000).await;
    let listed = player_for(&m.db, &seller).await;
    m.catalog
        .add(listed.id(), Decimal::from(1_000), &seller_actor)
        .await
        .unwrap();

    m.db.inject_conflicts(2);
    let receipt = m
        .engine
        .buy(listed.id(), buyer.id(), &buyer_actor)
        .await
        .unwrap();

    assert_eq!(receipt.player.market_value(), Decimal::from(1_500));
    assert_eq!(team(&m.db, buyer.id()).await.budget(), Decimal::ZERO);
}

#[tokio::test]
async fn exhausted_retries_surface_conflict_without_writes() {
    let m = market_with(Arc::new(SequenceAppreciation::constant(50)), 3);
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let (buyer, buyer_actor) = team_with_budget(&m.db, 1_000).await;
    let listed = player_for(&m.db, &seller).await;
    m.catalog
        .add(listed.id(), Decimal::from(1_000), &seller_actor)
        .await
        .unwrap();

    m.db.inject_conflicts(3);
    let err = m
        .engine
        .buy(listed.id(), buyer.id(), &buyer_actor)
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::Conflict(_)));
    assert_eq!(player(&m.db, listed.id()).await.team_id(), seller.id());
    assert_eq!(team(&m.db, buyer.id()).await.budget(), Decimal::from(1_000));
    assert!(m.catalog.contains(listed.id()).await.unwrap());
}

#[tokio::test]
async fn failure_mid_commit_applies_nothing() {
    let m = market();
    let (seller, seller_actor) = team_with_budget(&m.db, 0).await;
    let (buyer, buyer_actor) = team_with_budget(&m.db, 1_000).await;
    let listed = player_for(&m.db, &seller).await;
    m.catalog
        .add(listed.id(), Decimal::from(600), &seller_actor)
        .await
        .unwrap();

    m.db.inject_failures(1);
    let err = m
        .engine
        .buy(listed.id(), buyer.id(), &buyer_actor)
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::Storage(_)));
    assert_eq!(team(&m.db, seller.id()).await.budget(), Decimal::ZERO);
    assert_eq!(team(&m.db, buyer.id()).await.budget(), Decimal::from(1_000));
    assert_eq!(player(&m.db, listed.id()).await.asked_price(), Decimal::from(600));
    assert!(m.catalog.contains(listed.id()).await.unwrap());
}
