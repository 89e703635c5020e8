use rust_decimal::Decimal;
use uuid::Uuid;

/// Domain events that occur within the Team aggregate
///
/// Returned by the operations that produce them; callers decide where
/// they go (logs, audit, downstream consumers).
///
/// # Example
/// ```
/// use transfer_market_api::domain::team::events::TeamEvent;
/// use uuid::Uuid;
///
/// let event = TeamEvent::Created {
///     team_id: Uuid::new_v4(),
///     owner_id: Uuid::new_v4(),
///     name: "John's Team".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TeamEvent {
    /// Fired when a team is created
    Created {
        team_id: Uuid,
        owner_id: Uuid,
        name: String,
    },
    /// Fired when a team's roster is first populated
    RosterProvisioned { team_id: Uuid, players: usize },
    /// Fired on the selling side of a committed transfer
    PlayerSold {
        team_id: Uuid,
        player_id: Uuid,
        price: Decimal,
    },
    /// Fired on the buying side of a committed transfer
    PlayerBought {
        team_id: Uuid,
        player_id: Uuid,
        price: Decimal,
    },
}

impl TeamEvent {
    /// Returns the team_id for this event
    pub fn team_id(&self) -> Uuid {
        match self {
            TeamEvent::Created { team_id, .. } => *team_id,
            TeamEvent::RosterProvisioned { team_id, .. } => *team_id,
            TeamEvent::PlayerSold { team_id, .. } => *team_id,
            TeamEvent::PlayerBought { team_id, .. } => *team_id,
        }
    }
}
