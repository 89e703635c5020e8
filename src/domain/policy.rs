// Single authorisation point for every market operation.
// Administrators may do anything; everyone else only acts on teams they own
// and on players those teams own, and never creates, deletes, or changes
// the protected fields of either.

use crate::domain::error::{MarketError, MarketResult};
use crate::domain::player::Player;
use crate::domain::team::Team;
use std::fmt;
use uuid::Uuid;

/// The authenticated principal performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub account_id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(account_id: Uuid) -> Self {
        Self {
            account_id,
            is_admin: false,
        }
    }

    pub fn admin(account_id: Uuid) -> Self {
        Self {
            account_id,
            is_admin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    ListForSale,
    Delist,
    /// Spend a team's budget on a transfer
    BuyInto,
    Create,
    Delete,
    /// Change budget, market value, age, or position
    Administer,
}

impl Action {
    /// Actions reserved for administrators regardless of ownership
    pub fn is_admin_only(self) -> bool {
        matches!(self, Action::Create | Action::Delete | Action::Administer)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::View => "view",
            Action::Edit => "edit",
            Action::ListForSale => "put on the market list",
            Action::Delist => "remove from the market list",
            Action::BuyInto => "buy players for",
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Administer => "change protected fields of",
        };
        f.write_str(verb)
    }
}

/// What the action targets, reduced to the facts the policy needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Team { team_id: Uuid, owner_id: Uuid },
    Player { player_id: Uuid, owner_id: Uuid },
}

impl Resource {
    pub fn team(team: &Team) -> Self {
        Resource::Team {
            team_id: team.id(),
            owner_id: team.owner_id(),
        }
    }

    /// `team` must be the player's current owner
    pub fn player(player: &Player, team: &Team) -> Self {
        debug_assert_eq!(player.team_id(), team.id());
        Resource::Player {
            player_id: player.id(),
            owner_id: team.owner_id(),
        }
    }

    fn owner_id(&self) -> Uuid {
        match self {
            Resource::Team { owner_id, .. } | Resource::Player { owner_id, .. } => *owner_id,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Team { team_id, .. } => write!(f, "team {}", team_id),
            Resource::Player { player_id, .. } => write!(f, "player {}", player_id),
        }
    }
}

/// Evaluates whether `actor` may perform `action` on `resource`
///
/// # Example
/// ```
/// use transfer_market_api::domain::policy::{check, Action, Actor, Resource};
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let team = Resource::Team { team_id: Uuid::new_v4(), owner_id: owner };
///
/// assert!(check(&Actor::user(owner), &team, Action::Edit).is_ok());
/// assert!(check(&Actor::user(Uuid::new_v4()), &team, Action::Edit).is_err());
/// assert!(check(&Actor::admin(Uuid::new_v4()), &team, Action::Edit).is_ok());
/// ```
pub fn check(actor: &Actor, resource: &Resource, action: Action) -> MarketResult<()> {
    if actor.is_admin {
        return Ok(());
    }
    if action.is_admin_only() {
        return Err(MarketError::forbidden(format!(
            "You don't have permission to {} {}",
            action, resource
        )));
    }
    if resource.owner_id() == actor.account_id {
        return Ok(());
    }

    Err(MarketError::forbidden(format!(
        "You can't {} {} you don't own",
        action, resource
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_list_own_player() {
        let owner = Uuid::new_v4();
        let resource = Resource::Player {
            player_id: Uuid::new_v4(),
            owner_id: owner,
        };
        assert!(check(&Actor::user(owner), &resource, Action::ListForSale).is_ok());
    }

    #[test]
    fn stranger_is_forbidden_with_reason() {
        let resource = Resource::Player {
            player_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
        };
        let err = check(&Actor::user(Uuid::new_v4()), &resource, Action::Delist).unwrap_err();

        match err {
            MarketError::Forbidden(msg) => assert!(msg.contains("remove from the market list")),
            other => panic!("Expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn admin_bypasses_ownership() {
        let resource = Resource::Team {
            team_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
        };
        for action in [
            Action::View,
            Action::Edit,
            Action::ListForSale,
            Action::Delist,
            Action::BuyInto,
            Action::Create,
            Action::Delete,
            Action::Administer,
        ] {
            assert!(check(&Actor::admin(Uuid::new_v4()), &resource, action).is_ok());
        }
    }

    #[test]
    fn owners_cannot_delete_or_administer() {
        let owner = Uuid::new_v4();
        let resource = Resource::Team {
            team_id: Uuid::new_v4(),
            owner_id: owner,
        };
        for action in [Action::Create, Action::Delete, Action::Administer] {
            match check(&Actor::user(owner), &resource, action) {
                Err(MarketError::Forbidden(msg)) => {
                    assert!(msg.starts_with("You don't have permission"))
                }
                other => panic!("Expected Forbidden for {:?}, got {:?}", action, other),
            }
        }
    }
}
