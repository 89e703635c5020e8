use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use super::valuation::ValuationService;
use crate::domain::account::AccountEvent;
use crate::domain::error::{MarketError, MarketResult, StoreError};
use crate::domain::player::{Player, Position};
use crate::domain::repositories::TeamRepository;
use crate::domain::team::{Country, Team, TeamEvent};

/// Players per position on a freshly provisioned roster
pub const TEAM_COMPOSITION: [(Position, usize); 4] = [
    (Position::Goalkeeper, 3),
    (Position::Defender, 6),
    (Position::Midfielder, 6),
    (Position::Attacker, 5),
];

pub const MIN_PLAYER_AGE: i32 = 18;
pub const MAX_PLAYER_AGE: i32 = 40;

const COUNTRIES: &[&str] = &[
    "AR", "BE", "BR", "CM", "CO", "HR", "DK", "GB", "FR", "DE", "GH", "IT", "JP", "MA", "MX",
    "NL", "NG", "PL", "PT", "SN", "ES", "SE", "CH", "UY", "US",
];

const FIRST_NAMES: &[&str] = &[
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph", "Thomas",
    "Charles", "Daniel", "Matthew", "Anthony", "Mark", "Paul", "Steven", "Andrew", "Kevin",
    "Brian", "George", "Edward", "Ronald", "Timothy", "Jason", "Jeffrey", "Ryan", "Jacob",
    "Gary", "Nicholas", "Eric",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson",
];

/// Creates a team and starting roster for accounts that log in without one
///
/// Driven explicitly by `AccountEvent`s handed over by the login flow.
pub struct TeamProvisioning {
    teams: Arc<dyn TeamRepository>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl TeamProvisioning {
    /// Provisioning seeded from OS entropy
    pub fn new(teams: Arc<dyn TeamRepository>) -> Self {
        Self::with_rng(teams, Box::new(StdRng::from_entropy()))
    }

    pub fn with_rng(teams: Arc<dyn TeamRepository>, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            teams,
            rng: Mutex::new(rng),
        }
    }

    /// Reacts to an account event, returning the account's team
    pub async fn handle(&self, event: &AccountEvent) -> MarketResult<Team> {
        match event {
            AccountEvent::LoggedIn {
                account_id,
                first_name,
                ..
            } => self.ensure_team(*account_id, first_name).await,
        }
    }

    /// Returns the owner's team, creating it with a generated roster if missing
    pub async fn ensure_team(&self, owner_id: Uuid, first_name: &str) -> MarketResult<Team> {
        if let Some(team) = self.teams.find_by_owner(owner_id).await? {
            return Ok(team);
        }

        let (team, roster, events) = self.generate(owner_id, first_name)?;

        match self.teams.create_with_roster(&team, &roster).await {
            Ok(()) => {
                for event in &events {
                    info!(team_id = %event.team_id(), owner_id = %owner_id, event = ?event, "Team provisioned");
                }
                Ok(team)
            }
            // Another login for the same account won the race.
            Err(StoreError::Conflict(_)) => self
                .teams
                .find_by_owner(owner_id)
                .await?
                .ok_or_else(|| MarketError::Conflict(format!(
                    "team provisioning for account {} conflicted",
                    owner_id
                ))),
            Err(err) => Err(err.into()),
        }
    }

    fn generate(
        &self,
        owner_id: Uuid,
        first_name: &str,
    ) -> MarketResult<(Team, Vec<Player>, Vec<TeamEvent>)> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let (mut team, mut events) = Team::new(
            owner_id,
            format!("{}'s Team", first_name),
            random_country(&mut *rng)?,
        )?;

        let mut roster = Vec::with_capacity(TEAM_COMPOSITION.iter().map(|(_, n)| n).sum());
        for (position, count) in TEAM_COMPOSITION {
            for _ in 0..count {
                roster.push(Player::new(
                    team.id(),
                    pick(&mut *rng, FIRST_NAMES).to_string(),
                    pick(&mut *rng, LAST_NAMES).to_string(),
                    random_country(&mut *rng)?,
                    rng.gen_range(MIN_PLAYER_AGE..=MAX_PLAYER_AGE),
                    position,
                )?);
            }
        }

        team.set_value(ValuationService::recompute(&roster));
        events.push(TeamEvent::RosterProvisioned {
            team_id: team.id(),
            players: roster.len(),
        });

        Ok((team, roster, events))
    }
}

fn pick<'a>(rng: &mut dyn RngCore, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or("Unnamed")
}

fn random_country(rng: &mut dyn RngCore) -> MarketResult<Country> {
    Country::new(pick(rng, COUNTRIES)).map_err(MarketError::Validation)
}
