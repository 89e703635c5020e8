use super::events::TeamEvent;
use super::value_objects::Country;
use crate::domain::error::{MarketError, MarketResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Budget every newly provisioned team starts with
pub const INITIAL_BUDGET: i64 = 5_000_000;

/// Team aggregate root
///
/// A team is owned by exactly one account and holds the budget ledger
/// used to settle transfers.
///
/// # Invariants
/// - Name cannot be empty
/// - Budget is never negative
/// - Value equals the sum of `market_value` over the current roster; it is
///   only ever written by the valuation step
///
/// # Example
/// ```
/// use transfer_market_api::domain::team::{Team, value_objects::Country};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let (team, events) = Team::new(
///     Uuid::new_v4(),
///     "John's Team".to_string(),
///     Country::new("BR").unwrap(),
/// ).expect("valid team");
///
/// assert_eq!(team.budget(), Decimal::from(5_000_000));
/// assert_eq!(team.value(), Decimal::ZERO);
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    country: Country,
    pub(super) budget: Decimal,
    value: Decimal,
    created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a new Team aggregate with the initial budget
    ///
    /// # Returns
    /// * `Ok((Team, Vec<TeamEvent>))` - New team and a `Created` event
    /// * `Err(MarketError::Validation)` - If the name is empty
    pub fn new(
        owner_id: Uuid,
        name: String,
        country: Country,
    ) -> MarketResult<(Self, Vec<TeamEvent>)> {
        Self::validate_name(&name)?;

        let team = Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            country,
            budget: Decimal::from(INITIAL_BUDGET),
            value: Decimal::ZERO,
            created_at: Utc::now(),
        };

        let events = vec![TeamEvent::Created {
            team_id: team.id,
            owner_id: team.owner_id,
            name: team.name.clone(),
        }];

        Ok((team, events))
    }

    fn validate_name(name: &str) -> MarketResult<()> {
        if name.trim().is_empty() {
            return Err(MarketError::validation("Team name cannot be empty"));
        }
        if name.chars().count() > 100 {
            return Err(MarketError::validation(
                "Team name cannot exceed 100 characters",
            ));
        }
        Ok(())
    }

    pub fn rename(&mut self, name: String) -> MarketResult<()> {
        Self::validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn set_country(&mut self, country: Country) {
        self.country = country;
    }

    /// Administrator override of the budget ledger
    pub(crate) fn set_budget(&mut self, budget: Decimal) -> MarketResult<()> {
        if budget < Decimal::ZERO {
            return Err(MarketError::validation("Budget cannot be negative"));
        }
        self.budget = budget;
        Ok(())
    }

    /// Stores a freshly recomputed roster valuation
    pub(crate) fn set_value(&mut self, value: Decimal) {
        self.value = value;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> &Country {
        &self.country
    }

    pub fn budget(&self) -> Decimal {
        self.budget
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Only to be used by repository implementations.
    pub fn from_persistence(
        id: Uuid,
        owner_id: Uuid,
        name: String,
        country: Country,
        budget: Decimal,
        value: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name,
            country,
            budget,
            value,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country() -> Country {
        Country::new("BR").unwrap()
    }

    #[test]
    fn create_team_with_valid_name() {
        let owner_id = Uuid::new_v4();
        let (team, events) = Team::new(owner_id, "Test FC".to_string(), country()).unwrap();

        assert_eq!(team.name(), "Test FC");
        assert_eq!(team.owner_id(), owner_id);
        assert_eq!(team.budget(), Decimal::from(INITIAL_BUDGET));
        assert_eq!(team.value(), Decimal::ZERO);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].team_id(), team.id());
    }

    #[test]
    fn create_team_with_blank_name_fails() {
        let result = Team::new(Uuid::new_v4(), "   ".to_string(), country());
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[test]
    fn rename_rejects_long_names() {
        let (mut team, _) = Team::new(Uuid::new_v4(), "Short".to_string(), country()).unwrap();

        assert!(team.rename("x".repeat(101)).is_err());
        assert_eq!(team.name(), "Short");

        team.rename("Renamed".to_string()).unwrap();
        assert_eq!(team.name(), "Renamed");
    }

    #[test]
    fn budget_override_must_be_non_negative() {
        let (mut team, _) = Team::new(Uuid::new_v4(), "Ledger".to_string(), country()).unwrap();

        assert!(team.set_budget(Decimal::from(-1)).is_err());
        assert_eq!(team.budget(), Decimal::from(INITIAL_BUDGET));

        team.set_budget(Decimal::ZERO).unwrap();
        assert_eq!(team.budget(), Decimal::ZERO);
    }

    #[test]
    fn from_persistence_round_trips_fields() {
        let (team, _) = Team::new(Uuid::new_v4(), "Stored".to_string(), country()).unwrap();
        let restored = Team::from_persistence(
            team.id(),
            team.owner_id(),
            team.name().to_string(),
            team.country().clone(),
            team.budget(),
            team.value(),
            team.created_at(),
        );
        assert_eq!(restored, team);
    }
}
