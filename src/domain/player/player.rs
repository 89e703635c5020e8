use super::value_objects::Position;
use crate::domain::error::{MarketError, MarketResult};
use crate::domain::team::value_objects::Country;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Market value assigned to freshly generated players
pub const DEFAULT_MARKET_VALUE: i64 = 1_000_000;

/// Player entity
///
/// A player is a tradable asset owned by exactly one team at all times.
///
/// # Invariants
/// - `market_value >= 0` and `asked_price >= 0`
/// - `age >= 0`
/// - `team_id` only changes through a committed transfer
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    id: Uuid,
    team_id: Uuid,
    first_name: String,
    last_name: String,
    country: Country,
    age: i32,
    position: Position,
    market_value: Decimal,
    asked_price: Decimal,
    created_at: DateTime<Utc>,
}

impl Player {
    /// Creates a new player on `team_id` with the default market value
    ///
    /// # Example
    /// ```
    /// use transfer_market_api::domain::player::{Player, Position};
    /// use transfer_market_api::domain::team::Country;
    /// use uuid::Uuid;
    ///
    /// let player = Player::new(
    ///     Uuid::new_v4(),
    ///     "Marta".to_string(),
    ///     "Silva".to_string(),
    ///     Country::new("BR").unwrap(),
    ///     27,
    ///     Position::Attacker,
    /// ).expect("valid player");
    /// assert_eq!(player.full_name(), "Marta Silva");
    /// ```
    pub fn new(
        team_id: Uuid,
        first_name: String,
        last_name: String,
        country: Country,
        age: i32,
        position: Position,
    ) -> MarketResult<Self> {
        if age < 0 {
            return Err(MarketError::validation("Age cannot be negative"));
        }
        Self::validate_name(&first_name, "First name")?;
        Self::validate_name(&last_name, "Last name")?;

        Ok(Self {
            id: Uuid::new_v4(),
            team_id,
            first_name,
            last_name,
            country,
            age,
            position,
            market_value: Decimal::from(DEFAULT_MARKET_VALUE),
            asked_price: Decimal::ZERO,
            created_at: Utc::now(),
        })
    }

    fn validate_name(name: &str, field: &str) -> MarketResult<()> {
        if name.chars().count() > 100 {
            return Err(MarketError::validation(format!(
                "{} cannot exceed 100 characters",
                field
            )));
        }
        Ok(())
    }

    /// Applies a client profile edit; ownership and prices are not editable here
    pub fn update_profile(
        &mut self,
        first_name: Option<String>,
        last_name: Option<String>,
        country: Option<Country>,
    ) -> MarketResult<()> {
        if let Some(ref first) = first_name {
            Self::validate_name(first, "First name")?;
        }
        if let Some(ref last) = last_name {
            Self::validate_name(last, "Last name")?;
        }

        if let Some(first) = first_name {
            self.first_name = first;
        }
        if let Some(last) = last_name {
            self.last_name = last;
        }
        if let Some(country) = country {
            self.country = country;
        }
        Ok(())
    }

    /// Applies an administrator's edit of the protected fields
    ///
    /// Nothing changes unless every supplied value is valid.
    pub(crate) fn amend(
        &mut self,
        age: Option<i32>,
        position: Option<Position>,
        market_value: Option<Decimal>,
    ) -> MarketResult<()> {
        if matches!(age, Some(a) if a < 0) {
            return Err(MarketError::validation("Age cannot be negative"));
        }
        if matches!(market_value, Some(v) if v < Decimal::ZERO) {
            return Err(MarketError::validation("Market value cannot be negative"));
        }

        if let Some(age) = age {
            self.age = age;
        }
        if let Some(position) = position {
            self.position = position;
        }
        if let Some(value) = market_value {
            self.market_value = value;
        }
        Ok(())
    }

    /// Sets the price buyers must pay while the player is listed
    pub fn set_asked_price(&mut self, price: Decimal) -> MarketResult<()> {
        if price < Decimal::ZERO {
            return Err(MarketError::validation("Asked price cannot be negative"));
        }
        self.asked_price = price;
        Ok(())
    }

    pub fn clear_asked_price(&mut self) {
        self.asked_price = Decimal::ZERO;
    }

    /// Hands the player to `buyer_team_id` at a re-appraised market value
    pub(crate) fn transfer_to(&mut self, buyer_team_id: Uuid, market_value: Decimal) {
        self.team_id = buyer_team_id;
        self.market_value = market_value;
        self.asked_price = Decimal::ZERO;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn team_id(&self) -> Uuid {
        self.team_id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn country(&self) -> &Country {
        &self.country
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn market_value(&self) -> Decimal {
        self.market_value
    }

    pub fn asked_price(&self) -> Decimal {
        self.asked_price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reconstructs a Player from persistence layer data
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        team_id: Uuid,
        first_name: String,
        last_name: String,
        country: Country,
        age: i32,
        position: Position,
        market_value: Decimal,
        asked_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            team_id,
            first_name,
            last_name,
            country,
            age,
            position,
            market_value,
            asked_price,
            created_at,
        }
    }
}
