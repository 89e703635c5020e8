use rust_decimal::Decimal;

use crate::domain::error::StoreError;
use crate::domain::player::Player;
use crate::domain::repositories::MarketTransaction;
use crate::domain::team::Team;

/// Recomputes a team's aggregate roster value
///
/// Always a full sum over the roster; `Decimal` arithmetic is exact, so the
/// result does not depend on the order players are visited in.
pub struct ValuationService;

impl ValuationService {
    /// Sum of `market_value` over `roster`
    ///
    /// # Example
    /// ```
    /// use transfer_market_api::domain::player::Player;
    /// use transfer_market_api::services::ValuationService;
    /// use rust_decimal::Decimal;
    ///
    /// let empty: Vec<Player> = Vec::new();
    /// assert_eq!(ValuationService::recompute(&empty), Decimal::ZERO);
    /// ```
    pub fn recompute<'a>(roster: impl IntoIterator<Item = &'a Player>) -> Decimal {
        roster.into_iter().map(Player::market_value).sum()
    }

    /// Reloads the roster inside `tx` and stores the fresh value on `team`
    pub async fn revalue(tx: &mut dyn MarketTransaction, team: &mut Team) -> Result<(), StoreError> {
        let roster = tx.roster(team.id()).await?;
        team.set_value(Self::recompute(&roster));
        Ok(())
    }
}
