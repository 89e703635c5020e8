// TeamAccount: the budget ledger half of the Team aggregate.
// Debits never take the budget below zero; a transfer settlement applies
// the debit and the matching credit together or not at all.

use super::team::Team;
use crate::domain::error::{MarketError, MarketResult};
use rust_decimal::Decimal;

impl Team {
    /// Subtracts `amount` from the budget
    ///
    /// # Errors
    /// * `InsufficientFunds` - if `amount` exceeds the current budget
    /// * `Validation` - if `amount` is negative
    pub fn debit(&mut self, amount: Decimal) -> MarketResult<()> {
        if amount < Decimal::ZERO {
            return Err(MarketError::validation("Debit amount cannot be negative"));
        }
        if amount > self.budget {
            return Err(MarketError::InsufficientFunds { team_id: self.id() });
        }
        self.budget -= amount;
        Ok(())
    }

    /// Adds `amount` to the budget
    pub fn credit(&mut self, amount: Decimal) -> MarketResult<()> {
        if amount < Decimal::ZERO {
            return Err(MarketError::validation("Credit amount cannot be negative"));
        }
        self.budget += amount;
        Ok(())
    }

    pub fn can_afford(&self, amount: Decimal) -> bool {
        amount <= self.budget
    }
}

/// Moves `amount` from `buyer` to `seller` as a single unit
///
/// Works on the caller's copies; nothing is mutated unless both legs
/// succeed, so a failed settlement leaves both teams untouched.
pub fn settle_transfer(buyer: &mut Team, seller: &mut Team, amount: Decimal) -> MarketResult<()> {
    if buyer.id() == seller.id() {
        return Err(MarketError::SelfPurchase);
    }

    let mut debited = buyer.clone();
    debited.debit(amount)?;
    let mut credited = seller.clone();
    credited.credit(amount)?;

    *buyer = debited;
    *seller = credited;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::value_objects::Country;
    use uuid::Uuid;

    fn team_with_budget(budget: i64) -> Team {
        let (team, _) = Team::new(
            Uuid::new_v4(),
            "Ledger FC".to_string(),
            Country::new("PT").unwrap(),
        )
        .unwrap();
        Team::from_persistence(
            team.id(),
            team.owner_id(),
            team.name().to_string(),
            team.country().clone(),
            Decimal::from(budget),
            Decimal::ZERO,
            team.created_at(),
        )
    }

    #[test]
    fn debit_within_budget() {
        let mut team = team_with_budget(500_000);
        team.debit(Decimal::from(100_000)).unwrap();
        assert_eq!(team.budget(), Decimal::from(400_000));
    }

    #[test]
    fn debit_entire_budget_reaches_zero() {
        let mut team = team_with_budget(100);
        team.debit(Decimal::from(100)).unwrap();
        assert_eq!(team.budget(), Decimal::ZERO);
    }

    #[test]
    fn debit_over_budget_fails_unchanged() {
        let mut team = team_with_budget(99);
        let err = team.debit(Decimal::from(100)).unwrap_err();

        assert_eq!(err, MarketError::InsufficientFunds { team_id: team.id() });
        assert_eq!(team.budget(), Decimal::from(99));
    }

    #[test]
    fn negative_amounts_rejected() {
        let mut team = team_with_budget(10);
        assert!(team.debit(Decimal::from(-1)).is_err());
        assert!(team.credit(Decimal::from(-1)).is_err());
        assert_eq!(team.budget(), Decimal::from(10));
    }

    #[test]
    fn settlement_conserves_total_budget() {
        let mut buyer = team_with_budget(500_000);
        let mut seller = team_with_budget(1_000_000);
        let before = buyer.budget() + seller.budget();

        settle_transfer(&mut buyer, &mut seller, Decimal::from(100_000)).unwrap();

        assert_eq!(buyer.budget(), Decimal::from(400_000));
        assert_eq!(seller.budget(), Decimal::from(1_100_000));
        assert_eq!(buyer.budget() + seller.budget(), before);
    }

    #[test]
    fn failed_settlement_touches_neither_side() {
        let mut buyer = team_with_budget(10);
        let mut seller = team_with_budget(20);

        let err = settle_transfer(&mut buyer, &mut seller, Decimal::from(11)).unwrap_err();

        assert!(matches!(err, MarketError::InsufficientFunds { .. }));
        assert_eq!(buyer.budget(), Decimal::from(10));
        assert_eq!(seller.budget(), Decimal::from(20));
    }

    #[test]
    fn settlement_with_itself_is_self_purchase() {
        let mut team = team_with_budget(10);
        let mut same = team.clone();
        assert_eq!(
            settle_transfer(&mut team, &mut same, Decimal::ONE),
            Err(MarketError::SelfPurchase)
        );
    }
}
