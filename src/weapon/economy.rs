//! Per-currency balances spent by discharges.
//!
//! The combat core never charges for a shot itself; the firing controller
//! checks [`Wallet::try_spend`] before it sends a fire request.

use super::catalog::{Currency, WeaponDefinition};
use bevy::prelude::*;

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    balances: [u32; Currency::ALL.len()],
}

impl Wallet {
    pub fn with_balance(mut self, currency: Currency, amount: u32) -> Self {
        self.balances[currency.index()] = amount;
        self
    }

    #[inline]
    pub fn balance(&self, currency: Currency) -> u32 {
        self.balances[currency.index()]
    }

    pub fn deposit(&mut self, currency: Currency, amount: u32) {
        let slot = &mut self.balances[currency.index()];
        *slot = slot.saturating_add(amount);
    }

    pub fn can_afford(&self, weapon: &WeaponDefinition) -> bool {
        weapon
            .discharge_cost()
            .is_none_or(|(currency, cost)| self.balance(currency) >= cost)
    }

    /// Deduct one discharge worth of currency.  Returns `false` (and leaves
    /// the balance untouched) when the wallet cannot cover it.
    pub fn try_spend(&mut self, weapon: &WeaponDefinition) -> bool {
        match weapon.discharge_cost() {
            None => true,
            Some((currency, cost)) => {
                let slot = &mut self.balances[currency.index()];
                if *slot >= cost {
                    *slot -= cost;
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapon::WeaponCatalog;

    #[test]
    fn free_weapons_never_touch_the_wallet() {
        let catalog = WeaponCatalog::default();
        let mut wallet = Wallet::default();
        assert!(wallet.try_spend(catalog.lookup("bonk").unwrap()));
        assert_eq!(wallet, Wallet::default());
    }

    #[test]
    fn spending_stops_at_zero() {
        let catalog = WeaponCatalog::default();
        let rail = catalog.lookup("rail").unwrap();
        let mut wallet = Wallet::default().with_balance(Currency::Energy, 3);

        assert!(wallet.try_spend(rail));
        assert_eq!(wallet.balance(Currency::Energy), 1);
        assert!(!wallet.can_afford(rail));
        assert!(!wallet.try_spend(rail));
        assert_eq!(wallet.balance(Currency::Energy), 1);
    }

    #[test]
    fn deposit_saturates() {
        let mut wallet = Wallet::default().with_balance(Currency::Gems, u32::MAX - 1);
        wallet.deposit(Currency::Gems, 10);
        assert_eq!(wallet.balance(Currency::Gems), u32::MAX);
    }
}
