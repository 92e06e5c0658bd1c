//! Resource balances and costs.
//!
//! Two resources exist: minerals and gas. Balances are unsigned, and
//! spending is checked, so a balance can never go negative.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Price of a unit or building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Mineral cost.
    pub minerals: u32,
    /// Gas cost.
    pub gas: u32,
}

impl Cost {
    /// Create a new cost.
    #[must_use]
    pub const fn new(minerals: u32, gas: u32) -> Self {
        Self { minerals, gas }
    }

    /// Nothing to pay.
    pub const FREE: Self = Self::new(0, 0);
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minerals / {} gas", self.minerals, self.gas)
    }
}

/// A player's stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Current minerals.
    pub minerals: u32,
    /// Current gas.
    pub gas: u32,
}

impl Resources {
    /// Create a new balance.
    #[must_use]
    pub const fn new(minerals: u32, gas: u32) -> Self {
        Self { minerals, gas }
    }

    /// Check if both balances cover the cost.
    #[must_use]
    pub const fn can_afford(&self, cost: Cost) -> bool {
        self.minerals >= cost.minerals && self.gas >= cost.gas
    }

    /// Deduct a cost if both balances cover it.
    ///
    /// Returns `false` and leaves the balance untouched otherwise.
    pub fn spend(&mut self, cost: Cost) -> bool {
        match (
            self.minerals.checked_sub(cost.minerals),
            self.gas.checked_sub(cost.gas),
        ) {
            (Some(minerals), Some(gas)) => {
                self.minerals = minerals;
                self.gas = gas;
                true
            }
            _ => false,
        }
    }

    /// Add income. Saturates at `u32::MAX`.
    pub fn deposit(&mut self, minerals: u32, gas: u32) {
        self.minerals = self.minerals.saturating_add(minerals);
        self.gas = self.gas.saturating_add(gas);
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minerals / {} gas", self.minerals, self.gas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_afford_needs_both_resources() {
        let bank = Resources::new(100, 20);
        assert!(bank.can_afford(Cost::new(100, 20)));
        assert!(bank.can_afford(Cost::FREE));
        assert!(!bank.can_afford(Cost::new(101, 0)));
        assert!(!bank.can_afford(Cost::new(50, 25)));
    }

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut bank = Resources::new(100, 10);

        assert!(!bank.spend(Cost::new(50, 25)));
        assert_eq!(bank, Resources::new(100, 10));

        assert!(bank.spend(Cost::new(50, 10)));
        assert_eq!(bank, Resources::new(50, 0));
    }

    #[test]
    fn test_deposit() {
        let mut bank = Resources::new(50, 0);
        bank.deposit(8, 4);
        assert_eq!(bank, Resources::new(58, 4));

        bank.deposit(u32::MAX, 0);
        assert_eq!(bank.minerals, u32::MAX);
    }
}
