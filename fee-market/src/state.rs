use {
    crate::{config::Params, decimal::Dec, window::UtilizationWindow},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Mutable control-loop state, advanced once per block.
///
/// - The **base gas price** every transaction of the current block pays.
/// - The **learning rate** the next adjustment will start from.
/// - The trailing **utilization window**.
/// - A running tally of **gas used** in the current block, fed by settlement.
/// - The height at which the mechanism was last switched on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FeeMarketState {
    pub base_gas_price: Dec,
    pub learning_rate: Dec,
    pub window: UtilizationWindow,

    /// Gas settled so far in the current block. Reset by every block advance.
    pub block_gas_used: u64,

    /// First block that observed `enabled` flipping from false to true.
    /// Settlement moves no funds in that block.
    pub enabled_height: Option<u64>,
}

impl FeeMarketState {
    /// Genesis state: price at its floor, learning rate at its lower bound.
    pub fn genesis(params: &Params) -> Self {
        Self {
            base_gas_price: params.min_base_gas_price,
            learning_rate: params.min_learning_rate,
            window: UtilizationWindow::new(params.window),
            block_gas_used: 0,
            enabled_height: None,
        }
    }

    /// Record gas settled by a transaction in the current block, capped at one
    /// full block. Returns the new running total.
    #[inline]
    pub fn record_gas(&mut self, gas: u64, max_block_utilization: u64) -> u64 {
        self.block_gas_used = self
            .block_gas_used
            .saturating_add(gas)
            .min(max_block_utilization);
        self.block_gas_used
    }

    /// Size of the borsh encoding, computed without serializing the window.
    pub fn encoded_len(&self) -> usize {
        2 * Dec::ENCODED_LEN
            + self.window.encoded_len()
            + 8
            + 1
            + self.enabled_height.map_or(0, |_| 8)
    }

    /// Whether price and learning rate sit inside the bounds `params` sets.
    /// Holds after every block advance; a parameter update may break it until
    /// the next one.
    pub fn within_bounds(&self, params: &Params) -> bool {
        self.base_gas_price >= params.min_base_gas_price
            && self.learning_rate >= params.min_learning_rate
            && self.learning_rate <= params.max_learning_rate
    }

    /// Structural validity, independent of any parameter set.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_gas_price.is_negative() {
            return Err(format!(
                "base_gas_price ({}) must be non-negative",
                self.base_gas_price
            ));
        }
        if self.learning_rate.is_negative() {
            return Err(format!(
                "learning_rate ({}) must be non-negative",
                self.learning_rate
            ));
        }
        self.window.validate()
    }
}

/// Where the current block sits relative to the master switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enablement {
    /// Pass-through: no fee checks, no settlement, controller frozen.
    Disabled,
    /// First block after the switch turned on: checks run, no funds move.
    JustEnabled,
    Active,
}

impl Enablement {
    pub fn of(params: &Params, state: &FeeMarketState, height: u64) -> Self {
        if !params.enabled {
            Self::Disabled
        } else if state.enabled_height == Some(height) {
            Self::JustEnabled
        } else {
            Self::Active
        }
    }
}

/// Breakdown of a single transaction's fee, in the fee coin's denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionFee {
    /// `ceil(base_gas_price × gas_used)`.
    pub payment: u128,
    /// Whatever the offered fee carries above `payment`.
    pub tip: u128,
    /// `payment + tip`, never more than the offered fee.
    pub total: u128,
}
