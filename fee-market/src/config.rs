use {
    crate::{coin::validate_denom, decimal::Dec, error::FeeMarketError},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Denomination the base gas price is quoted in by default.
pub const DEFAULT_FEE_DENOM: &str = "stake";

/// Module account that escrows every deducted fee before distribution.
pub const FEE_COLLECTOR_NAME: &str = "feemarket-fee-collector";

/// Default destination for distributed fees and module-bound tips.
pub const DEFAULT_FEE_RECIPIENT_MODULE: &str = "fee_collector";

/// Default account allowed to replace the parameter set.
pub const DEFAULT_AUTHORITY: &str = "gov";

/// Upper bound on the utilization window, in blocks.
pub const MAX_WINDOW: u64 = 65_536;

const fn dec_milli(milli: i128) -> Dec {
    Dec::from_inner(milli * 1_000_000_000_000_000)
}

/// Governance-mutable parameters of the AIMD fee market.
///
/// The controller reads a whole `Params` at every block; updates replace the
/// full set after [`Params::validate`] accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Params {
    /// Additive learning-rate increase applied when utilization is far from
    /// target.
    pub alpha: Dec,

    /// Multiplicative learning-rate decay applied when utilization is near
    /// target. Must be within `[0, 1]`.
    pub beta: Dec,

    /// Width of the band around the target inside which the learning rate
    /// decays: `(gamma, 1 - gamma)`. Must be within `[0, 0.5]`.
    pub gamma: Dec,

    /// Weight of the net window deviation added to the base gas price.
    pub delta: Dec,

    /// Floor for the base gas price.
    pub min_base_gas_price: Dec,

    pub min_learning_rate: Dec,
    pub max_learning_rate: Dec,

    /// Gas units that make a block 100 % utilized.
    pub max_block_utilization: u64,

    /// Number of trailing blocks averaged by the controller.
    pub window: u64,

    /// Reference denomination of the base gas price.
    pub fee_denom: String,

    /// Master switch.
    pub enabled: bool,

    /// Forward collected fees to the fee recipient module instead of keeping
    /// them in [`FEE_COLLECTOR_NAME`].
    pub distribute_fees: bool,

    /// Pay tips to the block proposer instead of the fee recipient module.
    pub send_tip_to_proposer: bool,
}

impl Params {
    /// Classic EIP-1559: a fixed 12.5 % learning rate reacting to the last
    /// block only.
    pub fn eip1559() -> Self {
        Self {
            alpha: Dec::ZERO,
            beta: Dec::ONE,
            gamma: Dec::ZERO,
            delta: Dec::ZERO,
            min_base_gas_price: Dec::ONE,
            min_learning_rate: dec_milli(125),
            max_learning_rate: dec_milli(125),
            max_block_utilization: 30_000_000,
            window: 1,
            fee_denom: DEFAULT_FEE_DENOM.to_string(),
            enabled: true,
            distribute_fees: false,
            send_tip_to_proposer: true,
        }
    }

    /// Size of the borsh encoding.
    pub fn encoded_len(&self) -> usize {
        7 * Dec::ENCODED_LEN + 2 * 8 + 4 + self.fee_denom.len() + 3
    }

    /// Check every invariant of the parameter set.
    pub fn validate(&self) -> Result<(), FeeMarketError> {
        let invalid = |reason: String| Err(FeeMarketError::InvalidParams { reason });

        if self.alpha.is_negative() {
            return invalid(format!("alpha ({}) must be non-negative", self.alpha));
        }
        if self.beta.is_negative() || self.beta > Dec::ONE {
            return invalid(format!("beta ({}) must be within [0, 1]", self.beta));
        }
        if self.gamma.is_negative() || self.gamma > dec_milli(500) {
            return invalid(format!("gamma ({}) must be within [0, 0.5]", self.gamma));
        }
        if self.delta.is_negative() {
            return invalid(format!("delta ({}) must be non-negative", self.delta));
        }
        if self.min_base_gas_price.is_negative() {
            return invalid(format!(
                "min_base_gas_price ({}) must be non-negative",
                self.min_base_gas_price
            ));
        }
        if self.min_learning_rate.is_negative() {
            return invalid(format!(
                "min_learning_rate ({}) must be non-negative",
                self.min_learning_rate
            ));
        }
        if self.min_learning_rate > self.max_learning_rate {
            return invalid(format!(
                "min_learning_rate ({}) > max_learning_rate ({})",
                self.min_learning_rate, self.max_learning_rate
            ));
        }
        if self.max_block_utilization == 0 {
            return invalid("max_block_utilization must be > 0".to_string());
        }
        if self.window == 0 || self.window > MAX_WINDOW {
            return invalid(format!(
                "window ({}) must be within [1, {MAX_WINDOW}]",
                self.window
            ));
        }
        validate_denom(&self.fee_denom).or_else(invalid)
    }
}

impl Default for Params {
    /// AIMD genesis defaults.
    fn default() -> Self {
        Self {
            alpha: dec_milli(25),
            beta: dec_milli(950),
            gamma: dec_milli(250),
            delta: Dec::ZERO,
            min_base_gas_price: Dec::ONE,
            min_learning_rate: dec_milli(10),
            max_learning_rate: dec_milli(500),
            max_block_utilization: 30_000_000,
            window: 8,
            fee_denom: DEFAULT_FEE_DENOM.to_string(),
            enabled: true,
            distribute_fees: false,
            send_tip_to_proposer: true,
        }
    }
}

/// Settings fixed when the fee market is wired into a host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Account allowed to replace [`Params`].
    pub authority: String,

    /// Module account receiving distributed fees and module-bound tips.
    pub fee_recipient_module: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            authority: DEFAULT_AUTHORITY.to_string(),
            fee_recipient_module: DEFAULT_FEE_RECIPIENT_MODULE.to_string(),
        }
    }
}
