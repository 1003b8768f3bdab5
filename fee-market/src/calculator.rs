use crate::{
    config::Params,
    decimal::Dec,
    error::FeeMarketError,
    state::{FeeMarketState, TransactionFee},
};

/// Utilization the controller steers toward: half-full blocks.
pub const TARGET_UTILIZATION: Dec = Dec::from_inner(500_000_000_000_000_000);

/// Outcome of one block advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockUpdate {
    /// This block's utilization ratio.
    pub utilization: Dec,
    /// Mean utilization over the window, this block included.
    pub average_utilization: Dec,
    pub base_gas_price: Dec,
    pub learning_rate: Dec,
}

/// `min(gas_used, max) / max`.
pub fn block_utilization(gas_used: u64, max_block_utilization: u64) -> Dec {
    let gas_used = gas_used.min(max_block_utilization);
    Dec::from_rational(gas_used as u128, max_block_utilization as u128).unwrap_or(Dec::ZERO)
}

/// AIMD learning-rate step.
///
/// Driven by the distance of `avg` from the target band, not by its side:
/// sustained over-use and sustained under-use both grow the rate.
///
/// ```text
/// if avg <= gamma || avg >= 1 - gamma:
///     lr' = lr + alpha          (far from target: additive increase)
/// else:
///     lr' = lr × beta           (near target: multiplicative decrease)
/// ```
///
/// The result is clamped to `[min_learning_rate, max_learning_rate]`.
pub fn next_learning_rate(params: &Params, learning_rate: Dec, average_utilization: Dec) -> Dec {
    let upper = Dec::ONE.saturating_sub(params.gamma);
    let next = if average_utilization <= params.gamma || average_utilization >= upper {
        learning_rate.saturating_add(params.alpha)
    } else {
        learning_rate.saturating_mul(params.beta)
    };
    clamp(next, params.min_learning_rate, params.max_learning_rate)
}

/// Base gas price step.
///
/// ```text
/// signal = (avg - 0.5) / 0.5                    ∈ [-1, 1]
/// price' = price × (1 + lr × signal) + delta × Σ (uᵢ - 0.5)
/// ```
///
/// The result never drops below `min_base_gas_price`. All arithmetic
/// saturates at the decimal range.
pub fn next_base_gas_price(
    params: &Params,
    base_gas_price: Dec,
    learning_rate: Dec,
    average_utilization: Dec,
    net_deviation: Dec,
) -> Dec {
    let signal = average_utilization
        .saturating_sub(TARGET_UTILIZATION)
        .checked_quo(TARGET_UTILIZATION)
        .unwrap_or(Dec::ZERO);
    let factor = Dec::ONE.saturating_add(learning_rate.saturating_mul(signal));
    let next = base_gas_price
        .saturating_mul(factor)
        .saturating_add(params.delta.saturating_mul(net_deviation));
    next.max(params.min_base_gas_price)
}

/// Advance `state` by one block that consumed `gas_used`.
///
/// A window whose capacity no longer matches `params.window` is resized
/// first, keeping its newest samples. The in-block gas tally is reset.
pub fn advance(params: &Params, state: &mut FeeMarketState, gas_used: u64) -> BlockUpdate {
    if state.window.capacity() != params.window {
        state.window = state.window.resized(params.window);
    }

    let utilization = block_utilization(gas_used, params.max_block_utilization);
    state.window.push(utilization);
    let average_utilization = state.window.mean();

    let learning_rate = next_learning_rate(params, state.learning_rate, average_utilization);
    let base_gas_price = next_base_gas_price(
        params,
        state.base_gas_price,
        learning_rate,
        average_utilization,
        state.window.net_deviation(TARGET_UTILIZATION),
    );

    state.learning_rate = learning_rate;
    state.base_gas_price = base_gas_price;
    state.block_gas_used = 0;

    BlockUpdate {
        utilization,
        average_utilization,
        base_gas_price,
        learning_rate,
    }
}

/// `ceil(gas_price × gas)`: the smallest integer fee covering `gas` units.
pub fn required_fee(gas_price: Dec, gas: u64) -> Result<u128, FeeMarketError> {
    gas_price
        .mul_int_ceil(gas as u128)
        .ok_or(FeeMarketError::Overflow)
}

/// Split an offered fee into the base payment for `gas_used` and the tip.
///
/// `gas_price` and `offered` must share a denomination. An offer below the
/// payment yields a zero tip and `total == payment`.
pub fn calculate_transaction_fee(
    gas_price: Dec,
    offered: u128,
    gas_used: u64,
) -> Result<TransactionFee, FeeMarketError> {
    let payment = required_fee(gas_price, gas_used)?;
    let tip = offered.saturating_sub(payment);
    Ok(TransactionFee {
        payment,
        tip,
        total: payment.saturating_add(tip),
    })
}

#[inline]
fn clamp(value: Dec, min: Dec, max: Dec) -> Dec {
    value.max(min).min(max)
}
