//! Per-transaction fee checks and settlement.
//!
//! [`ante_handle`] runs before a transaction executes and rejects fees that
//! cannot cover `base_gas_price × gas_limit`. [`post_handle`] runs after
//! execution with the gas actually used: it charges `base_gas_price ×
//! gas_used` as the payment, treats the rest of the offered fee as the tip and
//! moves both through the [`Ledger`].
//!
//! Prices are converted into the fee coin's denomination, so payment and tip
//! are always charged in the coin the payer offered.

use {
    crate::{
        calculator::{calculate_transaction_fee, required_fee},
        coin::{Coin, DecCoin},
        config::FEE_COLLECTOR_NAME,
        decimal::Dec,
        error::FeeMarketError,
        gas::{GasMeter, BANK_SEND_GAS_CONSUMPTION, RESOLVE_GAS_COST},
        ledger::{Account, Address, Ledger},
        market::FeeMarket,
        resolver::DenomResolver,
        state::{Enablement, TransactionFee},
    },
    log::{debug, error},
};

/// Fee-relevant view of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeTx {
    pub payer: Address,
    /// Offered fee; at most one coin is accepted.
    pub fee: Vec<Coin>,
    pub gas_limit: u64,
}

impl FeeTx {
    pub fn new(payer: Address, fee: Vec<Coin>, gas_limit: u64) -> Self {
        Self {
            payer,
            fee,
            gas_limit,
        }
    }
}

/// Result of the pre-execution check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnteOutcome {
    /// The fee market is disabled; nothing was checked.
    PassThrough,
    Checked(FeeCheck),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeCheck {
    pub fee: Coin,
    /// Base gas price in the fee coin's denomination.
    pub gas_price: DecCoin,
    /// `ceil(gas_price × gas_limit)`.
    pub required_fee: u128,
    /// Offered fee valued in the reference denomination.
    pub resolved_fee: DecCoin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Genesis transactions are never charged.
    Genesis,
    Disabled,
    /// First block after the fee market was switched on.
    JustEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Funds moved.
    Settled,
    /// Dry run: amounts computed, ledger untouched.
    Simulated,
    Skipped(SkipReason),
}

/// Receipt of a post-execution settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Base payment for the gas used, in the fee coin's denomination.
    pub fee: Coin,
    pub tip: Coin,
    /// Offered fee valued in the reference denomination.
    pub resolved_fee: DecCoin,
    pub outcome: SettlementOutcome,
    /// Gas consumed by the settlement logic itself.
    pub gas_consumed: u64,
}

impl Settlement {
    fn skipped(reference: &str, reason: SkipReason) -> Self {
        Self {
            fee: Coin::zero(reference),
            tip: Coin::zero(reference),
            resolved_fee: DecCoin::new(reference, Dec::ZERO),
            outcome: SettlementOutcome::Skipped(reason),
            gas_consumed: 0,
        }
    }
}

/// Pick the single fee coin of `tx`. Simulation tolerates an absent or zero
/// fee and substitutes a zero coin of the reference denomination.
fn fee_coin(
    market: &FeeMarket,
    tx: &FeeTx,
    gas: u64,
    simulate: bool,
) -> Result<Coin, FeeMarketError> {
    if tx.fee.len() > 1 {
        return Err(FeeMarketError::TooManyFeeCoins {
            count: tx.fee.len(),
        });
    }
    match tx.fee.first() {
        Some(coin) if !coin.is_zero() => Ok(coin.clone()),
        Some(coin) if simulate => Ok(coin.clone()),
        None if simulate => Ok(Coin::zero(market.params().fee_denom.clone())),
        _ => {
            let price = market.base_gas_price();
            Err(FeeMarketError::InsufficientFee {
                offered: 0,
                required: required_fee(price.amount, gas)?,
                denom: price.denom,
                gas,
            })
        }
    }
}

/// Pre-execution fee check.
///
/// In order: pass through when disabled, reject a zero gas limit, reject
/// more than one or an absent fee coin, resolve the fee denomination, and
/// require `fee ≥ ceil(gas_price × gas_limit)`. Simulation skips the gas
/// limit, absent fee and floor checks.
pub fn ante_handle(
    market: &FeeMarket,
    resolver: &impl DenomResolver,
    tx: &FeeTx,
    simulate: bool,
) -> Result<AnteOutcome, FeeMarketError> {
    if market.enablement() == Enablement::Disabled {
        return Ok(AnteOutcome::PassThrough);
    }
    if tx.gas_limit == 0 && !simulate {
        return Err(FeeMarketError::OutOfGas { limit: 0, used: 0 });
    }

    let fee = fee_coin(market, tx, tx.gas_limit, simulate)?;
    let reference = market.params().fee_denom.as_str();
    let gas_price = market.min_gas_price(&fee.denom, resolver)?;
    let resolved_fee = resolver.resolve(&fee, reference)?;
    let required_fee = required_fee(gas_price.amount, tx.gas_limit)?;

    if !simulate && fee.amount < required_fee {
        debug!(
            "fee market ante: rejecting fee {fee}, requires {required_fee}{} for {} gas",
            fee.denom, tx.gas_limit
        );
        return Err(FeeMarketError::InsufficientFee {
            offered: fee.amount,
            required: required_fee,
            denom: fee.denom,
            gas: tx.gas_limit,
        });
    }

    Ok(AnteOutcome::Checked(FeeCheck {
        fee,
        gas_price,
        required_fee,
        resolved_fee,
    }))
}

/// Post-execution settlement.
///
/// Charges `ceil(gas_price × gas_used)` and pays the remainder of the offered
/// fee out as tip. The payer's balance is checked for the whole amount first,
/// which is then moved in a single deduction into the fee market's escrow
/// account; payment and tip are distributed from there.
///
/// If a transfer out of escrow fails, a forwarded payment is pulled back and
/// the deduction is refunded to the payer before the error is returned, and
/// no gas is recorded. Should the refund itself fail, the funds stay in escrow
/// and the host's transaction rollback has to discard them.
pub fn post_handle(
    market: &mut FeeMarket,
    ledger: &mut impl Ledger,
    resolver: &impl DenomResolver,
    tx: &FeeTx,
    gas_used: u64,
    proposer: &Address,
    simulate: bool,
) -> Result<Settlement, FeeMarketError> {
    let reference = market.params().fee_denom.clone();
    if market.height() == 0 {
        return Ok(Settlement::skipped(&reference, SkipReason::Genesis));
    }
    let enablement = market.enablement();
    if enablement == Enablement::Disabled {
        return Ok(Settlement::skipped(&reference, SkipReason::Disabled));
    }

    let mut meter = GasMeter::new();
    meter.consume_read(market.params().encoded_len(), "fee market params");
    meter.consume_read(market.state().encoded_len(), "fee market state");

    if !simulate && gas_used > tx.gas_limit {
        return Err(FeeMarketError::OutOfGas {
            limit: tx.gas_limit,
            used: gas_used,
        });
    }

    let fee = fee_coin(market, tx, gas_used, simulate)?;
    if fee.denom != reference {
        meter.consume(RESOLVE_GAS_COST, "denom resolution");
    }
    let gas_price = market.min_gas_price(&fee.denom, resolver)?;
    let resolved_fee = resolver.resolve(&fee, &reference)?;
    let TransactionFee { payment, tip, total } =
        calculate_transaction_fee(gas_price.amount, fee.amount, gas_used)?;

    if !simulate && fee.amount < payment {
        return Err(FeeMarketError::InsufficientFee {
            offered: fee.amount,
            required: payment,
            denom: fee.denom,
            gas: gas_used,
        });
    }

    let mut settlement = Settlement {
        fee: Coin::new(fee.denom.clone(), payment),
        tip: Coin::new(fee.denom.clone(), tip),
        resolved_fee,
        outcome: SettlementOutcome::Settled,
        gas_consumed: 0,
    };

    if enablement == Enablement::JustEnabled {
        debug!(
            "fee market post: height {} just enabled, skipping deduction of {} + tip {}",
            market.height(),
            settlement.fee,
            settlement.tip
        );
        if !simulate {
            market.record_gas(gas_used);
            meter.consume_write(market.state().encoded_len(), "fee market state");
        }
        settlement.outcome = SettlementOutcome::Skipped(SkipReason::JustEnabled);
        settlement.gas_consumed = meter.consumed();
        return Ok(settlement);
    }

    if simulate {
        meter.consume(BANK_SEND_GAS_CONSUMPTION, "simulated bank send");
        settlement.outcome = SettlementOutcome::Simulated;
        settlement.gas_consumed = meter.consumed();
        return Ok(settlement);
    }

    let payer = Account::User(tx.payer);
    let available = ledger.balance(&payer, &fee.denom);
    if available < total {
        debug!("fee market post: payer {payer} holds {available}{}, needs {total}", fee.denom);
        return Err(FeeMarketError::InsufficientFunds {
            account: payer.to_string(),
            denom: fee.denom,
            available,
            required: total,
        });
    }

    let escrow = Account::module(FEE_COLLECTOR_NAME);
    let deducted = Coin::new(fee.denom.clone(), total);
    if total > 0 {
        ledger.deduct(&payer, &escrow, &deducted)?;
        meter.consume(BANK_SEND_GAS_CONSUMPTION, "fee deduction");
    }
    let forwarded = match deduct_coins(market, ledger, &mut meter, &settlement.fee) {
        Ok(forwarded) => forwarded,
        Err(err) => return Err(refund(ledger, &payer, &deducted, None, err)),
    };
    if let Err(err) = send_tip(market, ledger, &mut meter, proposer, &settlement.tip) {
        let forwarded = forwarded.as_ref().map(|recipient| (recipient, &settlement.fee));
        return Err(refund(ledger, &payer, &deducted, forwarded, err));
    }

    market.record_gas(gas_used);
    meter.consume_write(market.state().encoded_len(), "fee market state");

    debug!(
        "fee market post: settled fee {} tip {} from {payer} ({} gas used)",
        settlement.fee, settlement.tip, gas_used
    );
    settlement.gas_consumed = meter.consumed();
    Ok(settlement)
}

/// Forward the base payment from escrow to the recipient module when fees are
/// distributed; otherwise it stays in escrow. Returns the account the payment
/// went to, if it moved.
fn deduct_coins(
    market: &FeeMarket,
    ledger: &mut impl Ledger,
    meter: &mut GasMeter,
    payment: &Coin,
) -> Result<Option<Account>, FeeMarketError> {
    if payment.is_zero() || !market.params().distribute_fees {
        return Ok(None);
    }
    let recipient = Account::module(market.config().fee_recipient_module.clone());
    ledger.transfer(&Account::module(FEE_COLLECTOR_NAME), &recipient, payment)?;
    meter.consume(BANK_SEND_GAS_CONSUMPTION, "fee distribution");
    Ok(Some(recipient))
}

/// Pay the tip out of escrow to the proposer or the recipient module.
fn send_tip(
    market: &FeeMarket,
    ledger: &mut impl Ledger,
    meter: &mut GasMeter,
    proposer: &Address,
    tip: &Coin,
) -> Result<(), FeeMarketError> {
    if tip.is_zero() {
        return Ok(());
    }
    let recipient = if market.params().send_tip_to_proposer {
        Account::User(*proposer)
    } else {
        Account::module(market.config().fee_recipient_module.clone())
    };
    ledger.transfer(&Account::module(FEE_COLLECTOR_NAME), &recipient, tip)?;
    meter.consume(BANK_SEND_GAS_CONSUMPTION, "tip transfer");
    Ok(())
}

/// Undo a partially distributed settlement and hand back `err`.
fn refund(
    ledger: &mut impl Ledger,
    payer: &Account,
    deducted: &Coin,
    forwarded: Option<(&Account, &Coin)>,
    err: FeeMarketError,
) -> FeeMarketError {
    let escrow = Account::module(FEE_COLLECTOR_NAME);
    let restored = forwarded
        .map_or(Ok(()), |(recipient, payment)| {
            ledger.transfer(recipient, &escrow, payment)
        })
        .and_then(|()| ledger.transfer(&escrow, payer, deducted));
    match restored {
        Ok(()) => debug!("fee market post: refunded {deducted} to {payer} after: {err}"),
        Err(refund_err) => error!(
            "fee market post: refund of {deducted} to {payer} failed ({refund_err}) after: {err}"
        ),
    }
    err
}
