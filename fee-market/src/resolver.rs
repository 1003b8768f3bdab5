//! Conversion between fee-paying denominations.
//!
//! The base gas price is quoted in the reference denomination
//! (`Params::fee_denom`). A payer may offer any denomination the configured
//! [`DenomResolver`] can convert; settlement then charges the payment and tip
//! in that denomination.

use {
    crate::{
        coin::{Coin, DecCoin},
        decimal::Dec,
        error::FeeMarketError,
    },
    std::collections::BTreeMap,
};

pub trait DenomResolver {
    /// Convert `coin` into an equivalent amount of `denom`.
    fn convert_to_denom(&self, coin: &DecCoin, denom: &str) -> Result<DecCoin, FeeMarketError>;

    /// Denominations besides the reference one that fees may be paid in.
    fn extra_denoms(&self) -> Vec<String>;

    /// Like [`convert_to_denom`](Self::convert_to_denom), but a coin already
    /// in `denom` is returned untouched without consulting the resolver.
    fn convert(&self, coin: &DecCoin, denom: &str) -> Result<DecCoin, FeeMarketError> {
        if coin.denom == denom {
            Ok(coin.clone())
        } else {
            self.convert_to_denom(coin, denom)
        }
    }

    /// Value of an offered fee coin in the reference denomination.
    fn resolve(&self, coin: &Coin, reference: &str) -> Result<DecCoin, FeeMarketError> {
        let coin = DecCoin::from_coin(coin).ok_or(FeeMarketError::Overflow)?;
        self.convert(&coin, reference)
    }
}

/// Accepts the reference denomination only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResolver;

impl DenomResolver for NoopResolver {
    fn convert_to_denom(&self, coin: &DecCoin, denom: &str) -> Result<DecCoin, FeeMarketError> {
        if coin.denom == denom {
            return Ok(coin.clone());
        }
        Err(FeeMarketError::UnresolvableDenom {
            denom: coin.denom.clone(),
            reference: denom.to_string(),
        })
    }

    fn extra_denoms(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Static exchange rates, each expressed as reference units per unit of the
/// foreign denomination. Conversions between two foreign denominations go
/// through the reference one.
#[derive(Debug, Clone)]
pub struct FixedRateResolver {
    reference: String,
    rates: BTreeMap<String, Dec>,
}

impl FixedRateResolver {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            rates: BTreeMap::new(),
        }
    }

    /// Register `denom` at `rate` reference units per unit. Non-positive
    /// rates are ignored.
    pub fn with_rate(mut self, denom: impl Into<String>, rate: Dec) -> Self {
        if rate.is_positive() {
            self.rates.insert(denom.into(), rate);
        }
        self
    }

    fn unresolvable(&self, denom: &str) -> FeeMarketError {
        FeeMarketError::UnresolvableDenom {
            denom: denom.to_string(),
            reference: self.reference.clone(),
        }
    }

    fn to_reference(&self, coin: &DecCoin) -> Result<Dec, FeeMarketError> {
        if coin.denom == self.reference {
            return Ok(coin.amount);
        }
        let rate = self
            .rates
            .get(&coin.denom)
            .ok_or_else(|| self.unresolvable(&coin.denom))?;
        coin.amount.checked_mul(*rate).ok_or(FeeMarketError::Overflow)
    }

    fn from_reference(&self, value: Dec, denom: &str) -> Result<Dec, FeeMarketError> {
        if denom == self.reference {
            return Ok(value);
        }
        let rate = self.rates.get(denom).ok_or_else(|| self.unresolvable(denom))?;
        value.checked_quo(*rate).ok_or(FeeMarketError::Overflow)
    }
}

impl DenomResolver for FixedRateResolver {
    fn convert_to_denom(&self, coin: &DecCoin, denom: &str) -> Result<DecCoin, FeeMarketError> {
        let value = self.to_reference(coin)?;
        let amount = self.from_reference(value, denom)?;
        Ok(DecCoin::new(denom, amount))
    }

    fn extra_denoms(&self) -> Vec<String> {
        self.rates.keys().cloned().collect()
    }
}
