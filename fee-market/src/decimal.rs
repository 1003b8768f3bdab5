//! Fixed-point decimal used for every price, rate and utilization value.
//!
//! All nodes must derive bit-identical base gas prices, so nothing in the fee
//! market touches floating point. A [`Dec`] is an `i128` scaled by `10^18`
//! (the precision of Cosmos `LegacyDec`); products and quotients are computed
//! in arbitrary precision and truncated toward zero.

use {
    borsh::{BorshDeserialize, BorshSerialize},
    num_bigint::BigInt,
    num_traits::{ToPrimitive, Zero},
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::{fmt, str::FromStr},
    thiserror::Error,
};

/// Number of fractional decimal digits.
pub const PRECISION: u32 = 18;

const DIV: i128 = 1_000_000_000_000_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseDecError {
    #[error("decimal string is empty")]
    Empty,
    #[error("invalid character in decimal string {0:?}")]
    InvalidDigit(String),
    #[error("decimal string {0:?} has more than 18 fractional digits")]
    TooPrecise(String),
    #[error("decimal string {0:?} is out of range")]
    OutOfRange(String),
}

/// Signed fixed-point number with 18 fractional digits.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Dec(i128);

impl Dec {
    pub const ZERO: Dec = Dec(0);
    pub const ONE: Dec = Dec(DIV);
    pub const MAX: Dec = Dec(i128::MAX);
    pub const MIN: Dec = Dec(i128::MIN);
    /// Size of the borsh encoding.
    pub const ENCODED_LEN: usize = 16;

    /// Build from the raw scaled representation (`value × 10^18`).
    pub const fn from_inner(inner: i128) -> Self {
        Self(inner)
    }

    pub const fn into_inner(self) -> i128 {
        self.0
    }

    /// Whole number. Every `i64` fits without overflow.
    pub const fn from_int(value: i64) -> Self {
        Self(value as i128 * DIV)
    }

    pub fn from_u128(value: u128) -> Option<Self> {
        i128::try_from(value)
            .ok()
            .and_then(|v| v.checked_mul(DIV))
            .map(Self)
    }

    /// `numerator / denominator`, truncated. `None` on a zero denominator or
    /// when the result does not fit.
    pub fn from_rational(numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let value = BigInt::from(numerator) * BigInt::from(DIV) / BigInt::from(denominator);
        value.to_i128().map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let product = BigInt::from(self.0) * BigInt::from(rhs.0) / BigInt::from(DIV);
        product.to_i128().map(Self)
    }

    pub fn checked_quo(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        let quotient = BigInt::from(self.0) * BigInt::from(DIV) / BigInt::from(rhs.0);
        quotient.to_i128().map(Self)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn saturating_mul(self, rhs: Self) -> Self {
        self.checked_mul(rhs).unwrap_or_else(|| {
            if self.is_negative() != rhs.is_negative() {
                Self::MIN
            } else {
                Self::MAX
            }
        })
    }

    /// Multiply by an integer amount and round the product up to the next
    /// whole unit. Used for fees: a payer is never undercharged by truncation.
    /// `None` for negative values or when the result exceeds `u128`.
    pub fn mul_int_ceil(self, amount: u128) -> Option<u128> {
        if self.is_negative() {
            return None;
        }
        let div = BigInt::from(DIV);
        let product = BigInt::from(self.0) * BigInt::from(amount);
        let mut whole = &product / &div;
        if !(&product % &div).is_zero() {
            whole += 1u32;
        }
        whole.to_u128()
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let div = DIV as u128;
        write!(
            f,
            "{sign}{}.{:0width$}",
            magnitude / div,
            magnitude % div,
            width = PRECISION as usize
        )
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

impl FromStr for Dec {
    type Err = ParseDecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(ParseDecError::Empty);
        }
        let (whole, fraction) = match body.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (body, None),
        };
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || fraction.is_some_and(|f| !all_digits(f)) {
            return Err(ParseDecError::InvalidDigit(s.to_string()));
        }
        let fraction = fraction.unwrap_or("");
        if fraction.len() > PRECISION as usize {
            return Err(ParseDecError::TooPrecise(s.to_string()));
        }

        let out_of_range = || ParseDecError::OutOfRange(s.to_string());
        let whole: i128 = whole.parse().map_err(|_| out_of_range())?;
        let fraction: i128 = format!("{fraction:0<width$}", width = PRECISION as usize)
            .parse()
            .map_err(|_| out_of_range())?;
        let inner = whole
            .checked_mul(DIV)
            .and_then(|w| w.checked_add(fraction))
            .ok_or_else(out_of_range)?;
        Ok(Self(if negative { -inner } else { inner }))
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) fn dec(s: &str) -> Dec {
    s.parse()
        .unwrap_or_else(|err| panic!("invalid decimal literal {s:?}: {err}"))
}
