use {crate::ledger::LedgerError, thiserror::Error};

/// Coarse classification of a [`FeeMarketError`], stable across releases so
/// callers can decide whether a failure blocks a transaction or an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range parameters, state or genesis.
    Validation,
    InsufficientFee,
    OutOfGas,
    UnresolvableDenom,
    InsufficientFunds,
    Migration,
    Internal,
}

/// Errors produced by the fee-market subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeMarketError {
    /// The parameter set violates an invariant; nothing was applied.
    #[error("Invalid fee market parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("Invalid fee market state: {reason}")]
    InvalidState { reason: String },

    #[error("Invalid fee market genesis: {reason}")]
    InvalidGenesis { reason: String },

    #[error("Unauthorized parameter update: expected authority {expected}, got {got}")]
    Unauthorized { expected: String, got: String },

    /// The offered fee is absent or below `base_gas_price × gas`.
    #[error(
        "Insufficient fee: got {offered}{denom} but requires at least \
         {required}{denom} ({gas} gas)"
    )]
    InsufficientFee {
        offered: u128,
        required: u128,
        denom: String,
        gas: u64,
    },

    #[error("Expected at most one fee coin, got {count}")]
    TooManyFeeCoins { count: usize },

    #[error("Out of gas: limit {limit}, used {used}")]
    OutOfGas { limit: u64, used: u64 },

    #[error("Cannot resolve denom {denom} against {reference}")]
    UnresolvableDenom { denom: String, reference: String },

    #[error(
        "Insufficient funds: account {account} holds {available}{denom}, \
         settlement requires {required}{denom}"
    )]
    InsufficientFunds {
        account: String,
        denom: String,
        available: u128,
        required: u128,
    },

    #[error("Ledger failure: {0}")]
    Ledger(LedgerError),

    #[error("Fee market store corrupted at {key}: {reason}")]
    Store { key: String, reason: String },

    #[error("Fee market migration failed: {reason}")]
    Migration { reason: String },

    /// Arithmetic overflow during fee calculation.
    #[error("Fee calculation overflow")]
    Overflow,
}

impl FeeMarketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParams { .. }
            | Self::InvalidState { .. }
            | Self::InvalidGenesis { .. }
            | Self::Unauthorized { .. }
            | Self::TooManyFeeCoins { .. } => ErrorKind::Validation,
            Self::InsufficientFee { .. } => ErrorKind::InsufficientFee,
            Self::OutOfGas { .. } => ErrorKind::OutOfGas,
            Self::UnresolvableDenom { .. } => ErrorKind::UnresolvableDenom,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Migration { .. } => ErrorKind::Migration,
            Self::Ledger(_) | Self::Store { .. } | Self::Overflow => ErrorKind::Internal,
        }
    }
}

impl From<LedgerError> for FeeMarketError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                account,
                denom,
                available,
                required,
            } => Self::InsufficientFunds {
                account,
                denom,
                available,
                required,
            },
            other => Self::Ledger(other),
        }
    }
}
