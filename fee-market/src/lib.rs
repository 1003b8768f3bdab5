//! # AIMD Fee Market
//!
//! A **dynamic base gas price** for a Cosmos-style chain, driven by an
//! additive-increase / multiplicative-decrease control loop.
//!
//! Every block the controller measures utilization (`gas used / block
//! capacity`), averages it over a trailing window and moves the base gas price
//! toward half-full blocks. The step size is itself adaptive: a **learning
//! rate** grows additively while utilization stays far from target and decays
//! multiplicatively once it settles. With a window of one block and a fixed
//! learning rate of 12.5 % the mechanism reduces to EIP-1559
//! ([`Params::eip1559`]).
//!
//! Transactions pay `base_gas_price × gas_used`; whatever the offered fee
//! carries on top is a **tip** for the block proposer. Fees may be offered in
//! any denomination a [`DenomResolver`] can convert.
//!
//! ## Quick start
//!
//! ```rust
//! use aimd_fee_market::{
//!     ledger::{Account, Address, InMemoryLedger},
//!     settlement::{ante_handle, post_handle, FeeTx},
//!     Coin, Dec, FeeMarket, GenesisState, ModuleConfig, NoopResolver,
//! };
//!
//! let mut market =
//!     FeeMarket::from_genesis(ModuleConfig::default(), GenesisState::default()).unwrap();
//!
//! let payer = Address::new([1; 32]);
//! let proposer = Address::new([2; 32]);
//! let mut ledger = InMemoryLedger::new();
//! ledger
//!     .credit(&Account::User(payer), &Coin::new("stake", 1_000_000))
//!     .unwrap();
//!
//! market.begin_block(1);
//!
//! // Offer 250 000 stake for up to 200 000 gas at a base price of 1 stake/gas.
//! let tx = FeeTx::new(payer, vec![Coin::new("stake", 250_000)], 200_000);
//! ante_handle(&market, &NoopResolver, &tx, false).unwrap();
//!
//! // The transaction used 150 000 gas: the rest of the offer is the tip.
//! let receipt =
//!     post_handle(&mut market, &mut ledger, &NoopResolver, &tx, 150_000, &proposer, false)
//!         .unwrap();
//! assert_eq!(receipt.fee, Coin::new("stake", 150_000));
//! assert_eq!(receipt.tip, Coin::new("stake", 100_000));
//!
//! // A full block raises the price for the next one.
//! market.record_gas(30_000_000);
//! market.end_block();
//! assert!(market.state().base_gas_price > Dec::ONE);
//! ```
//!
//! See [`calculator`] for the update rule, [`settlement`] for the fee flow and
//! [`config`] for tunables.

pub mod calculator;
pub mod coin;
pub mod config;
pub mod decimal;
pub mod error;
pub mod gas;
pub mod genesis;
pub mod ledger;
pub mod market;
pub mod migration;
pub mod resolver;
pub mod settlement;
pub mod state;
pub mod store;
pub mod window;


// Re-exports for convenience.
pub use {
    coin::{Coin, DecCoin},
    config::{ModuleConfig, Params},
    decimal::Dec,
    error::{ErrorKind, FeeMarketError},
    genesis::GenesisState,
    market::FeeMarket,
    resolver::{DenomResolver, FixedRateResolver, NoopResolver},
    state::{Enablement, FeeMarketState, TransactionFee},
};
