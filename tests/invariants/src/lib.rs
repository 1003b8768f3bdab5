//! Property-Based Invariant Tests for the AIMD fee market
//!
//! Uses proptest to verify:
//! - Controller bounds, fixed point and monotonicity
//! - Genesis export/import determinism
//! - Settlement conservation and simulation isolation

pub mod controller_invariants;
pub mod settlement_invariants;
