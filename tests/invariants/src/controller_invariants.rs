//! Property-based tests for the base gas price controller.
//!
//! Properties tested:
//! 1. Base gas price never drops below its floor; learning rate stays clamped
//! 2. Half-full blocks are a fixed point
//! 3. Full blocks strictly raise the price, empty blocks strictly lower it
//! 4. Exported genesis reproduces every later block bit for bit

#[cfg(test)]
mod tests {
    use {
        aimd_fee_market::{
            calculator::advance, Dec, FeeMarket, FeeMarketState, GenesisState, ModuleConfig,
            Params,
        },
        proptest::prelude::*,
    };

    const MILLI: i128 = 1_000_000_000_000_000;

    fn milli(value: u64) -> Dec {
        Dec::from_inner(value as i128 * MILLI)
    }

    prop_compose! {
        /// Any parameter set `Params::validate` accepts, with a non-zero
        /// learning rate floor.
        fn arb_params()(
            alpha in 0..=100u64,
            beta in 500..=1_000u64,
            gamma in 0..=500u64,
            delta in 0..=10u64,
            min_price in 0..=10_000u64,
            min_lr in 1..=200u64,
            lr_span in 0..=300u64,
            half_block in 500_000..=50_000_000u64,
            window in 1..=16u64,
        ) -> Params {
            Params {
                alpha: milli(alpha),
                beta: milli(beta),
                gamma: milli(gamma),
                delta: milli(delta),
                min_base_gas_price: milli(min_price),
                min_learning_rate: milli(min_lr),
                max_learning_rate: milli(min_lr + lr_span),
                max_block_utilization: half_block * 2,
                window,
                ..Default::default()
            }
        }
    }

    fn state_at(params: &Params, price: Dec) -> FeeMarketState {
        let mut state = FeeMarketState::genesis(params);
        state.base_gas_price = price.max(params.min_base_gas_price);
        state
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1. Bounds
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn price_and_learning_rate_stay_in_bounds(
            params in arb_params(),
            start in 0..=1_000_000u64,
            blocks in prop::collection::vec(0..=120_000_000u64, 1..64),
        ) {
            prop_assume!(params.validate().is_ok());
            let mut state = state_at(&params, milli(start));

            for gas in blocks {
                let update = advance(&params, &mut state, gas);
                prop_assert!(
                    update.base_gas_price >= params.min_base_gas_price,
                    "price {} below floor {}", update.base_gas_price, params.min_base_gas_price
                );
                prop_assert!(update.learning_rate >= params.min_learning_rate);
                prop_assert!(update.learning_rate <= params.max_learning_rate);
                prop_assert!(update.utilization >= Dec::ZERO && update.utilization <= Dec::ONE);
                prop_assert!(state.within_bounds(&params));
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 2. Target fixed point
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn half_full_blocks_are_a_fixed_point(
            params in arb_params(),
            start in 0..=1_000_000u64,
            blocks in 1..40usize,
        ) {
            prop_assume!(params.validate().is_ok());
            let mut state = state_at(&params, milli(start));
            let price = state.base_gas_price;

            for _ in 0..blocks {
                let update = advance(&params, &mut state, params.max_block_utilization / 2);
                prop_assert_eq!(update.base_gas_price, price);
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 3. Monotonicity under sustained load
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn full_blocks_strictly_raise_price(
            params in arb_params(),
            start in 1_000..=1_000_000u64,
            blocks in 1..50usize,
        ) {
            prop_assume!(params.validate().is_ok());
            let mut state = state_at(&params, milli(start));

            for _ in 0..blocks {
                let before = state.base_gas_price;
                let update = advance(&params, &mut state, params.max_block_utilization);
                prop_assert!(
                    update.base_gas_price > before,
                    "price did not rise: {} -> {}", before, update.base_gas_price
                );
            }
        }

        #[test]
        fn empty_blocks_strictly_lower_price_to_floor(
            params in arb_params(),
            start in 0..=1_000_000u64,
            blocks in 1..200usize,
        ) {
            prop_assume!(params.validate().is_ok());
            let mut state = state_at(&params, milli(start));

            for _ in 0..blocks {
                let before = state.base_gas_price;
                let update = advance(&params, &mut state, 0);
                if before > params.min_base_gas_price {
                    prop_assert!(update.base_gas_price < before);
                } else {
                    prop_assert_eq!(update.base_gas_price, params.min_base_gas_price);
                }
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 4. Export / import determinism
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn exported_genesis_replays_identically(
            params in arb_params(),
            prefix in prop::collection::vec(0..=120_000_000u64, 0..20),
            suffix in prop::collection::vec(0..=120_000_000u64, 1..20),
        ) {
            prop_assume!(params.validate().is_ok());
            let state = FeeMarketState::genesis(&params);
            let mut original = FeeMarket::from_genesis(
                ModuleConfig::default(),
                GenesisState::new(params, state),
            )
            .unwrap();
            for (height, gas) in prefix.into_iter().enumerate() {
                original.advance_block(gas, height as u64 + 1);
            }

            let json = original.export_genesis().to_json().unwrap();
            let mut imported = FeeMarket::from_genesis(
                ModuleConfig::default(),
                GenesisState::from_json(&json).unwrap(),
            )
            .unwrap();

            for (height, gas) in suffix.into_iter().enumerate() {
                let height = height as u64 + 1_000;
                prop_assert_eq!(
                    original.advance_block(gas, height),
                    imported.advance_block(gas, height)
                );
            }
            prop_assert_eq!(original.state(), imported.state());
        }
    }
}
