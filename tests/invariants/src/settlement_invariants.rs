//! Property-based tests for transaction settlement.
//!
//! Properties tested:
//! 1. Settlement conserves supply: the payer loses exactly payment + tip
//! 2. A payer who cannot cover the fee loses nothing and no tip moves
//! 3. Simulation never calls the ledger

#[cfg(test)]
mod tests {
    use {
        aimd_fee_market::{
            calculator::required_fee,
            ledger::{Account, Address, InMemoryLedger, Ledger, MockLedger},
            settlement::{post_handle, FeeTx, SettlementOutcome},
            Coin, Dec, ErrorKind, FeeMarket, FeeMarketState, GenesisState, ModuleConfig,
            NoopResolver, Params,
        },
        proptest::prelude::*,
    };

    const MICRO: i128 = 1_000_000_000_000;

    fn market_at(params: Params, price_micro: u64) -> FeeMarket {
        let mut state = FeeMarketState::genesis(&params);
        state.base_gas_price = Dec::from_inner(price_micro as i128 * MICRO);
        let mut market =
            FeeMarket::from_genesis(ModuleConfig::default(), GenesisState::new(params, state))
                .unwrap();
        market.begin_block(1);
        market
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1-2. Conservation and atomicity
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn settlement_conserves_supply(
            price_micro in 1_000_000..=50_000_000u64,
            gas_limit in 1..=10_000_000u64,
            used_pct in 0..=100u64,
            tip in 0..=1_000_000u128,
            balance in 0..=1_000_000_000u128,
            distribute_fees in any::<bool>(),
            send_tip_to_proposer in any::<bool>(),
        ) {
            let params = Params {
                distribute_fees,
                send_tip_to_proposer,
                ..Default::default()
            };
            let mut market = market_at(params, price_micro);
            let price = market.state().base_gas_price;
            let gas_used = gas_limit * used_pct / 100;
            let offered = required_fee(price, gas_limit).unwrap() + tip;

            let payer = Address::new([1; 32]);
            let proposer = Address::new([2; 32]);
            let mut ledger = InMemoryLedger::new();
            ledger.credit(&Account::User(payer), &Coin::new("stake", balance)).unwrap();
            let tx = FeeTx::new(payer, vec![Coin::new("stake", offered)], gas_limit);

            let result = post_handle(
                &mut market,
                &mut ledger,
                &NoopResolver,
                &tx,
                gas_used,
                &proposer,
                false,
            );

            prop_assert_eq!(ledger.total_supply("stake"), balance);
            if balance >= offered {
                let receipt = result.unwrap();
                prop_assert_eq!(receipt.outcome, SettlementOutcome::Settled);
                prop_assert_eq!(receipt.fee.amount + receipt.tip.amount, offered);
                prop_assert_eq!(
                    receipt.fee.amount,
                    required_fee(price, gas_used).unwrap()
                );
                prop_assert_eq!(
                    ledger.balance(&Account::User(payer), "stake"),
                    balance - offered
                );
                let tip_recipient = if send_tip_to_proposer {
                    Account::User(proposer)
                } else {
                    Account::module(ModuleConfig::default().fee_recipient_module)
                };
                prop_assert!(ledger.balance(&tip_recipient, "stake") >= receipt.tip.amount);
            } else {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InsufficientFunds);
                prop_assert_eq!(ledger.balance(&Account::User(payer), "stake"), balance);
                prop_assert_eq!(ledger.balance(&Account::User(proposer), "stake"), 0);
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 3. Simulation isolation
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn simulation_never_calls_ledger(
            price_micro in 1_000_000..=50_000_000u64,
            gas_limit in 0..=10_000_000u64,
            gas_used in 0..=20_000_000u64,
            fee in 0..=100_000_000u128,
        ) {
            let mut market = market_at(Params::default(), price_micro);
            let mut ledger = MockLedger::new();
            let payer = Address::new_unique();
            let fee = if fee == 0 { vec![] } else { vec![Coin::new("stake", fee)] };
            let tx = FeeTx::new(payer, fee, gas_limit);

            let receipt = post_handle(
                &mut market,
                &mut ledger,
                &NoopResolver,
                &tx,
                gas_used,
                &Address::new_unique(),
                true,
            )
            .unwrap();

            prop_assert_eq!(receipt.outcome, SettlementOutcome::Simulated);
            prop_assert!(receipt.gas_consumed > 0);
            prop_assert!(ledger.calls().is_empty());
            prop_assert_eq!(market.state().block_gas_used, 0);
        }
    }
}
