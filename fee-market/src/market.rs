//! The fee market context object.
//!
//! [`FeeMarket`] owns the parameter set and the controller state of one chain
//! and exposes the block-processing entry points a host calls:
//!
//! 1. **`begin_block`**: called when a new block starts. Every transaction of
//!    the block is priced at the base gas price current at this point.
//!
//! 2. **`ante_handle` / `post_handle`** (see [`crate::settlement`]): called
//!    per transaction before and after execution. Post-execution settlement
//!    feeds the block's gas tally through **`record_gas`**.
//!
//! 3. **`end_block`**: called once after the last transaction. Advances the
//!    controller with the block's gas tally, then installs any parameter set
//!    staged by **`update_params`** during the block.

use {
    crate::{
        calculator::{self, BlockUpdate},
        coin::DecCoin,
        config::{ModuleConfig, Params},
        error::FeeMarketError,
        genesis::GenesisState,
        migration::CONSENSUS_VERSION,
        resolver::DenomResolver,
        state::{Enablement, FeeMarketState},
        store::{self, KvStore},
    },
    log::{info, warn},
};

const PENDING_PARAMS_KEY: &[u8] = b"feemarket/pending_params";
const HEIGHT_KEY: &[u8] = b"feemarket/height";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeMarket {
    config: ModuleConfig,
    params: Params,
    pending_params: Option<Params>,
    state: FeeMarketState,
    height: u64,
}

impl FeeMarket {
    /// Start a fee market from a validated genesis snapshot at height 0.
    pub fn from_genesis(config: ModuleConfig, genesis: GenesisState) -> Result<Self, FeeMarketError> {
        genesis.validate()?;
        info!(
            "fee market genesis: base_gas_price={}{} learning_rate={} enabled={}",
            genesis.state.base_gas_price,
            genesis.params.fee_denom,
            genesis.state.learning_rate,
            genesis.params.enabled,
        );
        Ok(Self {
            config,
            params: genesis.params,
            pending_params: genesis.pending_params,
            state: genesis.state,
            height: 0,
        })
    }

    /// Snapshot of the active parameters, the controller state and any
    /// parameter set staged for the next block.
    pub fn export_genesis(&self) -> GenesisState {
        GenesisState {
            params: self.params.clone(),
            state: self.state.clone(),
            pending_params: self.pending_params.clone(),
        }
    }

    /// Restore a fee market persisted with [`save`](Self::save). The store
    /// must already be at [`CONSENSUS_VERSION`].
    pub fn load(config: ModuleConfig, kv: &impl KvStore) -> Result<Self, FeeMarketError> {
        let version = store::load_version(kv)?;
        if version != CONSENSUS_VERSION {
            return Err(FeeMarketError::Migration {
                reason: format!(
                    "store is at version {version}, expected {CONSENSUS_VERSION}; run migrations first"
                ),
            });
        }
        let params = store::load_params(kv)?.ok_or_else(|| missing(store::PARAMS_KEY))?;
        let state = store::load_state(kv)?.ok_or_else(|| missing(store::STATE_KEY))?;
        params.validate()?;
        state
            .validate()
            .map_err(|reason| FeeMarketError::InvalidState { reason })?;
        let pending_params: Option<Params> = store::load(kv, PENDING_PARAMS_KEY)?;
        if let Some(pending) = &pending_params {
            pending.validate()?;
        }
        Ok(Self {
            config,
            params,
            pending_params,
            state,
            height: store::load(kv, HEIGHT_KEY)?.unwrap_or_default(),
        })
    }

    pub fn save(&self, kv: &mut impl KvStore) -> Result<(), FeeMarketError> {
        store::save_params(kv, &self.params)?;
        store::save_state(kv, &self.state)?;
        store::save_version(kv, CONSENSUS_VERSION)?;
        store::save(kv, HEIGHT_KEY, &self.height)?;
        match &self.pending_params {
            Some(pending) => store::save(kv, PENDING_PARAMS_KEY, pending),
            None => {
                kv.delete(PENDING_PARAMS_KEY);
                Ok(())
            }
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Parameters in force for the current block.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Parameters staged for the next block, if any.
    pub fn pending_params(&self) -> Option<&Params> {
        self.pending_params.as_ref()
    }

    pub fn state(&self) -> &FeeMarketState {
        &self.state
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn begin_block(&mut self, height: u64) {
        self.height = height;
    }

    pub fn enablement(&self) -> Enablement {
        Enablement::of(&self.params, &self.state, self.height)
    }

    /// Base gas price in the reference denomination.
    pub fn base_gas_price(&self) -> DecCoin {
        DecCoin::new(self.params.fee_denom.clone(), self.state.base_gas_price)
    }

    /// Base gas price expressed in `denom`.
    pub fn min_gas_price(
        &self,
        denom: &str,
        resolver: &impl DenomResolver,
    ) -> Result<DecCoin, FeeMarketError> {
        resolver.convert(&self.base_gas_price(), denom)
    }

    /// Base gas price in the reference denomination followed by every extra
    /// denomination the resolver accepts.
    pub fn min_gas_prices(
        &self,
        resolver: &impl DenomResolver,
    ) -> Result<Vec<DecCoin>, FeeMarketError> {
        std::iter::once(Ok(self.base_gas_price()))
            .chain(
                resolver
                    .extra_denoms()
                    .into_iter()
                    .filter(|denom| *denom != self.params.fee_denom)
                    .map(|denom| self.min_gas_price(&denom, resolver)),
            )
            .collect()
    }

    /// Add settled gas to the current block's tally.
    pub fn record_gas(&mut self, gas: u64) -> u64 {
        self.state
            .record_gas(gas, self.params.max_block_utilization)
    }

    /// Advance the controller by one block. A disabled market stays frozen
    /// and returns `None`.
    pub fn advance_block(&mut self, gas_used: u64, height: u64) -> Option<BlockUpdate> {
        self.height = height;
        if !self.params.enabled {
            return None;
        }
        let update = calculator::advance(&self.params, &mut self.state, gas_used);
        info!(
            "fee market: height={} base_gas_price={}{} learning_rate={} (gas_used={}, utilization={}, window_avg={})",
            height,
            update.base_gas_price,
            self.params.fee_denom,
            update.learning_rate,
            gas_used,
            update.utilization,
            update.average_utilization,
        );
        Some(update)
    }

    /// Finalize the current block: advance with its gas tally, reset the
    /// tally and install any staged parameter set.
    pub fn end_block(&mut self) -> Option<BlockUpdate> {
        let gas_used = self.state.block_gas_used;
        let update = self.advance_block(gas_used, self.height);
        self.state.block_gas_used = 0;

        if let Some(params) = self.pending_params.take() {
            if !self.params.enabled && params.enabled {
                let enabled_height = self.height.saturating_add(1);
                self.state.enabled_height = Some(enabled_height);
                info!("fee market enabled from height {enabled_height}");
            } else if self.params.enabled && !params.enabled {
                info!(
                    "fee market disabled from height {}",
                    self.height.saturating_add(1)
                );
            }
            self.params = params;
        }
        update
    }

    /// Stage a full replacement parameter set for the next block. The set is
    /// rejected as a whole if `authority` is not the configured one or any
    /// invariant fails.
    pub fn update_params(&mut self, authority: &str, params: Params) -> Result<(), FeeMarketError> {
        if authority != self.config.authority {
            warn!("fee market params update rejected: unauthorized signer {authority}");
            return Err(FeeMarketError::Unauthorized {
                expected: self.config.authority.clone(),
                got: authority.to_string(),
            });
        }
        if let Err(err) = params.validate() {
            warn!("fee market params update rejected: {err}");
            return Err(err);
        }
        self.pending_params = Some(params);
        Ok(())
    }
}

fn missing(key: &[u8]) -> FeeMarketError {
    FeeMarketError::Store {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: "record not found".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            decimal::{dec, Dec},
            resolver::{FixedRateResolver, NoopResolver},
            store::MemStore,
        },
        assert_matches::assert_matches,
    };

    fn market(params: Params) -> FeeMarket {
        let state = FeeMarketState::genesis(&params);
        FeeMarket::from_genesis(ModuleConfig::default(), GenesisState::new(params, state)).unwrap()
    }

    #[test]
    fn test_end_block_advances_with_tally() {
        let mut market = market(Params::default());
        market.begin_block(1);
        market.record_gas(30_000_000);
        let update = market.end_block().unwrap();
        assert_eq!(update.utilization, Dec::ONE);
        assert!(market.state().base_gas_price > dec("1"));
        assert_eq!(market.state().block_gas_used, 0);
    }

    #[test]
    fn test_disabled_market_is_frozen() {
        let mut market = market(Params {
            enabled: false,
            ..Default::default()
        });
        let before = market.state().clone();
        market.begin_block(1);
        assert_eq!(market.enablement(), Enablement::Disabled);
        assert_eq!(market.advance_block(30_000_000, 1), None);
        assert_eq!(market.state(), &before);
    }

    #[test]
    fn test_update_params_applies_next_block() {
        let mut market = market(Params {
            enabled: false,
            ..Default::default()
        });
        market.begin_block(10);
        market
            .update_params("gov", Params::default())
            .unwrap();
        assert!(!market.params().enabled);
        assert!(market.pending_params().is_some());

        market.end_block();
        assert!(market.params().enabled);
        assert_eq!(market.state().enabled_height, Some(11));

        market.begin_block(11);
        assert_eq!(market.enablement(), Enablement::JustEnabled);
        market.end_block();
        market.begin_block(12);
        assert_eq!(market.enablement(), Enablement::Active);
    }

    #[test]
    fn test_update_params_rejections() {
        let mut market = market(Params::default());
        assert_matches!(
            market.update_params("mallory", Params::default()),
            Err(FeeMarketError::Unauthorized { .. })
        );
        assert_matches!(
            market.update_params(
                "gov",
                Params {
                    window: 0,
                    ..Default::default()
                }
            ),
            Err(FeeMarketError::InvalidParams { .. })
        );
        assert_eq!(market.pending_params(), None);
    }

    #[test]
    fn test_min_gas_prices() {
        let market = market(Params::default());
        let resolver = FixedRateResolver::new("stake").with_rate("atom", dec("4"));
        assert_eq!(
            market.min_gas_prices(&resolver).unwrap(),
            vec![
                DecCoin::new("stake", dec("1")),
                DecCoin::new("atom", dec("0.25")),
            ]
        );
        assert_eq!(
            market.min_gas_prices(&NoopResolver).unwrap(),
            vec![DecCoin::new("stake", dec("1"))]
        );
        assert_matches!(
            market.min_gas_price("btc", &NoopResolver),
            Err(FeeMarketError::UnresolvableDenom { .. })
        );
    }

    #[test]
    fn test_save_and_load() {
        let mut market = market(Params::default());
        market.begin_block(3);
        market.record_gas(10_000_000);
        market.end_block();
        market
            .update_params(
                "gov",
                Params {
                    window: 4,
                    ..Default::default()
                },
            )
            .unwrap();

        let mut kv = MemStore::new();
        market.save(&mut kv).unwrap();
        let loaded = FeeMarket::load(ModuleConfig::default(), &kv).unwrap();
        assert_eq!(loaded, market);
    }

    #[test]
    fn test_load_rejects_corrupt_state() {
        let mut state = FeeMarketState::genesis(&Params::default());
        state.base_gas_price = dec("-1");
        let mut kv = MemStore::new();
        market(Params::default()).save(&mut kv).unwrap();
        store::save_state(&mut kv, &state).unwrap();
        assert_matches!(
            FeeMarket::load(ModuleConfig::default(), &kv),
            Err(FeeMarketError::InvalidState { .. })
        );
    }

    #[test]
    fn test_export_keeps_staged_params() {
        let mut market = market(Params::default());
        market.begin_block(5);
        let staged = Params {
            window: 4,
            send_tip_to_proposer: false,
            ..Default::default()
        };
        market.update_params("gov", staged.clone()).unwrap();

        let genesis = market.export_genesis();
        assert_eq!(genesis.pending_params.as_ref(), Some(&staged));

        let mut imported = FeeMarket::from_genesis(
            ModuleConfig::default(),
            GenesisState::from_json(&genesis.to_json().unwrap()).unwrap(),
        )
        .unwrap();
        assert_eq!(imported.params(), &Params::default());
        imported.begin_block(5);
        imported.end_block();
        assert_eq!(imported.params(), &staged);
        assert_eq!(imported.pending_params(), None);
    }

    #[test]
    fn test_load_requires_current_version() {
        let mut kv = MemStore::new();
        market(Params::default()).save(&mut kv).unwrap();
        store::save_version(&mut kv, 1).unwrap();
        assert_matches!(
            FeeMarket::load(ModuleConfig::default(), &kv),
            Err(FeeMarketError::Migration { .. })
        );
    }
}
