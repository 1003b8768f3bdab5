//! One-shot store migrations between schema versions.
//!
//! Version 1 parameter records predate `send_tip_to_proposer`; version 2 adds
//! it, defaulting to `true`. A migration failure is fatal for the upgrade.

use {
    crate::{
        config::Params,
        decimal::Dec,
        error::FeeMarketError,
        store::{self, KvStore, PARAMS_KEY},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    log::info,
    serde::{Deserialize, Serialize},
};

/// Current schema version of the fee market store.
pub const CONSENSUS_VERSION: u64 = 2;

/// Version 1 parameter record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LegacyParams {
    pub alpha: Dec,
    pub beta: Dec,
    pub gamma: Dec,
    pub delta: Dec,
    pub min_base_gas_price: Dec,
    pub min_learning_rate: Dec,
    pub max_learning_rate: Dec,
    pub max_block_utilization: u64,
    pub window: u64,
    pub fee_denom: String,
    pub enabled: bool,
    pub distribute_fees: bool,
}

impl From<LegacyParams> for Params {
    fn from(legacy: LegacyParams) -> Self {
        Self {
            alpha: legacy.alpha,
            beta: legacy.beta,
            gamma: legacy.gamma,
            delta: legacy.delta,
            min_base_gas_price: legacy.min_base_gas_price,
            min_learning_rate: legacy.min_learning_rate,
            max_learning_rate: legacy.max_learning_rate,
            max_block_utilization: legacy.max_block_utilization,
            window: legacy.window,
            fee_denom: legacy.fee_denom,
            enabled: legacy.enabled,
            distribute_fees: legacy.distribute_fees,
            send_tip_to_proposer: true,
        }
    }
}

/// Rewrite the stored version 1 parameter record as a version 2 record.
pub fn migrate_v1_to_v2(kv: &mut impl KvStore) -> Result<Params, FeeMarketError> {
    let legacy: LegacyParams = store::load(&*kv, PARAMS_KEY)
        .map_err(|err| FeeMarketError::Migration {
            reason: format!("cannot decode fee market params: {err}"),
        })?
        .ok_or_else(|| FeeMarketError::Migration {
            reason: "cannot fetch fee market params from store".to_string(),
        })?;
    let params = Params::from(legacy);
    store::save_params(kv, &params)?;
    Ok(params)
}

/// Bring a store at `from_version` up to [`CONSENSUS_VERSION`] and record the
/// new version. Returns the version the store is left at.
pub fn run_migrations(kv: &mut impl KvStore, from_version: u64) -> Result<u64, FeeMarketError> {
    if from_version == 0 || from_version > CONSENSUS_VERSION {
        return Err(FeeMarketError::Migration {
            reason: format!(
                "unsupported store version {from_version}, this build is at {CONSENSUS_VERSION}"
            ),
        });
    }
    for version in from_version..CONSENSUS_VERSION {
        match version {
            1 => {
                migrate_v1_to_v2(kv)?;
            }
            _ => {
                return Err(FeeMarketError::Migration {
                    reason: format!("no migration registered from version {version}"),
                })
            }
        }
        info!("fee market store migrated from version {version} to {}", version + 1);
    }
    store::save_version(kv, CONSENSUS_VERSION)?;
    Ok(CONSENSUS_VERSION)
}
