//! Persistence of the parameter set, the controller state and the schema
//! version in a host key-value store. Records are borsh encoded.

use {
    crate::{config::Params, error::FeeMarketError, state::FeeMarketState},
    borsh::{BorshDeserialize, BorshSerialize},
    std::collections::BTreeMap,
};

pub const PARAMS_KEY: &[u8] = b"feemarket/params";
pub const STATE_KEY: &[u8] = b"feemarket/state";
pub const VERSION_KEY: &[u8] = b"feemarket/version";

/// Minimal byte-oriented store the host provides.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn set(&mut self, key: &[u8], value: Vec<u8>);
    fn delete(&mut self, key: &[u8]);
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }
}

fn store_error(key: &[u8], reason: impl ToString) -> FeeMarketError {
    FeeMarketError::Store {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: reason.to_string(),
    }
}

pub(crate) fn load<T: BorshDeserialize>(
    store: &impl KvStore,
    key: &[u8],
) -> Result<Option<T>, FeeMarketError> {
    store
        .get(key)
        .map(|bytes| borsh::from_slice(&bytes).map_err(|err| store_error(key, err)))
        .transpose()
}

pub(crate) fn save<T: BorshSerialize>(
    store: &mut impl KvStore,
    key: &[u8],
    value: &T,
) -> Result<(), FeeMarketError> {
    let bytes = borsh::to_vec(value).map_err(|err| store_error(key, err))?;
    store.set(key, bytes);
    Ok(())
}

pub fn load_params(store: &impl KvStore) -> Result<Option<Params>, FeeMarketError> {
    load(store, PARAMS_KEY)
}

pub fn save_params(store: &mut impl KvStore, params: &Params) -> Result<(), FeeMarketError> {
    save(store, PARAMS_KEY, params)
}

pub fn load_state(store: &impl KvStore) -> Result<Option<FeeMarketState>, FeeMarketError> {
    load(store, STATE_KEY)
}

pub fn save_state(store: &mut impl KvStore, state: &FeeMarketState) -> Result<(), FeeMarketError> {
    save(store, STATE_KEY, state)
}

/// Stored schema version; a store without one predates versioning and is
/// version 1.
pub fn load_version(store: &impl KvStore) -> Result<u64, FeeMarketError> {
    Ok(load(store, VERSION_KEY)?.unwrap_or(1))
}

pub fn save_version(store: &mut impl KvStore, version: u64) -> Result<(), FeeMarketError> {
    save(store, VERSION_KEY, &version)
}
