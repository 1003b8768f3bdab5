use {
    crate::{config::Params, error::FeeMarketError, state::FeeMarketState},
    serde::{Deserialize, Serialize},
};

/// Snapshot of the fee market consumed at chain start and produced on export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub state: FeeMarketState,

    /// Parameter set staged during the exported block, installed by the next
    /// `end_block` after import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_params: Option<Params>,
}

impl GenesisState {
    pub fn new(params: Params, state: FeeMarketState) -> Self {
        Self {
            params,
            state,
            pending_params: None,
        }
    }

    pub fn validate(&self) -> Result<(), FeeMarketError> {
        self.params.validate()?;
        if let Some(pending) = &self.pending_params {
            pending.validate()?;
        }
        self.state
            .validate()
            .map_err(|reason| FeeMarketError::InvalidGenesis { reason })
    }

    pub fn to_json(&self) -> Result<String, FeeMarketError> {
        serde_json::to_string_pretty(self).map_err(|err| FeeMarketError::InvalidGenesis {
            reason: err.to_string(),
        })
    }

    /// Parse and validate a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, FeeMarketError> {
        let genesis: Self =
            serde_json::from_str(json).map_err(|err| FeeMarketError::InvalidGenesis {
                reason: err.to_string(),
            })?;
        genesis.validate()?;
        Ok(genesis)
    }
}

impl Default for GenesisState {
    fn default() -> Self {
        let params = Params::default();
        let state = FeeMarketState::genesis(&params);
        Self::new(params, state)
    }
}
