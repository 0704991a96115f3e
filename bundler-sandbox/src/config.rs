//! Sandbox genesis configuration.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use bundler_common::{Address, Amount};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub address: Address,
    pub symbol: String,
}

/// Starting balance of one owner in one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub asset: Address,
    pub owner: Address,
    #[serde(default)]
    pub public: Amount,
    #[serde(default)]
    pub private: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub contract_address: Address,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,
}

impl SandboxConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse sandbox config")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read sandbox config {}", path.display()))?;
        Self::from_json_str(&raw)
    }
}
