//! Daemon configuration
//!
//! A TOML file provides the base values; `DUMBLY_*` environment variables
//! override them. Required values are checked only when the daemon talks
//! to a real node; `--dev` needs just the `[api]` and `[node]` defaults.

use dumbly_core::{Address, AssetId, DEFAULT_CONFIRMATION_ROUNDS};
use dumbly_crypto::KeyPair;
use dumbly_ledger::NodeClientConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use treasury::DistributionTargets;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// The config file as written
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub node: NodeSection,
    pub treasury: TreasurySection,
    pub targets: TargetsSection,
    pub api: ApiSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    pub address: Option<String>,
    pub token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub confirmation_rounds: Option<u64>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreasurySection {
    pub asset_id: Option<AssetId>,
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for TreasurySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreasurySection")
            .field("asset_id", &self.asset_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetsSection {
    pub burn: Option<String>,
    pub lp: Option<String>,
    pub rewards: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub listen: Option<String>,
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub listen: SocketAddr,
    pub allowed_origin: String,
}

#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub client: NodeClientConfig,
    pub confirmation_rounds: u64,
}

/// Everything needed to run against a real node
#[derive(Debug)]
pub struct DaemonConfig {
    pub node: NodeSettings,
    pub asset_id: AssetId,
    pub treasury_key: KeyPair,
    pub targets: DistributionTargets,
    pub api: ApiSettings,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `DUMBLY_*` overrides from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DUMBLY_NODE_ADDRESS") {
            self.node.address = Some(v);
        }
        if let Some(v) = lookup("DUMBLY_NODE_TOKEN") {
            self.node.token = Some(v);
        }
        if let Some(v) = lookup("DUMBLY_TREASURY_KEY") {
            self.treasury.secret_key = Some(v);
        }
        if let Some(v) = lookup("DUMBLY_ASSET_ID") {
            let asset_id = v.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "DUMBLY_ASSET_ID",
                reason: format!("{}", e),
            })?;
            self.treasury.asset_id = Some(asset_id);
        }
        if let Some(v) = lookup("DUMBLY_BURN_ADDR") {
            self.targets.burn = Some(v);
        }
        if let Some(v) = lookup("DUMBLY_LP_ADDR") {
            self.targets.lp = Some(v);
        }
        if let Some(v) = lookup("DUMBLY_REWARDS_ADDR") {
            self.targets.rewards = Some(v);
        }
        if let Some(v) = lookup("DUMBLY_LISTEN") {
            self.api.listen = Some(v);
        }
        Ok(self)
    }

    pub fn api_settings(&self) -> Result<ApiSettings> {
        let listen = self.api.listen.as_deref().unwrap_or(DEFAULT_LISTEN);
        let listen = listen.parse().map_err(|e| ConfigError::Invalid {
            field: "api.listen",
            reason: format!("{}", e),
        })?;

        Ok(ApiSettings {
            listen,
            allowed_origin: self
                .api
                .allowed_origin
                .clone()
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
        })
    }

    pub fn confirmation_rounds(&self) -> u64 {
        self.node
            .confirmation_rounds
            .unwrap_or(DEFAULT_CONFIRMATION_ROUNDS)
    }

    pub fn resolve(self) -> Result<DaemonConfig> {
        let api = self.api_settings()?;
        let confirmation_rounds = self.confirmation_rounds();

        let address = self.node.address.ok_or(ConfigError::Missing("node.address"))?;
        let mut client = NodeClientConfig::new(address);
        client.token = self.node.token;
        client.request_timeout = Duration::from_secs(
            self.node
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        let asset_id = self
            .treasury
            .asset_id
            .ok_or(ConfigError::Missing("treasury.asset_id"))?;
        let secret = self
            .treasury
            .secret_key
            .ok_or(ConfigError::Missing("treasury.secret_key"))?;
        let treasury_key =
            KeyPair::from_secret_hex(secret.trim()).map_err(|e| ConfigError::Invalid {
                field: "treasury.secret_key",
                reason: e.to_string(),
            })?;

        let targets = DistributionTargets {
            burn: target(self.targets.burn, "targets.burn")?,
            lp: target(self.targets.lp, "targets.lp")?,
            rewards: target(self.targets.rewards, "targets.rewards")?,
        };

        Ok(DaemonConfig {
            node: NodeSettings {
                client,
                confirmation_rounds,
            },
            asset_id,
            treasury_key,
            targets,
            api,
        })
    }
}

fn target(value: Option<String>, field: &'static str) -> Result<Address> {
    let value = value.ok_or(ConfigError::Missing(field))?;
    Address::parse(value.trim()).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })
}
