use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use blake3::Hasher as Blake3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{WalletError, WalletResult};
use crate::ledger::Network;
use crate::storage::WalletPaths;

const CONFIG_VERSION: u16 = 1;

/// Environment variable selecting the runtime environment
pub const ENV_ENVIRONMENT: &str = "HEDERA_WALLET_ENV";

const ENV_TESTNET_MIRROR: &str = "HEDERA_WALLET_TESTNET_MIRROR";
const ENV_MAINNET_MIRROR: &str = "HEDERA_WALLET_MAINNET_MIRROR";
const ENV_TIMEOUT_SECS: &str = "HEDERA_WALLET_TIMEOUT_SECS";

/// Runtime environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    /// Whether the wallet may bind to `network`. The test environment never
    /// touches mainnet.
    pub fn allows_network(&self, network: Network) -> bool {
        !matches!((self, network), (Environment::Test, Network::Mainnet))
    }

    /// Environment selected by `HEDERA_WALLET_ENV`, development when unset.
    pub fn from_env() -> Self {
        std::env::var(ENV_ENVIRONMENT)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for Environment {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "test" | "testing" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(WalletError::ValidationError(format!(
                "Unknown environment '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkEndpoints {
    /// Mirror node REST base URL
    pub mirror_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub testnet: NetworkEndpoints,
    pub mainnet: NetworkEndpoints,
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            testnet: NetworkEndpoints {
                mirror_url: "https://testnet.mirrornode.hedera.com".to_string(),
            },
            mainnet: NetworkEndpoints {
                mirror_url: "https://mainnet-public.mirrornode.hedera.com".to_string(),
            },
            request_timeout_secs: 30,
        }
    }
}

impl NetworkConfig {
    pub fn endpoints(&self, network: Network) -> &NetworkEndpoints {
        match network {
            Network::Testnet => &self.testnet,
            Network::Mainnet => &self.mainnet,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Key under which the wallet session is persisted
    pub storage_key: String,
    /// Re-enter the stored session on start-up without prompting the extension
    pub restore_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: "hedera-wallet-data".to_string(),
            restore_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    pub page_limit: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { page_limit: 25 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletConfig {
    pub network: NetworkConfig,
    pub session: SessionConfig,
    pub history: HistoryConfig,
    pub environment: Environment,
    pub last_updated: DateTime<Utc>,
    pub version: u16,
}

impl WalletConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            network: NetworkConfig::default(),
            session: SessionConfig::default(),
            history: HistoryConfig::default(),
            environment,
            last_updated: Utc::now(),
            version: CONFIG_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    /// Apply endpoint overrides from environment variables.
    ///
    /// Empty values and values containing control characters are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |env_var: &str| -> Option<String> {
            let value = lookup(env_var)?;
            if value.trim().is_empty() {
                log::warn!("Environment variable {} is empty", env_var);
                return None;
            }
            if value.chars().any(|c| c.is_control()) {
                log::warn!(
                    "Environment variable {} contains control characters, ignoring",
                    env_var
                );
                return None;
            }
            log::debug!("Loaded configuration from environment variable {}", env_var);
            Some(value.trim().to_string())
        };

        if let Some(url) = read(ENV_TESTNET_MIRROR) {
            self.network.testnet.mirror_url = url;
        }
        if let Some(url) = read(ENV_MAINNET_MIRROR) {
            self.network.mainnet.mirror_url = url;
        }
        if let Some(raw) = read(ENV_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => self.network.request_timeout_secs = secs,
                _ => log::warn!(
                    "Invalid numeric value '{}' for {}, keeping {}s",
                    raw,
                    ENV_TIMEOUT_SECS,
                    self.network.request_timeout_secs
                ),
            }
        }
    }

    pub fn validate(&self) -> WalletResult<()> {
        for (name, endpoints) in [("testnet", &self.network.testnet), ("mainnet", &self.network.mainnet)] {
            let url = &endpoints.mirror_url;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(WalletError::ValidationError(format!(
                    "Invalid {} endpoint '{}'",
                    name, url
                )));
            }
        }

        if self.session.storage_key.trim().is_empty() {
            return Err(WalletError::ValidationError(
                "Session storage key cannot be empty".to_string(),
            ));
        }

        if self.history.page_limit == 0 || self.history.page_limit > 100 {
            return Err(WalletError::ValidationError(
                "History page limit must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u16,
    checksum: [u8; 32],
    payload: WalletConfig,
    modified_at_unix: i64,
}

/// Handles persistence of wallet configuration with integrity checks.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn from_paths(paths: &WalletPaths) -> Self {
        Self {
            path: paths.config_file().to_path_buf(),
        }
    }

    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load_or_default(&self, environment: Environment) -> WalletResult<WalletConfig> {
        if !self.path.exists() {
            let config = WalletConfig::new(environment);
            self.save(&config)?;
            return Ok(config);
        }

        let bytes = fs::read(&self.path)?;
        let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != CONFIG_VERSION {
            return Err(WalletError::ValidationError(format!(
                "Unsupported config version {}",
                envelope.version
            )));
        }

        let checksum = checksum(&envelope.payload)?;
        if checksum != envelope.checksum {
            return Err(WalletError::ValidationError(
                "Config integrity verification failed".to_string(),
            ));
        }

        Ok(envelope.payload)
    }

    pub fn save(&self, config: &WalletConfig) -> WalletResult<()> {
        config.validate()?;

        let mut payload = config.clone();
        payload.touch();

        let envelope = ConfigEnvelope {
            version: CONFIG_VERSION,
            checksum: checksum(&payload)?,
            modified_at_unix: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map_err(|e| WalletError::StorageError(e.to_string()))?
                .as_secs() as i64,
            payload,
        };

        let serialized = serde_json::to_vec_pretty(&envelope)?;
        let tmp_path = self.path.with_extension("new");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&serialized)?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }

    pub fn update<F>(&self, environment: Environment, updater: F) -> WalletResult<WalletConfig>
    where
        F: FnOnce(&mut WalletConfig) -> WalletResult<()>,
    {
        let mut config = self.load_or_default(environment)?;
        updater(&mut config)?;
        config.touch();
        self.save(&config)?;
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn checksum(config: &WalletConfig) -> WalletResult<[u8; 32]> {
    let mut hasher = Blake3::new();
    let encoded = serde_json::to_vec(config)?;
    hasher.update(&encoded);
    Ok(*hasher.finalize().as_bytes())
}
