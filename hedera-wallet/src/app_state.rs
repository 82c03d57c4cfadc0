use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config_store::{ConfigStore, Environment, WalletConfig};
use crate::errors::WalletResult;
use crate::extension::{ExtensionHandle, WalletExtension};
use crate::ledger_client::{HttpLedgerConnector, LedgerConnector};
use crate::service::HederaWalletService;
use crate::session::{SessionStore, WalletSession};
use crate::storage::{FileKeyValueStore, WalletPaths};

#[derive(Debug)]
pub struct WalletContext {
    paths: WalletPaths,
    config_store: ConfigStore,
    config: RwLock<WalletConfig>,
    environment: Environment,
    service: HederaWalletService,
}

impl WalletContext {
    /// Build the wallet backend rooted at `root_dir` with the HTTP ledger
    /// client configured from the persisted config and environment.
    pub fn initialize(
        root_dir: PathBuf,
        extension: Option<Arc<dyn WalletExtension>>,
    ) -> WalletResult<Self> {
        Self::build(
            root_dir,
            extension,
            |config: &WalletConfig| -> Arc<dyn LedgerConnector> {
                Arc::new(HttpLedgerConnector::new(config.network.clone()))
            },
        )
    }

    /// Same as [`WalletContext::initialize`] with a caller-supplied ledger.
    pub fn with_connector(
        root_dir: PathBuf,
        extension: Option<Arc<dyn WalletExtension>>,
        connector: Arc<dyn LedgerConnector>,
    ) -> WalletResult<Self> {
        Self::build(root_dir, extension, move |_| connector)
    }

    fn build<F>(
        root_dir: PathBuf,
        extension: Option<Arc<dyn WalletExtension>>,
        connector: F,
    ) -> WalletResult<Self>
    where
        F: FnOnce(&WalletConfig) -> Arc<dyn LedgerConnector>,
    {
        let environment = Environment::from_env();
        let paths = WalletPaths::new(&root_dir)?;
        paths.ensure_directories()?;

        let config_store = ConfigStore::from_paths(&paths);
        let mut config = config_store.load_or_default(environment)?;
        config.apply_env_overrides();
        config.validate()?;

        let backend = Arc::new(FileKeyValueStore::new(paths.storage_dir()));
        let store = SessionStore::with_key(backend, config.session.storage_key.clone());
        let service = HederaWalletService::new(
            ExtensionHandle::new(extension),
            connector(&config),
            store,
        )
        .with_history_limit(config.history.page_limit)
        .with_environment(environment);

        log::info!(
            "Wallet backend initialized ({} environment) at {}",
            environment.as_str(),
            paths.root_dir().display()
        );

        Ok(Self {
            paths,
            config_store,
            config: RwLock::new(config),
            environment,
            service,
        })
    }

    /// Restore the persisted session when the config asks for it.
    pub async fn start(&self) -> WalletResult<Option<WalletSession>> {
        if !self.config.read().session.restore_on_start {
            return Ok(None);
        }
        self.service.restore_session().await
    }

    pub fn service(&self) -> &HederaWalletService {
        &self.service
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config_store
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn paths(&self) -> &WalletPaths {
        &self.paths
    }

    /// Effective configuration, including environment overrides.
    pub fn config(&self) -> WalletConfig {
        self.config.read().clone()
    }

    /// Persist a config change. Endpoint and storage changes apply on the
    /// next initialization.
    pub fn update_config<F>(&self, updater: F) -> WalletResult<WalletConfig>
    where
        F: FnOnce(&mut WalletConfig) -> WalletResult<()>,
    {
        let updated = self.config_store.update(self.environment, updater)?;
        let mut effective = updated.clone();
        effective.apply_env_overrides();
        *self.config.write() = effective;
        Ok(updated)
    }
}

/// Wallet context shared with frontend commands.
#[derive(Debug, Clone)]
pub struct SharedWalletContext(pub Arc<WalletContext>);

impl SharedWalletContext {
    pub fn new(inner: WalletContext) -> Self {
        Self(Arc::new(inner))
    }
}

impl Deref for SharedWalletContext {
    type Target = WalletContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
