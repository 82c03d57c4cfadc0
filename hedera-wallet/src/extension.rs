//! Browser wallet extension capability.
//!
//! The wallet never holds keys. Account discovery and signing are delegated to
//! an injected extension (HashPack in the browser build). The extension may be
//! installed after the service is created, or disappear again, so the service
//! holds it through an [`ExtensionHandle`].

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::{WalletError, WalletResult};
use crate::transaction::{SignedTransaction, TransferTransaction};

/// What the extension reports when the user approves a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionConnection {
    #[serde(default)]
    pub account_ids: Vec<String>,
    #[serde(default)]
    pub network: Option<String>,
}

/// Capability exposed by an injected wallet extension.
///
/// Implementations report their own failures as [`WalletError`]; the service
/// maps signing errors to `SigningFailed` regardless of variant.
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Ask the extension to pair with the local wallet.
    async fn connect_to_local_wallet(&self) -> WalletResult<ExtensionConnection>;

    /// Ask the user to approve and sign the transaction.
    async fn sign_transaction(
        &self,
        transaction: &TransferTransaction,
    ) -> WalletResult<SignedTransaction>;
}

/// Optional, swappable reference to the installed extension.
#[derive(Clone, Default)]
pub struct ExtensionHandle {
    inner: Arc<RwLock<Option<Arc<dyn WalletExtension>>>>,
}

impl ExtensionHandle {
    pub fn new(extension: Option<Arc<dyn WalletExtension>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(extension)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn install(&self, extension: Arc<dyn WalletExtension>) {
        *self.inner.write() = Some(extension);
    }

    pub fn remove(&self) {
        self.inner.write().take();
    }

    pub fn is_available(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Current extension, or `ExtensionNotFound`.
    ///
    /// Returns a clone of the `Arc` so no lock is held while awaiting it.
    pub fn get(&self) -> WalletResult<Arc<dyn WalletExtension>> {
        self.inner
            .read()
            .as_ref()
            .cloned()
            .ok_or(WalletError::ExtensionNotFound)
    }
}

impl std::fmt::Debug for ExtensionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionHandle")
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopExtension;

    #[async_trait]
    impl WalletExtension for NoopExtension {
        async fn connect_to_local_wallet(&self) -> WalletResult<ExtensionConnection> {
            Ok(ExtensionConnection::default())
        }

        async fn sign_transaction(
            &self,
            transaction: &TransferTransaction,
        ) -> WalletResult<SignedTransaction> {
            Ok(SignedTransaction::new(transaction.clone(), Vec::new()))
        }
    }

    #[test]
    fn handle_install_and_remove() {
        let handle = ExtensionHandle::empty();
        assert!(!handle.is_available());
        assert!(matches!(handle.get(), Err(WalletError::ExtensionNotFound)));

        handle.install(Arc::new(NoopExtension));
        assert!(handle.is_available());
        assert!(handle.get().is_ok());

        let shared = handle.clone();
        shared.remove();
        assert!(!handle.is_available());
    }

    #[test]
    fn connection_payload_tolerates_missing_fields() {
        let parsed: ExtensionConnection = serde_json::from_str("{}").unwrap();
        assert!(parsed.account_ids.is_empty());
        assert!(parsed.network.is_none());

        let parsed: ExtensionConnection =
            serde_json::from_str(r#"{"accountIds":["0.0.5"],"network":"mainnet"}"#).unwrap();
        assert_eq!(parsed.account_ids, vec!["0.0.5".to_string()]);
        assert_eq!(parsed.network.as_deref(), Some("mainnet"));
    }
}
